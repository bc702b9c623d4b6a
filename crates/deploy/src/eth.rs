//! Ethereum client: account resolution, transaction submission, and receipt
//! confirmation over JSON-RPC.

use std::str::FromStr;
use std::time::Duration;

use alloy_core::primitives::{Address, U256};
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};
use serde::Deserialize;

use crate::rpc;
use crate::tx::LegacyTransaction;

/// How long to wait for the node to answer `eth_chainId` at connect time.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// How long to wait for a transaction receipt plus its confirmations.
const RECEIPT_TIMEOUT_SECS: u64 = 600;

/// Interval between receipt polling attempts.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Gas fallback when `eth_estimateGas` fails (some nodes reject estimation
/// for creation transactions with large init code).
const FALLBACK_GAS_LIMIT: u64 = 6_000_000;

/// A log entry from a transaction receipt.
#[derive(Debug, Clone, Deserialize)]
pub struct LogEntry {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
}

/// The subset of a transaction receipt this tool consumes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub status: String,
    pub block_number: String,
    pub contract_address: Option<String>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl TxReceipt {
    /// Returns true if the transaction executed successfully.
    pub fn succeeded(&self) -> bool {
        self.status == "0x1"
    }

    /// The block number the transaction was included in.
    pub fn block_number(&self) -> Result<u64> {
        rpc::parse_quantity(&self.block_number)
    }

    /// The created contract address, for creation transactions.
    pub fn created_address(&self) -> Result<Address> {
        let raw = self
            .contract_address
            .as_deref()
            .context("Receipt has no contract address")?;
        Address::from_str(raw).context("Receipt contract address is not a valid address")
    }
}

/// Client for a single Ethereum JSON-RPC endpoint.
///
/// Transactions are signed locally when a signer is attached; otherwise they
/// are delegated to the node via `eth_sendTransaction`, which only works
/// against nodes that manage the sending account (Anvil, Hardhat).
pub struct EthClient {
    http: reqwest::Client,
    url: String,
    chain_id: u64,
    signer: Option<PrivateKeySigner>,
}

impl EthClient {
    /// Connect to the endpoint: wait until the node answers `eth_chainId` and
    /// verify the reported chain matches `expected_chain_id`.
    pub async fn connect(
        url: &str,
        expected_chain_id: u64,
        signer: Option<PrivateKeySigner>,
    ) -> Result<Self> {
        let http = rpc::create_client()?;

        let probe_http = http.clone();
        let probe_url = url.to_string();
        rpc::wait_until_ready("RPC endpoint", CONNECT_TIMEOUT_SECS, || {
            let http = probe_http.clone();
            let url = probe_url.clone();
            async move {
                let _: String = rpc::json_rpc_call(&http, &url, "eth_chainId", vec![]).await?;
                Ok(())
            }
        })
        .await
        .with_context(|| format!("No JSON-RPC endpoint reachable at {}", url))?;

        let chain_id_hex: String = rpc::json_rpc_call(&http, url, "eth_chainId", vec![]).await?;
        let chain_id = rpc::parse_quantity(&chain_id_hex)?;

        if chain_id != expected_chain_id {
            anyhow::bail!(
                "Chain ID mismatch: endpoint {} reports {}, configuration expects {}",
                url,
                chain_id,
                expected_chain_id
            );
        }

        tracing::debug!(url, chain_id, "Connected to RPC endpoint");

        Ok(Self {
            http,
            url: url.to_string(),
            chain_id,
            signer,
        })
    }

    /// The chain ID reported by the node.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Resolve the account that sends deployment transactions.
    ///
    /// A local signer wins; without one, fall back to the node's first
    /// unlocked account (the hardhat/anvil "deployer" convention).
    pub async fn deployer_address(&self) -> Result<Address> {
        if let Some(ref signer) = self.signer {
            return Ok(signer.address());
        }

        let accounts: Vec<String> = rpc::json_rpc_call(&self.http, &self.url, "eth_accounts", vec![])
            .await
            .context("Failed to list node accounts")?;

        let first = accounts
            .first()
            .context("Node manages no accounts and no private key was provided")?;
        Address::from_str(first).context("Node returned an invalid account address")
    }

    /// Submit a transaction and return its hash.
    ///
    /// Nonce, gas price, and gas limit are filled from the node. `to = None`
    /// deploys a contract.
    pub async fn send_transaction(
        &self,
        from: Address,
        to: Option<Address>,
        value: U256,
        data: Vec<u8>,
    ) -> Result<String> {
        let gas_price = self.gas_price().await?;
        let gas_limit = self.estimate_gas(from, to, value, &data).await;

        let tx_hash = match self.signer {
            Some(ref signer) => {
                // Only local signing needs the nonce; node-managed accounts
                // get it filled server-side.
                let nonce = self.transaction_count(from).await?;
                let tx = LegacyTransaction {
                    nonce,
                    gas_price,
                    gas_limit,
                    to,
                    value,
                    data,
                };
                let raw = tx.sign(self.chain_id, signer)?;
                rpc::json_rpc_call(
                    &self.http,
                    &self.url,
                    "eth_sendRawTransaction",
                    vec![serde_json::json!(format!("0x{}", hex::encode(raw)))],
                )
                .await
                .context("Failed to send raw transaction")?
            }
            None => {
                let request = node_tx_request(from, to, value, &data, Some((gas_limit, gas_price)));
                rpc::json_rpc_call(
                    &self.http,
                    &self.url,
                    "eth_sendTransaction",
                    vec![request],
                )
                .await
                .context("Failed to send transaction via node account")?
            }
        };

        tracing::debug!(tx_hash = %tx_hash, ?to, gas_limit, "Transaction submitted");

        Ok(tx_hash)
    }

    /// Wait for a transaction receipt, check its status, then wait until the
    /// chain head reaches the confirmation target.
    pub async fn wait_for_receipt(&self, tx_hash: &str, confirmations: u64) -> Result<TxReceipt> {
        let start = std::time::Instant::now();
        let receipt = loop {
            if start.elapsed() > Duration::from_secs(RECEIPT_TIMEOUT_SECS) {
                anyhow::bail!("Timed out waiting for receipt of {}", tx_hash);
            }

            let receipt: Result<Option<TxReceipt>> = rpc::json_rpc_call(
                &self.http,
                &self.url,
                "eth_getTransactionReceipt",
                vec![serde_json::json!(tx_hash)],
            )
            .await;
            match receipt {
                Ok(Some(receipt)) => break receipt,
                Ok(None) => {}
                Err(e) => {
                    tracing::trace!(error = %e, tx_hash = %tx_hash, "Receipt fetch failed, retrying...");
                }
            }

            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        };

        if !receipt.succeeded() {
            anyhow::bail!("Transaction {} reverted (status {})", tx_hash, receipt.status);
        }

        let included_at = receipt.block_number()?;
        let target = confirmation_target(included_at, confirmations);

        if confirmations > 1 {
            tracing::info!(tx_hash = %tx_hash, included_at, confirmations, "Waiting for confirmations...");
            let http = self.http.clone();
            let url = self.url.clone();
            rpc::wait_until_ready("block confirmations", RECEIPT_TIMEOUT_SECS, || {
                let http = http.clone();
                let url = url.clone();
                async move {
                    let head_hex: String =
                        rpc::json_rpc_call(&http, &url, "eth_blockNumber", vec![]).await?;
                    let head = rpc::parse_quantity(&head_hex)?;
                    if head >= target {
                        Ok(())
                    } else {
                        anyhow::bail!("Head at {}, waiting for {}", head, target)
                    }
                }
            })
            .await?;
        }

        Ok(receipt)
    }

    /// Submit a transaction and wait for it to confirm in one step.
    pub async fn send_and_confirm(
        &self,
        from: Address,
        to: Option<Address>,
        value: U256,
        data: Vec<u8>,
        confirmations: u64,
    ) -> Result<(String, TxReceipt)> {
        let tx_hash = self.send_transaction(from, to, value, data).await?;
        let receipt = self.wait_for_receipt(&tx_hash, confirmations).await?;
        Ok((tx_hash, receipt))
    }

    /// Execute a read-only contract call and return the raw result bytes.
    pub async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>> {
        let result: String = rpc::json_rpc_call(
            &self.http,
            &self.url,
            "eth_call",
            vec![
                serde_json::json!({
                    "to": format!("{:#x}", to),
                    "data": format!("0x{}", hex::encode(data)),
                }),
                serde_json::json!("latest"),
            ],
        )
        .await?;
        hex::decode(result.trim_start_matches("0x")).context("eth_call returned invalid hex")
    }

    async fn transaction_count(&self, address: Address) -> Result<u64> {
        let hex_count: String = rpc::json_rpc_call(
            &self.http,
            &self.url,
            "eth_getTransactionCount",
            vec![
                serde_json::json!(format!("{:#x}", address)),
                serde_json::json!("pending"),
            ],
        )
        .await
        .context("Failed to fetch account nonce")?;
        rpc::parse_quantity(&hex_count)
    }

    async fn gas_price(&self) -> Result<u128> {
        let hex_price: String =
            rpc::json_rpc_call(&self.http, &self.url, "eth_gasPrice", vec![]).await?;
        Ok(rpc::parse_quantity(&hex_price)? as u128)
    }

    /// Estimate gas with a 20% safety margin; fall back to a fixed limit when
    /// the node refuses to estimate.
    async fn estimate_gas(
        &self,
        from: Address,
        to: Option<Address>,
        value: U256,
        data: &[u8],
    ) -> u64 {
        let request = node_tx_request(from, to, value, data, None);

        let estimate: Result<String> = rpc::json_rpc_call(
            &self.http,
            &self.url,
            "eth_estimateGas",
            vec![request],
        )
        .await;

        match estimate.and_then(|hex_gas| rpc::parse_quantity(&hex_gas)) {
            Ok(gas) => gas + gas / 5,
            Err(e) => {
                tracing::warn!(error = %e, fallback = FALLBACK_GAS_LIMIT, "Gas estimation failed, using fallback");
                FALLBACK_GAS_LIMIT
            }
        }
    }
}

/// Build the parameter object for `eth_sendTransaction` and
/// `eth_estimateGas`. The nonce is omitted: nodes fill it for accounts they
/// manage. `to = None` means contract creation.
fn node_tx_request(
    from: Address,
    to: Option<Address>,
    value: U256,
    data: &[u8],
    gas: Option<(u64, u128)>,
) -> serde_json::Value {
    let mut request = serde_json::json!({
        "from": format!("{:#x}", from),
        "value": format!("0x{:x}", value),
        "data": format!("0x{}", hex::encode(data)),
    });
    if let Some(to) = to {
        request["to"] = serde_json::json!(format!("{:#x}", to));
    }
    if let Some((gas_limit, gas_price)) = gas {
        request["gas"] = serde_json::json!(rpc::to_quantity(gas_limit));
        // Gas prices can exceed a u64 in wei; keep the full u128 width.
        request["gasPrice"] = serde_json::json!(format!("0x{:x}", gas_price));
    }
    request
}

/// Head height at which a transaction included at `included_at` has
/// `confirmations` confirmations. The inclusion block counts as the first.
fn confirmation_target(included_at: u64, confirmations: u64) -> u64 {
    included_at + confirmations.saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt(status: &str, block: &str, addr: Option<&str>) -> TxReceipt {
        TxReceipt {
            status: status.to_string(),
            block_number: block.to_string(),
            contract_address: addr.map(String::from),
            logs: vec![],
        }
    }

    #[test]
    fn test_receipt_status() {
        assert!(receipt("0x1", "0x10", None).succeeded());
        assert!(!receipt("0x0", "0x10", None).succeeded());
    }

    #[test]
    fn test_receipt_block_number() {
        assert_eq!(receipt("0x1", "0xaa36a7", None).block_number().unwrap(), 11155111);
        assert!(receipt("0x1", "0xzz", None).block_number().is_err());
    }

    #[test]
    fn test_receipt_created_address() {
        let r = receipt(
            "0x1",
            "0x1",
            Some("0x5fbdb2315678afecb367f032d93f642f64180aa3"),
        );
        assert_eq!(
            format!("{:#x}", r.created_address().unwrap()),
            "0x5fbdb2315678afecb367f032d93f642f64180aa3"
        );
        assert!(receipt("0x1", "0x1", None).created_address().is_err());
    }

    #[test]
    fn test_node_tx_request_has_no_nonce() {
        let request = node_tx_request(Address::ZERO, None, U256::ZERO, &[0x60, 0x80], None);
        assert!(request.get("nonce").is_none());
        // Creation transactions also omit the `to` field entirely.
        assert!(request.get("to").is_none());
        assert_eq!(request["data"], "0x6080");
        assert!(request.get("gas").is_none());
    }

    #[test]
    fn test_node_tx_request_keeps_full_gas_price_width() {
        let gas_price = u64::MAX as u128 + 1;
        let request = node_tx_request(
            Address::ZERO,
            Some(Address::ZERO),
            U256::ZERO,
            &[],
            Some((21_000, gas_price)),
        );
        assert_eq!(request["gasPrice"], "0x10000000000000000");
        assert_eq!(request["gas"], "0x5208");
        assert_eq!(
            request["to"],
            "0x0000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_confirmation_target() {
        // The inclusion block is the first confirmation.
        assert_eq!(confirmation_target(100, 1), 100);
        assert_eq!(confirmation_target(100, 2), 101);
        assert_eq!(confirmation_target(100, 6), 105);
        assert_eq!(confirmation_target(100, 0), 100);
    }

    #[test]
    fn test_receipt_deserializes_from_rpc_shape() {
        let json = serde_json::json!({
            "status": "0x1",
            "blockNumber": "0x2",
            "contractAddress": null,
            "transactionHash": "0xabc",
            "logs": [
                {"address": "0xdead", "topics": ["0x01"], "data": "0x"}
            ]
        });
        let receipt: TxReceipt = serde_json::from_value(json).unwrap();
        assert!(receipt.succeeded());
        assert_eq!(receipt.logs.len(), 1);
        assert!(receipt.contract_address.is_none());
    }
}
