//! Mock VRF coordinator setup for development chains.
//!
//! Deploys `VRFCoordinatorV2Mock`, creates a subscription, and funds it, so
//! the raffle can request randomness without live oracle infrastructure.

use std::path::Path;

use alloy_core::primitives::{Address, U256};
use anyhow::{Context, Result};

use crate::abi::{self, Token};
use crate::artifact::Artifact;
use crate::eth::{EthClient, TxReceipt};
use crate::network::NetworkConfig;

use super::{StepOutcome, deploy_contract};

/// Contract name of the mock coordinator artifact.
pub const MOCK_COORDINATOR_CONTRACT: &str = "VRFCoordinatorV2Mock";

/// Flat fee the mock charges per request: 0.25 LINK in juels.
pub const BASE_FEE: u128 = 250_000_000_000_000_000;

/// LINK per gas used by the mock to price fulfillment: 1 gwei.
pub const GAS_PRICE_LINK: u128 = 1_000_000_000;

/// Amount the fresh subscription is funded with: 30 LINK in juels.
pub const SUBSCRIPTION_FUND_AMOUNT: u128 = 30_000_000_000_000_000_000;

/// Event emitted by the coordinator when a subscription is created.
const SUBSCRIPTION_CREATED_EVENT: &str = "SubscriptionCreated(uint64,address)";

/// Result of the mocks step: everything the raffle step needs.
#[derive(Debug, Clone)]
pub struct MockVrfSetup {
    /// Address of the (deployed or reused) mock coordinator.
    pub coordinator: Address,
    /// ID of the freshly created and funded subscription.
    pub subscription_id: u64,
    /// The coordinator deployment outcome.
    pub outcome: StepOutcome,
}

/// Run the mocks step: deploy the coordinator, create and fund a subscription.
pub async fn run(
    eth: &EthClient,
    from: Address,
    artifacts_dir: &Path,
    outdata: &Path,
    net: &NetworkConfig,
    redeploy: bool,
) -> Result<MockVrfSetup> {
    tracing::info!("Local network detected! Deploying mocks...");

    let artifact = Artifact::load(artifacts_dir, MOCK_COORDINATOR_CONTRACT)?;
    let constructor_args = abi::encode_tokens(&[
        Token::Uint(U256::from(BASE_FEE)),
        Token::Uint(U256::from(GAS_PRICE_LINK)),
    ]);

    let outcome = deploy_contract(
        eth,
        from,
        &artifact,
        &constructor_args,
        net,
        outdata,
        redeploy,
    )
    .await?;
    let coordinator: Address = outcome
        .record
        .address
        .parse()
        .context("Recorded coordinator address is invalid")?;

    // A fresh subscription is created on every run, even when the
    // coordinator deployment itself was reused.
    let subscription_id = create_subscription(eth, from, coordinator, net).await?;
    fund_subscription(eth, from, coordinator, subscription_id, net).await?;

    tracing::info!(
        coordinator = %outcome.record.address,
        subscription_id,
        "Mock VRF coordinator ready"
    );

    Ok(MockVrfSetup {
        coordinator,
        subscription_id,
        outcome,
    })
}

/// Create a VRF subscription and return its ID from the emitted event.
async fn create_subscription(
    eth: &EthClient,
    from: Address,
    coordinator: Address,
    net: &NetworkConfig,
) -> Result<u64> {
    let data = abi::encode_call("createSubscription()", &[]);
    let (tx_hash, receipt) = eth
        .send_and_confirm(from, Some(coordinator), U256::ZERO, data, net.block_confirmations)
        .await
        .context("Failed to create VRF subscription")?;

    let subscription_id = parse_subscription_id(&receipt)
        .with_context(|| format!("No SubscriptionCreated event in receipt of {}", tx_hash))?;

    tracing::debug!(subscription_id, tx_hash = %tx_hash, "VRF subscription created");
    Ok(subscription_id)
}

/// Fund the subscription with [`SUBSCRIPTION_FUND_AMOUNT`].
async fn fund_subscription(
    eth: &EthClient,
    from: Address,
    coordinator: Address,
    subscription_id: u64,
    net: &NetworkConfig,
) -> Result<()> {
    let data = abi::encode_call(
        "fundSubscription(uint64,uint96)",
        &[
            Token::Uint(U256::from(subscription_id)),
            Token::Uint(U256::from(SUBSCRIPTION_FUND_AMOUNT)),
        ],
    );
    eth.send_and_confirm(from, Some(coordinator), U256::ZERO, data, net.block_confirmations)
        .await
        .context("Failed to fund VRF subscription")?;

    tracing::debug!(subscription_id, amount = SUBSCRIPTION_FUND_AMOUNT, "VRF subscription funded");
    Ok(())
}

/// Register a consumer contract on the subscription so its randomness
/// requests are accepted.
pub async fn add_consumer(
    eth: &EthClient,
    from: Address,
    coordinator: Address,
    subscription_id: u64,
    consumer: Address,
    net: &NetworkConfig,
) -> Result<()> {
    let data = abi::encode_call(
        "addConsumer(uint64,address)",
        &[
            Token::Uint(U256::from(subscription_id)),
            Token::Address(consumer),
        ],
    );
    eth.send_and_confirm(from, Some(coordinator), U256::ZERO, data, net.block_confirmations)
        .await
        .context("Failed to register VRF consumer")?;

    tracing::info!(consumer = %format!("{:#x}", consumer), subscription_id, "VRF consumer registered");
    Ok(())
}

/// Extract the subscription ID from the `SubscriptionCreated(uint64 indexed
/// subId, address owner)` log of a receipt. The ID is the first indexed
/// topic.
fn parse_subscription_id(receipt: &TxReceipt) -> Result<u64> {
    let topic0 = format!("0x{}", hex::encode(abi::event_topic(SUBSCRIPTION_CREATED_EVENT)));

    for log in &receipt.logs {
        let Some(first) = log.topics.first() else {
            continue;
        };
        if !first.eq_ignore_ascii_case(&topic0) {
            continue;
        }
        let sub_id_topic = log
            .topics
            .get(1)
            .context("SubscriptionCreated log is missing the subId topic")?;
        let digits = sub_id_topic.trim_start_matches("0x");
        // The uint64 lives in the low-order bytes of the 32-byte topic.
        let tail = &digits[digits.len().saturating_sub(16)..];
        return u64::from_str_radix(tail, 16)
            .with_context(|| format!("Invalid subId topic: {}", sub_id_topic));
    }

    anyhow::bail!("Receipt contains no SubscriptionCreated event")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eth::LogEntry;

    fn subscription_receipt(topics: Vec<String>) -> TxReceipt {
        serde_json::from_value(serde_json::json!({
            "status": "0x1",
            "blockNumber": "0x1",
            "contractAddress": null,
            "logs": [],
        }))
        .map(|mut receipt: TxReceipt| {
            receipt.logs = vec![LogEntry {
                address: "0x5fbdb2315678afecb367f032d93f642f64180aa3".to_string(),
                topics,
                data: "0x".to_string(),
            }];
            receipt
        })
        .unwrap()
    }

    fn subscription_created_topic0() -> String {
        format!(
            "0x{}",
            hex::encode(abi::event_topic(SUBSCRIPTION_CREATED_EVENT))
        )
    }

    #[test]
    fn test_parse_subscription_id() {
        let receipt = subscription_receipt(vec![
            subscription_created_topic0(),
            "0x0000000000000000000000000000000000000000000000000000000000000001".to_string(),
            "0x000000000000000000000000f39fd6e51aad88f6f4ce6ab8827279cfffb92266".to_string(),
        ]);
        assert_eq!(parse_subscription_id(&receipt).unwrap(), 1);
    }

    #[test]
    fn test_parse_subscription_id_large_value() {
        let receipt = subscription_receipt(vec![
            subscription_created_topic0(),
            "0x00000000000000000000000000000000000000000000000000000000deadbeef".to_string(),
        ]);
        assert_eq!(parse_subscription_id(&receipt).unwrap(), 0xdeadbeef);
    }

    #[test]
    fn test_parse_subscription_id_ignores_other_events() {
        let receipt = subscription_receipt(vec![
            // A different event topic entirely.
            format!("0x{}", hex::encode(abi::event_topic("Transfer(address,address,uint256)"))),
            "0x0000000000000000000000000000000000000000000000000000000000000005".to_string(),
        ]);
        assert!(parse_subscription_id(&receipt).is_err());
    }

    #[test]
    fn test_mock_constant_denominations() {
        // BASE_FEE is 0.25 LINK in juels, the fund amount 30.
        assert_eq!(BASE_FEE * 4, 10u128.pow(18));
        assert_eq!(SUBSCRIPTION_FUND_AMOUNT, 30 * 10u128.pow(18));
        assert_eq!(GAS_PRICE_LINK, 10u128.pow(9));
    }
}
