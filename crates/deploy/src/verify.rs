//! Etherscan source verification for deployed contracts.
//!
//! Follows the classic two-phase flow: submit the flattened source with
//! `verifysourcecode`, then poll `checkverifystatus` with the returned GUID
//! until Etherscan leaves the "Pending in queue" state.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use backon::{ExponentialBuilder, Retryable};
use serde::Deserialize;

use crate::artifact::Artifact;
use crate::rpc;

/// Solc version assumed when the artifact does not carry one.
const DEFAULT_COMPILER_VERSION: &str = "v0.8.19+commit.7dd6d404";

/// Etherscan API response envelope: `status` is "1" on success.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    message: String,
    result: String,
}

/// Outcome of a `verifysourcecode` submission.
enum Submission {
    /// Accepted; carries the GUID used to poll for the result.
    Accepted(String),
    /// The source at this address was verified earlier.
    AlreadyVerified,
}

/// Client for one network's Etherscan API.
pub struct EtherscanVerifier {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

/// Resolve the Etherscan API endpoint for a chain ID.
pub fn api_url_for_chain(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        1 => Some("https://api.etherscan.io/api"),
        11155111 => Some("https://api-sepolia.etherscan.io/api"),
        _ => None,
    }
}

impl EtherscanVerifier {
    /// Create a verifier for a chain. Returns an error for chains without a
    /// known Etherscan endpoint.
    pub fn for_chain(chain_id: u64, api_key: impl Into<String>) -> Result<Self> {
        let api_url = api_url_for_chain(chain_id)
            .with_context(|| format!("No Etherscan endpoint known for chain {}", chain_id))?;
        Ok(Self {
            http: rpc::create_client()?,
            api_url: api_url.to_string(),
            api_key: api_key.into(),
        })
    }

    /// Verify a deployed contract's source.
    ///
    /// The artifact must carry its flattened source; `constructor_args` are
    /// the raw encoded bytes appended to the creation code at deploy time.
    pub async fn verify(
        &self,
        address: &str,
        artifact: &Artifact,
        constructor_args: &[u8],
    ) -> Result<()> {
        tracing::info!(address, contract = %artifact.contract_name, "Verifying on Etherscan...");

        let guid = match self.submit(address, artifact, constructor_args).await? {
            Submission::Accepted(guid) => guid,
            Submission::AlreadyVerified => {
                tracing::info!(address, "Contract already verified");
                return Ok(());
            }
        };

        let status = (|| async { self.check_status(&guid).await })
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_secs(3))
                    .with_max_delay(Duration::from_secs(20))
                    .with_max_times(10),
            )
            .when(|e: &anyhow::Error| e.to_string().contains("Pending in queue"))
            .await?;

        tracing::info!(address, status = %status, "Contract verified");
        Ok(())
    }

    async fn submit(
        &self,
        address: &str,
        artifact: &Artifact,
        constructor_args: &[u8],
    ) -> Result<Submission> {
        let source = artifact.source.as_deref().with_context(|| {
            format!(
                "Artifact {} has no flattened source; cannot verify",
                artifact.contract_name
            )
        })?;
        let compiler_version = artifact
            .compiler_version
            .as_deref()
            .unwrap_or(DEFAULT_COMPILER_VERSION);

        let mut form = HashMap::new();
        form.insert("apikey", self.api_key.as_str());
        form.insert("module", "contract");
        form.insert("action", "verifysourcecode");
        form.insert("codeformat", "solidity-single-file");
        form.insert("contractaddress", address);
        form.insert("sourceCode", source);
        let qualified_name = artifact.qualified_name();
        form.insert("contractname", &qualified_name);
        form.insert("compilerversion", compiler_version);
        form.insert("optimizationUsed", "1");
        // Etherscan's historical misspelling of "arguments" is part of the API.
        let args_hex = hex::encode(constructor_args);
        form.insert("constructorArguements", &args_hex);

        let response: ApiResponse = self
            .http
            .post(&self.api_url)
            .form(&form)
            .send()
            .await
            .context("Failed to submit verification request")?
            .json()
            .await
            .context("Failed to parse verification response")?;

        if response.status == "1" {
            return Ok(Submission::Accepted(response.result));
        }
        if response.result.contains("already verified") {
            return Ok(Submission::AlreadyVerified);
        }
        anyhow::bail!(
            "Etherscan rejected the verification request: {} ({})",
            response.result,
            response.message
        )
    }

    async fn check_status(&self, guid: &str) -> Result<String> {
        let response: ApiResponse = self
            .http
            .get(&self.api_url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .send()
            .await
            .context("Failed to poll verification status")?
            .json()
            .await
            .context("Failed to parse verification status")?;

        if response.status == "1" || response.result.contains("Already Verified") {
            return Ok(response.result);
        }
        // "Pending in queue" flows through here and triggers the retry.
        anyhow::bail!("Verification not complete: {}", response.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_for_known_chains() {
        assert_eq!(
            api_url_for_chain(11155111),
            Some("https://api-sepolia.etherscan.io/api")
        );
        assert_eq!(api_url_for_chain(1), Some("https://api.etherscan.io/api"));
        assert_eq!(api_url_for_chain(31337), None);
    }

    #[test]
    fn test_verifier_rejects_unknown_chain() {
        assert!(EtherscanVerifier::for_chain(31337, "key").is_err());
        assert!(EtherscanVerifier::for_chain(11155111, "key").is_ok());
    }

    #[test]
    fn test_api_response_shape() {
        let accepted: ApiResponse = serde_json::from_str(
            r#"{"status":"1","message":"OK","result":"abc123guid"}"#,
        )
        .unwrap();
        assert_eq!(accepted.status, "1");
        assert_eq!(accepted.result, "abc123guid");

        let pending: ApiResponse = serde_json::from_str(
            r#"{"status":"0","message":"NOTOK","result":"Pending in queue"}"#,
        )
        .unwrap();
        assert_eq!(pending.status, "0");
        assert!(pending.result.contains("Pending"));
    }
}
