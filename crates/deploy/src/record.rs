//! Per-contract deployment records and the redeploy-skip decision.
//!
//! Every successful deployment writes
//! `<outdata>/deployments/<network>/<Contract>.json`. On the next run the
//! record's configuration hash decides whether the existing address can be
//! reused or the contract must be redeployed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The parameters that, when changed, invalidate an existing deployment.
///
/// Runtime-only settings (RPC endpoint, verbosity, confirmation count) are
/// deliberately excluded: changing them must not force a redeploy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigHash {
    /// Chain the contract is deployed on.
    pub chain_id: u64,
    /// Hex constructor arguments appended to the creation code.
    pub constructor_args: String,
    /// Creation bytecode hash, so recompiled contracts redeploy.
    pub bytecode_hash: String,
}

impl ConfigHash {
    /// Build the hash input for a deployment.
    pub fn new(chain_id: u64, constructor_args: &[u8], creation_code: &[u8]) -> Self {
        Self {
            chain_id,
            constructor_args: hex::encode(constructor_args),
            bytecode_hash: hex::encode(Sha256::digest(creation_code)),
        }
    }

    /// Compute the deterministic SHA-256 hash of this configuration.
    pub fn compute(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.chain_id.to_be_bytes());
        hasher.update(self.constructor_args.as_bytes());
        hasher.update(self.bytecode_hash.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Record of one deployed contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// The contract name, e.g. `Raffle`.
    pub contract_name: String,
    /// Deployed contract address (`0x`-prefixed).
    pub address: String,
    /// Hash of the deployment transaction.
    pub tx_hash: String,
    /// Block the deployment was included in.
    pub block_number: u64,
    /// Hex-encoded constructor arguments (no `0x` prefix).
    pub constructor_args: String,
    /// Hash of the deployment-relevant configuration.
    pub config_hash: String,
    /// RFC 3339 timestamp of the deployment.
    pub deployed_at: String,
    /// rafup version that wrote this record.
    pub rafup_version: String,
}

impl DeploymentRecord {
    /// Create a record for a fresh deployment, stamped with the current time
    /// and crate version.
    pub fn new(
        contract_name: impl Into<String>,
        address: impl Into<String>,
        tx_hash: impl Into<String>,
        block_number: u64,
        constructor_args: &[u8],
        config_hash: String,
    ) -> Self {
        Self {
            contract_name: contract_name.into(),
            address: address.into(),
            tx_hash: tx_hash.into(),
            block_number,
            constructor_args: hex::encode(constructor_args),
            config_hash,
            deployed_at: chrono::Utc::now().to_rfc3339(),
            rafup_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Path of the record file for a contract on a network.
    pub fn path_for(outdata: &Path, network_name: &str, contract_name: &str) -> PathBuf {
        outdata
            .join("deployments")
            .join(network_name)
            .join(format!("{}.json", contract_name))
    }

    /// Save this record, creating the deployments directory as needed.
    pub fn save(&self, outdata: &Path, network_name: &str) -> Result<PathBuf> {
        let path = Self::path_for(outdata, network_name, &self.contract_name);
        let dir = path
            .parent()
            .context("Record path has no parent directory")?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize deployment record")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write record to {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Deployment record saved");
        Ok(path)
    }

    /// Load the record for a contract, if one exists.
    pub fn load(outdata: &Path, network_name: &str, contract_name: &str) -> Result<Option<Self>> {
        let path = Self::path_for(outdata, network_name, contract_name);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read record from {}", path.display()))?;
        let record: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse record {}", path.display()))?;
        Ok(Some(record))
    }

    /// Decide whether an existing record still matches the wanted
    /// configuration and can be reused.
    pub fn is_reusable(&self, config_hash: &str) -> bool {
        self.config_hash == config_hash
    }
}
