//! Compiled contract artifacts.
//!
//! Artifacts are solc/hardhat-style JSON files, one per contract, living in an
//! artifacts directory: `{"contractName", "sourceName", "bytecode", ...}`.
//! The optional flattened `source` and `compilerVersion` fields are only
//! needed for explorer verification.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A compiled contract artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// The contract name, e.g. `Raffle`.
    pub contract_name: String,
    /// The source file the contract was compiled from, e.g. `contracts/Raffle.sol`.
    pub source_name: String,
    /// Hex-encoded creation bytecode, with or without a `0x` prefix.
    pub bytecode: String,
    /// Full solc version string, e.g. `v0.8.19+commit.7dd6d404`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler_version: Option<String>,
    /// Flattened Solidity source, required for explorer verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Artifact {
    /// Load `<dir>/<contract_name>.json`.
    pub fn load(artifacts_dir: &Path, contract_name: &str) -> Result<Self> {
        let path = Self::path_for(artifacts_dir, contract_name);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read artifact {}", path.display()))?;
        let artifact: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse artifact {}", path.display()))?;

        if artifact.contract_name != contract_name {
            anyhow::bail!(
                "Artifact {} declares contract '{}', expected '{}'",
                path.display(),
                artifact.contract_name,
                contract_name
            );
        }

        Ok(artifact)
    }

    /// The artifact file path for a contract.
    pub fn path_for(artifacts_dir: &Path, contract_name: &str) -> PathBuf {
        artifacts_dir.join(format!("{}.json", contract_name))
    }

    /// Decode the creation bytecode.
    pub fn creation_code(&self) -> Result<Vec<u8>> {
        let cleaned = self.bytecode.trim().trim_start_matches("0x");
        let code = hex::decode(cleaned).with_context(|| {
            format!("Artifact {} has invalid bytecode hex", self.contract_name)
        })?;
        if code.is_empty() {
            anyhow::bail!(
                "Artifact {} has empty bytecode (is it an interface or abstract contract?)",
                self.contract_name
            );
        }
        Ok(code)
    }

    /// The fully-qualified name Etherscan expects: `source.sol:Contract`.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn write_artifact(dir: &Path, name: &str, body: serde_json::Value) {
        std::fs::write(
            dir.join(format!("{}.json", name)),
            serde_json::to_string_pretty(&body).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_load_and_decode() {
        let dir = TempDir::new("artifact-test").unwrap();
        write_artifact(
            dir.path(),
            "Raffle",
            serde_json::json!({
                "contractName": "Raffle",
                "sourceName": "contracts/Raffle.sol",
                "bytecode": "0x608060405234801561001057600080fd5b50",
            }),
        );

        let artifact = Artifact::load(dir.path(), "Raffle").unwrap();
        assert_eq!(artifact.contract_name, "Raffle");
        assert_eq!(artifact.qualified_name(), "contracts/Raffle.sol:Raffle");

        let code = artifact.creation_code().unwrap();
        assert_eq!(code[0], 0x60);
        assert_eq!(code.len(), 18);
    }

    #[test]
    fn test_bytecode_without_prefix() {
        let artifact = Artifact {
            contract_name: "Mock".to_string(),
            source_name: "contracts/Mock.sol".to_string(),
            bytecode: "6080".to_string(),
            compiler_version: None,
            source: None,
        };
        assert_eq!(artifact.creation_code().unwrap(), vec![0x60, 0x80]);
    }

    #[test]
    fn test_rejects_name_mismatch() {
        let dir = TempDir::new("artifact-test").unwrap();
        write_artifact(
            dir.path(),
            "Raffle",
            serde_json::json!({
                "contractName": "SomethingElse",
                "sourceName": "contracts/Raffle.sol",
                "bytecode": "0x6080",
            }),
        );
        assert!(Artifact::load(dir.path(), "Raffle").is_err());
    }

    #[test]
    fn test_rejects_empty_or_invalid_bytecode() {
        let mut artifact = Artifact {
            contract_name: "Mock".to_string(),
            source_name: "contracts/Mock.sol".to_string(),
            bytecode: "0x".to_string(),
            compiler_version: None,
            source: None,
        };
        assert!(artifact.creation_code().is_err());

        artifact.bytecode = "0xzz".to_string();
        assert!(artifact.creation_code().is_err());
    }

    #[test]
    fn test_missing_artifact_is_an_error() {
        let dir = TempDir::new("artifact-test").unwrap();
        let err = Artifact::load(dir.path(), "Raffle").unwrap_err();
        assert!(err.to_string().contains("Raffle.json"));
    }
}
