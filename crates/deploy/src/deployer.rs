//! Main deployer that orchestrates the raffle deployment end to end.

use std::path::PathBuf;

use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};
use comfy_table::Table;
use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::eth::EthClient;
use crate::network::NetworkConfig;
use crate::record::DeploymentRecord;
use crate::steps::{StepOutcome, mocks, raffle};
use crate::verify::EtherscanVerifier;

/// The default name for the rafup configuration file.
pub const RAFUP_CONF_FILENAME: &str = "Rafup.toml";

/// A deployment tag selecting which steps to run.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum DeployTag {
    /// Run every step.
    All,
    /// Mock VRF infrastructure (development chains only).
    Mocks,
    /// The Raffle contract itself.
    Raffle,
}

/// Returns true if a step tagged `step` should run under `tags`.
fn tag_selected(tags: &[DeployTag], step: DeployTag) -> bool {
    tags.iter()
        .any(|tag| *tag == DeployTag::All || *tag == step)
}

/// Per-run options that never belong in the serialized configuration:
/// redeploy forcing and secret material.
#[derive(Default)]
pub struct DeployOptions {
    /// Redeploy contracts even when a matching record exists.
    pub redeploy: bool,
    /// Local signer. Required on live networks; optional on development
    /// chains, where the node's unlocked accounts are used instead.
    pub signer: Option<PrivateKeySigner>,
    /// Etherscan API key enabling explorer verification.
    pub etherscan_api_key: Option<String>,
}

/// Main deployer for the raffle contracts.
///
/// Contains all the configuration needed to run a deployment and can be
/// serialized to/from TOML format (`Rafup.toml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployer {
    /// The target chain ID.
    pub chain_id: u64,
    /// A name for this deployment, used in log output.
    pub network_name: String,
    /// The JSON-RPC endpoint to deploy through.
    pub rpc_url: String,
    /// Path to the output data directory (records, saved config).
    pub outdata: PathBuf,
    /// Directory holding the compiled contract artifacts.
    pub artifacts_dir: PathBuf,
    /// Deployment tags selecting which steps run.
    pub tags: Vec<DeployTag>,
    /// Attempt explorer verification on live networks.
    pub verify: bool,
    /// Override for the VRF subscription ID (live networks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<u64>,
    /// Override for the number of block confirmations to wait.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
}

impl Deployer {
    /// Save the configuration to a TOML file.
    pub fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize deployer config to TOML")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Load the configuration from a TOML file (or a directory containing a
    /// `Rafup.toml`).
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Configuration file or directory not found: {}",
                path.display()
            );
        }

        let config_path = if path.is_dir() {
            path.join(RAFUP_CONF_FILENAME)
        } else {
            path.to_path_buf()
        };

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
        let config: Self =
            toml::from_str(&content).context("Failed to parse config file as TOML")?;
        tracing::info!(path = %config_path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Save the configuration to the default location (`Rafup.toml` in
    /// outdata).
    pub fn save_config(&self) -> Result<PathBuf> {
        let config_path = self.outdata.join(RAFUP_CONF_FILENAME);
        self.save_to_file(&config_path)?;
        Ok(config_path)
    }

    /// The network parameter set for the configured chain, with the
    /// per-deployment overrides applied.
    pub fn network(&self) -> Result<NetworkConfig> {
        let mut net = NetworkConfig::from_chain_id(self.chain_id).with_context(|| {
            format!(
                "Chain {} is not in the supported network table",
                self.chain_id
            )
        })?;
        if let Some(sub_id) = self.subscription_id {
            net.subscription_id = Some(sub_id);
        }
        if let Some(confirmations) = self.confirmations {
            net.block_confirmations = confirmations;
        }
        Ok(net)
    }

    /// Run the deployment.
    pub async fn deploy(self, opts: DeployOptions) -> Result<()> {
        let net = self.network()?;

        tracing::info!(
            network = net.name,
            chain_id = self.chain_id,
            rpc_url = %self.rpc_url,
            tags = ?self.tags,
            "Starting deployment process..."
        );

        if !net.is_development() && opts.signer.is_none() {
            anyhow::bail!(
                "Deploying to the live network '{}' requires a private key or mnemonic",
                net.name
            );
        }

        let eth = EthClient::connect(&self.rpc_url, self.chain_id, opts.signer)
            .await
            .context("Failed to connect to the RPC endpoint")?;
        let from = eth.deployer_address().await?;

        tracing::info!(deployer = %format!("{:#x}", from), "Deployer account resolved");

        // Resolve the VRF coordinator and subscription, mocking on
        // development chains.
        let (coordinator, subscription_id, mock_outcome) = if net.is_development() {
            if tag_selected(&self.tags, DeployTag::Mocks) {
                let setup = mocks::run(
                    &eth,
                    from,
                    &self.artifacts_dir,
                    &self.outdata,
                    &net,
                    opts.redeploy,
                )
                .await?;
                (setup.coordinator, setup.subscription_id, Some(setup.outcome))
            } else {
                // The mocks step was excluded by tags: fall back to the
                // recorded coordinator from an earlier run.
                let record = DeploymentRecord::load(
                    &self.outdata,
                    net.name,
                    mocks::MOCK_COORDINATOR_CONTRACT,
                )?
                .context(
                    "Mocks step excluded by tags but no mock coordinator record exists; \
                     run with --tags mocks first",
                )?;
                let coordinator = record
                    .address
                    .parse()
                    .context("Recorded coordinator address is invalid")?;
                let sub_id = net
                    .subscription_id
                    .context("Mocks step excluded; provide --subscription-id explicitly")?;
                (coordinator, sub_id, None)
            }
        } else {
            let coordinator = net
                .vrf_coordinator
                .context("Network table has no VRF coordinator for this chain")?;
            let sub_id = net.subscription_id.with_context(|| {
                format!(
                    "No VRF subscription ID configured for {}; pass --subscription-id \
                     or set subscription_id in Rafup.toml",
                    net.name
                )
            })?;
            (coordinator, sub_id, None)
        };

        // Deploy the raffle itself.
        let raffle = if tag_selected(&self.tags, DeployTag::Raffle) {
            let deployment = raffle::run(
                &eth,
                from,
                &self.artifacts_dir,
                &self.outdata,
                &net,
                coordinator,
                subscription_id,
                opts.redeploy,
            )
            .await?;

            // On development chains the raffle must be allowed to spend the
            // mock subscription.
            if net.is_development() {
                mocks::add_consumer(
                    &eth,
                    from,
                    coordinator,
                    subscription_id,
                    deployment.address,
                    &net,
                )
                .await?;
            }

            Some(deployment)
        } else {
            None
        };

        self.print_summary(mock_outcome.as_ref(), raffle.as_ref().map(|r| &r.outcome));

        // Explorer verification: live networks with an API key only.
        if let Some(ref deployment) = raffle {
            if !net.is_development() && self.verify {
                match opts.etherscan_api_key {
                    Some(ref api_key) => {
                        self.verify_raffle(deployment, api_key).await;
                    }
                    None => {
                        tracing::info!(
                            "Skipping verification: no Etherscan API key provided"
                        );
                    }
                }
            }
        }

        tracing::info!("Deployment complete!");
        Ok(())
    }

    /// Attempt verification; a failure is logged but does not fail the run,
    /// since the deployment itself already succeeded.
    async fn verify_raffle(&self, deployment: &raffle::RaffleDeployment, api_key: &str) {
        let result = async {
            let artifact = Artifact::load(&self.artifacts_dir, raffle::RAFFLE_CONTRACT)?;
            let verifier = EtherscanVerifier::for_chain(self.chain_id, api_key)?;
            verifier
                .verify(
                    &deployment.outcome.record.address,
                    &artifact,
                    &deployment.constructor_args,
                )
                .await
        }
        .await;

        if let Err(e) = result {
            tracing::error!(error = %e, "Etherscan verification failed");
        }
    }

    fn print_summary(&self, mock: Option<&StepOutcome>, raffle: Option<&StepOutcome>) {
        let mut table = Table::new();
        table.set_header(vec!["Contract", "Address", "Block", "Status"]);

        for outcome in [mock, raffle].into_iter().flatten() {
            table.add_row(vec![
                outcome.record.contract_name.clone(),
                outcome.record.address.clone(),
                outcome.record.block_number.to_string(),
                if outcome.reused { "reused" } else { "deployed" }.to_string(),
            ]);
        }

        tracing::info!("Deployment summary:\n{table}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn sample_deployer(outdata: PathBuf) -> Deployer {
        Deployer {
            chain_id: 31337,
            network_name: "rafup-local".to_string(),
            rpc_url: "http://127.0.0.1:8545".to_string(),
            outdata,
            artifacts_dir: PathBuf::from("artifacts"),
            tags: vec![DeployTag::All],
            verify: false,
            subscription_id: None,
            confirmations: None,
        }
    }

    #[test]
    fn test_tag_selection() {
        assert!(tag_selected(&[DeployTag::All], DeployTag::Mocks));
        assert!(tag_selected(&[DeployTag::All], DeployTag::Raffle));
        assert!(tag_selected(&[DeployTag::Mocks], DeployTag::Mocks));
        assert!(!tag_selected(&[DeployTag::Mocks], DeployTag::Raffle));
        assert!(tag_selected(
            &[DeployTag::Mocks, DeployTag::Raffle],
            DeployTag::Raffle
        ));
        assert!(!tag_selected(&[], DeployTag::Raffle));
    }

    #[test]
    fn test_tag_parsing() {
        assert_eq!("all".parse::<DeployTag>().unwrap(), DeployTag::All);
        assert_eq!("mocks".parse::<DeployTag>().unwrap(), DeployTag::Mocks);
        assert_eq!("raffle".parse::<DeployTag>().unwrap(), DeployTag::Raffle);
        assert!("unknown".parse::<DeployTag>().is_err());
    }

    #[test]
    fn test_config_save_and_load_round_trip() {
        let dir = TempDir::new("deployer-test").unwrap();
        let deployer = sample_deployer(dir.path().to_path_buf());

        let config_path = deployer.save_config().unwrap();
        assert!(config_path.ends_with(RAFUP_CONF_FILENAME));

        let loaded = Deployer::load_from_file(&config_path).unwrap();
        assert_eq!(deployer, loaded);

        // Loading via the directory also works.
        let loaded = Deployer::load_from_file(&dir.path().to_path_buf()).unwrap();
        assert_eq!(deployer, loaded);
    }

    #[test]
    fn test_load_missing_config_is_an_error() {
        let missing = PathBuf::from("/nonexistent/rafup/config");
        assert!(Deployer::load_from_file(&missing).is_err());
    }

    #[test]
    fn test_network_applies_overrides() {
        let dir = TempDir::new("deployer-test").unwrap();
        let mut deployer = sample_deployer(dir.path().to_path_buf());
        deployer.chain_id = 11155111;
        deployer.subscription_id = Some(777);
        deployer.confirmations = Some(3);

        let net = deployer.network().unwrap();
        assert_eq!(net.subscription_id, Some(777));
        assert_eq!(net.block_confirmations, 3);
        assert_eq!(net.name, "sepolia");
    }

    #[test]
    fn test_live_network_has_no_default_subscription() {
        let dir = TempDir::new("deployer-test").unwrap();
        let mut deployer = sample_deployer(dir.path().to_path_buf());
        deployer.chain_id = 11155111;

        // Without an explicit override the resolved parameters carry no
        // subscription, so the deploy-time guard refuses to wire the raffle
        // to a subscription the deployer does not own.
        let net = deployer.network().unwrap();
        assert!(net.subscription_id.is_none());

        deployer.subscription_id = Some(777);
        assert_eq!(deployer.network().unwrap().subscription_id, Some(777));
    }

    #[test]
    fn test_network_rejects_unsupported_chain() {
        let dir = TempDir::new("deployer-test").unwrap();
        let mut deployer = sample_deployer(dir.path().to_path_buf());
        deployer.chain_id = 4242;
        assert!(deployer.network().is_err());
    }
}
