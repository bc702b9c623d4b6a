//! Builder module for creating a [`Deployer`] configuration.
//!
//! Handles deployment-name generation, output directory creation, and
//! defaulting of tags and artifact paths.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::deployer::{DeployTag, Deployer};

/// Specifies how the output data directory should be created.
#[derive(Debug, Clone)]
pub enum OutDataPath {
    /// Use a temporary directory that will be cleaned up.
    TempDir,
    /// Use a specific path.
    Path(PathBuf),
}

/// Builder for creating a [`Deployer`] configuration.
///
/// # Example
///
/// ```no_run
/// use rafup_deploy::DeployerBuilder;
///
/// # fn example() -> anyhow::Result<()> {
/// let deployer = DeployerBuilder::new(31337)
///     .rpc_url("http://127.0.0.1:8545")
///     .network_name("my-raffle")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DeployerBuilder {
    /// The target chain ID (required).
    chain_id: u64,
    /// The RPC endpoint (required before build).
    rpc_url: Option<String>,
    /// The deployment name (optional, generated if not provided).
    network_name: Option<String>,
    /// The output data path specification.
    outdata: Option<OutDataPath>,
    /// Directory holding compiled contract artifacts.
    artifacts_dir: Option<PathBuf>,
    /// Deployment tags.
    tags: Vec<DeployTag>,
    /// Whether explorer verification is attempted on live networks.
    verify: bool,
    /// Override for the VRF subscription ID.
    subscription_id: Option<u64>,
    /// Override for block confirmations.
    confirmations: Option<u64>,
}

impl DeployerBuilder {
    /// Create a new [`DeployerBuilder`] for a chain ID.
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            rpc_url: None,
            network_name: None,
            outdata: None,
            artifacts_dir: None,
            tags: vec![DeployTag::All],
            verify: true,
            subscription_id: None,
            confirmations: None,
        }
    }

    /// Set the JSON-RPC endpoint used for the deployment.
    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    /// Set the deployment name.
    ///
    /// If not set, a memorable two-word name is generated
    /// (e.g. `rafup-happy-turtle`).
    pub fn network_name(mut self, name: impl Into<String>) -> Self {
        self.network_name = Some(name.into());
        self
    }

    /// Set the output data directory.
    ///
    /// If not set, defaults to `./data-<deployment-name>`.
    pub fn outdata(mut self, outdata: OutDataPath) -> Self {
        self.outdata = Some(outdata);
        self
    }

    /// Set the artifacts directory. Defaults to `./artifacts`.
    pub fn artifacts_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifacts_dir = Some(path.into());
        self
    }

    /// Set the deployment tags. An empty selection is replaced by `all`.
    pub fn tags(mut self, tags: Vec<DeployTag>) -> Self {
        self.tags = if tags.is_empty() {
            vec![DeployTag::All]
        } else {
            tags
        };
        self
    }

    /// Enable or disable explorer verification on live networks.
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Override the VRF subscription ID.
    pub fn subscription_id(mut self, subscription_id: Option<u64>) -> Self {
        self.subscription_id = subscription_id;
        self
    }

    /// Override the number of block confirmations to wait for.
    pub fn confirmations(mut self, confirmations: Option<u64>) -> Self {
        self.confirmations = confirmations;
        self
    }

    /// Build the [`Deployer`] configuration.
    ///
    /// Generates a deployment name if none was provided, then creates and
    /// canonicalizes the output data directory.
    pub fn build(self) -> Result<Deployer> {
        let rpc_url = self
            .rpc_url
            .context("An RPC endpoint is required to build a deployer")?;
        url::Url::parse(&rpc_url)
            .with_context(|| format!("Invalid RPC endpoint URL: {}", rpc_url))?;

        let network_name = self.network_name.unwrap_or_else(|| {
            let name = names::Generator::default()
                .next()
                .unwrap_or_else(|| "unknown-raffle".to_string());
            format!("rafup-{}", name)
        });

        let outdata_path = match self.outdata {
            None => PathBuf::from(format!("data-{}", network_name)),
            Some(OutDataPath::TempDir) => {
                let temp_dir = tempdir::TempDir::new("data-rafup-")
                    .context("Failed to create temporary directory")?;
                // into_path keeps the directory alive past this scope.
                temp_dir.into_path()
            }
            Some(OutDataPath::Path(path)) => path,
        };

        if !outdata_path.try_exists().with_context(|| {
            format!(
                "Failed to check if output data directory exists at {}. Ensure you have permissions to the directory.",
                outdata_path.display()
            )
        })? {
            std::fs::create_dir_all(&outdata_path)
                .context("Failed to create output data directory")?;
        }

        let outdata = outdata_path
            .canonicalize()
            .context("Failed to canonicalize output data directory path")?;

        tracing::info!(
            network_name,
            chain_id = self.chain_id,
            outdata = %outdata.display(),
            "Building raffle deployer configuration..."
        );

        Ok(Deployer {
            chain_id: self.chain_id,
            network_name,
            rpc_url,
            outdata,
            artifacts_dir: self.artifacts_dir.unwrap_or_else(|| PathBuf::from("artifacts")),
            tags: self.tags,
            verify: self.verify,
            subscription_id: self.subscription_id,
            confirmations: self.confirmations,
        })
    }
}
