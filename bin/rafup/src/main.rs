//! rafup is a CLI tool to deploy the VRF-backed Raffle contracts in a few clicks.

mod cli;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};

use alloy_signer_local::{MnemonicBuilder, PrivateKeySigner, coins_bip39::English};
use cli::{Cli, OutData};
use rafup_deploy::{DeployOptions, Deployer, DeployerBuilder, OutDataPath, RAFUP_CONF_FILENAME};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let opts = DeployOptions {
        redeploy: cli.redeploy,
        signer: resolve_signer(&cli)?,
        etherscan_api_key: cli.etherscan_api_key.clone(),
    };

    // If a config file is provided, load it and deploy.
    if let Some(config_path) = &cli.config {
        let deployer = load_config(Path::new(config_path))?;

        tracing::info!(
            config_path = %config_path,
            network = %deployer.network_name,
            chain_id = deployer.chain_id,
            outdata = %deployer.outdata.display(),
            "Loading deployment from config file..."
        );

        deployer.deploy(opts).await?;

        return Ok(());
    }

    // Otherwise, create a new deployment from CLI arguments.
    let rpc_url = cli.rpc_provider.to_rpc_url(cli.network)?;

    let mut builder = DeployerBuilder::new(cli.network.to_chain_id())
        .rpc_url(rpc_url)
        .tags(cli.tags.clone())
        .artifacts_dir(cli.artifacts.clone())
        .verify(!cli.skip_verify)
        .subscription_id(cli.subscription_id)
        .confirmations(cli.confirmations);

    // Set the deployment name if provided.
    if let Some(name) = cli.deployment_name {
        builder = builder.network_name(name);
    }

    // Set the output data path if provided.
    if let Some(outdata) = cli.outdata {
        let outdata_path = match outdata {
            OutData::TempDir => OutDataPath::TempDir,
            OutData::Path(path) => OutDataPath::Path(PathBuf::from(path)),
        };
        builder = builder.outdata(outdata_path);
    }

    // Build the deployer configuration.
    let deployer = builder.build()?;

    // Save the configuration to Rafup.toml before deploying.
    deployer.save_config()?;

    deployer.deploy(opts).await?;

    Ok(())
}

/// Load a saved configuration, layering `RAFUP_CONF_`-prefixed environment
/// variables over the TOML file.
fn load_config(path: &Path) -> Result<Deployer> {
    let config_path = if path.is_dir() {
        path.join(RAFUP_CONF_FILENAME)
    } else {
        path.to_path_buf()
    };

    if !config_path.exists() {
        anyhow::bail!("Configuration file not found: {}", config_path.display());
    }

    Figment::new()
        .merge(Toml::file(&config_path))
        .merge(Env::prefixed("RAFUP_CONF_"))
        .extract()
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))
}

/// Resolve the local signer from CLI-provided key material, if any.
fn resolve_signer(cli: &Cli) -> Result<Option<PrivateKeySigner>> {
    if let Some(ref key) = cli.private_key {
        let signer: PrivateKeySigner = key
            .trim()
            .parse()
            .context("Invalid private key (expected 32-byte hex)")?;
        return Ok(Some(signer));
    }

    if let Some(ref mnemonic) = cli.mnemonic {
        let signer = MnemonicBuilder::<English>::default()
            .phrase(mnemonic.trim())
            .index(0)?
            .build()
            .context("Invalid mnemonic phrase")?;
        return Ok(Some(signer));
    }

    Ok(None)
}
