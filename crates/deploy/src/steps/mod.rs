//! Tag-selected deployment steps.
//!
//! `mocks` prepares the VRF coordinator mock on development chains, `raffle`
//! deploys the main contract.

pub mod mocks;
pub mod raffle;

use std::path::Path;

use alloy_core::primitives::U256;
use anyhow::{Context, Result};

use crate::artifact::Artifact;
use crate::eth::EthClient;
use crate::network::NetworkConfig;
use crate::record::{ConfigHash, DeploymentRecord};

/// Outcome of a single contract deployment step.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub record: DeploymentRecord,
    /// True when an existing, still-valid deployment was reused.
    pub reused: bool,
}

/// Deploy one contract, or reuse the recorded deployment when its
/// configuration hash still matches and `redeploy` was not requested.
pub(crate) async fn deploy_contract(
    eth: &EthClient,
    from: alloy_core::primitives::Address,
    artifact: &Artifact,
    constructor_args: &[u8],
    net: &NetworkConfig,
    outdata: &Path,
    redeploy: bool,
) -> Result<StepOutcome> {
    let creation_code = artifact.creation_code()?;
    let config_hash = ConfigHash::new(net.chain_id, constructor_args, &creation_code).compute();

    if !redeploy {
        if let Some(record) = DeploymentRecord::load(outdata, net.name, &artifact.contract_name)? {
            if record.is_reusable(&config_hash) {
                tracing::info!(
                    contract = %artifact.contract_name,
                    address = %record.address,
                    "Existing deployment matches configuration, skipping"
                );
                return Ok(StepOutcome {
                    record,
                    reused: true,
                });
            }
            tracing::info!(
                contract = %artifact.contract_name,
                "Existing deployment is stale (configuration changed), redeploying"
            );
        }
    }

    let mut init_code = creation_code;
    init_code.extend_from_slice(constructor_args);

    tracing::info!(
        contract = %artifact.contract_name,
        init_code_len = init_code.len(),
        "Deploying contract..."
    );

    let (tx_hash, receipt) = eth
        .send_and_confirm(from, None, U256::ZERO, init_code, net.block_confirmations)
        .await
        .with_context(|| format!("Failed to deploy {}", artifact.contract_name))?;

    let address = receipt.created_address()?;
    let record = DeploymentRecord::new(
        artifact.contract_name.clone(),
        format!("{:#x}", address),
        tx_hash,
        receipt.block_number()?,
        constructor_args,
        config_hash,
    );
    record.save(outdata, net.name)?;

    tracing::info!(
        contract = %artifact.contract_name,
        address = %record.address,
        block = record.block_number,
        "Contract deployed"
    );

    Ok(StepOutcome {
        record,
        reused: false,
    })
}
