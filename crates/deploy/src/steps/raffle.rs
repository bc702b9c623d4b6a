//! Deployment of the main Raffle contract.

use std::path::Path;

use alloy_core::primitives::{Address, U256};
use anyhow::{Context, Result};

use crate::abi::{self, Token};
use crate::artifact::Artifact;
use crate::eth::EthClient;
use crate::network::NetworkConfig;

use super::{StepOutcome, deploy_contract};

/// Contract name of the raffle artifact.
pub const RAFFLE_CONTRACT: &str = "Raffle";

/// Result of the raffle step.
#[derive(Debug, Clone)]
pub struct RaffleDeployment {
    /// Address of the (deployed or reused) raffle.
    pub address: Address,
    /// Encoded constructor arguments, kept for explorer verification.
    pub constructor_args: Vec<u8>,
    /// The deployment outcome.
    pub outcome: StepOutcome,
}

/// Constructor argument tokens in declaration order:
/// `(address vrfCoordinatorV2, uint256 entranceFee, bytes32 gasLane,
///   uint64 subscriptionId, uint32 callbackGasLimit, uint256 interval)`.
pub fn constructor_tokens(
    net: &NetworkConfig,
    coordinator: Address,
    subscription_id: u64,
) -> Vec<Token> {
    vec![
        Token::Address(coordinator),
        Token::Uint(U256::from(net.entrance_fee)),
        Token::FixedBytes(net.gas_lane),
        Token::Uint(U256::from(subscription_id)),
        Token::Uint(U256::from(net.callback_gas_limit)),
        Token::Uint(U256::from(net.interval_secs)),
    ]
}

/// Run the raffle step: encode the constructor arguments and deploy.
pub async fn run(
    eth: &EthClient,
    from: Address,
    artifacts_dir: &Path,
    outdata: &Path,
    net: &NetworkConfig,
    coordinator: Address,
    subscription_id: u64,
    redeploy: bool,
) -> Result<RaffleDeployment> {
    let artifact = Artifact::load(artifacts_dir, RAFFLE_CONTRACT)?;
    let constructor_args =
        abi::encode_tokens(&constructor_tokens(net, coordinator, subscription_id));

    tracing::info!(
        coordinator = %format!("{:#x}", coordinator),
        subscription_id,
        entrance_fee = net.entrance_fee,
        callback_gas_limit = net.callback_gas_limit,
        interval_secs = net.interval_secs,
        "Deploying Raffle..."
    );

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
    let address: Address = outcome
        .record
        .address
        .parse()
        .context("Recorded raffle address is invalid")?;

    Ok(RaffleDeployment {
        address,
        constructor_args,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network;
    use alloy_core::primitives::address;

    #[test]
    fn test_constructor_arg_order_and_layout() {
        let coordinator = address!("8103B0A8A00be2DDC778e6e7eaa21791Cd364625");
        let tokens = constructor_tokens(&network::SEPOLIA, coordinator, 42);
        let encoded = abi::encode_tokens(&tokens);

        // Six static words.
        assert_eq!(encoded.len(), 6 * 32);

        // Word 0: coordinator address, left-padded.
        assert_eq!(
            hex::encode(&encoded[..32]),
            "0000000000000000000000008103b0a8a00be2ddc778e6e7eaa21791cd364625"
        );
        // Word 2: gas lane, verbatim.
        assert_eq!(&encoded[64..96], network::SEPOLIA.gas_lane.as_slice());
        // Word 3: subscription id.
        assert_eq!(encoded[127], 42);
        // Word 4: callback gas limit (500_000 = 0x07a120).
        assert_eq!(&encoded[157..160], &[0x07, 0xa1, 0x20]);
        // Word 5: interval (30 seconds).
        assert_eq!(encoded[191], 30);
    }

    #[test]
    fn test_subscription_id_changes_args() {
        let coordinator = address!("8103B0A8A00be2DDC778e6e7eaa21791Cd364625");
        let a = abi::encode_tokens(&constructor_tokens(&network::SEPOLIA, coordinator, 1));
        let b = abi::encode_tokens(&constructor_tokens(&network::SEPOLIA, coordinator, 2));
        assert_ne!(a, b);
    }
}
