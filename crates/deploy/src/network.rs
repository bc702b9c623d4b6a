//! Static per-network deployment parameters, keyed by chain ID.

use alloy_core::primitives::{Address, B256, address, b256};

/// Chain IDs treated as local development networks.
///
/// On these chains the VRF coordinator is mocked, the deployer account comes
/// from the node's unlocked accounts, and explorer verification is skipped.
pub const DEV_CHAIN_IDS: &[u64] = &[31337, 1337];

/// Returns true if the chain ID belongs to a local development network.
pub fn is_development_chain(chain_id: u64) -> bool {
    DEV_CHAIN_IDS.contains(&chain_id)
}

/// Deployment parameters for one supported network.
///
/// Live networks carry the canonical Chainlink VRF coordinator address;
/// development networks get a mock coordinator plus a fresh subscription at
/// deploy time. The subscription ID is never pinned in the table: on live
/// networks it must be supplied per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Human-readable network name, used for the deployments directory.
    pub name: &'static str,
    /// The chain ID this entry applies to.
    pub chain_id: u64,
    /// Raffle entrance fee in wei.
    pub entrance_fee: u128,
    /// VRF gas lane (key hash) identifying the maximum gas price to pay.
    pub gas_lane: B256,
    /// Gas limit for the VRF fulfillment callback.
    pub callback_gas_limit: u32,
    /// Seconds between raffle upkeep rounds.
    pub interval_secs: u64,
    /// VRF coordinator address (None on development chains).
    pub vrf_coordinator: Option<Address>,
    /// VRF subscription ID. Always None in the table; live networks require
    /// an explicit per-deployment value, development chains mock one.
    pub subscription_id: Option<u64>,
    /// Block confirmations to wait for after each deployment transaction.
    pub block_confirmations: u64,
}

/// [`NetworkConfig`] for the Sepolia testnet.
pub const SEPOLIA: NetworkConfig = NetworkConfig {
    name: "sepolia",
    chain_id: 11155111,
    // 0.01 ETH
    entrance_fee: 10_000_000_000_000_000,
    // 30 gwei key hash
    gas_lane: b256!("474e34a077df58807dbe9c96d3c009b23b3c6d0cce433e59bbf5b34f823bc56c"),
    callback_gas_limit: 500_000,
    interval_secs: 30,
    vrf_coordinator: Some(address!("8103B0A8A00be2DDC778e6e7eaa21791Cd364625")),
    subscription_id: None,
    block_confirmations: 6,
};

/// [`NetworkConfig`] for a local development chain (Anvil / Hardhat).
pub const LOCAL: NetworkConfig = NetworkConfig {
    name: "localhost",
    chain_id: 31337,
    entrance_fee: 10_000_000_000_000_000,
    // The mock coordinator ignores the gas lane; any value works.
    gas_lane: b256!("474e34a077df58807dbe9c96d3c009b23b3c6d0cce433e59bbf5b34f823bc56c"),
    callback_gas_limit: 500_000,
    interval_secs: 30,
    vrf_coordinator: None,
    subscription_id: None,
    block_confirmations: 1,
};

/// All supported networks.
pub const SUPPORTED_NETWORKS: &[NetworkConfig] = &[SEPOLIA, LOCAL];

impl NetworkConfig {
    /// Lookup the deployment parameters for a chain ID.
    pub fn from_chain_id(chain_id: u64) -> Option<NetworkConfig> {
        SUPPORTED_NETWORKS
            .iter()
            .find(|net| net.chain_id == chain_id)
            .copied()
    }

    /// Returns true if this entry describes a development network.
    pub fn is_development(&self) -> bool {
        is_development_chain(self.chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_network_has_complete_parameters() {
        for net in SUPPORTED_NETWORKS {
            assert!(!net.name.is_empty());
            assert!(net.chain_id != 0, "{}: zero chain id", net.name);
            assert!(net.entrance_fee > 0, "{}: zero entrance fee", net.name);
            assert!(net.gas_lane != B256::ZERO, "{}: empty gas lane", net.name);
            assert!(net.callback_gas_limit > 0, "{}: zero callback gas", net.name);
            assert!(net.interval_secs > 0, "{}: zero interval", net.name);
            assert!(net.block_confirmations >= 1, "{}: zero confirmations", net.name);
        }
    }

    #[test]
    fn test_live_networks_have_coordinator() {
        for net in SUPPORTED_NETWORKS {
            if !net.is_development() {
                assert!(
                    net.vrf_coordinator.is_some(),
                    "{}: live network without VRF coordinator",
                    net.name
                );
            } else {
                assert!(net.vrf_coordinator.is_none());
            }
        }
    }

    #[test]
    fn test_no_network_pins_a_subscription_id() {
        // A table default would wire live deployments to a subscription the
        // deployer does not own; the ID must always come from the run.
        for net in SUPPORTED_NETWORKS {
            assert!(
                net.subscription_id.is_none(),
                "{}: subscription id pinned in the table",
                net.name
            );
        }
    }

    #[test]
    fn test_from_chain_id() {
        assert_eq!(NetworkConfig::from_chain_id(11155111), Some(SEPOLIA));
        assert_eq!(NetworkConfig::from_chain_id(31337), Some(LOCAL));
        assert_eq!(NetworkConfig::from_chain_id(1), None);
    }

    #[test]
    fn test_development_chain_detection() {
        assert!(is_development_chain(31337));
        assert!(is_development_chain(1337));
        assert!(!is_development_chain(11155111));
        assert!(!is_development_chain(1));
    }

    #[test]
    fn test_confirmation_policy() {
        assert_eq!(LOCAL.block_confirmations, 1);
        assert_eq!(SEPOLIA.block_confirmations, 6);
    }
}
