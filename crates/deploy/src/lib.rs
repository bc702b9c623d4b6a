//! rafup-deploy - Deployment library for the Raffle lottery contracts.
//!
//! This crate drives the deployment of a VRF-backed Raffle contract against an
//! Ethereum JSON-RPC endpoint: network-keyed parameter lookup, mock VRF
//! coordinator setup on development chains, the main contract deployment, and
//! optional block-explorer verification.

mod deployer;
pub use deployer::{DeployOptions, DeployTag, Deployer, RAFUP_CONF_FILENAME};

mod builder;
pub use builder::{DeployerBuilder, OutDataPath};

pub mod abi;
pub mod artifact;
pub mod eth;
pub mod network;
pub mod record;
pub mod rpc;
pub mod steps;
pub mod tx;
pub mod verify;

pub use artifact::Artifact;
pub use eth::EthClient;
pub use network::{NetworkConfig, is_development_chain};
pub use record::DeploymentRecord;
