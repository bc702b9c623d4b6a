use clap::Parser;
use rafup_deploy::DeployTag;
use tracing::level_filters::LevelFilter;

/// The default target network (local Anvil/Hardhat node).
const DEFAULT_NETWORK: Network = Network::Localhost;

/// Networks the deployment table knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Network {
    Localhost,
    Sepolia,
}

impl Network {
    pub fn to_chain_id(&self) -> u64 {
        match self {
            Network::Localhost => 31337,
            Network::Sepolia => 11155111,
        }
    }
}

/// Where deployment transactions are sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum RpcProvider {
    PublicNode,
    #[strum(default)]
    Custom(String),
}

impl RpcProvider {
    pub fn to_rpc_url(&self, network: Network) -> anyhow::Result<String> {
        match self {
            RpcProvider::PublicNode if network == Network::Sepolia => {
                Ok("https://ethereum-sepolia-rpc.publicnode.com".to_string())
            }
            RpcProvider::PublicNode if network == Network::Localhost => {
                Ok("http://127.0.0.1:8545".to_string())
            }
            RpcProvider::PublicNode => {
                anyhow::bail!("No default RPC endpoint for network {}", network);
            }
            RpcProvider::Custom(url) => Ok(url.clone()),
        }
    }
}

/// Output data directory selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum OutData {
    TempDir,
    #[strum(default)]
    Path(String),
}

#[derive(Parser)]
#[command(name = "rafup")]
#[command(
    author,
    version,
    about = "Deploy the VRF-backed Raffle contracts in a few clicks"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "RAFUP_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// The target network.
    #[arg(long, alias = "net", env = "RAFUP_NETWORK", default_value_t = DEFAULT_NETWORK)]
    pub network: Network,

    /// The RPC endpoint to deploy through.
    ///
    /// `public-node` picks a sensible default for the selected network
    /// (a publicnode.com endpoint for Sepolia, localhost:8545 for the
    /// development chain). Any other value is used as a custom URL.
    #[arg(long, alias = "rpc", env = "RAFUP_RPC_URL", default_value_t = RpcProvider::PublicNode)]
    pub rpc_provider: RpcProvider,

    /// A custom name for this deployment. If not provided, the deployment
    /// will be named: rafup-<adjective>-<noun>.
    #[arg(short, long, visible_alias = "name", env = "RAFUP_NAME")]
    pub deployment_name: Option<String>,

    /// Deployment tags selecting which steps run (comma-separated:
    /// all, mocks, raffle).
    #[arg(long, env = "RAFUP_TAGS", value_delimiter = ',', default_values_t = [DeployTag::All])]
    pub tags: Vec<DeployTag>,

    /// Redeploy contracts even when a matching deployment record exists.
    #[arg(long, env = "RAFUP_REDEPLOY", default_value_t = false)]
    pub redeploy: bool,

    /// The path to the output data directory (deployment records, saved
    /// configuration).
    ///
    /// If not provided, the data will be stored at: ./data-<deployment-name>
    #[arg(long, alias = "outdata", env = "RAFUP_OUTDATA")]
    pub outdata: Option<OutData>,

    /// Directory holding the compiled contract artifacts
    /// (Raffle.json, VRFCoordinatorV2Mock.json).
    #[arg(long, env = "RAFUP_ARTIFACTS", default_value = "artifacts")]
    pub artifacts: String,

    /// VRF subscription ID to use on live networks (overrides the
    /// network table entry).
    #[arg(long, alias = "sub-id", env = "RAFUP_SUBSCRIPTION_ID")]
    pub subscription_id: Option<u64>,

    /// Number of block confirmations to wait for after each deployment
    /// transaction (defaults to the network policy: 1 locally, 6 live).
    #[arg(long, env = "RAFUP_CONFIRMATIONS")]
    pub confirmations: Option<u64>,

    /// Skip explorer verification even when an API key is available.
    #[arg(long, env = "RAFUP_SKIP_VERIFY", default_value_t = false)]
    pub skip_verify: bool,

    /// Private key of the deployer account (required on live networks).
    #[arg(long, env = "RAFUP_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// BIP-39 mnemonic for the deployer account (alternative to
    /// --private-key; account index 0 is used).
    #[arg(long, env = "RAFUP_MNEMONIC", hide_env_values = true)]
    pub mnemonic: Option<String>,

    /// Etherscan API key enabling source verification on live networks.
    #[arg(long, env = "ETHERSCAN_API_KEY", hide_env_values = true)]
    pub etherscan_api_key: Option<String>,

    /// Path to an existing Rafup.toml configuration file to load.
    ///
    /// When provided, the deployment uses the configuration from this file
    /// (with RAFUP_-prefixed environment overrides) instead of generating a
    /// new one from CLI arguments.
    #[arg(long, alias = "conf", env = "RAFUP_CONFIG")]
    pub config: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_network_parsing() {
        assert_eq!(Network::from_str("localhost").unwrap(), Network::Localhost);
        assert_eq!(Network::from_str("sepolia").unwrap(), Network::Sepolia);
        assert!(Network::from_str("mainnet").is_err());
    }

    #[test]
    fn test_network_chain_ids() {
        assert_eq!(Network::Localhost.to_chain_id(), 31337);
        assert_eq!(Network::Sepolia.to_chain_id(), 11155111);
    }

    #[test]
    fn test_rpc_provider_defaults() {
        let url = RpcProvider::PublicNode.to_rpc_url(Network::Sepolia).unwrap();
        assert!(url.contains("publicnode.com"));

        let url = RpcProvider::PublicNode
            .to_rpc_url(Network::Localhost)
            .unwrap();
        assert_eq!(url, "http://127.0.0.1:8545");
    }

    #[test]
    fn test_rpc_provider_custom_url_passthrough() {
        let provider = RpcProvider::from_str("http://10.0.0.5:8545").unwrap();
        assert_eq!(provider, RpcProvider::Custom("http://10.0.0.5:8545".to_string()));
        assert_eq!(
            provider.to_rpc_url(Network::Localhost).unwrap(),
            "http://10.0.0.5:8545"
        );
    }

    #[test]
    fn test_outdata_parsing() {
        assert_eq!(OutData::from_str("temp-dir").unwrap(), OutData::TempDir);
        assert_eq!(
            OutData::from_str("./data").unwrap(),
            OutData::Path("./data".to_string())
        );
    }
}
