//! The network table: per-network RPC endpoints, gas overrides, and external
//! contract addresses.
//!
//! Every network the pipeline supports has exactly one entry here, and the
//! whole table is validated before any command runs. An unknown network name
//! is a hard error rather than a default, so a run can never pick up the
//! wrong collateral or quote token.

use std::{env, str::FromStr};

use ethers::{abi::Address, types::U256};

use crate::{
    constants::{ETHERSCAN_API_KEY_ENV_VAR, INFURA_API_KEY_ENV_VAR},
    errors::ScriptError,
};

/// The Uniswap V3 factory, deployed at the same address on every supported
/// network (and present on local forks)
const UNISWAP_V3_FACTORY: &str = "0x1F98431c8aD98523631AE4a59f267346ea31F984";

/// The Uniswap V3 nonfungible position manager
const UNISWAP_POSITION_MANAGER: &str = "0xC36442b4a4522E871399CD717aBDD847Ab11FE88";

/// The Uniswap V3 swap router
const UNISWAP_SWAP_ROUTER: &str = "0xE592427A0AEce92De3Edee1F18E0157C05861564";

/// How a network's RPC endpoint is derived
#[derive(Debug, Clone, Copy)]
pub enum RpcEndpoint {
    /// A fixed URL
    Static(&'static str),
    /// An Infura endpoint; the subdomain is completed with the key from
    /// `INFURA_API_KEY`
    Infura(&'static str),
}

/// Explorer endpoints used for contract verification links
#[derive(Debug, Clone, Copy)]
pub struct ExplorerProfile {
    /// The explorer API endpoint
    pub api_url: &'static str,
    /// The explorer browser URL
    pub browser_url: &'static str,
}

/// One row of the static network table, with addresses still in literal form
struct NetworkDef {
    /// The network name used on the command line and in the deployments
    /// directory
    name: &'static str,
    /// The EIP-155 chain id
    chain_id: u64,
    /// The RPC endpoint
    endpoint: RpcEndpoint,
    /// Gas price override in wei, where the network needs one
    gas_price: Option<u64>,
    /// Gas limit override, where the network needs one
    gas_limit: Option<u64>,
    /// The companion L1 network for cross-layer verification, for L2 targets
    companion_l1: Option<&'static str>,
    /// Explorer endpoints, where the network has one
    explorer: Option<ExplorerProfile>,
    /// The canonical USDC address; absent on dev networks, where a mock is
    /// deployed instead
    usdc: Option<&'static str>,
    /// The canonical WETH address; absent on dev networks, where a mock is
    /// deployed instead
    weth: Option<&'static str>,
}

/// The static network table
const NETWORKS: &[NetworkDef] = &[
    NetworkDef {
        name: "localhost",
        chain_id: 31337,
        endpoint: RpcEndpoint::Static("http://localhost:7545"),
        gas_price: None,
        gas_limit: None,
        companion_l1: None,
        explorer: None,
        usdc: None,
        weth: None,
    },
    NetworkDef {
        name: "goerli",
        chain_id: 5,
        endpoint: RpcEndpoint::Infura("goerli"),
        gas_price: None,
        gas_limit: None,
        companion_l1: None,
        explorer: Some(ExplorerProfile {
            api_url: "https://api-goerli.etherscan.io/api",
            browser_url: "https://goerli.etherscan.io",
        }),
        usdc: Some("0x603eFB95394c6cf5b6b29B1c813bd1Ee42A07714"),
        weth: Some("0xB4FBF271143F4FBf7B91A5ded31805e42b2208d6"),
    },
    NetworkDef {
        name: "goerli-arbitrum",
        chain_id: 421613,
        endpoint: RpcEndpoint::Static("https://goerli-rollup.arbitrum.io/rpc"),
        // 0.2 gwei
        gas_price: Some(200_000_000),
        gas_limit: Some(50_000_000),
        companion_l1: Some("goerli"),
        explorer: Some(ExplorerProfile {
            api_url: "https://api-testnet.arbiscan.io/api",
            browser_url: "https://testnet.arbiscan.io",
        }),
        usdc: Some("0xF61Cffd6071a8DB7cD5E8DF1D3A5450D9903cF1c"),
        weth: None,
    },
    NetworkDef {
        name: "arbitrum",
        chain_id: 42161,
        endpoint: RpcEndpoint::Static("https://arb1.arbitrum.io/rpc"),
        gas_price: None,
        gas_limit: None,
        companion_l1: Some("mainnet"),
        explorer: Some(ExplorerProfile {
            api_url: "https://api.arbiscan.io/api",
            browser_url: "https://arbiscan.io",
        }),
        usdc: Some("0xFF970A61A04b1cA14834A43f5dE4533eBDDB5CC8"),
        weth: Some("0x82aF49447D8a07e3bd95BD0d56f35241523fBab1"),
    },
    NetworkDef {
        name: "mainnet",
        chain_id: 1,
        endpoint: RpcEndpoint::Infura("mainnet"),
        gas_price: None,
        gas_limit: None,
        companion_l1: None,
        explorer: Some(ExplorerProfile {
            api_url: "https://api.etherscan.io/api",
            browser_url: "https://etherscan.io",
        }),
        usdc: Some("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
        weth: Some("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
    },
];

/// A fully resolved network profile, with every address parsed
#[derive(Debug, Clone)]
pub struct NetworkProfile {
    /// The network name
    pub name: &'static str,
    /// The EIP-155 chain id
    pub chain_id: u64,
    /// The RPC endpoint
    pub endpoint: RpcEndpoint,
    /// Gas price override for deployment transactions
    pub gas_price: Option<U256>,
    /// Gas limit override for deployment transactions
    pub gas_limit: Option<U256>,
    /// The companion L1 network, for L2 targets
    pub companion_l1: Option<&'static str>,
    /// Explorer endpoints, where the network has one
    pub explorer: Option<ExplorerProfile>,
    /// The canonical USDC address, absent on dev networks
    pub usdc: Option<Address>,
    /// The canonical WETH address, absent on dev networks
    pub weth: Option<Address>,
    /// The Uniswap V3 factory address
    pub uniswap_v3_factory: Address,
    /// The Uniswap V3 position manager address
    pub position_manager: Address,
    /// The Uniswap V3 swap router address
    pub swap_router: Address,
}

impl NetworkProfile {
    /// The URL of the network's RPC endpoint.
    ///
    /// Fails when the endpoint is Infura-keyed and `INFURA_API_KEY` is unset.
    pub fn rpc_url(&self) -> Result<String, ScriptError> {
        match self.endpoint {
            RpcEndpoint::Static(url) => Ok(url.to_string()),
            RpcEndpoint::Infura(subdomain) => {
                let key = env::var(INFURA_API_KEY_ENV_VAR)
                    .map_err(|_| ScriptError::MissingEnvVar(INFURA_API_KEY_ENV_VAR.to_string()))?;
                Ok(format!("https://{}.infura.io/v3/{}", subdomain, key))
            }
        }
    }
}

/// Parse one address literal from the network table
fn parse_address(raw: &str, field: &str, network: &str) -> Result<Address, ScriptError> {
    Address::from_str(raw).map_err(|e| {
        ScriptError::ProfileValidation(format!("{} address for {}: {}", field, network, e))
    })
}

/// Resolve a fully populated profile from the table
fn resolve_def(def: &NetworkDef) -> Result<NetworkProfile, ScriptError> {
    let usdc = def
        .usdc
        .map(|raw| parse_address(raw, "usdc", def.name))
        .transpose()?;
    let weth = def
        .weth
        .map(|raw| parse_address(raw, "weth", def.name))
        .transpose()?;

    Ok(NetworkProfile {
        name: def.name,
        chain_id: def.chain_id,
        endpoint: def.endpoint,
        gas_price: def.gas_price.map(U256::from),
        gas_limit: def.gas_limit.map(U256::from),
        companion_l1: def.companion_l1,
        explorer: def.explorer,
        usdc,
        weth,
        uniswap_v3_factory: parse_address(UNISWAP_V3_FACTORY, "uniswap factory", def.name)?,
        position_manager: parse_address(UNISWAP_POSITION_MANAGER, "position manager", def.name)?,
        swap_router: parse_address(UNISWAP_SWAP_ROUTER, "swap router", def.name)?,
    })
}

/// Resolve the profile for a named network.
///
/// Unknown names are an explicit error, never a default.
pub fn resolve(name: &str) -> Result<NetworkProfile, ScriptError> {
    NETWORKS
        .iter()
        .find(|def| def.name == name)
        .ok_or_else(|| ScriptError::UnknownNetwork(name.to_string()))
        .and_then(resolve_def)
}

/// The names of every supported network, in table order
pub fn supported_networks() -> impl Iterator<Item = &'static str> {
    NETWORKS.iter().map(|def| def.name)
}

/// Validate the whole network table.
///
/// Run once at startup so a malformed address literal fails every command,
/// not just the ones that touch the broken network.
pub fn validate_profiles() -> Result<(), ScriptError> {
    for def in NETWORKS {
        let profile = resolve_def(def)?;
        if let Some(companion) = profile.companion_l1 {
            if !NETWORKS.iter().any(|d| d.name == companion) {
                return Err(ScriptError::ProfileValidation(format!(
                    "companion network {} of {} is not in the table",
                    companion, profile.name
                )));
            }
        }
    }
    Ok(())
}

/// The explorer verification key, where the operator has configured one
pub fn etherscan_api_key() -> Option<String> {
    env::var(ETHERSCAN_API_KEY_ENV_VAR).ok()
}

#[cfg(test)]
mod tests {
    use ethers::abi::Address;

    use super::{resolve, supported_networks, validate_profiles};
    use crate::errors::ScriptError;

    #[test]
    fn all_supported_networks_resolve() {
        for name in supported_networks() {
            let profile = resolve(name).unwrap();
            assert_eq!(profile.name, name);
            assert_ne!(profile.chain_id, 0);
            assert_ne!(profile.uniswap_v3_factory, Address::zero());
            assert_ne!(profile.position_manager, Address::zero());
            assert_ne!(profile.swap_router, Address::zero());
        }
    }

    #[test]
    fn unknown_network_is_rejected() {
        assert!(matches!(
            resolve("unknown-net"),
            Err(ScriptError::UnknownNetwork(_))
        ));
    }

    #[test]
    fn table_passes_validation() {
        validate_profiles().unwrap();
    }

    #[test]
    fn dev_networks_leave_mockable_tokens_unset() {
        let localhost = resolve("localhost").unwrap();
        assert!(localhost.usdc.is_none());
        assert!(localhost.weth.is_none());

        // The testnet rollup has a canonical USDC but mocks WETH
        let testnet = resolve("goerli-arbitrum").unwrap();
        assert!(testnet.usdc.is_some());
        assert!(testnet.weth.is_none());
    }

    #[test]
    fn rollup_profile_carries_overrides_and_companion() {
        let testnet = resolve("goerli-arbitrum").unwrap();
        assert!(testnet.gas_price.is_some());
        assert!(testnet.gas_limit.is_some());
        assert_eq!(testnet.companion_l1, Some("goerli"));

        let arbitrum = resolve("arbitrum").unwrap();
        assert_eq!(arbitrum.companion_l1, Some("mainnet"));
    }

    #[test]
    fn mainnet_profile_is_fully_populated() {
        let mainnet = resolve("mainnet").unwrap();
        assert!(mainnet.usdc.is_some());
        assert!(mainnet.weth.is_some());
        assert!(mainnet.explorer.is_some());
    }
}
