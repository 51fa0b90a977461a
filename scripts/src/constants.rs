//! Constants used in the deploy scripts

/// The name of the environment variable holding the deployer's private key.
///
/// When unset there is no signer and deploy commands fail before submitting
/// anything.
pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";

/// The name of the environment variable holding the Infura project key,
/// required for networks served through Infura endpoints
pub const INFURA_API_KEY_ENV_VAR: &str = "INFURA_API_KEY";

/// The name of the environment variable holding the explorer verification key
pub const ETHERSCAN_API_KEY_ENV_VAR: &str = "ETHERSCAN_API_KEY";

/// The default directory holding per-network deployment records
pub const DEFAULT_DEPLOYMENTS_DIR: &str = "deployments";

/// The default directory holding compiled contract artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The number of confirmations to wait for a deployment transaction
pub const NUM_DEPLOY_CONFIRMATIONS: usize = 1;

/// The storage slot containing the proxy admin contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#admin-address
pub const PROXY_ADMIN_STORAGE_SLOT: &str =
    "0xb53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103";

/// The number of bytes stored in a single storage slot
pub const NUM_BYTES_STORAGE_SLOT: usize = 32;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The artifact name of the upgradeable proxy deployed in front of the
/// controller implementation.
///
/// Compiled from https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/transparent/TransparentUpgradeableProxy.sol
pub const PROXY_CONTRACT_NAME: &str = "TransparentUpgradeableProxy";

/// The ledger-name suffix under which a proxied contract's implementation is
/// recorded
pub const IMPLEMENTATION_SUFFIX: &str = "_Implementation";

/// The ERC-20 name of the mock wrapped-ether token
pub const MOCK_WETH_NAME: &str = "Mock Wrapped Ether";

/// The ERC-20 symbol of the mock wrapped-ether token
pub const MOCK_WETH_SYMBOL: &str = "WETH";

/// The number of decimals of the mock wrapped-ether token
pub const MOCK_WETH_DECIMALS: u8 = 18;

/// Power of ten minted to the deployer on a fresh mock WETH deployment,
/// i.e. 1,000,000 tokens at 18 decimals
pub const MOCK_WETH_SUPPLY_EXP: usize = 24;

/// The ERC-20 name of the mock USD-coin token
pub const MOCK_USDC_NAME: &str = "Mock USD Coin";

/// The ERC-20 symbol of the mock USD-coin token
pub const MOCK_USDC_SYMBOL: &str = "USDC";

/// The number of decimals of the mock USD-coin token
pub const MOCK_USDC_DECIMALS: u8 = 6;

/// Power of ten minted to the deployer on a fresh mock USDC deployment,
/// i.e. 1,000,000 tokens at 6 decimals
pub const MOCK_USDC_SUPPLY_EXP: usize = 12;

/// The ERC-721 name of the vault position NFT
pub const VAULT_NFT_NAME: &str = "Vault Position NFT";

/// The ERC-721 symbol of the vault position NFT
pub const VAULT_NFT_SYMBOL: &str = "VPT";

/// The base token URI of the vault position NFT
pub const VAULT_NFT_BASE_URI: &str = "";

/// Whether the margin currency is token0 of the underlying Uniswap pool
pub const IS_MARGIN_ZERO: bool = false;

/// The base borrow rate of the interest rate model, 1e18 fixed point (1%)
pub const IRM_BASE_RATE: u128 = 10_000_000_000_000_000;

/// The utilization kink of the interest rate model, 1e18 fixed point (75%)
pub const IRM_KINK_RATE: u128 = 750_000_000_000_000_000;

/// The interest slope below the kink, 1e18 fixed point (10%)
pub const IRM_SLOPE_1: u128 = 100_000_000_000_000_000;

/// The interest slope above the kink, 1e18 fixed point (170%)
pub const IRM_SLOPE_2: u128 = 1_700_000_000_000_000_000;
