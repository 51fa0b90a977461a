//! Implementations of the deployment stages.
//!
//! Stages run in a fixed order (tokens, libraries, controller, periphery,
//! future market); each consumes the addresses earlier stages persisted to
//! the ledger. One-time initialization calls run only when the stage's
//! deployment was newly created.

use ethers::{
    abi::{Address, Token},
    providers::Middleware,
    types::{Bytes, U256},
    utils::hex::FromHex,
};
use tracing::{info, warn};

use crate::{
    cli::UpgradeArgs,
    constants::{
        ETHERSCAN_API_KEY_ENV_VAR, IRM_BASE_RATE, IRM_KINK_RATE, IRM_SLOPE_1, IRM_SLOPE_2,
        IS_MARGIN_ZERO, MOCK_USDC_DECIMALS, MOCK_USDC_NAME, MOCK_USDC_SUPPLY_EXP,
        MOCK_USDC_SYMBOL, MOCK_WETH_DECIMALS, MOCK_WETH_NAME, MOCK_WETH_SUPPLY_EXP,
        MOCK_WETH_SYMBOL, VAULT_NFT_BASE_URI, VAULT_NFT_NAME, VAULT_NFT_SYMBOL,
    },
    deploy::Deployer,
    errors::ScriptError,
    networks,
    solidity::{ControllerContract, MockErc20Contract, ProxyAdminContract, VaultNftContract},
    types::ProtocolContract,
};

/// The position-management libraries, in dependency order: the later
/// libraries link the earlier ones
const PROTOCOL_LIBRARIES: [ProtocolContract; 5] = [
    ProtocolContract::VaultLib,
    ProtocolContract::PositionUpdater,
    ProtocolContract::InterestCalculator,
    ProtocolContract::LiquidationLogic,
    ProtocolContract::UpdatePositionLogic,
];

/// The WETH address a stage should use: the canonical address where the
/// network has one, the mock deployment otherwise
fn weth_address<M: Middleware + 'static>(deployer: &Deployer<M>) -> Result<Address, ScriptError> {
    match deployer.profile.weth {
        Some(address) => Ok(address),
        None => deployer
            .ledger
            .address_of(&ProtocolContract::MockWeth.to_string()),
    }
}

/// The USDC address a stage should use, resolved like [`weth_address`]
fn usdc_address<M: Middleware + 'static>(deployer: &Deployer<M>) -> Result<Address, ScriptError> {
    match deployer.profile.usdc {
        Some(address) => Ok(address),
        None => deployer
            .ledger
            .address_of(&ProtocolContract::MockUsdc.to_string()),
    }
}

/// Deploy one mock ERC-20 and mint its initial supply to the deployer
async fn deploy_mock<M: Middleware + 'static>(
    deployer: &mut Deployer<M>,
    contract: ProtocolContract,
    name: &str,
    symbol: &str,
    decimals: u8,
    supply_exp: usize,
    recipient: Address,
) -> Result<(), ScriptError> {
    warn!("Deploying {} - THIS SHOULD ONLY BE DONE FOR TESTING", contract);

    let args = vec![
        Token::String(name.to_string()),
        Token::String(symbol.to_string()),
        Token::Uint(U256::from(decimals)),
    ];
    let outcome = deployer.ensure_deployed(contract, args).await?;

    if outcome.newly_deployed {
        let token = MockErc20Contract::new(outcome.address, deployer.client());
        let supply = U256::exp10(supply_exp);
        token
            .mint(recipient, supply)
            .send()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
        info!("minted {} {} to {:#x}", supply, symbol, recipient);
    }

    Ok(())
}

/// Deploy mock tokens on networks whose profile has no canonical token
/// addresses; a no-op elsewhere
pub async fn deploy_mock_tokens<M: Middleware + 'static>(
    deployer: &mut Deployer<M>,
) -> Result<(), ScriptError> {
    if deployer.profile.weth.is_some() && deployer.profile.usdc.is_some() {
        info!(
            "{} uses canonical token addresses, no mocks to deploy",
            deployer.profile.name
        );
        return Ok(());
    }

    let recipient = deployer.deployer_address()?;
    if deployer.profile.weth.is_none() {
        deploy_mock(
            deployer,
            ProtocolContract::MockWeth,
            MOCK_WETH_NAME,
            MOCK_WETH_SYMBOL,
            MOCK_WETH_DECIMALS,
            MOCK_WETH_SUPPLY_EXP,
            recipient,
        )
        .await?;
    }
    if deployer.profile.usdc.is_none() {
        deploy_mock(
            deployer,
            ProtocolContract::MockUsdc,
            MOCK_USDC_NAME,
            MOCK_USDC_SYMBOL,
            MOCK_USDC_DECIMALS,
            MOCK_USDC_SUPPLY_EXP,
            recipient,
        )
        .await?;
    }

    Ok(())
}

/// Deploy the position-management libraries
pub async fn deploy_libraries<M: Middleware + 'static>(
    deployer: &mut Deployer<M>,
) -> Result<(), ScriptError> {
    for contract in PROTOCOL_LIBRARIES {
        deployer.ensure_deployed(contract, vec![]).await?;
    }
    Ok(())
}

/// Deploy the vault NFT and the controller proxy stack, then run the
/// controller's one-time initialization sequence
pub async fn deploy_controller<M: Middleware + 'static>(
    deployer: &mut Deployer<M>,
) -> Result<(), ScriptError> {
    let vault_nft = deployer
        .ensure_deployed(
            ProtocolContract::VaultNft,
            vec![
                Token::String(VAULT_NFT_NAME.to_string()),
                Token::String(VAULT_NFT_SYMBOL.to_string()),
                Token::String(VAULT_NFT_BASE_URI.to_string()),
            ],
        )
        .await?;

    let weth = weth_address(deployer)?;
    let usdc = usdc_address(deployer)?;
    let initializer_args = [
        Token::Address(weth),
        Token::Address(usdc),
        Token::Bool(IS_MARGIN_ZERO),
        Token::Address(deployer.profile.position_manager),
        Token::Address(deployer.profile.uniswap_v3_factory),
        Token::Address(deployer.profile.swap_router),
    ];
    let outcome = deployer
        .ensure_deployed_with_proxy(ProtocolContract::Controller, &initializer_args)
        .await?;

    if outcome.newly_deployed {
        let controller = ControllerContract::new(outcome.address, deployer.client());
        controller
            .set_interest_rate_model(
                U256::from(IRM_BASE_RATE),
                U256::from(IRM_KINK_RATE),
                U256::from(IRM_SLOPE_1),
                U256::from(IRM_SLOPE_2),
            )
            .send()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        controller
            .set_operator(deployer.deployer_address()?)
            .send()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        VaultNftContract::new(vault_nft.address, deployer.client())
            .init(outcome.address)
            .send()
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        info!("Controller initialized");
    }

    Ok(())
}

/// Deploy the controller periphery: the helper and the state reader
pub async fn deploy_periphery<M: Middleware + 'static>(
    deployer: &mut Deployer<M>,
) -> Result<(), ScriptError> {
    let controller = deployer
        .ledger
        .address_of(&ProtocolContract::Controller.to_string())?;

    deployer
        .ensure_deployed(
            ProtocolContract::ControllerHelper,
            vec![Token::Address(controller)],
        )
        .await?;
    deployer
        .ensure_deployed(ProtocolContract::Reader, vec![Token::Address(controller)])
        .await?;

    Ok(())
}

/// Deploy the future market on top of the periphery
pub async fn deploy_future_market<M: Middleware + 'static>(
    deployer: &mut Deployer<M>,
) -> Result<(), ScriptError> {
    let helper = deployer
        .ledger
        .address_of(&ProtocolContract::ControllerHelper.to_string())?;
    let reader = deployer
        .ledger
        .address_of(&ProtocolContract::Reader.to_string())?;
    let vault_nft = deployer
        .ledger
        .address_of(&ProtocolContract::VaultNft.to_string())?;
    let usdc = usdc_address(deployer)?;

    deployer
        .ensure_deployed(
            ProtocolContract::FutureMarket,
            vec![
                Token::Address(helper),
                Token::Address(reader),
                Token::Address(usdc),
                Token::Address(vault_nft),
            ],
        )
        .await?;

    Ok(())
}

/// Run every deployment stage in order
pub async fn deploy_all<M: Middleware + 'static>(
    deployer: &mut Deployer<M>,
) -> Result<(), ScriptError> {
    deploy_mock_tokens(deployer).await?;
    deploy_libraries(deployer).await?;
    deploy_controller(deployer).await?;
    deploy_periphery(deployer).await?;
    deploy_future_market(deployer).await
}

/// Upgrade a proxied contract: deploy a fresh implementation and point the
/// proxy at it through its admin
pub async fn upgrade<M: Middleware + 'static>(
    deployer: &mut Deployer<M>,
    args: UpgradeArgs,
) -> Result<(), ScriptError> {
    let contract = args.contract.unwrap_or(ProtocolContract::Controller);
    let name = contract.to_string();
    let proxy_address = deployer.ledger.address_of(&name)?;

    let impl_address = deployer.deploy_implementation(contract).await?;

    let data = match args.calldata {
        Some(calldata) => Bytes::from_hex(calldata)
            .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?,
        None => Bytes::new(),
    };

    let admin = deployer.proxy_admin_of(proxy_address).await?;
    ProxyAdminContract::new(admin, deployer.client())
        .upgrade_and_call(proxy_address, impl_address, data)
        .send()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    info!("{} upgraded to implementation {:#x}", name, impl_address);
    Ok(())
}

/// Print the validated network table
pub fn list_networks() -> Result<(), ScriptError> {
    let verification_key = if networks::etherscan_api_key().is_some() {
        "set"
    } else {
        "unset"
    };
    println!("supported networks ({}: {})", ETHERSCAN_API_KEY_ENV_VAR, verification_key);

    for name in networks::supported_networks() {
        let profile = networks::resolve(name)?;
        println!("  {} (chain id {})", profile.name, profile.chain_id);
        if let Some(companion) = profile.companion_l1 {
            println!("    companion L1: {}", companion);
        }
        let usdc = profile
            .usdc
            .map(|address| format!("{:#x}", address))
            .unwrap_or_else(|| "mock".to_string());
        let weth = profile
            .weth
            .map(|address| format!("{:#x}", address))
            .unwrap_or_else(|| "mock".to_string());
        println!("    usdc: {}", usdc);
        println!("    weth: {}", weth);
        if let Some(explorer) = profile.explorer {
            println!("    explorer: {}", explorer.browser_url);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{path::Path, sync::Arc};

    use ethers::providers::{Http, Provider};
    use tempfile::tempdir;

    use super::{deploy_mock_tokens, deploy_periphery};
    use crate::{deploy::Deployer, errors::ScriptError, ledger::DeploymentLedger, networks};

    /// A step runner over a dead endpoint; tests only exercise paths that
    /// must return before any RPC traffic
    fn deployer(network: &str, dir: &Path) -> Deployer<Provider<Http>> {
        let client = Arc::new(Provider::<Http>::try_from("http://localhost:1").unwrap());
        let profile = networks::resolve(network).unwrap();
        let ledger = DeploymentLedger::load(dir, network).unwrap();
        Deployer::new(client, profile, ledger, dir.to_path_buf(), false)
    }

    #[tokio::test]
    async fn mock_tokens_are_skipped_on_configured_networks() {
        let dir = tempdir().unwrap();

        // Mainnet has canonical addresses for both tokens, so the stage
        // returns without needing a signer or an artifact
        let mut deployer = deployer("mainnet", dir.path());
        deploy_mock_tokens(&mut deployer).await.unwrap();
        assert_eq!(deployer.ledger.records().count(), 0);
    }

    #[tokio::test]
    async fn periphery_requires_a_deployed_controller() {
        let dir = tempdir().unwrap();

        let mut deployer = deployer("localhost", dir.path());
        let err = deploy_periphery(&mut deployer).await.unwrap_err();
        assert!(matches!(err, ScriptError::MissingDeployment(_)));
    }
}
