//! Definitions of CLI arguments and commands for the deploy scripts

use clap::{Args, Parser, Subcommand};
use ethers::providers::Middleware;

use crate::{
    commands::{
        deploy_all, deploy_controller, deploy_future_market, deploy_libraries,
        deploy_mock_tokens, deploy_periphery, list_networks, upgrade,
    },
    constants::{DEFAULT_ARTIFACTS_DIR, DEFAULT_DEPLOYMENTS_DIR, PRIVATE_KEY_ENV_VAR},
    deploy::Deployer,
    errors::ScriptError,
    types::ProtocolContract,
};

/// The deploy-scripts CLI
#[derive(Parser)]
pub struct Cli {
    /// Name of the target network; see `list-networks` for the supported set
    #[arg(short, long)]
    pub network: String,

    /// Private key of the deployer.
    ///
    /// Read from the environment when not passed; without it there is no
    /// signer and deploy commands fail.
    #[arg(short, long, env = PRIVATE_KEY_ENV_VAR, hide_env_values = true)]
    pub priv_key: Option<String>,

    /// Override the network profile's RPC URL
    #[arg(short, long)]
    pub rpc_url: Option<String>,

    /// Directory holding per-network deployment records
    #[arg(long, default_value = DEFAULT_DEPLOYMENTS_DIR)]
    pub deployments_path: String,

    /// Directory holding compiled contract artifacts
    #[arg(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_path: String,

    /// Redeploy contracts even when a deployment record already exists.
    ///
    /// Replaced records lose their old address; one-time initialization runs
    /// again against the fresh instance.
    #[arg(long)]
    pub force: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The deployment stages and maintenance commands
#[derive(Subcommand)]
pub enum Command {
    /// Deploy mock tokens on networks without canonical token addresses
    DeployTokens,
    /// Deploy the position-management libraries
    DeployLibraries,
    /// Deploy the vault NFT and the controller proxy stack
    DeployController,
    /// Deploy the controller periphery (helper and reader)
    DeployPeriphery,
    /// Deploy the future market
    DeployFutureMarket,
    /// Run every deployment stage in order
    DeployAll,
    /// Upgrade a proxied contract to a freshly built implementation
    Upgrade(UpgradeArgs),
    /// Print the supported network table
    ListNetworks,
}

impl Command {
    /// Dispatch the command against a configured step runner.
    ///
    /// `ListNetworks` is handled before client setup in `main`; its arm here
    /// keeps the dispatch total.
    pub async fn run<M: Middleware + 'static>(
        self,
        deployer: &mut Deployer<M>,
    ) -> Result<(), ScriptError> {
        match self {
            Command::DeployTokens => deploy_mock_tokens(deployer).await,
            Command::DeployLibraries => deploy_libraries(deployer).await,
            Command::DeployController => deploy_controller(deployer).await,
            Command::DeployPeriphery => deploy_periphery(deployer).await,
            Command::DeployFutureMarket => deploy_future_market(deployer).await,
            Command::DeployAll => deploy_all(deployer).await,
            Command::Upgrade(args) => upgrade(deployer, args).await,
            Command::ListNetworks => list_networks(),
        }
    }
}

/// Upgrade the implementation behind a proxied contract
#[derive(Args)]
pub struct UpgradeArgs {
    /// The proxied contract to upgrade; defaults to the controller
    #[arg(short, long, value_enum)]
    pub contract: Option<ProtocolContract>,

    /// Optional calldata, in hex form, with which to
    /// call the implementation contract when upgrading
    #[arg(long)]
    pub calldata: Option<String>,
}
