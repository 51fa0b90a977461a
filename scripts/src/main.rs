use std::path::Path;

use clap::Parser;
use scripts::{
    cli::{Cli, Command},
    commands,
    deploy::Deployer,
    errors::ScriptError,
    ledger::DeploymentLedger,
    networks,
    utils::setup_client,
};

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    let Cli {
        network,
        priv_key,
        rpc_url,
        deployments_path,
        artifacts_path,
        force,
        command,
    } = Cli::parse();

    tracing_subscriber::fmt().pretty().init();

    networks::validate_profiles()?;
    if let Command::ListNetworks = command {
        return commands::list_networks();
    }

    let profile = networks::resolve(&network)?;
    let priv_key = priv_key.ok_or(ScriptError::MissingSigner)?;
    let rpc_url = match rpc_url {
        Some(url) => url,
        None => profile.rpc_url()?,
    };
    let client = setup_client(&priv_key, &rpc_url).await?;

    let ledger = DeploymentLedger::load(Path::new(&deployments_path), profile.name)?;
    let mut deployer = Deployer::new(client, profile, ledger, artifacts_path.into(), force);

    command.run(&mut deployer).await
}
