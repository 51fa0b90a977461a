//! Type definitions used throughout the deploy scripts

use std::fmt::{self, Display};

use clap::ValueEnum;
use ethers::abi::Address;
use serde::{Deserialize, Serialize};

/// The deployable contracts of the protocol.
///
/// The `Display` form of a variant is its deployment-record name; the
/// artifact it is built from may differ (both mock tokens share the
/// `MockERC20` artifact).
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProtocolContract {
    /// The mock wrapped-ether token, deployed on dev networks only
    MockWeth,
    /// The mock USD-coin token, deployed on dev networks only
    MockUsdc,
    /// The vault bookkeeping library
    VaultLib,
    /// The position update library
    PositionUpdater,
    /// The interest rate calculation library
    InterestCalculator,
    /// The liquidation library
    LiquidationLogic,
    /// The position update entrypoint library
    UpdatePositionLogic,
    /// The vault position NFT
    VaultNft,
    /// The controller, deployed behind an upgradeable proxy
    Controller,
    /// The controller periphery helper
    ControllerHelper,
    /// The read-only protocol state reader
    Reader,
    /// The future market built on top of the controller
    FutureMarket,
}

impl ProtocolContract {
    /// The name of the compilation artifact the contract is deployed from
    pub fn artifact_name(&self) -> &'static str {
        match self {
            ProtocolContract::MockWeth | ProtocolContract::MockUsdc => "MockERC20",
            ProtocolContract::VaultLib => "VaultLib",
            ProtocolContract::PositionUpdater => "PositionUpdater",
            ProtocolContract::InterestCalculator => "InterestCalculator",
            ProtocolContract::LiquidationLogic => "LiquidationLogic",
            ProtocolContract::UpdatePositionLogic => "UpdatePositionLogic",
            ProtocolContract::VaultNft => "VaultNFT",
            ProtocolContract::Controller => "Controller",
            ProtocolContract::ControllerHelper => "ControllerHelper",
            ProtocolContract::Reader => "Reader",
            ProtocolContract::FutureMarket => "FutureMarket",
        }
    }
}

impl Display for ProtocolContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolContract::MockWeth => write!(f, "MockWETH"),
            ProtocolContract::MockUsdc => write!(f, "MockUSDC"),
            ProtocolContract::VaultLib => write!(f, "VaultLib"),
            ProtocolContract::PositionUpdater => write!(f, "PositionUpdater"),
            ProtocolContract::InterestCalculator => write!(f, "InterestCalculator"),
            ProtocolContract::LiquidationLogic => write!(f, "LiquidationLogic"),
            ProtocolContract::UpdatePositionLogic => write!(f, "UpdatePositionLogic"),
            ProtocolContract::VaultNft => write!(f, "VaultNFT"),
            ProtocolContract::Controller => write!(f, "Controller"),
            ProtocolContract::ControllerHelper => write!(f, "ControllerHelper"),
            ProtocolContract::Reader => write!(f, "Reader"),
            ProtocolContract::FutureMarket => write!(f, "FutureMarket"),
        }
    }
}

/// A persisted record of one deployed contract on one network.
///
/// Written once after the deployment transaction confirms; later steps look
/// records up by name and never mutate them. A record is replaced only by a
/// forced redeploy or an upgrade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployedContractRecord {
    /// The record name, unique within a network
    pub name: String,
    /// The deployed contract address
    pub address: Address,
    /// The contract ABI, as emitted by the compiler
    pub abi: serde_json::Value,
    /// Hex-encoded keccak-256 hash of the deployment bytecode after library
    /// linking
    pub bytecode_hash: String,
    /// The constructor arguments the contract was deployed with
    #[serde(default)]
    pub constructor_args: Vec<String>,
}

/// The result of running one deployment step
#[derive(Debug, Clone, Copy)]
pub struct DeployOutcome {
    /// The address the contract lives at
    pub address: Address,
    /// Whether this run created the deployment, as opposed to reusing an
    /// existing record.
    ///
    /// One-time initialization calls are gated on this flag.
    pub newly_deployed: bool,
}
