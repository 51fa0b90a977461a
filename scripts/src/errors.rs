//! Definitions of errors that can occur during the execution of the deploy scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug)]
pub enum ScriptError {
    /// The requested network name has no entry in the network table
    UnknownNetwork(String),
    /// A network profile failed startup validation
    ProfileValidation(String),
    /// A required environment variable is unset
    MissingEnvVar(String),
    /// No private key was supplied, so there is no signer to deploy with
    MissingSigner,
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error parsing a compilation artifact
    ArtifactParsing(String),
    /// Error reading the deployment records
    ReadDeployments(String),
    /// Error writing the deployment records
    WriteDeployments(String),
    /// A step referenced a contract with no deployment record
    MissingDeployment(String),
    /// Error linking a library address into contract bytecode
    LibraryLinking(String),
    /// Error constructing calldata for a contract method
    CalldataConstruction(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// Error calling a contract method
    ContractInteraction(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::UnknownNetwork(s) => write!(f, "unsupported network: {}", s),
            ScriptError::ProfileValidation(s) => write!(f, "invalid network profile: {}", s),
            ScriptError::MissingEnvVar(s) => {
                write!(f, "required environment variable {} is unset", s)
            }
            ScriptError::MissingSigner => {
                write!(f, "no private key configured, deploy calls cannot be signed")
            }
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::MissingDeployment(s) => write!(f, "missing deployment record: {}", s),
            ScriptError::LibraryLinking(s) => write!(f, "error linking libraries: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
        }
    }
}

impl Error for ScriptError {}
