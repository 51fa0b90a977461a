//! The deployment step runner.
//!
//! A step deploys one named contract: it links library addresses from the
//! ledger into the artifact bytecode, submits the deployment, and persists
//! the resulting record. Steps are idempotent: an existing ledger record
//! short-circuits the step without touching the chain, unless the run is
//! forced. Every ledger lookup happens before the transaction is built, so
//! an ordering mistake fails before anything is spent.

use std::{collections::BTreeMap, path::PathBuf, str::FromStr, sync::Arc};

use ethers::{
    abi::{Address, Token},
    contract::ContractFactory,
    providers::Middleware,
    types::{Bytes, H256},
    utils::keccak256,
};
use tracing::info;

use crate::{
    artifacts::ContractArtifact,
    constants::{
        IMPLEMENTATION_SUFFIX, NUM_BYTES_ADDRESS, NUM_BYTES_STORAGE_SLOT,
        NUM_DEPLOY_CONFIRMATIONS, PROXY_ADMIN_STORAGE_SLOT, PROXY_CONTRACT_NAME,
    },
    errors::ScriptError,
    ledger::DeploymentLedger,
    networks::NetworkProfile,
    types::{DeployOutcome, DeployedContractRecord, ProtocolContract},
    utils::initialize_calldata,
};

/// Runs deployment steps against one network, tracking their records in the
/// ledger
pub struct Deployer<M> {
    /// The RPC client the steps deploy through
    client: Arc<M>,
    /// The profile of the active network
    pub profile: NetworkProfile,
    /// The ledger of contracts already deployed to the active network
    pub ledger: DeploymentLedger,
    /// The directory compiled artifacts are loaded from
    artifacts_dir: PathBuf,
    /// Whether to redeploy contracts that already have a ledger record
    force: bool,
}

impl<M: Middleware + 'static> Deployer<M> {
    /// Create a step runner over a client, network profile, and ledger
    pub fn new(
        client: Arc<M>,
        profile: NetworkProfile,
        ledger: DeploymentLedger,
        artifacts_dir: PathBuf,
        force: bool,
    ) -> Self {
        Self {
            client,
            profile,
            ledger,
            artifacts_dir,
            force,
        }
    }

    /// A handle on the underlying client, for post-deploy contract calls
    pub fn client(&self) -> Arc<M> {
        self.client.clone()
    }

    /// The address deploy transactions are signed with
    pub fn deployer_address(&self) -> Result<Address, ScriptError> {
        self.client.default_sender().ok_or(ScriptError::MissingSigner)
    }

    /// Load the compilation artifact a contract is deployed from
    fn artifact(&self, contract: ProtocolContract) -> Result<ContractArtifact, ScriptError> {
        ContractArtifact::load(&self.artifacts_dir, contract.artifact_name())
    }

    /// Resolve the ledger address of every library an artifact links.
    ///
    /// A library with no record aborts the step here, before the deployment
    /// transaction exists.
    fn resolve_libraries(
        &self,
        artifact: &ContractArtifact,
    ) -> Result<BTreeMap<String, Address>, ScriptError> {
        let mut libraries = BTreeMap::new();
        for lib_name in artifact.required_libraries() {
            let address = self.ledger.address_of(lib_name)?;
            libraries.insert(lib_name.to_string(), address);
        }
        Ok(libraries)
    }

    /// Deploy a contract unless the ledger already holds a record for it.
    ///
    /// Returns whether the deployment was newly created, which gates the
    /// one-time initialization calls.
    pub async fn ensure_deployed(
        &mut self,
        contract: ProtocolContract,
        args: Vec<Token>,
    ) -> Result<DeployOutcome, ScriptError> {
        let name = contract.to_string();
        if !self.force {
            if let Some(record) = self.ledger.get(&name) {
                info!("{} already deployed at {:#x}, skipping", name, record.address);
                return Ok(DeployOutcome {
                    address: record.address,
                    newly_deployed: false,
                });
            }
        }

        let artifact = self.artifact(contract)?;
        let libraries = self.resolve_libraries(&artifact)?;
        let bytecode = artifact.linked_bytecode(&libraries)?;

        let record = self.deploy_artifact(&name, &artifact, bytecode, args).await?;
        let address = record.address;
        self.ledger.insert(record)?;
        info!("{} deployed at {:#x}", name, address);

        Ok(DeployOutcome {
            address,
            newly_deployed: true,
        })
    }

    /// Deploy a contract behind a transparent upgradeable proxy unless the
    /// ledger already holds a record for it.
    ///
    /// Two records are persisted: `<name>_Implementation` for the raw
    /// implementation and `<name>` for the proxy, which is the address every
    /// later step references. `initializer_args` are encoded against the
    /// implementation's `initialize` method and forwarded through the proxy
    /// constructor.
    pub async fn ensure_deployed_with_proxy(
        &mut self,
        contract: ProtocolContract,
        initializer_args: &[Token],
    ) -> Result<DeployOutcome, ScriptError> {
        let name = contract.to_string();
        if !self.force {
            if let Some(record) = self.ledger.get(&name) {
                info!("{} already deployed at {:#x}, skipping", name, record.address);
                return Ok(DeployOutcome {
                    address: record.address,
                    newly_deployed: false,
                });
            }
        }

        let artifact = self.artifact(contract)?;
        let libraries = self.resolve_libraries(&artifact)?;
        let bytecode = artifact.linked_bytecode(&libraries)?;
        let calldata = initialize_calldata(&artifact.parsed_abi()?, initializer_args)?;

        let impl_name = format!("{}{}", name, IMPLEMENTATION_SUFFIX);
        let impl_record = self
            .deploy_artifact(&impl_name, &artifact, bytecode, vec![])
            .await?;
        let impl_address = impl_record.address;
        info!("{} deployed at {:#x}", impl_name, impl_address);

        let owner = self.deployer_address()?;
        let proxy_artifact = ContractArtifact::load(&self.artifacts_dir, PROXY_CONTRACT_NAME)?;
        let proxy_bytecode = proxy_artifact.linked_bytecode(&BTreeMap::new())?;
        let proxy_args = vec![
            Token::Address(impl_address),
            Token::Address(owner),
            Token::Bytes(calldata.to_vec()),
        ];
        let mut proxy_record = self
            .deploy_artifact(&name, &proxy_artifact, proxy_bytecode, proxy_args)
            .await?;
        // callers interact with the implementation ABI at the proxy address
        proxy_record.abi = artifact.abi.clone();
        let proxy_address = proxy_record.address;

        let admin_address = self.proxy_admin_of(proxy_address).await?;
        info!("{} proxy deployed at {:#x}", name, proxy_address);
        info!("{} proxy admin deployed at {:#x}", name, admin_address);

        self.ledger.insert(impl_record)?;
        self.ledger.insert(proxy_record)?;

        Ok(DeployOutcome {
            address: proxy_address,
            newly_deployed: true,
        })
    }

    /// Deploy a fresh implementation for a proxied contract and replace its
    /// `_Implementation` record.
    ///
    /// Used by upgrades; the proxy record is left untouched since the proxy
    /// address does not change.
    pub async fn deploy_implementation(
        &mut self,
        contract: ProtocolContract,
    ) -> Result<Address, ScriptError> {
        let name = contract.to_string();
        let artifact = self.artifact(contract)?;
        let libraries = self.resolve_libraries(&artifact)?;
        let bytecode = artifact.linked_bytecode(&libraries)?;

        let impl_name = format!("{}{}", name, IMPLEMENTATION_SUFFIX);
        let record = self
            .deploy_artifact(&impl_name, &artifact, bytecode, vec![])
            .await?;
        let address = record.address;
        self.ledger.insert(record)?;
        info!("{} deployed at {:#x}", impl_name, address);

        Ok(address)
    }

    /// The admin contract of an upgradeable proxy.
    ///
    /// This is the recommended way to get the proxy admin address:
    /// https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/ERC1967/ERC1967Utils.sol#L104-L106
    pub async fn proxy_admin_of(&self, proxy: Address) -> Result<Address, ScriptError> {
        let slot = self
            .client
            .get_storage_at(
                proxy,
                // Can `unwrap` here since we know the storage slot constitutes a valid H256
                H256::from_str(PROXY_ADMIN_STORAGE_SLOT).unwrap(),
                None, /* block */
            )
            .await
            .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

        Ok(Address::from_slice(
            &slot[NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..NUM_BYTES_STORAGE_SLOT],
        ))
    }

    /// Deploy one artifact and build its ledger record.
    ///
    /// The record is returned rather than persisted so callers control when
    /// it lands in the ledger; nothing is written for a failed deployment.
    async fn deploy_artifact(
        &self,
        name: &str,
        artifact: &ContractArtifact,
        bytecode: Bytes,
        args: Vec<Token>,
    ) -> Result<DeployedContractRecord, ScriptError> {
        let abi = artifact.parsed_abi()?;
        let bytecode_hash = format!("0x{}", hex::encode(keccak256(&bytecode)));
        let constructor_args = args.iter().map(ToString::to_string).collect();

        let factory = ContractFactory::new(abi, bytecode, self.client.clone());
        let mut deployer = factory
            .deploy_tokens(args)
            .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?
            .confirmations(NUM_DEPLOY_CONFIRMATIONS);
        if let Some(gas_price) = self.profile.gas_price {
            deployer.tx.set_gas_price(gas_price);
        }
        if let Some(gas_limit) = self.profile.gas_limit {
            deployer.tx.set_gas(gas_limit);
        }

        let deployed = deployer
            .send()
            .await
            .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;

        Ok(DeployedContractRecord {
            name: name.to_string(),
            address: deployed.address(),
            abi: artifact.abi.clone(),
            bytecode_hash,
            constructor_args,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path, str::FromStr, sync::Arc};

    use ethers::{
        abi::Address,
        providers::{Http, Provider},
    };
    use tempfile::tempdir;

    use super::Deployer;
    use crate::{
        errors::ScriptError,
        ledger::DeploymentLedger,
        networks,
        types::{DeployedContractRecord, ProtocolContract},
    };

    /// A client pointed at a dead endpoint; tests only exercise paths that
    /// must return before any RPC traffic
    fn dead_client() -> Arc<Provider<Http>> {
        Arc::new(Provider::<Http>::try_from("http://localhost:1").unwrap())
    }

    /// A step runner over empty temp directories
    fn deployer(
        deployments: &Path,
        artifacts: &Path,
        force: bool,
    ) -> Deployer<Provider<Http>> {
        let profile = networks::resolve("localhost").unwrap();
        let ledger = DeploymentLedger::load(deployments, "localhost").unwrap();
        Deployer::new(dead_client(), profile, ledger, artifacts.to_path_buf(), force)
    }

    /// A ledger record at a fixed address
    fn record(name: &str) -> DeployedContractRecord {
        DeployedContractRecord {
            name: name.to_string(),
            address: Address::from_str("0x3333333333333333333333333333333333333333").unwrap(),
            abi: serde_json::json!([]),
            bytecode_hash: "0x00".to_string(),
            constructor_args: vec![],
        }
    }

    #[tokio::test]
    async fn existing_record_short_circuits_the_step() {
        let deployments = tempdir().unwrap();
        let artifacts = tempdir().unwrap();
        let mut deployer = deployer(deployments.path(), artifacts.path(), false);
        deployer.ledger.insert(record("VaultLib")).unwrap();

        // Returns without touching the artifact directory or the dead client
        let outcome = deployer
            .ensure_deployed(ProtocolContract::VaultLib, vec![])
            .await
            .unwrap();
        assert!(!outcome.newly_deployed);
        assert_eq!(outcome.address, record("VaultLib").address);
    }

    #[tokio::test]
    async fn force_bypasses_the_ledger_check() {
        let deployments = tempdir().unwrap();
        let artifacts = tempdir().unwrap();
        let mut deployer = deployer(deployments.path(), artifacts.path(), true);
        deployer.ledger.insert(record("VaultLib")).unwrap();

        // With no artifact on disk the forced step fails at artifact loading,
        // proving the record did not short-circuit it
        let err = deployer
            .ensure_deployed(ProtocolContract::VaultLib, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ScriptError::ArtifactParsing(_)));
    }

    #[tokio::test]
    async fn missing_library_fails_before_any_transaction() {
        let deployments = tempdir().unwrap();
        let artifacts = tempdir().unwrap();
        fs::write(
            artifacts.path().join("LiquidationLogic.json"),
            r#"{
                "contractName": "LiquidationLogic",
                "abi": [],
                "bytecode": "0x00__$f91cf0375d1eeb608a1cbb55e2ba8d9f29$__00",
                "linkReferences": {
                    "src/libraries/PositionUpdater.sol": {
                        "PositionUpdater": [{ "start": 1, "length": 20 }]
                    }
                }
            }"#,
        )
        .unwrap();

        let mut deployer = deployer(deployments.path(), artifacts.path(), false);
        let err = deployer
            .ensure_deployed(ProtocolContract::LiquidationLogic, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ScriptError::MissingDeployment(_)));
    }
}
