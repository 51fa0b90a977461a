//! The deployment ledger: one JSON record per contract per network.
//!
//! Records live under `<deployments dir>/<network>/<Name>.json`. The ledger
//! is append-only across runs: steps look earlier records up by name and a
//! record is only replaced by a forced redeploy or an upgrade. A record is
//! written after its deployment transaction confirms, so a failed step
//! leaves no partial entry.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use ethers::abi::Address;

use crate::{errors::ScriptError, types::DeployedContractRecord};

/// The per-network deployment ledger
#[derive(Debug)]
pub struct DeploymentLedger {
    /// The network the ledger belongs to
    network: String,
    /// The directory records are persisted to
    dir: PathBuf,
    /// The in-memory view of the persisted records, keyed by record name
    records: BTreeMap<String, DeployedContractRecord>,
}

impl DeploymentLedger {
    /// Load the ledger for a network, creating its directory if this is the
    /// first run against that network
    pub fn load(deployments_dir: &Path, network: &str) -> Result<Self, ScriptError> {
        let dir = deployments_dir.join(network);
        fs::create_dir_all(&dir)
            .map_err(|e| ScriptError::WriteDeployments(format!("{}: {}", dir.display(), e)))?;

        let mut records = BTreeMap::new();
        let entries = fs::read_dir(&dir)
            .map_err(|e| ScriptError::ReadDeployments(format!("{}: {}", dir.display(), e)))?;
        for entry in entries {
            let path = entry
                .map_err(|e| ScriptError::ReadDeployments(e.to_string()))?
                .path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }

            let raw = fs::read_to_string(&path)
                .map_err(|e| ScriptError::ReadDeployments(format!("{}: {}", path.display(), e)))?;
            let record: DeployedContractRecord = serde_json::from_str(&raw)
                .map_err(|e| ScriptError::ReadDeployments(format!("{}: {}", path.display(), e)))?;
            records.insert(record.name.clone(), record);
        }

        Ok(Self {
            network: network.to_string(),
            dir,
            records,
        })
    }

    /// The network this ledger belongs to
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Whether a record exists under the given name
    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    /// Look up a record by name
    pub fn get(&self, name: &str) -> Option<&DeployedContractRecord> {
        self.records.get(name)
    }

    /// Look up a record that an upcoming step depends on.
    ///
    /// A missing record is an ordering error: the step that produces it has
    /// not run against this network. Fatal, surfaced before any transaction
    /// is built.
    pub fn require(&self, name: &str) -> Result<&DeployedContractRecord, ScriptError> {
        self.records.get(name).ok_or_else(|| {
            ScriptError::MissingDeployment(format!(
                "{} has not been deployed to {}",
                name, self.network
            ))
        })
    }

    /// The deployed address of a required record
    pub fn address_of(&self, name: &str) -> Result<Address, ScriptError> {
        self.require(name).map(|record| record.address)
    }

    /// Persist a record and add it to the in-memory view, replacing any
    /// existing record of the same name
    pub fn insert(&mut self, record: DeployedContractRecord) -> Result<(), ScriptError> {
        let path = self.dir.join(format!("{}.json", record.name));
        let rendered = serde_json::to_string_pretty(&record)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        fs::write(&path, rendered)
            .map_err(|e| ScriptError::WriteDeployments(format!("{}: {}", path.display(), e)))?;

        self.records.insert(record.name.clone(), record);
        Ok(())
    }

    /// The records of this ledger, in name order
    pub fn records(&self) -> impl Iterator<Item = &DeployedContractRecord> {
        self.records.values()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use ethers::abi::Address;
    use tempfile::tempdir;

    use super::DeploymentLedger;
    use crate::{errors::ScriptError, types::DeployedContractRecord};

    /// A minimal record for tests
    fn record(name: &str) -> DeployedContractRecord {
        DeployedContractRecord {
            name: name.to_string(),
            address: Address::from_str("0x2222222222222222222222222222222222222222").unwrap(),
            abi: serde_json::json!([]),
            bytecode_hash: "0xabcd".to_string(),
            constructor_args: vec![],
        }
    }

    #[test]
    fn records_round_trip_through_disk() {
        let dir = tempdir().unwrap();

        let mut ledger = DeploymentLedger::load(dir.path(), "localhost").unwrap();
        ledger.insert(record("VaultLib")).unwrap();

        let reloaded = DeploymentLedger::load(dir.path(), "localhost").unwrap();
        let restored = reloaded.get("VaultLib").unwrap();
        assert_eq!(restored.name, "VaultLib");
        assert_eq!(restored.address, record("VaultLib").address);
        assert_eq!(reloaded.records().count(), 1);
    }

    #[test]
    fn require_fails_on_missing_record() {
        let dir = tempdir().unwrap();
        let ledger = DeploymentLedger::load(dir.path(), "localhost").unwrap();

        let err = ledger.require("Controller").unwrap_err();
        assert!(matches!(err, ScriptError::MissingDeployment(_)));
    }

    #[test]
    fn networks_are_isolated() {
        let dir = tempdir().unwrap();

        let mut localhost = DeploymentLedger::load(dir.path(), "localhost").unwrap();
        localhost.insert(record("VaultLib")).unwrap();

        let goerli = DeploymentLedger::load(dir.path(), "goerli").unwrap();
        assert!(!goerli.contains("VaultLib"));
    }
}
