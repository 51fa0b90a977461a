//! Loading of compiled contract artifacts and library linking.
//!
//! Artifacts are the compiler's JSON output: the ABI, the creation bytecode,
//! and `linkReferences` describing where library addresses must be spliced
//! into the bytecode before deployment.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use ethers::{
    abi::{Address, Contract},
    types::Bytes,
};
use serde::Deserialize;

use crate::errors::ScriptError;

/// One library placeholder span inside creation bytecode
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LinkReference {
    /// Byte offset of the placeholder, relative to the start of the bytecode
    pub start: usize,
    /// Length of the placeholder in bytes; always an address width
    pub length: usize,
}

/// A compiled contract artifact
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    /// The contract name, as emitted by the compiler
    #[serde(default)]
    pub contract_name: String,
    /// Hex-encoded creation bytecode.
    ///
    /// Unlinked library spans hold compiler placeholders (`__$...$__`), which
    /// are not valid hex until linking replaces them.
    pub bytecode: String,
    /// The contract ABI
    pub abi: serde_json::Value,
    /// Library placeholders, keyed by source file then library name
    #[serde(default)]
    pub link_references: BTreeMap<String, BTreeMap<String, Vec<LinkReference>>>,
}

impl ContractArtifact {
    /// The on-disk path of a named artifact
    fn path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}.json", name))
    }

    /// Load a named artifact from the artifacts directory
    pub fn load(dir: &Path, name: &str) -> Result<Self, ScriptError> {
        let path = Self::path(dir, name);
        let raw = fs::read_to_string(&path)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {}", path.display(), e)))
    }

    /// The names of every library the bytecode links against
    pub fn required_libraries(&self) -> Vec<&str> {
        self.link_references
            .values()
            .flat_map(|libs| libs.keys())
            .map(String::as_str)
            .collect()
    }

    /// The parsed ABI
    pub fn parsed_abi(&self) -> Result<Contract, ScriptError> {
        serde_json::from_value(self.abi.clone()).map_err(|e| {
            ScriptError::ArtifactParsing(format!("{} abi: {}", self.contract_name, e))
        })
    }

    /// The creation bytecode with every library placeholder replaced by its
    /// deployed address.
    ///
    /// Placeholder substitution happens on the hex encoding, since unlinked
    /// bytecode is not decodable. Fails when a referenced library is missing
    /// from `libraries`, before any transaction is constructed.
    pub fn linked_bytecode(
        &self,
        libraries: &BTreeMap<String, Address>,
    ) -> Result<Bytes, ScriptError> {
        let mut hex_code = self.bytecode.trim_start_matches("0x").to_string();

        for (source, libs) in &self.link_references {
            for (lib_name, references) in libs {
                let address = libraries.get(lib_name).ok_or_else(|| {
                    ScriptError::LibraryLinking(format!(
                        "no deployed address for library {} (referenced by {})",
                        lib_name, source
                    ))
                })?;
                let encoded = hex::encode(address.as_bytes());

                for reference in references {
                    let start = reference.start * 2;
                    let end = (reference.start + reference.length) * 2;
                    if reference.length != Address::len_bytes() || end > hex_code.len() {
                        return Err(ScriptError::LibraryLinking(format!(
                            "malformed link reference for {} at offset {}",
                            lib_name, reference.start
                        )));
                    }
                    hex_code.replace_range(start..end, &encoded);
                }
            }
        }

        let bytecode = hex::decode(&hex_code).map_err(|e| {
            ScriptError::ArtifactParsing(format!("{} bytecode: {}", self.contract_name, e))
        })?;
        Ok(Bytes::from(bytecode))
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, str::FromStr};

    use ethers::abi::Address;

    use super::ContractArtifact;
    use crate::errors::ScriptError;

    /// An artifact whose bytecode links one library at byte offset 1
    fn linked_artifact() -> ContractArtifact {
        serde_json::from_str(
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
        .unwrap()
    }

    #[test]
    fn required_libraries_lists_link_targets() {
        let artifact = linked_artifact();
        assert_eq!(artifact.required_libraries(), vec!["PositionUpdater"]);
    }

    #[test]
    fn linking_splices_address_at_reference_offset() {
        let artifact = linked_artifact();
        let address = Address::from_str("0x1111111111111111111111111111111111111111").unwrap();

        let mut libraries = BTreeMap::new();
        libraries.insert("PositionUpdater".to_string(), address);

        let bytecode = artifact.linked_bytecode(&libraries).unwrap();
        assert_eq!(bytecode.len(), 22);
        assert_eq!(bytecode[0], 0x00);
        assert_eq!(&bytecode[1..21], address.as_bytes());
        assert_eq!(bytecode[21], 0x00);
    }

    #[test]
    fn linking_fails_fast_on_missing_library() {
        let artifact = linked_artifact();
        let err = artifact.linked_bytecode(&BTreeMap::new()).unwrap_err();
        assert!(matches!(err, ScriptError::LibraryLinking(_)));
    }

    #[test]
    fn unlinked_artifact_passes_through() {
        let artifact: ContractArtifact = serde_json::from_str(
            r#"{ "contractName": "Reader", "abi": [], "bytecode": "0x6080604052" }"#,
        )
        .unwrap();
        assert!(artifact.required_libraries().is_empty());

        let bytecode = artifact.linked_bytecode(&BTreeMap::new()).unwrap();
        assert_eq!(bytecode.to_vec(), vec![0x60, 0x80, 0x60, 0x40, 0x52]);
    }
}
