//! Bundle the ABI fragments of deployed contracts into one ABI.
//!
//! Reads deployment records from the deployments directory and concatenates
//! their `abi` arrays in the order the contracts are listed, so the output
//! covers the controller's full callable surface (the implementation plus
//! the libraries it links).

use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::Parser;
use eyre::{eyre, Result, WrapErr};
use serde_json::Value;

/// The records bundled when no explicit list is given: the controller
/// implementation and the libraries linked into it
const DEFAULT_CONTRACTS: [&str; 6] = [
    "Controller_Implementation",
    "InterestCalculator",
    "LiquidationLogic",
    "UpdatePositionLogic",
    "PositionUpdater",
    "VaultLib",
];

/// Bundle deployment-record ABIs into one ABI
#[derive(Parser)]
struct Args {
    /// Directory holding per-network deployment records
    #[arg(long, default_value = "deployments")]
    deployments: PathBuf,

    /// The network whose records are bundled
    #[arg(short, long)]
    network: String,

    /// The records to bundle, in output order
    #[arg(short, long, value_delimiter = ',')]
    contracts: Vec<String>,

    /// File to write the bundle to; stdout when absent
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Read the `abi` array of one deployment record
fn record_abi(path: &Path) -> Result<Vec<Value>> {
    let raw = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read deployment record {}", path.display()))?;
    let record: Value = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("failed to parse deployment record {}", path.display()))?;

    record
        .get("abi")
        .and_then(Value::as_array)
        .cloned()
        .ok_or_else(|| eyre!("deployment record {} has no abi array", path.display()))
}

/// Concatenate the ABI arrays of the listed records, preserving list order
fn bundle_abis(dir: &Path, contracts: &[String]) -> Result<Value> {
    let mut entries = Vec::new();
    for name in contracts {
        entries.extend(record_abi(&dir.join(format!("{}.json", name)))?);
    }
    Ok(Value::Array(entries))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let dir = args.deployments.join(&args.network);
    let contracts = if args.contracts.is_empty() {
        DEFAULT_CONTRACTS.map(str::to_string).to_vec()
    } else {
        args.contracts
    };

    let bundle = bundle_abis(&dir, &contracts)?;
    let rendered = serde_json::to_string_pretty(&bundle)?;

    match args.output {
        Some(path) => fs::write(&path, rendered)
            .wrap_err_with(|| format!("failed to write bundle to {}", path.display()))?,
        None => println!("{}", rendered),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::{json, Value};
    use tempfile::tempdir;

    use super::bundle_abis;

    #[test]
    fn bundle_preserves_input_order() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("VaultLib.json"),
            json!({ "name": "VaultLib", "abi": [{ "name": "a", "type": "function" }] })
                .to_string(),
        )
        .unwrap();
        fs::write(
            dir.path().join("PositionUpdater.json"),
            json!({ "name": "PositionUpdater", "abi": [{ "name": "b", "type": "function" }] })
                .to_string(),
        )
        .unwrap();

        let bundle = bundle_abis(
            dir.path(),
            &["VaultLib".to_string(), "PositionUpdater".to_string()],
        )
        .unwrap();

        let entries = bundle.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["name"], "a");
        assert_eq!(entries[1]["name"], "b");

        // Reversing the list reverses the bundle
        let reversed = bundle_abis(
            dir.path(),
            &["PositionUpdater".to_string(), "VaultLib".to_string()],
        )
        .unwrap();
        assert_eq!(reversed.as_array().unwrap()[0]["name"], "b");
    }

    #[test]
    fn empty_contract_list_bundles_to_empty_abi() {
        let dir = tempdir().unwrap();
        let bundle = bundle_abis(dir.path(), &[]).unwrap();
        assert_eq!(bundle, Value::Array(vec![]));
    }

    #[test]
    fn missing_record_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(bundle_abis(dir.path(), &["Controller".to_string()]).is_err());
    }

    #[test]
    fn record_without_abi_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("VaultLib.json"),
            json!({ "name": "VaultLib" }).to_string(),
        )
        .unwrap();
        assert!(bundle_abis(dir.path(), &["VaultLib".to_string()]).is_err());
    }
}
