//! Utilities for the deploy scripts

use std::{str::FromStr, sync::Arc};

use ethers::{
    abi::{Contract, Token},
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::Bytes,
};

use crate::errors::ScriptError;

/// Sets up the client with which to deploy and initialize contracts, from
/// the deployer's private key and the resolved RPC url
pub async fn setup_client(
    priv_key: &str,
    rpc_url: &str,
) -> Result<Arc<impl Middleware>, ScriptError> {
    let provider = Provider::<Http>::try_from(rpc_url)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    let wallet = LocalWallet::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let chain_id = provider
        .get_chainid()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?
        .as_u64();
    let client = Arc::new(SignerMiddleware::new(
        provider,
        wallet.clone().with_chain_id(chain_id),
    ));

    Ok(client)
}

/// Encode calldata for a contract's `initialize` method from its artifact
/// ABI, used to initialize an implementation through its proxy constructor
pub fn initialize_calldata(abi: &Contract, args: &[Token]) -> Result<Bytes, ScriptError> {
    let function = abi
        .function("initialize")
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;
    let encoded = function
        .encode_input(args)
        .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))?;

    Ok(Bytes::from(encoded))
}

#[cfg(test)]
mod tests {
    use ethers::{
        abi::{Address, Contract, Token},
        utils::id,
    };

    use super::initialize_calldata;
    use crate::errors::ScriptError;

    /// An ABI exposing `initialize(address)`
    fn initializable_abi() -> Contract {
        serde_json::from_str(
            r#"[{
                "type": "function",
                "name": "initialize",
                "stateMutability": "nonpayable",
                "inputs": [{ "name": "operator", "type": "address" }],
                "outputs": []
            }]"#,
        )
        .unwrap()
    }

    #[test]
    fn calldata_starts_with_initialize_selector() {
        let abi = initializable_abi();
        let calldata =
            initialize_calldata(&abi, &[Token::Address(Address::zero())]).unwrap();

        assert_eq!(&calldata[..4], &id("initialize(address)")[..]);
        // selector + one 32-byte word
        assert_eq!(calldata.len(), 36);
    }

    #[test]
    fn missing_initializer_is_an_error() {
        let abi: Contract = serde_json::from_str("[]").unwrap();
        let err = initialize_calldata(&abi, &[]).unwrap_err();
        assert!(matches!(err, ScriptError::CalldataConstruction(_)));
    }
}
