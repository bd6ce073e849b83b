use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::json_abi::Function;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;

use crate::compiler::DeployArtifact;
use crate::error::{Error, Result};

/// Thin wrapper around one HTTP JSON-RPC endpoint. Transactions are signed
/// by the node's unlocked accounts (eth_sendTransaction), so no local key
/// material is held. Every mutating operation blocks until its receipt is
/// mined; nothing is retried.
#[derive(Clone)]
pub struct ChainClient {
  provider: DynProvider,
}

impl ChainClient {
  pub fn connect(endpoint: &str) -> Result<Self> {
    let url = endpoint
      .parse()
      .map_err(|err| Error::rpc(format!("invalid endpoint {endpoint:?}: {err}")))?;
    let provider = ProviderBuilder::new().connect_http(url).erased();
    Ok(Self { provider })
  }

  /// Accounts exposed by the node, unfiltered, in node order.
  pub async fn list_accounts(&self) -> Result<Vec<Address>> {
    self
      .provider
      .get_accounts()
      .await
      .map_err(|err| Error::rpc(format!("eth_accounts failed: {err}")))
  }

  /// Submit a zero-argument constructor transaction for the artifact and
  /// block until it is mined. Returns the created contract address.
  pub async fn deploy(&self, artifact: &DeployArtifact, from: Address) -> Result<Address> {
    let code = decode_bytecode(&artifact.bytecode)?;
    let tx = TransactionRequest::default()
      .with_from(from)
      .with_deploy_code(code);

    let receipt = self
      .provider
      .send_transaction(tx)
      .await
      .map_err(Error::deployment)?
      .get_receipt()
      .await
      .map_err(Error::deployment)?;

    if !receipt.status() {
      return Err(Error::Deployment(format!(
        "constructor transaction {} reverted",
        receipt.transaction_hash
      )));
    }
    receipt
      .contract_address
      .ok_or_else(|| Error::Deployment("mined receipt carries no contract address".into()))
  }

  /// Execute a `view`/`pure` function via eth_call and decode the returned
  /// values. No transaction is submitted and no receipt is produced.
  pub async fn call_read(
    &self,
    address: Address,
    function: &Function,
    args: &[DynSolValue],
  ) -> Result<Vec<DynSolValue>> {
    let data = function.abi_encode_input(args).map_err(Error::call)?;
    let tx = TransactionRequest::default()
      .with_to(address)
      .with_input(data);

    let output = self
      .provider
      .call(tx)
      .await
      .map_err(|err| Error::call(format!("eth_call of {} failed: {err}", function.name)))?;
    function
      .abi_decode_output(&output)
      .map_err(|err| Error::call(format!("failed to decode {} output: {err}", function.name)))
  }

  /// Submit a state-mutating invocation from `from` and block until it is
  /// mined. Returns the transaction hash.
  pub async fn transact(
    &self,
    address: Address,
    function: &Function,
    args: &[DynSolValue],
    from: Address,
  ) -> Result<TxHash> {
    let data = function.abi_encode_input(args).map_err(Error::call)?;
    let tx = TransactionRequest::default()
      .with_from(from)
      .with_to(address)
      .with_input(data);

    let receipt = self
      .provider
      .send_transaction(tx)
      .await
      .map_err(Error::call)?
      .get_receipt()
      .await
      .map_err(Error::call)?;

    if !receipt.status() {
      return Err(Error::Call(format!(
        "{} transaction {} reverted",
        function.name, receipt.transaction_hash
      )));
    }
    Ok(receipt.transaction_hash)
  }
}

fn decode_bytecode(bytecode: &str) -> Result<Bytes> {
  let stripped = bytecode.trim().trim_start_matches("0x");
  let bytes = hex::decode(stripped)
    .map_err(|err| Error::Deployment(format!("invalid creation bytecode hex: {err}")))?;
  if bytes.is_empty() {
    return Err(Error::Deployment("creation bytecode is empty".into()));
  }
  Ok(bytes.into())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decode_bytecode_accepts_prefixed_and_bare_hex() {
    assert_eq!(
      decode_bytecode("0x6080").unwrap(),
      Bytes::from(vec![0x60, 0x80])
    );
    assert_eq!(
      decode_bytecode("6080").unwrap(),
      Bytes::from(vec![0x60, 0x80])
    );
  }

  #[test]
  fn decode_bytecode_rejects_empty_and_invalid_input() {
    assert!(matches!(
      decode_bytecode("0x").unwrap_err(),
      Error::Deployment(_)
    ));
    assert!(matches!(
      decode_bytecode("0xzz").unwrap_err(),
      Error::Deployment(_)
    ));
  }
}
