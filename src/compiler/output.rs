use alloy::json_abi::JsonAbi;
use foundry_compilers::artifacts::{CompilerOutput, Contract};

use crate::error::{Error, Result};

/// The contract chosen for deployment. Invariant: `abi` was present in the
/// compiler output and `bytecode` is a non-empty `0x`-prefixed hex string.
#[derive(Debug, Clone)]
pub struct DeployArtifact {
  pub contract_name: String,
  pub abi: JsonAbi,
  pub bytecode: String,
}

/// Scan the compiler output for the first contract with a usable creation
/// bytecode and a present ABI. Files and contracts are visited in the
/// output's own enumeration order; the tie-break is strictly
/// first-encountered. Interfaces and abstract contracts compile to empty
/// bytecode and are skipped.
pub fn select_deployable(output: &CompilerOutput) -> Result<DeployArtifact> {
  for (file, contracts) in &output.contracts {
    for (name, contract) in contracts {
      let Some(bytecode) = creation_bytecode(contract) else {
        log::debug!("skipping {name} in {file:?}: no concrete bytecode");
        continue;
      };
      let Some(abi) = contract.abi.clone() else {
        log::debug!("skipping {name} in {file:?}: no ABI emitted");
        continue;
      };
      log::info!("selected {name} from {file:?} for deployment");
      return Ok(DeployArtifact {
        contract_name: name.clone(),
        abi,
        bytecode,
      });
    }
  }

  Err(Error::NoDeployableArtifact(
    "every compiled contract is abstract or an interface".into(),
  ))
}

fn creation_bytecode(contract: &Contract) -> Option<String> {
  contract
    .evm
    .as_ref()
    .and_then(|evm| evm.bytecode.as_ref())
    .and_then(|bytecode| bytecode.object.as_bytes())
    .filter(|bytes| !bytes.is_empty())
    .map(|bytes| format!("0x{}", hex::encode(bytes.as_ref())))
}

/// Raw `contracts` map of the compiler output, kept around for the console's
/// collapsible artifact viewer. Display only; selection never re-reads this.
pub fn raw_contracts_json(output: &CompilerOutput) -> serde_json::Value {
  serde_json::to_value(&output.contracts).unwrap_or(serde_json::Value::Null)
}
