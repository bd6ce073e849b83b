use std::collections::BTreeMap;
use std::path::PathBuf;

use foundry_compilers::artifacts::{
  output_selection::OutputSelection, CompilerOutput, Settings, SolcInput, Source, Sources,
};
use foundry_compilers::solc::SolcLanguage;
use semver::Version;

use crate::error::{Error, Result};
use crate::solc;

pub mod output;

pub use output::{raw_contracts_json, select_deployable, DeployArtifact};

/// Stateful compiler facade pinned to one solc version. The binary is
/// resolved (and installed when missing) at construction so repeated
/// compilations are cheap and startup is where install failures surface.
pub struct Compiler {
  version: Version,
}

impl Compiler {
  pub fn new(version: Version) -> Result<Self> {
    solc::ensure_installed(&version)?;
    Ok(Self { version })
  }

  pub fn version(&self) -> &Version {
    &self.version
  }

  /// Compile an in-memory map of normalized file paths to Solidity source
  /// text through solc's standard JSON interface. Every contract in every
  /// file is compiled with the console's fixed output selection (ABI,
  /// creation bytecode, metadata).
  pub fn compile_sources(&self, entries: &BTreeMap<String, String>) -> Result<CompilerOutput> {
    if entries.is_empty() {
      return Err(Error::Compilation("no source files staged".into()));
    }

    let solc = solc::ensure_installed(&self.version)?;
    let sources = sources_from_map(entries);
    let mut input = SolcInput::new(SolcLanguage::Solidity, sources, deploy_settings());
    input.sanitize(&solc.version);

    log::debug!(
      "compiling {} source file(s) with solc {}",
      entries.len(),
      solc.version
    );
    let output: CompilerOutput = solc
      .compile_as(&input)
      .map_err(|err| Error::compilation(err))?;
    ensure_compiled(output)
  }
}

/// Settings for a deploy-oriented compile: request ABI, EVM creation
/// bytecode, and metadata for `*`/`*` so artifact selection can scan every
/// contract the sources produce.
fn deploy_settings() -> Settings {
  let mut settings = Settings::default();
  settings.output_selection = OutputSelection::common_output_selection([
    "abi".to_string(),
    "evm.bytecode".to_string(),
    "metadata".to_string(),
  ]);
  settings
}

fn sources_from_map(entries: &BTreeMap<String, String>) -> Sources {
  let mut sources = Sources::new();
  for (path, source) in entries {
    sources.insert(PathBuf::from(path), Source::new(source.as_str()));
  }
  sources
}

/// Reject outputs that carry error-severity diagnostics or no contracts at
/// all. Diagnostics are surfaced verbatim; the caller renders them to the
/// operator without retrying.
fn ensure_compiled(output: CompilerOutput) -> Result<CompilerOutput> {
  let diagnostics: Vec<String> = output
    .errors
    .iter()
    .filter(|error| error.severity.is_error())
    .map(|error| {
      error
        .formatted_message
        .clone()
        .unwrap_or_else(|| error.message.clone())
    })
    .collect();
  if !diagnostics.is_empty() {
    return Err(Error::Compilation(diagnostics.join("\n")));
  }
  if output.contracts.is_empty() {
    return Err(Error::Compilation(
      "compiler returned zero contracts".into(),
    ));
  }
  Ok(output)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::{json, Value};

  #[test]
  fn deploy_settings_request_the_fixed_output_selection() {
    let value = serde_json::to_value(deploy_settings()).expect("serialize settings");
    assert_eq!(
      value["outputSelection"]["*"]["*"],
      json!(["abi", "evm.bytecode", "metadata"])
    );
  }

  #[test]
  fn standard_json_input_shape_is_preserved() {
    let mut entries = BTreeMap::new();
    entries.insert(
      "contracts/C.sol".to_string(),
      "contract C {}".to_string(),
    );
    let input = SolcInput::new(
      SolcLanguage::Solidity,
      sources_from_map(&entries),
      deploy_settings(),
    );
    let value: Value = serde_json::to_value(&input).expect("serialize input");
    assert_eq!(value["language"], "Solidity");
    assert_eq!(
      value["sources"]["contracts/C.sol"]["content"],
      "contract C {}"
    );
  }

  #[test]
  fn error_diagnostics_fail_the_compile() {
    let output: CompilerOutput = serde_json::from_value(json!({
      "errors": [{
        "type": "ParserError",
        "component": "general",
        "severity": "error",
        "message": "Expected ';'",
        "formattedMessage": "ParserError: Expected ';' at C.sol:1"
      }],
      "sources": {},
      "contracts": {}
    }))
    .expect("parse output");

    let err = ensure_compiled(output).unwrap_err();
    assert!(err.to_string().contains("Expected ';'"));
  }

  #[test]
  fn warnings_alone_do_not_fail_the_compile() {
    let output: CompilerOutput = serde_json::from_value(json!({
      "errors": [{
        "type": "Warning",
        "component": "general",
        "severity": "warning",
        "message": "Unused local variable."
      }],
      "sources": {},
      "contracts": {
        "C.sol": { "C": { "abi": [] } }
      }
    }))
    .expect("parse output");

    assert!(ensure_compiled(output).is_ok());
  }

  #[test]
  fn zero_contracts_fail_the_compile() {
    let output: CompilerOutput = serde_json::from_value(json!({
      "errors": [],
      "sources": {},
      "contracts": {}
    }))
    .expect("parse output");

    let err = ensure_compiled(output).unwrap_err();
    assert!(matches!(err, Error::Compilation(_)));
  }
}
