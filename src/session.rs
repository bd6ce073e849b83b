use std::collections::BTreeMap;

use alloy::json_abi::JsonAbi;
use alloy::primitives::Address;

/// Contract created by the most recent successful deployment. Persists until
/// overwritten by the next deployment; never explicitly destroyed.
#[derive(Debug, Clone)]
pub struct DeployedContract {
  pub address: Address,
  pub contract_name: String,
  pub abi: JsonAbi,
}

/// Explicit per-session context threaded through the handlers: staged
/// sources, the most recent raw compiled-contracts map (display only), and
/// the deployed contract. Process-scoped, one operator per console.
#[derive(Debug, Default)]
pub struct Session {
  sources: BTreeMap<String, String>,
  compiled: Option<serde_json::Value>,
  deployed: Option<DeployedContract>,
}

impl Session {
  /// Replace the staged source set. A new upload supersedes the old one
  /// wholesale; partial merges would let stale files leak into compiles.
  pub fn stage_sources(&mut self, sources: BTreeMap<String, String>) {
    self.sources = sources;
  }

  pub fn sources(&self) -> &BTreeMap<String, String> {
    &self.sources
  }

  pub fn record_compilation(&mut self, raw_contracts: serde_json::Value) {
    self.compiled = Some(raw_contracts);
  }

  pub fn compiled(&self) -> Option<&serde_json::Value> {
    self.compiled.as_ref()
  }

  pub fn record_deployment(&mut self, contract: DeployedContract) {
    self.deployed = Some(contract);
  }

  pub fn deployed(&self) -> Option<&DeployedContract> {
    self.deployed.as_ref()
  }
}
