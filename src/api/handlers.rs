//! JSON API handlers for the console actions.

use std::collections::BTreeMap;
use std::sync::Arc;

use alloy::primitives::Address;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::chain::ChainClient;
use crate::compiler::{raw_contracts_json, select_deployable, Compiler};
use crate::error::Error;
use crate::forms::{coerce_args, contract_forms, is_read_only, value_to_json, FunctionForm};
use crate::session::{DeployedContract, Session};
use crate::sources::{SourceStore, SourceUpload};

/// Shared application state for the console handlers. The session is the
/// only mutable piece; every user action is one handler invocation that runs
/// to completion before the page re-renders.
#[derive(Clone)]
pub struct ApiState {
  pub session: Arc<RwLock<Session>>,
  pub chain: ChainClient,
  pub compiler: Arc<Compiler>,
  pub store: Arc<SourceStore>,
}

// ============================================================================
// Request / response types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
  pub status: &'static str,
}

#[derive(Serialize)]
pub struct AccountsResponse {
  pub accounts: Vec<String>,
}

#[derive(Deserialize)]
pub struct UploadRequest {
  pub files: Vec<SourceUpload>,
}

#[derive(Serialize)]
pub struct UploadResponse {
  pub staged: Vec<String>,
}

#[derive(Deserialize)]
pub struct DeployRequest {
  pub from: String,
}

#[derive(Serialize)]
pub struct ContractResponse {
  pub contract_name: String,
  pub address: String,
  pub functions: Vec<FunctionForm>,
}

#[derive(Deserialize)]
pub struct CallRequest {
  pub function: String,
  #[serde(default)]
  pub args: Vec<String>,
  pub from: Option<String>,
}

#[derive(Serialize)]
pub struct CallResponse {
  pub function: String,
  pub read_only: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result: Option<Vec<serde_json::Value>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tx_hash: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
  pub error: String,
}

type ErrorResponse = (StatusCode, Json<ApiError>);

/// Every error is rendered as a user-visible message at the action that
/// triggered it; nothing is retried.
fn error_response(err: Error) -> ErrorResponse {
  let status = match &err {
    Error::InvalidSource(_) | Error::Call(_) => StatusCode::BAD_REQUEST,
    Error::Compilation(_) | Error::NoDeployableArtifact(_) => StatusCode::UNPROCESSABLE_ENTITY,
    Error::Deployment(_) | Error::Rpc(_) => StatusCode::BAD_GATEWAY,
    Error::CompilerInstall(_) => StatusCode::INTERNAL_SERVER_ERROR,
  };
  log::error!("{err}");
  (
    status,
    Json(ApiError {
      error: err.to_string(),
    }),
  )
}

fn bad_request(message: impl Into<String>) -> ErrorResponse {
  (
    StatusCode::BAD_REQUEST,
    Json(ApiError {
      error: message.into(),
    }),
  )
}

fn parse_account(raw: &str) -> Result<Address, ErrorResponse> {
  raw
    .trim()
    .parse()
    .map_err(|_| bad_request(format!("{raw:?} is not a valid account address")))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
  Json(HealthResponse { status: "ok" })
}

/// GET /api/accounts - accounts exposed by the node, for the selector.
pub async fn list_accounts(
  State(state): State<ApiState>,
) -> Result<Json<AccountsResponse>, ErrorResponse> {
  let accounts = state.chain.list_accounts().await.map_err(error_response)?;
  Ok(Json(AccountsResponse {
    accounts: accounts.iter().map(|account| account.to_string()).collect(),
  }))
}

/// POST /api/sources - upload .sol files; normalize, persist, stage.
pub async fn upload_sources(
  State(state): State<ApiState>,
  Json(req): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, ErrorResponse> {
  let entries = state.store.stage(&req.files).map_err(error_response)?;
  let staged = entries.keys().cloned().collect();
  state.session.write().await.stage_sources(entries);
  Ok(Json(UploadResponse { staged }))
}

/// POST /api/deploy - compile the staged sources, select the deployable
/// artifact, submit the constructor transaction, and record the result.
pub async fn deploy(
  State(state): State<ApiState>,
  Json(req): Json<DeployRequest>,
) -> Result<Json<ContractResponse>, ErrorResponse> {
  let from = parse_account(&req.from)?;

  let sources: BTreeMap<String, String> = state.session.read().await.sources().clone();
  if sources.is_empty() {
    return Err(bad_request("upload source files before deploying"));
  }

  // solc is an external process; keep it off the async workers.
  let compiler = Arc::clone(&state.compiler);
  let output = tokio::task::spawn_blocking(move || compiler.compile_sources(&sources))
    .await
    .map_err(|err| bad_request(format!("compile task failed: {err}")))?
    .map_err(error_response)?;

  state
    .session
    .write()
    .await
    .record_compilation(raw_contracts_json(&output));

  let artifact = select_deployable(&output).map_err(error_response)?;
  let address = state
    .chain
    .deploy(&artifact, from)
    .await
    .map_err(error_response)?;
  log::info!("deployed {} at {address}", artifact.contract_name);

  let deployed = DeployedContract {
    address,
    contract_name: artifact.contract_name,
    abi: artifact.abi,
  };
  let response = ContractResponse {
    contract_name: deployed.contract_name.clone(),
    address: deployed.address.to_string(),
    functions: contract_forms(&deployed.abi),
  };
  state.session.write().await.record_deployment(deployed);
  Ok(Json(response))
}

/// GET /api/artifacts - raw compiled-contracts JSON for the viewer.
pub async fn get_artifacts(
  State(state): State<ApiState>,
) -> Result<Json<serde_json::Value>, ErrorResponse> {
  match state.session.read().await.compiled() {
    Some(raw) => Ok(Json(raw.clone())),
    None => Err((
      StatusCode::NOT_FOUND,
      Json(ApiError {
        error: "nothing compiled yet".into(),
      }),
    )),
  }
}

/// GET /api/contract - the deployed contract and its generated forms.
pub async fn get_contract(
  State(state): State<ApiState>,
) -> Result<Json<ContractResponse>, ErrorResponse> {
  match state.session.read().await.deployed() {
    Some(contract) => Ok(Json(ContractResponse {
      contract_name: contract.contract_name.clone(),
      address: contract.address.to_string(),
      functions: contract_forms(&contract.abi),
    })),
    None => Err((
      StatusCode::NOT_FOUND,
      Json(ApiError {
        error: "no contract deployed yet".into(),
      }),
    )),
  }
}

/// POST /api/call - invoke a function of the deployed contract. Routing is
/// taken from the function's mutability: view/pure read, the rest transact
/// from the caller-supplied account.
pub async fn call_function(
  State(state): State<ApiState>,
  Json(req): Json<CallRequest>,
) -> Result<Json<CallResponse>, ErrorResponse> {
  let (address, function) = {
    let session = state.session.read().await;
    let contract = session
      .deployed()
      .ok_or_else(|| bad_request("no contract deployed yet"))?;
    let function = contract
      .abi
      .function(&req.function)
      .and_then(|overloads| overloads.first())
      .ok_or_else(|| bad_request(format!("unknown function {:?}", req.function)))?
      .clone();
    (contract.address, function)
  };

  let args = coerce_args(&function, &req.args).map_err(error_response)?;

  if is_read_only(function.state_mutability) {
    let values = state
      .chain
      .call_read(address, &function, &args)
      .await
      .map_err(error_response)?;
    Ok(Json(CallResponse {
      function: function.name,
      read_only: true,
      result: Some(values.iter().map(value_to_json).collect()),
      tx_hash: None,
    }))
  } else {
    let from = match &req.from {
      Some(raw) => parse_account(raw)?,
      None => return Err(bad_request("state-mutating calls need a from account")),
    };
    let tx_hash = state
      .chain
      .transact(address, &function, &args, from)
      .await
      .map_err(error_response)?;
    Ok(Json(CallResponse {
      function: function.name,
      read_only: false,
      result: None,
      tx_hash: Some(tx_hash.to_string()),
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn errors_map_to_the_expected_status_codes() {
    let (status, _) = error_response(Error::InvalidSource("x".into()));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = error_response(Error::Compilation("x".into()));
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = error_response(Error::NoDeployableArtifact("x".into()));
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = error_response(Error::Deployment("x".into()));
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let (status, _) = error_response(Error::CompilerInstall("x".into()));
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn parse_account_round_trips_hex_addresses() {
    let parsed = parse_account("0x00000000000000000000000000000000000000aa").expect("parse");
    assert_eq!(
      parsed,
      "0x00000000000000000000000000000000000000aa"
        .parse::<Address>()
        .unwrap()
    );
    assert!(parse_account("not-an-address").is_err());
  }
}
