//! Solidity deploy console.
//!
//! Serves a single-page console that uploads Solidity sources, compiles them
//! with a managed solc, deploys the first deployable artifact to the
//! configured node, and renders call forms for the deployed contract.

use std::sync::Arc;

use clap::Parser;
use tokio::sync::RwLock;

use solpad::api::{create_router, ApiState};
use solpad::chain::ChainClient;
use solpad::compiler::Compiler;
use solpad::session::Session;
use solpad::solc;
use solpad::sources::SourceStore;

#[derive(Parser)]
#[command(name = "solpad")]
#[command(version = "0.1.0")]
#[command(about = "Compile, deploy, and call Solidity contracts from one page", long_about = None)]
struct Cli {
  /// JSON-RPC endpoint of the target node
  #[arg(long, default_value = "http://127.0.0.1:8545")]
  rpc_url: String,

  /// Address to serve the console on
  #[arg(long, default_value = "127.0.0.1:3000")]
  listen: String,

  /// Directory uploaded sources are persisted under
  #[arg(long, default_value = "contracts")]
  contracts_dir: String,

  /// solc version used for every compile
  #[arg(long, default_value = solc::DEFAULT_SOLC_VERSION)]
  solc_version: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  let cli = Cli::parse();

  // Toolchain problems are unrecoverable for the console; fail startup
  // instead of failing the first compile.
  let version = solc::parse_version(&cli.solc_version)?;
  let compiler = Compiler::new(version)?;
  log::info!("using solc {}", compiler.version());

  let runtime = tokio::runtime::Runtime::new()?;
  runtime.block_on(async {
    let state = ApiState {
      session: Arc::new(RwLock::new(Session::default())),
      chain: ChainClient::connect(&cli.rpc_url)?,
      compiler: Arc::new(compiler),
      store: Arc::new(SourceStore::new(&cli.contracts_dir)),
    };
    let app = create_router(state);

    log::info!("console listening on http://{}", cli.listen);
    log::info!("targeting node at {}", cli.rpc_url);
    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    axum::serve(listener, app).await?;
    Ok::<(), Box<dyn std::error::Error>>(())
  })?;

  Ok(())
}
