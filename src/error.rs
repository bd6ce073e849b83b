use thiserror::Error;

/// Canonical error type used across the console. Variants mirror the points
/// where a user action can fail: toolchain setup, compilation, artifact
/// selection, and chain interaction.
#[derive(Debug, Error)]
pub enum Error {
  /// The solc toolchain is unavailable or the requested version cannot be
  /// installed. Raised during startup and treated as unrecoverable.
  #[error("solc toolchain unavailable: {0}")]
  CompilerInstall(String),

  /// solc reported error-severity diagnostics or produced no contracts.
  #[error("compilation failed: {0}")]
  Compilation(String),

  /// Every compiled contract was skipped (no ABI or empty bytecode).
  #[error("no deployable artifact: {0}")]
  NoDeployableArtifact(String),

  /// The constructor transaction failed, reverted, or produced no address.
  #[error("deployment failed: {0}")]
  Deployment(String),

  /// A function invocation failed: revert, argument mismatch, or a result
  /// that could not be decoded.
  #[error("call failed: {0}")]
  Call(String),

  /// An uploaded source file was rejected before compilation.
  #[error("invalid source upload: {0}")]
  InvalidSource(String),

  /// The JSON-RPC endpoint itself misbehaved (connection, account listing).
  #[error("rpc endpoint error: {0}")]
  Rpc(String),
}

impl Error {
  pub fn compiler_install(cause: impl std::fmt::Display) -> Self {
    Self::CompilerInstall(cause.to_string())
  }

  pub fn compilation(cause: impl std::fmt::Display) -> Self {
    Self::Compilation(cause.to_string())
  }

  pub fn deployment(cause: impl std::fmt::Display) -> Self {
    Self::Deployment(cause.to_string())
  }

  pub fn call(cause: impl std::fmt::Display) -> Self {
    Self::Call(cause.to_string())
  }

  pub fn rpc(cause: impl std::fmt::Display) -> Self {
    Self::Rpc(cause.to_string())
  }
}

/// Result alias bound to [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
