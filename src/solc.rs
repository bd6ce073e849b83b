use std::sync::{Mutex, OnceLock};

use foundry_compilers::solc::Solc;
use semver::Version;

use crate::error::{Error, Result};

/// Version the console pins by default. Matches the pragma range of the
/// contracts this tool is typically fed; overridable via `--solc-version`.
pub const DEFAULT_SOLC_VERSION: &str = "0.8.26";

pub fn parse_version(version: &str) -> Result<Version> {
  let trimmed = version.trim().trim_start_matches('v');
  Version::parse(trimmed)
    .map_err(|err| Error::compiler_install(format!("failed to parse solc version: {err}")))
}

pub fn default_version() -> Result<Version> {
  parse_version(DEFAULT_SOLC_VERSION)
}

/// Locate an svm-installed solc matching `version`, if any.
pub fn find_installed_version(version: &Version) -> Result<Option<Solc>> {
  Solc::find_svm_installed_version(version)
    .map_err(|err| Error::compiler_install(format!("failed to inspect solc versions: {err}")))
}

pub fn is_version_installed(version: &Version) -> Result<bool> {
  find_installed_version(version).map(|maybe| maybe.is_some())
}

/// Return the installed solc for `version`, downloading it first when
/// missing. Install failure is unrecoverable for the console and surfaces as
/// [`Error::CompilerInstall`].
pub fn ensure_installed(version: &Version) -> Result<Solc> {
  if let Some(solc) = find_installed_version(version)? {
    return Ok(solc);
  }
  install_version(version)?;
  find_installed_version(version)?.ok_or_else(|| {
    Error::CompilerInstall(format!("solc {version} missing after a reported install"))
  })
}

fn install_mutex() -> &'static Mutex<()> {
  static INSTALL_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
  INSTALL_MUTEX.get_or_init(|| Mutex::new(()))
}

/// Download and persist a solc binary through svm. Serialized process-wide;
/// concurrent installs of the same version corrupt the svm store.
pub fn install_version(version: &Version) -> Result<()> {
  let _guard = install_mutex()
    .lock()
    .map_err(|err| Error::compiler_install(format!("solc install mutex poisoned: {err}")))?;

  if find_installed_version(version)?.is_some() {
    return Ok(());
  }

  log::info!("installing solc {version}");
  Solc::blocking_install(version)
    .map_err(|err| Error::compiler_install(format!("failed to install solc {version}: {err}")))
    .map(|_| ())
}
