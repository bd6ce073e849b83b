use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// One uploaded source file, path as sent by the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceUpload {
  pub path: String,
  pub content: String,
}

/// Persists uploaded sources under a local directory (default `contracts/`)
/// before compilation, mirroring what lands in the compiler's source map.
pub struct SourceStore {
  root: PathBuf,
}

impl SourceStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Normalize every upload, write it below the store root, and return the
  /// path→content map the compiler consumes. Path uniqueness is required by
  /// the standard-JSON interface, so duplicates are rejected up front.
  pub fn stage(&self, uploads: &[SourceUpload]) -> Result<BTreeMap<String, String>> {
    if uploads.is_empty() {
      return Err(Error::InvalidSource("no files uploaded".into()));
    }

    let mut entries = BTreeMap::new();
    for upload in uploads {
      let normalized = normalize_path(&upload.path)?;
      if !normalized.to_ascii_lowercase().ends_with(".sol") {
        return Err(Error::InvalidSource(format!(
          "{normalized:?} is not a .sol file"
        )));
      }
      if entries
        .insert(normalized.clone(), upload.content.clone())
        .is_some()
      {
        return Err(Error::InvalidSource(format!(
          "duplicate source path {normalized:?}"
        )));
      }

      let target = self.root.join(&normalized);
      if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
          .map_err(|err| Error::InvalidSource(format!("failed to create {parent:?}: {err}")))?;
      }
      fs::write(&target, &upload.content)
        .map_err(|err| Error::InvalidSource(format!("failed to persist {normalized:?}: {err}")))?;
    }

    log::info!("staged {} source file(s) under {:?}", entries.len(), self.root);
    Ok(entries)
  }
}

/// Reduce an uploaded path to a normalized forward-slash relative path.
/// Backslashes become slashes; absolute paths and parent-directory escapes
/// are rejected so uploads cannot write outside the store root.
pub fn normalize_path(raw: &str) -> Result<String> {
  let slashed = raw.trim().replace('\\', "/");
  if slashed.is_empty() {
    return Err(Error::InvalidSource("empty file path".into()));
  }

  let mut parts: Vec<&str> = Vec::new();
  for component in Path::new(&slashed).components() {
    match component {
      Component::Normal(part) => {
        let part = part
          .to_str()
          .ok_or_else(|| Error::InvalidSource(format!("{raw:?} is not valid UTF-8")))?;
        parts.push(part);
      }
      Component::CurDir => {}
      _ => {
        return Err(Error::InvalidSource(format!(
          "{raw:?} must be a relative path without parent escapes"
        )));
      }
    }
  }

  if parts.is_empty() {
    return Err(Error::InvalidSource(format!("{raw:?} names no file")));
  }
  Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn upload(path: &str, content: &str) -> SourceUpload {
    SourceUpload {
      path: path.to_string(),
      content: content.to_string(),
    }
  }

  #[test]
  fn backslashes_become_forward_slashes() {
    assert_eq!(
      normalize_path(r"lib\token\ERC20.sol").unwrap(),
      "lib/token/ERC20.sol"
    );
  }

  #[test]
  fn current_dir_segments_collapse() {
    assert_eq!(normalize_path("./C.sol").unwrap(), "C.sol");
  }

  #[test]
  fn traversal_and_absolute_paths_are_rejected() {
    assert!(normalize_path("../C.sol").is_err());
    assert!(normalize_path("/etc/C.sol").is_err());
    assert!(normalize_path("a/../../C.sol").is_err());
  }

  #[test]
  fn staging_writes_below_the_store_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SourceStore::new(dir.path());
    let entries = store
      .stage(&[upload("sub/C.sol", "contract C {}")])
      .expect("stage");

    assert_eq!(entries.get("sub/C.sol").map(String::as_str), Some("contract C {}"));
    let written = fs::read_to_string(dir.path().join("sub/C.sol")).expect("read back");
    assert_eq!(written, "contract C {}");
  }

  #[test]
  fn duplicate_paths_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SourceStore::new(dir.path());
    let err = store
      .stage(&[upload("C.sol", "contract C {}"), upload(r".\C.sol", "contract D {}")])
      .unwrap_err();
    assert!(matches!(err, Error::InvalidSource(_)));
  }

  #[test]
  fn non_solidity_files_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SourceStore::new(dir.path());
    assert!(store.stage(&[upload("notes.txt", "hi")]).is_err());
  }

  #[test]
  fn empty_upload_sets_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SourceStore::new(dir.path());
    assert!(store.stage(&[]).is_err());
  }
}
