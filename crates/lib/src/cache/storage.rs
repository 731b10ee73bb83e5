//! Cache file reading and writing.
//!
//! The document is written pretty printed with every object's keys sorted,
//! through a sibling temp file that is renamed into place.

use std::fs;
use std::io;
use std::path::Path;

use crate::platform::prepare_file_path;

use super::types::{CacheDocument, CacheError};

/// Read the cache at `path`. A missing file is `Ok(None)`.
pub fn load(path: &Path) -> Result<Option<CacheDocument>, CacheError> {
  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
    Err(source) => {
      return Err(CacheError::Read {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  let document = serde_json::from_str(&content).map_err(|source| CacheError::Parse {
    path: path.to_path_buf(),
    source,
  })?;
  Ok(Some(document))
}

/// Write `document` to `path` atomically.
pub fn save(path: &Path, document: &CacheDocument) -> Result<(), CacheError> {
  prepare_file_path(path, true)?;

  // serde_json's default map keeps keys ordered, so a round trip through Value sorts them.
  let value = serde_json::to_value(document).map_err(CacheError::Serialize)?;
  let content = serde_json::to_string_pretty(&value).map_err(CacheError::Serialize)?;

  let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
  temp_name.push(".tmp");
  let temp_path = path.with_file_name(temp_name);

  let write_err = |source| CacheError::Write {
    path: path.to_path_buf(),
    source,
  };
  fs::write(&temp_path, &content).map_err(write_err)?;
  fs::rename(&temp_path, path).map_err(write_err)?;

  Ok(())
}
