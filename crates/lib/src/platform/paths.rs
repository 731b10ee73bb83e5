//! Filesystem path handling.
//!
//! Directory preparation walks a path's ancestor chain looking for the nearest
//! directory that already exists. Missing directories are only ever created
//! beneath an ancestor the current user can write to; an existing ancestor that
//! is not writable stops the walk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PathError {
  #[error("permission denied: {0} is not writable")]
  PermissionDenied(PathBuf),

  #[error("refusing to overwrite existing file {0}")]
  NoOverwrite(PathBuf),

  #[error("failed to create directory {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Returns the user's home directory, if `HOME` (or `USERPROFILE`) is set.
pub fn home_dir() -> Option<PathBuf> {
  #[cfg(windows)]
  let var = "USERPROFILE";
  #[cfg(not(windows))]
  let var = "HOME";

  std::env::var_os(var).filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Expand `~` and environment variables in `raw` and make the result absolute.
///
/// Variables that are not set are left in place.
pub fn expand_path(raw: &str) -> PathBuf {
  let expanded = shellexpand::full_with_context_no_errors(
    raw,
    || home_dir().map(|p| p.to_string_lossy().into_owned()),
    |var: &str| std::env::var(var).ok(),
  );
  let path = PathBuf::from(expanded.as_ref());
  std::path::absolute(&path).unwrap_or(path)
}

#[cfg(unix)]
fn is_writable(path: &Path) -> bool {
  rustix::fs::access(path, rustix::fs::Access::WRITE_OK).is_ok()
}

#[cfg(not(unix))]
fn is_writable(path: &Path) -> bool {
  fs::metadata(path).map(|m| !m.permissions().readonly()).unwrap_or(false)
}

/// Find the nearest ancestor of `path` (including `path` itself) that exists and is writable.
///
/// Missing ancestors are skipped. The first ancestor that exists but is not
/// writable fails the walk with [`PathError::PermissionDenied`].
pub fn ensure_writable_ancestor(path: &Path) -> Result<PathBuf, PathError> {
  for ancestor in path.ancestors() {
    let candidate = if ancestor.as_os_str().is_empty() {
      Path::new(".")
    } else {
      ancestor
    };

    if !candidate.exists() {
      continue;
    }

    if is_writable(candidate) {
      return Ok(candidate.to_path_buf());
    }

    return Err(PathError::PermissionDenied(candidate.to_path_buf()));
  }

  Err(PathError::PermissionDenied(path.to_path_buf()))
}

/// Make sure the directory `path` exists, creating the missing chain below its writable ancestor.
pub fn prepare_directory(path: &Path) -> Result<(), PathError> {
  let available = ensure_writable_ancestor(path)?;
  if available != path {
    debug!(path = ?path, "creating directory");
    fs::create_dir_all(path).map_err(|source| PathError::CreateDir {
      path: path.to_path_buf(),
      source,
    })?;
  }
  Ok(())
}

/// Prepare the parent directory of the file `path` for writing.
///
/// Fails with [`PathError::NoOverwrite`] when the file already exists and
/// `overwrite` is false.
pub fn prepare_file_path(path: &Path, overwrite: bool) -> Result<(), PathError> {
  let parent = path
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .unwrap_or(Path::new("."));
  let available = ensure_writable_ancestor(parent)?;

  if path.exists() {
    if !overwrite {
      return Err(PathError::NoOverwrite(path.to_path_buf()));
    }
  } else if available != parent {
    debug!(path = ?parent, "creating directory");
    fs::create_dir_all(parent).map_err(|source| PathError::CreateDir {
      path: parent.to_path_buf(),
      source,
    })?;
  }
  Ok(())
}
