//! In-process install steps: file copies, tree copies and versioned library links.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::execute::BuildError;
use crate::platform::prepare_directory;

fn copy_failed(from: &Path, to: &Path, source: io::Error) -> BuildError {
  BuildError::CopyFailed {
    from: from.to_path_buf(),
    to: to.to_path_buf(),
    source,
  }
}

/// Copy the file `src` into the directory `dest_dir`, keeping its name.
pub fn copy_into(src: &Path, dest_dir: &Path) -> Result<PathBuf, BuildError> {
  prepare_directory(dest_dir)?;
  let name = src
    .file_name()
    .ok_or_else(|| copy_failed(src, dest_dir, io::Error::new(io::ErrorKind::InvalidInput, "no file name")))?;
  let dest = dest_dir.join(name);

  debug!(from = ?src, to = ?dest, "copying file");
  fs::copy(src, &dest).map_err(|e| copy_failed(src, &dest, e))?;
  Ok(dest)
}

/// Recursively copy the contents of `src` into `dest`, merging with what is there.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<usize, BuildError> {
  if !src.is_dir() {
    return Err(copy_failed(src, dest, io::Error::new(io::ErrorKind::NotFound, "source directory missing")));
  }
  prepare_directory(dest)?;
  let mut copied = 0;

  for entry in WalkDir::new(src).min_depth(1) {
    let entry = entry.map_err(|e| copy_failed(src, dest, e.into()))?;
    let relative = entry
      .path()
      .strip_prefix(src)
      .map_err(|_| copy_failed(entry.path(), dest, io::Error::other("entry outside source tree")))?;
    let target = dest.join(relative);

    if entry.file_type().is_dir() {
      fs::create_dir_all(&target).map_err(|e| copy_failed(entry.path(), &target, e))?;
    } else {
      fs::copy(entry.path(), &target).map_err(|e| copy_failed(entry.path(), &target, e))?;
      copied += 1;
    }
  }

  debug!(from = ?src, to = ?dest, files = copied, "copied tree");
  Ok(copied)
}

/// Link every shorter version name of `<library>.<version>` to the full one.
///
/// For `libbz2.so` at `1.0.8` this creates `libbz2.so.1.0` and `libbz2.so.1`,
/// both pointing at `libbz2.so.1.0.8`. Existing links are replaced.
#[cfg(unix)]
pub fn link_versions(lib_dir: &Path, library: &str, version: &str) -> Result<Vec<PathBuf>, BuildError> {
  let full = format!("{}.{}", library, version);
  let parts: Vec<&str> = version.split('.').collect();
  let mut links = Vec::new();

  for len in (1..parts.len()).rev() {
    let link = lib_dir.join(format!("{}.{}", library, parts[..len].join(".")));
    if link.symlink_metadata().is_ok() {
      fs::remove_file(&link).map_err(|e| copy_failed(Path::new(&full), &link, e))?;
    }
    debug!(link = ?link, target = %full, "linking");
    std::os::unix::fs::symlink(&full, &link).map_err(|e| copy_failed(Path::new(&full), &link, e))?;
    links.push(link);
  }

  Ok(links)
}

#[cfg(not(unix))]
pub fn link_versions(_lib_dir: &Path, _library: &str, _version: &str) -> Result<Vec<PathBuf>, BuildError> {
  Ok(Vec::new())
}
