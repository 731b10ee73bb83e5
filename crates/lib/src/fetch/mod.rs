//! Source archive acquisition.
//!
//! The [`Downloader`] turns a package's ordered mirror list and optional
//! checksum into a verified archive at a fixed local path. A local copy is
//! only ever trusted when a checksum is declared and it matches; otherwise it
//! is discarded and fetched again. Mirrors are tried in order until one yields
//! a payload that verifies.

mod types;

pub use types::{DownloadError, FetchError};

use std::io::Write;
use std::path::Path;

use tokio::fs;
use tracing::{debug, info, warn};

use crate::platform::prepare_file_path;
use crate::util::hash::{Checksum, hash_bytes};

/// Fetches source archives over HTTP(S).
#[derive(Debug, Clone, Default)]
pub struct Downloader {
  client: reqwest::Client,
}

impl Downloader {
  pub fn new() -> Self {
    Self::default()
  }

  /// Make sure a verified copy of `package`'s archive exists at `dest`.
  ///
  /// Writes exactly one verified file or none. When every mirror fails the
  /// returned [`DownloadError::Exhausted`] carries the last failure.
  pub async fn acquire(
    &self,
    package: &str,
    mirrors: &[String],
    checksum: Option<&Checksum>,
    dest: &Path,
  ) -> Result<(), DownloadError> {
    if self.reuse_local(package, checksum, dest).await? {
      return Ok(());
    }

    let mut last = None;
    for url in mirrors {
      info!(package = %package, url = %url, "downloading");
      match self.fetch_verified(url, checksum).await {
        Ok(bytes) => {
          write_archive(dest, &bytes)?;
          info!(package = %package, path = ?dest, size = bytes.len(), "download complete");
          return Ok(());
        }
        Err(err) => {
          warn!(package = %package, error = %err, "mirror failed");
          last = Some(err);
        }
      }
    }

    Err(DownloadError::Exhausted {
      package: package.to_string(),
      last,
    })
  }

  /// Decide what to do with a file already sitting at `dest`.
  ///
  /// Returns `true` when it verifies and can be used as is. Unverifiable and
  /// corrupt copies are removed.
  async fn reuse_local(&self, package: &str, checksum: Option<&Checksum>, dest: &Path) -> Result<bool, DownloadError> {
    if !dest.exists() {
      return Ok(false);
    }

    let Some(checksum) = checksum else {
      debug!(package = %package, path = ?dest, "no checksum declared, discarding local archive");
      remove_local(dest).await?;
      return Ok(false);
    };

    let actual = digest_local(checksum, dest).await?;

    if checksum.matches(&actual) {
      info!(package = %package, path = ?dest, "using verified local archive");
      return Ok(true);
    }

    warn!(
      package = %package,
      path = ?dest,
      expected = %checksum.expected(),
      actual = %actual,
      "local archive is corrupt, removing"
    );
    remove_local(dest).await?;
    Ok(false)
  }

  async fn fetch_verified(&self, url: &str, checksum: Option<&Checksum>) -> Result<Vec<u8>, FetchError> {
    let response = self
      .client
      .get(url)
      .send()
      .await
      .map_err(|e| FetchError::from_reqwest(url, e))?;

    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status {
        url: url.to_string(),
        status: status.as_u16(),
      });
    }

    let bytes = response.bytes().await.map_err(|e| FetchError::from_reqwest(url, e))?;

    if let Some(checksum) = checksum {
      let actual = checksum.digest_bytes(&bytes);
      if !checksum.matches(&actual) {
        return Err(FetchError::ChecksumMismatch {
          url: url.to_string(),
          expected: checksum.expected().to_string(),
          actual,
        });
      }
    }

    Ok(bytes.to_vec())
  }
}

/// Stream the file at `path` through `checksum`'s digest on the blocking pool.
async fn digest_local(checksum: &Checksum, path: &Path) -> Result<String, DownloadError> {
  let read_err = |source| DownloadError::ReadLocal {
    path: path.to_path_buf(),
    source,
  };

  let owned_checksum = checksum.clone();
  let owned_path = path.to_path_buf();
  tokio::task::spawn_blocking(move || owned_checksum.digest_file(&owned_path))
    .await
    .map_err(|e| read_err(std::io::Error::other(e)))?
    .map_err(read_err)
}

async fn remove_local(path: &Path) -> Result<(), DownloadError> {
  fs::remove_file(path).await.map_err(|source| DownloadError::Write {
    path: path.to_path_buf(),
    source,
  })
}

/// Write `bytes` to `dest` through a temporary sibling file.
fn write_archive(dest: &Path, bytes: &[u8]) -> Result<(), DownloadError> {
  prepare_file_path(dest, true)?;

  let write_err = |source| DownloadError::Write {
    path: dest.to_path_buf(),
    source,
  };

  let parent = dest.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
  let mut temp = tempfile::Builder::new()
    .prefix(".download-")
    .tempfile_in(parent)
    .map_err(write_err)?;
  temp.write_all(bytes).map_err(write_err)?;
  temp.flush().map_err(write_err)?;
  temp.persist(dest).map_err(|e| write_err(e.error))?;

  Ok(())
}

/// Derive a local filename from the last path segment of `url`.
///
/// The query string is dropped and anything outside `[A-Za-z0-9._-]` becomes
/// `_`. URLs without a usable segment fall back to a name derived from the URL's hash.
pub fn url_to_filename(url: &str) -> String {
  let without_query = url.split(['?', '#']).next().unwrap_or(url);
  let after_scheme = without_query.split_once("://").map_or(without_query, |(_, rest)| rest);
  let segment = after_scheme
    .split_once('/')
    .and_then(|(_, path)| path.trim_end_matches('/').rsplit('/').next());

  if let Some(segment) = segment {
    let sanitized: String = segment
      .chars()
      .map(|c| {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
          c
        } else {
          '_'
        }
      })
      .collect();

    if !sanitized.is_empty() && sanitized != "." && sanitized != ".." {
      return sanitized;
    }
  }

  format!("download_{}", &hash_bytes::<sha2::Sha256>(url.as_bytes())[..16])
}
