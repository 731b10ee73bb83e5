//! Download error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::platform::PathError;

/// Why a single mirror failed to produce a verified archive.
#[derive(Debug, Error)]
pub enum FetchError {
  /// The server answered with a non-success status line.
  #[error("{url} answered with HTTP {status}")]
  Status { url: String, status: u16 },

  /// The response could not be read (redirect loop, truncated body, decode failure).
  #[error("protocol error fetching {url}: {message}")]
  Protocol { url: String, message: String },

  /// The mirror could not be reached at all.
  #[error("transport error fetching {url}: {message}")]
  Transport { url: String, message: String },

  #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
  ChecksumMismatch {
    url: String,
    expected: String,
    actual: String,
  },
}

impl FetchError {
  pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
    if err.is_connect() || err.is_timeout() {
      FetchError::Transport {
        url: url.to_string(),
        message: err.to_string(),
      }
    } else {
      FetchError::Protocol {
        url: url.to_string(),
        message: err.to_string(),
      }
    }
  }
}

#[derive(Debug, Error)]
pub enum DownloadError {
  /// Every mirror was tried and none produced a verified archive.
  #[error("failed to download {package} from any mirror")]
  Exhausted {
    package: String,
    #[source]
    last: Option<FetchError>,
  },

  #[error(transparent)]
  Path(#[from] PathError),

  #[error("failed to read local archive {path}: {source}")]
  ReadLocal {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write archive {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}
