//! Archive extraction.
//!
//! Extraction shells out to the host's `tar` and `unzip`, chosen purely by the
//! package's declared compression kind, and runs inside the package prefix so
//! the archive's top-level directory lands there.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::process::{CommandRunner, CommandSpec, ProcessError};

/// Compression kind of a source archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
  #[serde(alias = "gzip", alias = "tgz")]
  Gz,
  #[serde(alias = "bzip2")]
  Bz2,
  Zip,
}

impl Compression {
  /// Map a filename extension (without the dot) to a compression kind.
  pub fn from_extension(ext: &str) -> Option<Self> {
    match ext.to_ascii_lowercase().as_str() {
      "gz" | "tgz" => Some(Compression::Gz),
      "bz2" | "tbz2" => Some(Compression::Bz2),
      "zip" => Some(Compression::Zip),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Compression::Gz => "gz",
      Compression::Bz2 => "bz2",
      Compression::Zip => "zip",
    }
  }
}

impl fmt::Display for Compression {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// The command that unpacks `archive` into `dest_dir`.
pub fn extract_command(compression: Compression, archive: &Path, dest_dir: &Path) -> CommandSpec {
  let archive = archive.to_string_lossy().into_owned();
  let spec = match compression {
    Compression::Gz => CommandSpec::new("tar").args(["-x", "-z", "-f"]).arg(archive),
    Compression::Bz2 => CommandSpec::new("tar").args(["-x", "-j", "-f"]).arg(archive),
    Compression::Zip => CommandSpec::new("unzip").arg("-o").arg(archive),
  };
  spec.cwd(dest_dir)
}

/// Extract `archive` into `dest_dir` with the host tool for `compression`.
pub async fn extract(
  runner: &mut CommandRunner,
  compression: Compression,
  archive: &Path,
  dest_dir: &Path,
) -> Result<(), ProcessError> {
  info!(archive = ?archive, compression = %compression, "extracting");
  runner.run(&extract_command(compression, archive, dest_dir)).await?;
  Ok(())
}
