//! Test utilities for depbuild-lib.
//!
//! Fixture archives are built in memory so tests never depend on network
//! access, and helpers report whether optional host tools are present.

use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;

/// Build a gzip-compressed tarball whose entries all live under `root/`.
///
/// Entries named `configure` are marked executable.
pub fn tar_gz(root: &str, files: &[(&str, &str)]) -> Vec<u8> {
  let encoder = GzEncoder::new(Vec::new(), Compression::default());
  let mut builder = tar::Builder::new(encoder);

  for (name, content) in files {
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(if name.ends_with("configure") { 0o755 } else { 0o644 });
    header.set_cksum();
    builder
      .append_data(&mut header, format!("{}/{}", root, name), content.as_bytes())
      .unwrap();
  }

  let encoder = builder.into_inner().unwrap();
  let mut bytes = encoder.finish().unwrap();
  bytes.flush().unwrap();
  bytes
}

/// Whether `program` resolves to an executable on `PATH`.
pub fn tool_available(program: &str) -> bool {
  std::env::var_os("PATH")
    .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
    .unwrap_or(false)
}

/// Whether the tests run with an effective uid of 0, which bypasses permission checks.
#[cfg(unix)]
pub fn running_as_root() -> bool {
  rustix::process::geteuid().is_root()
}

#[cfg(not(unix))]
pub fn running_as_root() -> bool {
  false
}

/// Remove write permission from `path` (unix only).
#[cfg(unix)]
pub fn make_read_only(path: &Path) {
  use std::os::unix::fs::PermissionsExt;
  std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o555)).unwrap();
}

#[cfg(not(unix))]
pub fn make_read_only(path: &Path) {
  let mut perms = std::fs::metadata(path).unwrap().permissions();
  perms.set_readonly(true);
  std::fs::set_permissions(path, perms).unwrap();
}
