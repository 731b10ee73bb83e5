//! Host platform: operating system detection and filesystem path handling.

pub mod os;
pub mod paths;

pub use os::Os;
pub use paths::{PathError, ensure_writable_ancestor, expand_path, prepare_directory, prepare_file_path};
