/// Application name, used for the default home directory.
pub const APP_NAME: &str = "depbuild";

/// Default home directory for plans that do not declare one.
pub const DEFAULT_HOME: &str = "~/.depbuild";

/// Cache document file name inside the home directory.
pub const CACHE_FILENAME: &str = "cache.json";

/// Append-only log of child process standard output, inside the home directory.
pub const STDOUT_LOG_FILENAME: &str = "output";

/// Append-only log of child process standard error, inside the home directory.
pub const STDERR_LOG_FILENAME: &str = "error";

/// Revision used when a preset is requested without one.
pub const DEFAULT_REVISION: &str = "HEAD";
