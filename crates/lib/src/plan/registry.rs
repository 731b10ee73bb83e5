//! Fixed strategy registry.
//!
//! A handful of packages do not follow the plain `configure && make && make
//! install` recipe. Their strategy is fixed here by package name and takes
//! precedence over whatever a plan declares.

use crate::platform::Os;

use super::types::StrategyKind;

/// The strategy registered for `name`, if any.
pub fn registered_strategy(name: &str) -> Option<StrategyKind> {
  match name {
    "bz2" => Some(StrategyKind::SharedLibrary {
      makefile: "Makefile-libbz2_so".to_string(),
      library: "libbz2.so".to_string(),
      platform: Os::Linux,
    }),
    "libdeflate" => Some(StrategyKind::PrebuiltArchive {
      archive: "libdeflate.a".to_string(),
      header: "libdeflate.h".to_string(),
      shared_object: "libdeflate.so".to_string(),
      platform: Os::Linux,
    }),
    "rapidjson" => Some(StrategyKind::HeaderOnly {
      include_dir: "include".to_string(),
    }),
    "samtools" => Some(StrategyKind::ConfigureWith {
      flag: "--with-htslib".to_string(),
    }),
    "zlib" | "xz" | "htslib" | "pheniqs" => Some(StrategyKind::Make),
    _ => None,
  }
}
