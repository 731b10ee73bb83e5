//! Implementation of `depbuild presets`.

use anyhow::{Context, Result};
use serde::Serialize;

use depbuild_lib::plan::{Catalogue, PlanSpec};

use crate::output::{OutputFormat, print_field, print_json, print_preset};

#[derive(Debug, Serialize)]
struct PresetEntry<'a> {
  name: &'a str,
  home: Option<&'a str>,
  packages: Vec<&'a str>,
}

impl<'a> PresetEntry<'a> {
  fn new(name: &'a str, spec: &'a PlanSpec) -> Self {
    Self {
      name,
      home: spec.home.as_deref(),
      packages: spec.packages.iter().map(|p| p.name.as_str()).collect(),
    }
  }
}

/// List the built-in presets and the packages each one builds.
pub fn cmd_presets(format: OutputFormat) -> Result<()> {
  let catalogue = Catalogue::builtin().context("Failed to load built-in presets")?;
  let entries: Vec<_> = catalogue
    .presets
    .iter()
    .map(|(name, spec)| PresetEntry::new(name, spec))
    .collect();

  if format.is_json() {
    return print_json(&entries);
  }

  for entry in &entries {
    print_preset(entry.name);
    print_field("Packages", &entry.packages.join(", "));
  }
  if let Some(tracking) = &catalogue.revision_tracking {
    println!();
    print_field("Revision tracked", &format!("{} ({})", tracking.package, tracking.url_prefix));
  }

  Ok(())
}
