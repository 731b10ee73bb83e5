//! Terminal rendering of run summaries and preset listings.
//!
//! Text mode prints one marked line per package followed by indented run
//! facts; `--output json` prints the serialized summary instead and nothing
//! else goes to stdout.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use depbuild_lib::execute::PackageOutcome;
use depbuild_lib::util::hash::ObjectHash;

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

/// Line markers.
pub mod markers {
  pub const DONE: &str = "✓";
  pub const STOPPED: &str = "⚠";
  pub const PRESET: &str = "•";

  pub const INSTALLED: &str = "+";
  pub const UP_TO_DATE: &str = "=";
  pub const CLEANED: &str = "~";
  pub const REMOVED: &str = "-";
}

pub fn outcome_marker(outcome: PackageOutcome) -> &'static str {
  match outcome {
    PackageOutcome::Installed => markers::INSTALLED,
    PackageOutcome::AlreadyInstalled => markers::UP_TO_DATE,
    PackageOutcome::Cleaned => markers::CLEANED,
    PackageOutcome::Removed => markers::REMOVED,
  }
}

/// First 12 hex digits of a descriptor or plan digest.
pub fn short_digest(digest: &ObjectHash) -> &str {
  let len = digest.0.len().min(12);
  &digest.0[..len]
}

/// Wall-clock time of a run, coarsening as it grows.
pub fn format_elapsed(elapsed: Duration) -> String {
  let secs = elapsed.as_secs();

  match secs {
    0 => format!("{}ms", elapsed.subsec_millis()),
    1..60 => format!("{}.{:02}s", secs, elapsed.subsec_millis() / 10),
    60..3600 => format!("{}m {}s", secs / 60, secs % 60),
    _ => format!("{}h {}m", secs / 3600, (secs % 3600) / 60),
  }
}

/// `  + zlib 1.2.11 installed (3f2a9c01b7de)`
pub fn package_line(display_name: &str, outcome: PackageOutcome, digest: &ObjectHash) -> String {
  format!(
    "  {} {} {} ({})",
    outcome_marker(outcome),
    display_name,
    outcome.as_str(),
    short_digest(digest)
  )
}

pub fn print_done(message: &str) {
  println!(
    "{} {}",
    markers::DONE.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

/// Stop notices go to stderr with the log lines that explain them.
pub fn print_stopped(message: &str) {
  eprintln!(
    "{} {}",
    markers::STOPPED.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_preset(name: &str) {
  println!(
    "{} {}",
    markers::PRESET.if_supports_color(Stream::Stdout, |s| s.blue()),
    name.if_supports_color(Stream::Stdout, |s| s.bold())
  );
}

pub fn print_field(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to encode output as JSON")?;
  println!("{}", json);
  Ok(())
}
