//! Implementation of `depbuild build`, `depbuild clean` and `depbuild clean.package`.
//!
//! All three resolve a plan, run one action over every package in declaration
//! order and print a summary. A stop signal lets the current step finish,
//! saves progress and exits successfully.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, warn};

use depbuild_lib::execute::{Action, Interrupt, Orchestrator, RunOutcome, RunRequest, RunSummary};
use depbuild_lib::plan::PlanSource;

use crate::output::{
  OutputFormat, format_elapsed, package_line, print_done, print_field, print_json, print_stopped, short_digest,
};

/// Which plan to run.
#[derive(Debug, Args)]
pub struct PlanArgs {
  /// Plan file to run instead of a preset
  #[arg(long, value_name = "PATH")]
  pub config: Option<PathBuf>,

  /// Built-in preset to run
  #[arg(short, long, value_name = "PRESET", default_value = "static", conflicts_with = "config")]
  pub preset: String,
}

impl PlanArgs {
  fn source(&self, revision: Option<String>) -> PlanSource {
    match &self.config {
      Some(path) => PlanSource::File(path.clone()),
      None => PlanSource::Preset {
        name: self.preset.clone(),
        revision,
      },
    }
  }
}

/// Run `action` over the selected plan.
pub fn cmd_run(
  action: Action,
  plan: &PlanArgs,
  revision: Option<String>,
  home: Option<PathBuf>,
  format: OutputFormat,
) -> Result<()> {
  let request = RunRequest {
    action,
    source: plan.source(revision),
    home,
  };

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let started = Instant::now();
  let outcome = rt.block_on(async {
    let interrupt = Interrupt::new();
    watch_signals(interrupt.clone());
    Orchestrator::new(interrupt).run(&request).await
  });
  let outcome = outcome.with_context(|| format!("{} failed", action))?;

  match outcome {
    RunOutcome::Completed(summary) => {
      if format.is_json() {
        print_json(&summary)?;
      } else {
        print_summary(&summary, started);
      }
    }
    RunOutcome::Interrupted => {
      if format.is_json() {
        print_json(&serde_json::json!({ "action": action, "interrupted": true }))?;
      } else {
        print_stopped(&format!("{} interrupted; progress up to the last finished step is saved", action));
      }
    }
  }

  Ok(())
}

/// Trigger `interrupt` on SIGINT, and on SIGTERM where there is one.
fn watch_signals(interrupt: Interrupt) {
  tokio::spawn(async move {
    if let Err(err) = wait_for_stop().await {
      debug!(error = %err, "signal listener unavailable");
      return;
    }
    warn!("stop requested, finishing the current step");
    interrupt.trigger();
  });
}

#[cfg(unix)]
async fn wait_for_stop() -> std::io::Result<()> {
  use tokio::signal::unix::{SignalKind, signal};

  let mut terminate = signal(SignalKind::terminate())?;
  tokio::select! {
    result = tokio::signal::ctrl_c() => result,
    _ = terminate.recv() => Ok(()),
  }
}

#[cfg(not(unix))]
async fn wait_for_stop() -> std::io::Result<()> {
  tokio::signal::ctrl_c().await
}

fn print_summary(summary: &RunSummary, started: Instant) {
  print_done(&format!("{} complete: {}", summary.action, summary.plan));
  for package in &summary.packages {
    println!("{}", package_line(&package.display_name, package.outcome, &package.digest));
  }
  println!();
  print_field("Home", &summary.home.display().to_string());
  print_field("Plan", short_digest(&summary.plan_id));
  print_field("Commands run", &summary.commands_run.to_string());
  print_field("Elapsed", &format_elapsed(started.elapsed()));
}
