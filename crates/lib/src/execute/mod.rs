//! Run orchestration.
//!
//! This module provides the entry point for running an action over a plan.
//! It handles:
//! - resolving the plan and preparing its directory layout
//! - loading the plan's section of the progress cache
//! - driving each package, in declaration order, through the requested action
//! - mapping a requested stop to a clean [`RunOutcome::Interrupted`]

mod interrupt;
pub mod types;

pub use interrupt::Interrupt;
pub use types::{Action, BuildError, PackageOutcome, PackageReport, RunOutcome, RunRequest, RunSummary};

use tracing::{debug, info};

use crate::build::{BuildContext, Lifecycle};
use crate::cache::{DescriptorCache, Stage};
use crate::fetch::Downloader;
use crate::plan::{BuildPlan, PackageDescriptor};
use crate::platform::prepare_directory;
use crate::process::CommandRunner;

/// Runs actions over build plans.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
  downloader: Downloader,
  interrupt: Interrupt,
}

impl Orchestrator {
  pub fn new(interrupt: Interrupt) -> Self {
    Self {
      downloader: Downloader::new(),
      interrupt,
    }
  }

  pub fn interrupt(&self) -> &Interrupt {
    &self.interrupt
  }

  /// Resolve the requested plan and run the action over it.
  pub async fn run(&self, request: &RunRequest) -> Result<RunOutcome, BuildError> {
    let plan = BuildPlan::load(&request.source, request.home.as_deref())?;
    self.run_plan(&plan, request.action).await
  }

  /// Run `action` over an already resolved plan.
  ///
  /// A failure observed after a stop was requested, or a command killed by a
  /// signal, is reported as [`RunOutcome::Interrupted`] rather than as an error.
  pub async fn run_plan(&self, plan: &BuildPlan, action: Action) -> Result<RunOutcome, BuildError> {
    match self.execute(plan, action).await {
      Ok(summary) => Ok(RunOutcome::Completed(summary)),
      Err(BuildError::Interrupted) => {
        info!(plan = %plan.label, "interrupted");
        Ok(RunOutcome::Interrupted)
      }
      Err(err) if self.interrupt.is_set() || err.killed_by_signal() => {
        debug!(error = %err, "failure while stopping");
        self.interrupt.trigger();
        info!(plan = %plan.label, "interrupted");
        Ok(RunOutcome::Interrupted)
      }
      Err(err) => Err(err),
    }
  }

  async fn execute(&self, plan: &BuildPlan, action: Action) -> Result<RunSummary, BuildError> {
    let layout = &plan.layout;
    info!(
      action = %action,
      plan = %plan.label,
      home = ?layout.home,
      packages = plan.packages.len(),
      "starting run"
    );

    for dir in [
      &layout.home,
      &layout.install_prefix,
      &layout.download_prefix,
      &layout.package_prefix,
    ] {
      prepare_directory(dir)?;
    }

    let mut cache = DescriptorCache::open(&layout.cache_path, &plan.id)?;
    let mut runner = CommandRunner::with_logs(&layout.home).await?;
    let mut reports = Vec::with_capacity(plan.packages.len());

    {
      let mut ctx = BuildContext {
        layout,
        platform: plan.platform,
        runner: &mut runner,
        downloader: &self.downloader,
        cache: &mut cache,
        interrupt: &self.interrupt,
      };

      for descriptor in &plan.packages {
        self.interrupt.check()?;
        let report = run_package(descriptor, action, &mut ctx).await?;
        ctx.cache.save()?;
        reports.push(report);
      }
    }

    cache.save()?;
    info!(action = %action, plan = %plan.label, commands = runner.invocations(), "run complete");

    Ok(RunSummary {
      action,
      plan: plan.label.clone(),
      plan_id: plan.id.clone(),
      home: layout.home.clone(),
      packages: reports,
      commands_run: runner.invocations(),
    })
  }
}

async fn run_package(
  descriptor: &PackageDescriptor,
  action: Action,
  ctx: &mut BuildContext<'_>,
) -> Result<PackageReport, BuildError> {
  let digest = ctx.cache.track(descriptor)?;
  ctx.cache.save()?;
  let lifecycle = Lifecycle::new(descriptor, digest.clone());

  let outcome = match action {
    Action::Build => {
      if lifecycle.progress(ctx).installed {
        info!(package = %descriptor.display_name, "already installed");
        PackageOutcome::AlreadyInstalled
      } else {
        lifecycle.ensure(Stage::Installed, ctx).await?;
        info!(package = %descriptor.display_name, "installed");
        PackageOutcome::Installed
      }
    }
    Action::Clean => {
      lifecycle.clean(ctx).await?;
      PackageOutcome::Cleaned
    }
    Action::CleanPackage => {
      lifecycle.clean_package(ctx).await?;
      PackageOutcome::Removed
    }
  };

  Ok(PackageReport {
    name: descriptor.name.clone(),
    display_name: descriptor.display_name.clone(),
    digest,
    outcome,
  })
}
