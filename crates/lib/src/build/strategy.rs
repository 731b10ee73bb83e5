//! Per-package build strategies.
//!
//! [`BuildStrategy`] maps each lifecycle stage of one package to concrete
//! work according to its [`StrategyKind`]. Command construction is kept
//! separate from execution so the exact argument lists can be inspected.

use std::collections::BTreeMap;
use std::fs;

use tracing::{debug, info, warn};

use crate::archive;
use crate::cache::Stage;
use crate::execute::BuildError;
use crate::plan::{BuildLayout, PackageDescriptor, StrategyKind};
use crate::platform::prepare_directory;
use crate::process::CommandSpec;

use super::BuildContext;
use super::install::{copy_into, copy_tree, link_versions};

/// The strategy of one package.
#[derive(Debug, Clone, Copy)]
pub struct BuildStrategy<'a> {
  descriptor: &'a PackageDescriptor,
}

impl<'a> BuildStrategy<'a> {
  pub fn new(descriptor: &'a PackageDescriptor) -> Self {
    Self { descriptor }
  }

  pub fn descriptor(&self) -> &'a PackageDescriptor {
    self.descriptor
  }

  /// Do the work that reaches `stage`.
  pub async fn perform(&self, stage: Stage, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    match stage {
      Stage::Unpacked => self.unpack(ctx).await,
      Stage::Configured => self.configure(ctx).await,
      Stage::Built => self.build(ctx).await,
      Stage::Installed => self.install(ctx).await,
    }
  }

  /// Replace the extraction directory with a fresh copy of the verified archive.
  pub async fn unpack(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let d = self.descriptor;

    if d.package_path.exists() {
      debug!(path = ?d.package_path, "removing stale extraction");
      fs::remove_dir_all(&d.package_path).map_err(|source| BuildError::Io {
        path: d.package_path.clone(),
        source,
      })?;
    }

    ctx
      .downloader
      .acquire(&d.name, &d.mirrors, d.checksum.as_ref(), &d.download_path)
      .await?;

    prepare_directory(&ctx.layout.package_prefix)?;
    archive::extract(ctx.runner, d.compression, &d.download_path, &ctx.layout.package_prefix).await?;
    Ok(())
  }

  pub async fn configure(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    match &self.descriptor.strategy {
      StrategyKind::HeaderOnly { .. } => Ok(()),
      _ => self.generic_configure(ctx).await,
    }
  }

  pub async fn build(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    match &self.descriptor.strategy {
      StrategyKind::HeaderOnly { .. } => Ok(()),
      StrategyKind::SharedLibrary {
        makefile,
        library,
        platform,
      } => {
        if *platform == ctx.platform {
          self.build_shared_library(makefile, library, ctx).await?;
        }
        self.generic_build(ctx).await
      }
      _ => self.generic_build(ctx).await,
    }
  }

  pub async fn install(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let d = self.descriptor;
    match &d.strategy {
      StrategyKind::HeaderOnly { include_dir } => {
        let copied = copy_tree(&d.package_path.join(include_dir), &ctx.layout.include_prefix)?;
        info!(package = %d.name, files = copied, "installed headers");
        Ok(())
      }
      StrategyKind::PrebuiltArchive {
        archive,
        header,
        shared_object,
        platform,
      } => {
        copy_into(&d.package_path.join(archive), &ctx.layout.lib_prefix)?;
        copy_into(&d.package_path.join(header), &ctx.layout.include_prefix)?;
        if *platform == ctx.platform {
          copy_into(&d.package_path.join(shared_object), &ctx.layout.lib_prefix)?;
        }
        Ok(())
      }
      _ => self.generic_install(ctx).await,
    }
  }

  /// Run the package's clean target, if it has a makefile to run it with.
  ///
  /// Resetting progress is left to the caller.
  pub async fn clean(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    if let Some(command) = clean_command(self.descriptor, ctx.layout) {
      ctx.runner.run(&command).await?;
    }
    Ok(())
  }

  async fn generic_configure(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    if !self.descriptor.package_path.join("configure").is_file() {
      debug!(package = %self.descriptor.name, "no configure script, nothing to configure");
      return Ok(());
    }
    ctx.runner.run(&configure_command(self.descriptor, ctx.layout)).await?;
    Ok(())
  }

  async fn generic_build(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    ctx.runner.run(&build_command(self.descriptor, ctx.layout)).await?;
    Ok(())
  }

  async fn generic_install(&self, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    ctx.runner.run(&install_command(self.descriptor, ctx.layout)).await?;
    Ok(())
  }

  async fn build_shared_library(
    &self,
    makefile: &str,
    library: &str,
    ctx: &mut BuildContext<'_>,
  ) -> Result<(), BuildError> {
    let d = self.descriptor;
    ctx.runner.run(&shared_library_command(d, ctx.layout, makefile)).await?;

    let Some(version) = d.version.as_deref() else {
      warn!(package = %d.name, "no version known, skipping shared library install");
      return Ok(());
    };

    let versioned = format!("{}.{}", library, version);
    copy_into(&d.package_path.join(&versioned), &ctx.layout.lib_prefix)?;
    link_versions(&ctx.layout.lib_prefix, library, version)?;
    Ok(())
  }
}

/// Environment for every make-family command.
pub fn make_env(layout: &BuildLayout) -> BTreeMap<String, String> {
  BTreeMap::from([
    (
      "CFLAGS".to_string(),
      format!("-I{}", layout.include_prefix.to_string_lossy()),
    ),
    (
      "LDFLAGS".to_string(),
      format!("-L{}", layout.lib_prefix.to_string_lossy()),
    ),
  ])
}

fn prefix_arg(layout: &BuildLayout) -> String {
  format!("PREFIX={}", layout.install_prefix.to_string_lossy())
}

fn make_command(d: &PackageDescriptor, layout: &BuildLayout) -> CommandSpec {
  CommandSpec::new("make").cwd(&d.package_path).envs(&make_env(layout))
}

fn with_prefix(command: CommandSpec, d: &PackageDescriptor, layout: &BuildLayout) -> CommandSpec {
  if d.make.prefix_in_make {
    command.arg(prefix_arg(layout))
  } else {
    command
  }
}

/// `<package>/configure --prefix=<install> [flags]`, plus the injected flag for flag-injecting strategies.
pub fn configure_command(d: &PackageDescriptor, layout: &BuildLayout) -> CommandSpec {
  let script = d.package_path.join("configure");
  let mut command = CommandSpec::new(script.to_string_lossy())
    .cwd(&d.package_path)
    .envs(&make_env(layout))
    .arg(format!("--prefix={}", layout.install_prefix.to_string_lossy()))
    .args(d.make.configure_flags.iter().cloned());

  if let StrategyKind::ConfigureWith { flag } = &d.strategy {
    command = command.arg(format!("{}={}", flag, layout.install_prefix.to_string_lossy()));
  }
  command
}

/// `make [target] [PREFIX=<install>] [flags]`
pub fn build_command(d: &PackageDescriptor, layout: &BuildLayout) -> CommandSpec {
  let command = make_command(d, layout).args(d.make.build_target.iter().cloned());
  with_prefix(command, d, layout).args(d.make.build_flags.iter().cloned())
}

/// `make <install target> [PREFIX=<install>] [flags]`
pub fn install_command(d: &PackageDescriptor, layout: &BuildLayout) -> CommandSpec {
  let command = make_command(d, layout).arg(d.make.install_target.clone());
  with_prefix(command, d, layout).args(d.make.build_flags.iter().cloned())
}

/// `make --file <makefile> [PREFIX=<install>]`
pub fn shared_library_command(d: &PackageDescriptor, layout: &BuildLayout, makefile: &str) -> CommandSpec {
  with_prefix(make_command(d, layout).args(["--file", makefile]), d, layout)
}

/// `make <clean target> [PREFIX=<install>]`, when a makefile and a clean target exist.
pub fn clean_command(d: &PackageDescriptor, layout: &BuildLayout) -> Option<CommandSpec> {
  let target = d.make.clean_target.as_deref()?;
  if !d.package_path.join("Makefile").is_file() {
    return None;
  }
  Some(with_prefix(make_command(d, layout).arg(target), d, layout))
}
