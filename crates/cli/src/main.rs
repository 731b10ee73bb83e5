mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::error;
use tracing_subscriber::EnvFilter;

use depbuild_lib::consts::APP_NAME;
use depbuild_lib::execute::Action;

use crate::cmd::{PlanArgs, cmd_presets, cmd_run};
use crate::output::OutputFormat;

/// depbuild - build a chain of C/C++ source packages into a private prefix
#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Logging verbosity; overrides RUST_LOG
  #[arg(short, long, global = true, value_enum, value_name = "LEVEL")]
  verbosity: Option<Verbosity>,

  /// Home directory for this run, replacing the one the plan declares
  #[arg(long, global = true, value_name = "DIR")]
  home: Option<PathBuf>,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Download, build and install every package of a plan
  Build {
    #[command(flatten)]
    plan: PlanArgs,

    /// Revision of the tracked package to build (presets only)
    #[arg(short = 'R', long, value_name = "REVISION", conflicts_with = "config")]
    revision: Option<String>,
  },

  /// Run each package's clean target and forget its configure/build/install progress
  Clean {
    #[command(flatten)]
    plan: PlanArgs,
  },

  /// Remove each package's unpacked source tree
  #[command(name = "clean.package")]
  CleanPackage {
    #[command(flatten)]
    plan: PlanArgs,
  },

  /// List the built-in presets
  Presets,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Verbosity {
  Debug,
  Info,
  Warning,
  Error,
  Critical,
}

impl Verbosity {
  fn directive(self) -> &'static str {
    match self {
      Verbosity::Debug => "debug",
      Verbosity::Info => "info",
      Verbosity::Warning => "warn",
      // tracing has nothing above error
      Verbosity::Error | Verbosity::Critical => "error",
    }
  }
}

fn init_logging(verbosity: Option<Verbosity>) {
  let filter = match verbosity {
    Some(level) => EnvFilter::new(level.directive()),
    None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbosity);

  let result = match cli.command {
    Commands::Build { plan, revision } => cmd_run(Action::Build, &plan, revision, cli.home, cli.output),
    Commands::Clean { plan } => cmd_run(Action::Clean, &plan, None, cli.home, cli.output),
    Commands::CleanPackage { plan } => cmd_run(Action::CleanPackage, &plan, None, cli.home, cli.output),
    Commands::Presets => cmd_presets(cli.output),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      error!("{:#}", err);
      ExitCode::FAILURE
    }
  }
}
