mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::CompileArgs;
use output::EmitTarget;

/// devgen - Generate device setup code from YAML configuration
#[derive(Parser)]
#[command(name = "devgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile a configuration into setup code
  Compile {
    /// Path to the configuration file
    config: PathBuf,

    /// Write generated code here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: EmitTarget,

    /// Stop scheduling components after the first error
    #[arg(long)]
    fail_fast: bool,

    /// Do not check that required components are configured
    #[arg(long)]
    skip_requirements: bool,

    /// Print the build report as JSON
    #[arg(long, requires = "out")]
    json: bool,
  },

  /// Show the build tasks for a configuration without generating code
  Plan {
    /// Path to the configuration file
    config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Print the dependency graph in Graphviz DOT format
  Graph {
    /// Path to the configuration file
    config: PathBuf,
  },

  /// List the known components
  Components {
    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Compile {
      config,
      out,
      format,
      fail_fast,
      skip_requirements,
      json,
    } => cmd::cmd_compile(&CompileArgs {
      config,
      out,
      format,
      fail_fast,
      skip_requirements,
      json,
    }),
    Commands::Plan { config, json } => cmd::cmd_plan(&config, cli.verbose, json),
    Commands::Graph { config } => cmd::cmd_graph(&config),
    Commands::Components { json } => cmd::cmd_components(json),
  }
}
