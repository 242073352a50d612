//! # polcron CLI entry point
//!
//! Parses command-line arguments, loads settings, installs logging and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use polcron_cli::apply::{run_apply, ApplyArgs};
use polcron_cli::compile::{run_compile, CompileArgs};
use polcron_cli::extension::{run_list, run_register, run_unregister, RegisterArgs};
use polcron_cli::ledger::{run_ledger, LedgerArgs};
use polcron_cli::rsop::{run_rsop, RsopArgs};
use polcron_cli::Settings;

/// Reconcile cron script directories against Group Policy.
///
/// Script bodies published under the `Daily`, `Hourly`, `Weekly` and
/// `Monthly Scripts` policy keys become owner-only executables in the
/// matching cron directories. Re-running with unchanged policy is a no-op.
#[derive(Parser, Debug)]
#[command(name = "polcron", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the ledger and extension registry.
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one reconciliation pass.
    Apply(ApplyArgs),

    /// Show what a policy source declares, without applying it.
    Rsop(RsopArgs),

    /// Show recorded attributes and their generated files.
    Ledger(LedgerArgs),

    /// Compile a YAML policy manifest into a Registry.pol payload.
    Compile(CompileArgs),

    /// Register this extension with the host and list installed extensions.
    Register(RegisterArgs),

    /// Unregister this extension and list installed extensions.
    Unregister,

    /// List installed extensions.
    List,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "polcron starting");

    let mut settings = match Settings::load(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };
    if let Some(dir) = cli.state_dir {
        settings.state_dir = dir;
    }
    tracing::debug!(state_dir = %settings.state_dir.display(), "resolved state directory");

    let result = match cli.command {
        Commands::Apply(args) => run_apply(&args, &settings),
        Commands::Rsop(args) => run_rsop(&args, &settings),
        Commands::Ledger(args) => run_ledger(&args, &settings),
        Commands::Compile(args) => run_compile(&args),
        Commands::Register(args) => run_register(&args, &settings),
        Commands::Unregister => run_unregister(&settings),
        Commands::List => run_list(&settings),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
