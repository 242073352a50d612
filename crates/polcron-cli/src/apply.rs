//! # Apply Subcommand
//!
//! Runs one reconciliation pass against the durable ledger and prints the
//! pass report as YAML.
//!
//! ```bash
//! polcron apply --source '{31B2F340-016D-11D2-945F-00C04FB984F9}=/var/lib/sysvol/gpo1' \
//!               --removed '{6AC1786C-016F-11D2-945F-00C04FB984F9}'
//! ```

use anyhow::{Context, Result};
use clap::Args;

use polcron_core::SourceId;
use polcron_scripts::{PassReport, PolicySource, EXTENSION_NAME};

use crate::config::Settings;

/// Arguments for `polcron apply`.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Present source as `ID=DIR`, or `ID` for a source with no payload location.
    #[arg(long = "source", value_name = "ID[=DIR]", value_parser = parse_source)]
    pub sources: Vec<PolicySource>,

    /// Source reported removed since the last pass.
    #[arg(long = "removed", value_name = "ID")]
    pub removed: Vec<SourceId>,
}

/// Parse `ID=DIR` or `ID`.
pub fn parse_source(arg: &str) -> Result<PolicySource, String> {
    let (id, dir) = match arg.split_once('=') {
        Some((id, dir)) => (id, Some(dir)),
        None => (arg, None),
    };
    let id = SourceId::new(id).map_err(|e| e.to_string())?;
    match dir.map(str::trim) {
        Some("") => Err(format!("empty directory for source {id}")),
        Some(dir) => Ok(PolicySource::new(id, dir)),
        None => Ok(PolicySource::without_path(id)),
    }
}

/// Execute `polcron apply`.
///
/// Returns exit code: 0 when every source reconciled cleanly, 1 when any
/// source or category failed.
pub fn run_apply(args: &ApplyArgs, settings: &Settings) -> Result<u8> {
    let mut ledger = settings.open_ledger()?;
    let reconciler = settings.reconciler();

    tracing::info!(extension = EXTENSION_NAME, ledger = %ledger.path().display(), "processing policy");
    let report = reconciler.process(&mut ledger, &args.removed, &args.sources);
    print_report(&report)?;

    if report.has_failures() {
        tracing::warn!("reconciliation finished with failures");
        return Ok(1);
    }
    Ok(0)
}

fn print_report(report: &PassReport) -> Result<()> {
    let yaml = serde_yaml::to_string(report).context("failed to render pass report")?;
    print!("{yaml}");
    Ok(())
}
