//! # Rsop Subcommand
//!
//! Prints what one source declares, keyed by short category name. Reads
//! the payload only; the ledger and cron directories are not touched.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::config::Settings;

/// Arguments for `polcron rsop`.
#[derive(Args, Debug)]
pub struct RsopArgs {
    /// Directory of the policy source.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,
}

/// Execute `polcron rsop`. A source without a usable payload prints `{}`.
pub fn run_rsop(args: &RsopArgs, settings: &Settings) -> Result<u8> {
    let snapshot = settings.reconciler().snapshot(&args.dir);
    let yaml = serde_yaml::to_string(&snapshot).context("failed to render snapshot")?;
    print!("{yaml}");
    Ok(0)
}
