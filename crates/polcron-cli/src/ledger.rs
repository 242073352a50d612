//! # Ledger Subcommand
//!
//! Prints the recorded attributes, optionally for one source.

use anyhow::{Context, Result};
use clap::Args;

use polcron_core::SourceId;
use polcron_ledger::{AttributeLedger, AttributeRecord};

use crate::config::Settings;

/// Arguments for `polcron ledger`.
#[derive(Args, Debug)]
pub struct LedgerArgs {
    /// Only show records of this source.
    #[arg(long, value_name = "ID")]
    pub source: Option<SourceId>,
}

/// Records selected by `filter`, in ledger order.
pub fn select_records<L: AttributeLedger>(ledger: &L, filter: Option<&SourceId>) -> Vec<AttributeRecord> {
    ledger
        .records()
        .into_iter()
        .filter(|r| filter.map_or(true, |s| &r.source == s))
        .collect()
}

/// Execute `polcron ledger`.
pub fn run_ledger(args: &LedgerArgs, settings: &Settings) -> Result<u8> {
    let ledger = settings.open_ledger()?;
    let records = select_records(&ledger, args.source.as_ref());
    let yaml = serde_yaml::to_string(&records).context("failed to render ledger")?;
    print!("{yaml}");
    Ok(0)
}
