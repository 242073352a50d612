//! # polcron-cli — Policy Script Reconciliation CLI
//!
//! Provides the `polcron` command-line interface over the reconciliation
//! core.
//!
//! ## Subcommands
//!
//! - `polcron apply` — one reconciliation pass over removed and present sources.
//! - `polcron rsop` — what a single source declares, without applying it.
//! - `polcron ledger` — recorded attributes, hashes and generated files.
//! - `polcron compile` — YAML manifest to `Registry.pol`.
//! - `polcron register` / `unregister` / `list` — extension registration.
//!
//! ```bash
//! polcron -v apply --source gpo1=/var/lib/sysvol/gpo1 --removed gpo0
//! polcron rsop /var/lib/sysvol/gpo1
//! polcron --config /etc/polcron.yaml register
//! ```

pub mod apply;
pub mod compile;
pub mod config;
pub mod extension;
pub mod ledger;
pub mod rsop;

pub use config::Settings;
