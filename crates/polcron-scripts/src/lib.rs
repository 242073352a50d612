//! # polcron-scripts — Policy Script Reconciliation
//!
//! Turns script bodies published under the `<Period> Scripts` policy keys
//! into executable files in the matching cron directories, and keeps those
//! directories in line with policy as sources change or disappear.
//!
//! ## Architecture
//!
//! - **Sections** (`sections.rs`): the category map, registry key to
//!   schedule bucket and target directory.
//! - **Extract** (`extract.rs`): groups a payload's non-blank bodies per
//!   recognized key, in declaration order.
//! - **Materialize** (`materialize.rs`): writes one owner-only executable
//!   per body under a unique `gp_` name.
//! - **Reconcile** (`reconcile.rs`): withdrawal, declaration and orphan
//!   cleanup over an [`polcron_ledger::AttributeLedger`].
//! - **Rsop** (`rsop.rs`): read-only snapshot of what a source declares.
//!
//! ## Crate Policy
//!
//! - The ledger attribute for a category is its full registry key.
//! - Every generated file belongs to exactly one ledger record; nothing in
//!   this crate deletes a file the ledger does not list.

pub mod error;
pub mod extract;
pub mod materialize;
pub mod reconcile;
pub mod rsop;
pub mod sections;

use polcron_core::ExtensionId;

pub use error::ReconcileError;
pub use extract::{extract, extract_display, CategoryBucket};
pub use materialize::{render_script, MaterializeError, ScriptBatch, SCRIPT_HEADER, SCRIPT_PREFIX};
pub use reconcile::{
    Failure, PassReport, PolicySource, Reconciler, SourceReport, SourceStatus, DEFAULT_PAYLOAD_FILE,
};
pub use rsop::snapshot;
pub use sections::{CategoryDirectories, CategoryMap, CategoryTarget, DEFAULT_POLICY_ROOT};

/// Display name of this extension in registries, logs and reports.
pub const EXTENSION_NAME: &str = "Unix Settings/Scripts";

/// Registry module name recorded when the extension is registered.
pub const EXTENSION_MODULE: &str = "polcron_scripts";

/// Fixed identifier of this extension: `{5930022C-94FF-4ED5-A403-CFB4549DB6F0}`.
pub const EXTENSION_ID: ExtensionId = ExtensionId::from_u128(0x5930022C_94FF_4ED5_A403_CFB4549DB6F0);
