//! # polcron-ledger — Attribute Ledger
//!
//! The one piece of durable mutable state the reconciler depends on. For
//! every `(source, attribute)` pair that has been applied, the ledger keeps
//! the content hash of the bodies that produced it and the exact files that
//! were generated.
//!
//! ## Primitives
//!
//! - **apply** — materialize and commit only when the stored hash differs
//!   (or nothing is stored). Replacing a record deletes the old files.
//! - **unapply** — delete a record's files (already-missing files are fine)
//!   and drop the record.
//! - **clean** — unapply every attribute of a source that is not in a keep set,
//!   carrying on past attributes whose files cannot be removed.
//!
//! ## Invariants
//!
//! - At most one record per `(source, attribute)`.
//! - No two records claim the same path; a commit that would violate this
//!   is rejected.
//! - A record is committed only after its complete path set exists. A failed
//!   materialization leaves the previous record and its files untouched.
//!
//! ## Stores
//!
//! - [`MemoryLedger`] — in-process only.
//! - [`FileLedger`] — JSON document rewritten atomically after each mutation.

pub mod error;
pub mod file;
pub mod ledger;
pub mod memory;
pub mod record;
mod table;

pub use error::{ApplyError, LedgerError};
pub use file::{FileLedger, LEDGER_FORMAT_VERSION};
pub use ledger::{ApplyOutcome, AttributeLedger, CleanOutcome, FnMaterializer, Materialize};
pub use memory::MemoryLedger;
pub use record::AttributeRecord;
