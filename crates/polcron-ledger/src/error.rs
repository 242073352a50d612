//! # Ledger Error Types

use std::path::PathBuf;

use polcron_core::{AttributeName, SourceId};
use thiserror::Error;

/// Errors from ledger storage and file removal.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A generated file could not be removed (other than already missing).
    #[error("cannot remove generated file {path}: {source}")]
    RemoveFile {
        /// File that could not be removed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The ledger file could not be read or written.
    #[error("ledger I/O error on {path}: {source}")]
    Io {
        /// Ledger file or directory.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The ledger file is not valid JSON of the expected shape.
    #[error("ledger file {path} is corrupt: {source}")]
    Corrupt {
        /// Ledger file.
        path: PathBuf,
        /// Decoder diagnostic.
        #[source]
        source: serde_json::Error,
    },

    /// The ledger file was written by an incompatible format version.
    #[error("ledger file {path} has unsupported format version {found}")]
    UnsupportedVersion {
        /// Ledger file.
        path: PathBuf,
        /// Version found in the file.
        found: u32,
    },

    /// The same key appears twice in a loaded ledger file.
    #[error("ledger file {path} holds two records for {source_id}/{attribute}")]
    DuplicateRecord {
        /// Ledger file.
        path: PathBuf,
        /// Duplicated source.
        source_id: SourceId,
        /// Duplicated attribute.
        attribute: AttributeName,
    },

    /// A record would claim a path another record already owns.
    #[error("{path} is already claimed by {owner_source}/{owner_attribute}")]
    PathClaimed {
        /// Contested path.
        path: PathBuf,
        /// Source of the existing owner.
        owner_source: SourceId,
        /// Attribute of the existing owner.
        owner_attribute: AttributeName,
    },
}

/// Failure of [`crate::AttributeLedger::apply`].
#[derive(Error, Debug)]
pub enum ApplyError<E>
where
    E: std::error::Error + 'static,
{
    /// The materializer failed; nothing was committed.
    #[error("materialization failed: {0}")]
    Materialize(#[source] E),

    /// The ledger could not commit the new record.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
