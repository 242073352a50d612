//! # Reconciliation Errors

use polcron_core::{CanonicalizationError, IdentityError};
use polcron_ledger::LedgerError;
use thiserror::Error;

use crate::materialize::MaterializeError;

/// A failure confined to one source or one of its categories.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The category's bodies could not be hashed.
    #[error("content hash failed: {0}")]
    Hash(#[from] CanonicalizationError),

    /// The registry key is not a usable attribute name.
    #[error("invalid attribute: {0}")]
    Attribute(#[from] IdentityError),

    /// Scripts could not be generated; nothing was recorded.
    #[error(transparent)]
    Materialize(#[from] MaterializeError),

    /// The ledger rejected or failed to persist a change.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
