//! # Ledger Trait and Primitives
//!
//! `AttributeLedger` splits into two halves. Stores implement the storage
//! methods (`get`, `put`, `delete`, listing). The reconciliation primitives
//! (`apply`, `unapply`, `clean`) are provided on top of them and behave
//! identically for every store.
//!
//! The work `apply` performs when a hash changed is passed in as a
//! [`Materialize`] value, so the ledger never knows what kind of files it is
//! tracking.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use polcron_core::{AttributeName, ContentDigest, SourceId};

use crate::error::{ApplyError, LedgerError};
use crate::record::AttributeRecord;

/// Produces the files for one attribute.
///
/// Implementations must either return the complete list of files they
/// created, or fail having left no file that the caller needs to track.
pub trait Materialize {
    /// Error reported when materialization fails.
    type Error: std::error::Error + 'static;

    /// Create the files and return their paths in order.
    fn materialize(&self) -> Result<Vec<PathBuf>, Self::Error>;
}

/// Adapts a closure into a [`Materialize`] value.
pub struct FnMaterializer<F>(pub F);

impl<F, E> Materialize for FnMaterializer<F>
where
    F: Fn() -> Result<Vec<PathBuf>, E>,
    E: std::error::Error + 'static,
{
    type Error = E;

    fn materialize(&self) -> Result<Vec<PathBuf>, E> {
        (self.0)()
    }
}

/// Result of [`AttributeLedger::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The stored hash matched; nothing was touched.
    Unchanged,
    /// New files were generated and committed.
    Applied {
        /// The committed record.
        record: AttributeRecord,
        /// The record it replaced, whose files have been removed.
        previous: Option<AttributeRecord>,
    },
}

/// Result of [`AttributeLedger::clean`].
#[derive(Debug, Default)]
pub struct CleanOutcome {
    /// Attributes whose files and record are gone.
    pub reverted: Vec<AttributeName>,
    /// Attributes that could not be reverted; their records are kept.
    pub failures: Vec<(AttributeName, LedgerError)>,
}

impl CleanOutcome {
    /// Whether every attribute outside the keep set was reverted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Durable `(source, attribute)` state plus the reconciliation primitives.
pub trait AttributeLedger {
    /// Fetch the record for a key.
    fn get(&self, source: &SourceId, attribute: &AttributeName) -> Option<AttributeRecord>;

    /// Attributes recorded for a source, sorted.
    fn attributes(&self, source: &SourceId) -> Vec<AttributeName>;

    /// Sources with at least one record, sorted.
    fn sources(&self) -> Vec<SourceId>;

    /// Every record, sorted by source then attribute.
    fn records(&self) -> Vec<AttributeRecord>;

    /// Insert or replace a record, returning the replaced one.
    ///
    /// Must reject a record claiming a path owned by a different key.
    fn put(&mut self, record: AttributeRecord) -> Result<Option<AttributeRecord>, LedgerError>;

    /// Drop a record, returning it.
    fn delete(
        &mut self,
        source: &SourceId,
        attribute: &AttributeName,
    ) -> Result<Option<AttributeRecord>, LedgerError>;

    /// Materialize and commit `attribute` unless `hash` is already recorded.
    ///
    /// On success with a changed hash, the previous record's files are
    /// removed after the new record is committed. If `job` fails, the ledger
    /// and the previous files are left exactly as they were. If the commit
    /// fails, the files `job` just created are removed again.
    fn apply<M: Materialize>(
        &mut self,
        source: &SourceId,
        attribute: &AttributeName,
        hash: &ContentDigest,
        job: &M,
    ) -> Result<ApplyOutcome, ApplyError<M::Error>> {
        if let Some(existing) = self.get(source, attribute) {
            if existing.hash == *hash {
                tracing::debug!(source = %source, attribute = %attribute, "hash unchanged");
                return Ok(ApplyOutcome::Unchanged);
            }
        }

        let paths = job.materialize().map_err(ApplyError::Materialize)?;
        let record = AttributeRecord::new(source.clone(), attribute.clone(), hash.clone(), paths);

        let previous = match self.put(record.clone()) {
            Ok(previous) => previous,
            Err(e) => {
                // Never unlink a path some committed record still lists.
                let owned: BTreeSet<PathBuf> =
                    self.records().into_iter().flat_map(|r| r.paths).collect();
                for path in record.paths.iter().filter(|p| !owned.contains(*p)) {
                    if let Err(cleanup) = remove_generated(path) {
                        tracing::warn!(error = %cleanup, "could not remove uncommitted file");
                    }
                }
                return Err(e.into());
            }
        };

        if let Some(old) = &previous {
            for path in old.paths.iter().filter(|p| !record.paths.contains(p)) {
                // The replacement is committed; a leftover file is inert.
                if let Err(e) = remove_generated(path) {
                    tracing::warn!(error = %e, "could not remove replaced file");
                }
            }
        }

        tracing::info!(
            source = %source,
            attribute = %attribute,
            hash = %hash,
            files = record.paths.len(),
            "applied attribute"
        );
        Ok(ApplyOutcome::Applied { record, previous })
    }

    /// Remove an attribute's files and then its record.
    ///
    /// Files that are already gone count as removed. If any other removal
    /// fails, the record is kept so the next pass retries.
    fn unapply(
        &mut self,
        source: &SourceId,
        attribute: &AttributeName,
    ) -> Result<Option<AttributeRecord>, LedgerError> {
        let Some(record) = self.get(source, attribute) else {
            return Ok(None);
        };
        for path in &record.paths {
            remove_generated(path)?;
        }
        let removed = self.delete(source, attribute)?;
        tracing::info!(source = %source, attribute = %attribute, "reverted attribute");
        Ok(removed)
    }

    /// Unapply every attribute of `source` not listed in `keep`.
    ///
    /// A failure on one attribute does not stop the others; each failed
    /// attribute keeps its record so the next pass retries it.
    fn clean(&mut self, source: &SourceId, keep: &BTreeSet<AttributeName>) -> CleanOutcome {
        let mut outcome = CleanOutcome::default();
        for attribute in self.attributes(source) {
            if keep.contains(&attribute) {
                continue;
            }
            match self.unapply(source, &attribute) {
                Ok(Some(_)) => outcome.reverted.push(attribute),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(source = %source, attribute = %attribute, error = %e, "attribute not reverted");
                    outcome.failures.push((attribute, e));
                }
            }
        }
        outcome
    }
}

/// Delete a generated file. Returns `false` when it was already gone.
pub(crate) fn remove_generated(path: &Path) -> Result<bool, LedgerError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "removed generated file");
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "generated file already absent");
            Ok(false)
        }
        Err(source) => Err(LedgerError::RemoveFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}
