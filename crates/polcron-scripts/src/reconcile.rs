//! # Reconciler
//!
//! One pass takes the sources the host reports removed and the sources
//! present now, and brings the category directories in line with them:
//!
//! 1. **Withdrawal**: every attribute recorded for a removed source is
//!    reverted. Files that are already gone count as reverted.
//! 2. **Declaration**: each present source's payload is parsed and
//!    extracted. Every category is hashed and applied through the ledger,
//!    which skips it when the hash is unchanged.
//! 3. **Orphan cleanup**: attributes recorded for that source but not
//!    declared this pass are reverted.
//!
//! A source without a filesystem location, or whose payload is missing,
//! unreadable or malformed, declares nothing and is left as it is. A payload
//! that decodes to zero entries is a valid declaration of nothing, so orphan
//! cleanup reverts everything the source produced before.
//! Failures are collected per source and per category; none of them stops
//! the rest of the pass. Running the same pass twice performs no
//! filesystem mutation the second time.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use polcron_core::{content_hash, AttributeName, SourceId};
use polcron_ledger::{ApplyError, ApplyOutcome, AttributeLedger, CleanOutcome};
use polcron_preg::PolicyParser;
use serde::Serialize;

use crate::error::ReconcileError;
use crate::extract::{extract, CategoryBucket};
use crate::materialize::ScriptBatch;
use crate::rsop;
use crate::sections::CategoryMap;

/// Payload location relative to a source's filesystem path.
pub const DEFAULT_PAYLOAD_FILE: &str = "MACHINE/Registry.pol";

/// A policy source as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySource {
    /// Source identifier, e.g. a GPO name.
    pub id: SourceId,
    /// Directory holding the source's payload, if it has one.
    pub file_sys_path: Option<PathBuf>,
}

impl PolicySource {
    /// A source with a filesystem location.
    pub fn new(id: SourceId, file_sys_path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            file_sys_path: Some(file_sys_path.into()),
        }
    }

    /// A source with no filesystem location.
    pub fn without_path(id: SourceId) -> Self {
        Self {
            id,
            file_sys_path: None,
        }
    }
}

/// How a source was handled in a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    /// Reported removed; its attributes were reverted.
    Withdrawn,
    /// Payload parsed and reconciled.
    Declared,
    /// No filesystem location; skipped.
    NoLocation,
    /// Payload missing, unreadable or malformed; skipped.
    NoPayload,
}

/// A failure recorded for a source, optionally scoped to one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<AttributeName>,
    pub error: String,
}

impl Failure {
    fn new(attribute: Option<&AttributeName>, error: &ReconcileError) -> Self {
        Self {
            attribute: attribute.cloned(),
            error: error.to_string(),
        }
    }
}

/// What one pass did to one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: SourceId,
    pub status: SourceStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applied: Vec<AttributeName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unchanged: Vec<AttributeName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reverted: Vec<AttributeName>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<Failure>,
}

impl SourceReport {
    fn new(source: SourceId, status: SourceStatus) -> Self {
        Self {
            source,
            status,
            applied: Vec::new(),
            unchanged: Vec::new(),
            reverted: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// Outcome of a reconciliation pass, withdrawals first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub sources: Vec<SourceReport>,
}

impl PassReport {
    /// Whether any source or category failed.
    pub fn has_failures(&self) -> bool {
        self.sources.iter().any(|s| !s.failures.is_empty())
    }

    /// Number of attributes applied or reverted.
    pub fn mutations(&self) -> usize {
        self.sources
            .iter()
            .map(|s| s.applied.len() + s.reverted.len())
            .sum()
    }

    /// Report for `source`, if it took part in the pass.
    pub fn source(&self, source: &SourceId) -> Option<&SourceReport> {
        self.sources.iter().find(|s| &s.source == source)
    }
}

/// Drives reconciliation passes against a ledger.
#[derive(Debug, Clone)]
pub struct Reconciler<P> {
    map: CategoryMap,
    parser: P,
    payload_file: PathBuf,
}

impl<P: PolicyParser> Reconciler<P> {
    /// A reconciler reading [`DEFAULT_PAYLOAD_FILE`] from each source.
    pub fn new(map: CategoryMap, parser: P) -> Self {
        Self {
            map,
            parser,
            payload_file: PathBuf::from(DEFAULT_PAYLOAD_FILE),
        }
    }

    /// Read payloads from `payload_file` relative to each source path.
    pub fn with_payload_file(mut self, payload_file: impl Into<PathBuf>) -> Self {
        self.payload_file = payload_file.into();
        self
    }

    /// The category map in use.
    pub fn map(&self) -> &CategoryMap {
        &self.map
    }

    /// Payload path for a source directory.
    pub fn payload_path(&self, source_path: &Path) -> PathBuf {
        source_path.join(&self.payload_file)
    }

    /// Run one pass: withdraw `removed`, then declare each of `changed`.
    pub fn process<L: AttributeLedger>(
        &self,
        ledger: &mut L,
        removed: &[SourceId],
        changed: &[PolicySource],
    ) -> PassReport {
        tracing::info!(
            removed = removed.len(),
            changed = changed.len(),
            "starting reconciliation pass"
        );
        let mut report = PassReport::default();
        for source in removed {
            report.sources.push(self.withdraw(ledger, source));
        }
        for source in changed {
            report.sources.push(self.declare(ledger, source));
        }
        tracing::info!(
            mutations = report.mutations(),
            failed = report.has_failures(),
            "reconciliation pass finished"
        );
        report
    }

    /// Read-only view of what `source` declares, keyed by short category
    /// name. Empty when the source has no usable payload.
    pub fn snapshot(&self, source_path: &Path) -> BTreeMap<String, Vec<String>> {
        rsop::snapshot(&self.parser, &self.payload_path(source_path))
    }

    fn withdraw<L: AttributeLedger>(&self, ledger: &mut L, source: &SourceId) -> SourceReport {
        let mut report = SourceReport::new(source.clone(), SourceStatus::Withdrawn);
        record_clean(&mut report, ledger.clean(source, &BTreeSet::new()));
        report
    }

    fn declare<L: AttributeLedger>(&self, ledger: &mut L, source: &PolicySource) -> SourceReport {
        let id = &source.id;
        let Some(dir) = &source.file_sys_path else {
            tracing::debug!(source = %id, "source has no filesystem location");
            return SourceReport::new(id.clone(), SourceStatus::NoLocation);
        };
        let payload = self.payload_path(dir);
        let Some(doc) = self.parser.parse(&payload) else {
            tracing::debug!(source = %id, path = %payload.display(), "no declarations this pass");
            return SourceReport::new(id.clone(), SourceStatus::NoPayload);
        };

        let mut report = SourceReport::new(id.clone(), SourceStatus::Declared);
        let mut keep = BTreeSet::new();
        for bucket in extract(&doc, &self.map).into_values() {
            let attribute = match AttributeName::new(&bucket.keyname) {
                Ok(a) => a,
                Err(e) => {
                    let e = ReconcileError::from(e);
                    report.failures.push(Failure::new(None, &e));
                    continue;
                }
            };
            keep.insert(attribute.clone());
            match apply_bucket(ledger, id, &attribute, &bucket) {
                Ok(ApplyOutcome::Unchanged) => report.unchanged.push(attribute),
                Ok(ApplyOutcome::Applied { .. }) => report.applied.push(attribute),
                Err(e) => {
                    tracing::warn!(source = %id, attribute = %attribute, error = %e, "category not applied");
                    report.failures.push(Failure::new(Some(&attribute), &e));
                }
            }
        }

        record_clean(&mut report, ledger.clean(id, &keep));
        report
    }
}

fn record_clean(report: &mut SourceReport, outcome: CleanOutcome) {
    report.reverted = outcome.reverted;
    for (attribute, e) in outcome.failures {
        let e = ReconcileError::from(e);
        report.failures.push(Failure::new(Some(&attribute), &e));
    }
}

fn apply_bucket<L: AttributeLedger>(
    ledger: &mut L,
    source: &SourceId,
    attribute: &AttributeName,
    bucket: &CategoryBucket,
) -> Result<ApplyOutcome, ReconcileError> {
    let hash = content_hash(bucket.bodies.as_slice())?;
    let batch = ScriptBatch {
        category: bucket.category,
        directory: &bucket.directory,
        bodies: &bucket.bodies,
    };
    ledger
        .apply(source, attribute, &hash, &batch)
        .map_err(|e| match e {
            ApplyError::Materialize(e) => ReconcileError::Materialize(e),
            ApplyError::Ledger(e) => ReconcileError::Ledger(e),
        })
}

#[cfg(test)]
mod tests {
    use polcron_ledger::MemoryLedger;
    use polcron_preg::{PolicyDocument, PregParser, RegistryEntry, RegistryValue};

    use super::*;
    use crate::sections::CategoryDirectories;

    const DAILY: &str = r"Software\Policies\Samba\Unix Settings\Daily Scripts";

    fn source(id: &str) -> SourceId {
        SourceId::new(id).unwrap()
    }

    #[test]
    fn test_source_without_location_is_skipped() {
        let mut ledger = MemoryLedger::new();
        let reconciler = Reconciler::new(CategoryMap::default(), PregParser);
        let report = reconciler.process(&mut ledger, &[], &[PolicySource::without_path(source("s"))]);
        assert_eq!(report.sources[0].status, SourceStatus::NoLocation);
        assert_eq!(report.mutations(), 0);
    }

    fn publish_daily(reconciler: &Reconciler<PregParser>, gpo: &Path, entries: Vec<RegistryEntry>) {
        let payload = reconciler.payload_path(gpo);
        std::fs::create_dir_all(payload.parent().unwrap()).unwrap();
        PolicyDocument::new(entries).write(&payload).unwrap();
    }

    fn daily_entry() -> RegistryEntry {
        RegistryEntry::new(DAILY, "1", RegistryValue::String("echo hi".into()))
    }

    #[test]
    fn test_missing_payload_keeps_existing_records() {
        let root = tempfile::tempdir().unwrap();
        let dirs = CategoryDirectories::under(root.path());
        std::fs::create_dir_all(&dirs.daily).unwrap();
        let reconciler = Reconciler::new(CategoryMap::new(crate::DEFAULT_POLICY_ROOT, &dirs), PregParser);

        let gpo = root.path().join("gpo");
        publish_daily(&reconciler, &gpo, vec![daily_entry()]);

        let mut ledger = MemoryLedger::new();
        let s = PolicySource::new(source("s"), &gpo);
        reconciler.process(&mut ledger, &[], std::slice::from_ref(&s));
        assert_eq!(ledger.records().len(), 1);

        std::fs::remove_file(reconciler.payload_path(&gpo)).unwrap();
        let report = reconciler.process(&mut ledger, &[], &[s]);
        assert_eq!(report.sources[0].status, SourceStatus::NoPayload);
        assert_eq!(ledger.records().len(), 1);
    }

    #[test]
    fn test_payload_without_entries_reverts_everything() {
        let root = tempfile::tempdir().unwrap();
        let dirs = CategoryDirectories::under(root.path());
        std::fs::create_dir_all(&dirs.daily).unwrap();
        let reconciler = Reconciler::new(CategoryMap::new(crate::DEFAULT_POLICY_ROOT, &dirs), PregParser);

        let gpo = root.path().join("gpo");
        publish_daily(&reconciler, &gpo, vec![daily_entry()]);
        let mut ledger = MemoryLedger::new();
        let s = PolicySource::new(source("s"), &gpo);
        reconciler.process(&mut ledger, &[], std::slice::from_ref(&s));

        publish_daily(&reconciler, &gpo, vec![]);
        let report = reconciler.process(&mut ledger, &[], &[s]);
        assert_eq!(report.sources[0].status, SourceStatus::Declared);
        assert_eq!(report.sources[0].reverted, vec![AttributeName::new(DAILY).unwrap()]);
        assert!(ledger.records().is_empty());
        assert_eq!(std::fs::read_dir(&dirs.daily).unwrap().count(), 0);
    }

    #[test]
    fn test_withdrawing_unknown_source_is_quiet() {
        let mut ledger = MemoryLedger::new();
        let reconciler = Reconciler::new(CategoryMap::default(), PregParser);
        let report = reconciler.process(&mut ledger, &[source("never-seen")], &[]);
        assert_eq!(report.sources[0].status, SourceStatus::Withdrawn);
        assert!(report.sources[0].reverted.is_empty());
        assert!(!report.has_failures());
    }
}
