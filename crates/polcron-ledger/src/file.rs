//! # File-Backed Ledger
//!
//! The ledger is a single JSON document:
//!
//! ```json
//! { "version": 1, "records": [ { "source": "...", "attribute": "...", ... } ] }
//! ```
//!
//! Every mutation rewrites the whole document through a temporary file in
//! the same directory, synced and then renamed over the old one, so a crash
//! leaves either the previous or the new ledger on disk and never a torn one.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use polcron_core::{AttributeName, SourceId};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::ledger::AttributeLedger;
use crate::record::AttributeRecord;
use crate::table::LedgerTable;

/// On-disk format version written by this crate.
pub const LEDGER_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct DocumentRef<'a> {
    version: u32,
    records: Vec<&'a AttributeRecord>,
}

#[derive(Deserialize)]
struct Header {
    version: u32,
}

#[derive(Deserialize)]
struct Document {
    records: Vec<AttributeRecord>,
}

/// A ledger persisted to a JSON file.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    table: LedgerTable,
}

impl FileLedger {
    /// Load the ledger at `path`. A missing file is an empty ledger; the file
    /// is created on the first mutation.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no ledger file yet; starting empty");
                return Ok(Self {
                    path,
                    table: LedgerTable::default(),
                });
            }
            Err(source) => return Err(LedgerError::Io { path, source }),
        };

        // Version first, so a future format is reported as such instead of
        // as a shape mismatch.
        let header: Header = serde_json::from_slice(&bytes).map_err(|source| {
            LedgerError::Corrupt {
                path: path.clone(),
                source,
            }
        })?;
        if header.version != LEDGER_FORMAT_VERSION {
            return Err(LedgerError::UnsupportedVersion {
                path,
                found: header.version,
            });
        }
        let document: Document =
            serde_json::from_slice(&bytes).map_err(|source| LedgerError::Corrupt {
                path: path.clone(),
                source,
            })?;

        let mut table = LedgerTable::default();
        for record in document.records {
            let source_id = record.source.clone();
            let attribute = record.attribute.clone();
            if table.get(&source_id, &attribute).is_some() {
                return Err(LedgerError::DuplicateRecord {
                    path,
                    source_id,
                    attribute,
                });
            }
            table.insert(record)?;
        }

        tracing::debug!(path = %path.display(), "loaded ledger");
        Ok(Self { path, table })
    }

    /// Location of the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), LedgerError> {
        let document = DocumentRef {
            version: LEDGER_FORMAT_VERSION,
            records: self.table.records().collect(),
        };
        let mut bytes = serde_json::to_vec_pretty(&document).map_err(|source| {
            LedgerError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        bytes.push(b'\n');
        atomic_write(&self.path, &bytes)
    }
}

impl AttributeLedger for FileLedger {
    fn get(&self, source: &SourceId, attribute: &AttributeName) -> Option<AttributeRecord> {
        self.table.get(source, attribute).cloned()
    }

    fn attributes(&self, source: &SourceId) -> Vec<AttributeName> {
        self.table.attributes(source)
    }

    fn sources(&self) -> Vec<SourceId> {
        self.table.sources()
    }

    fn records(&self) -> Vec<AttributeRecord> {
        self.table.records().cloned().collect()
    }

    fn put(&mut self, record: AttributeRecord) -> Result<Option<AttributeRecord>, LedgerError> {
        let key = (record.source.clone(), record.attribute.clone());
        let previous = self.table.insert(record)?;
        if let Err(e) = self.save() {
            self.table.restore(key, previous);
            return Err(e);
        }
        Ok(previous)
    }

    fn delete(
        &mut self,
        source: &SourceId,
        attribute: &AttributeName,
    ) -> Result<Option<AttributeRecord>, LedgerError> {
        let Some(removed) = self.table.remove(source, attribute) else {
            return Ok(None);
        };
        if let Err(e) = self.save() {
            self.table
                .restore((source.clone(), attribute.clone()), Some(removed));
            return Err(e);
        }
        Ok(Some(removed))
    }
}

/// Replace `path` with `bytes` via a synced temporary file in the same directory.
fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), LedgerError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let io_err = |source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(parent).map_err(io_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(io_err)?;
    }

    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use polcron_core::content_hash;

    use super::*;
    use crate::ledger::FnMaterializer;

    fn source(id: &str) -> SourceId {
        SourceId::new(id).unwrap()
    }

    fn attr(name: &str) -> AttributeName {
        AttributeName::new(name).unwrap()
    }

    fn touch(path: PathBuf) -> FnMaterializer<impl Fn() -> Result<Vec<PathBuf>, std::io::Error>> {
        FnMaterializer(move || {
            fs::write(&path, "#!/bin/sh\n")?;
            Ok(vec![path.clone()])
        })
    }

    #[test]
    fn test_missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::open(dir.path().join("ledger.json")).unwrap();
        assert!(ledger.sources().is_empty());
        assert!(!ledger.path().exists());
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("state").join("ledger.json");
        let script = dir.path().join("gp_one");
        let hash = content_hash(&["echo hi"]).unwrap();

        {
            let mut ledger = FileLedger::open(&ledger_path).unwrap();
            ledger
                .apply(&source("gpo-1"), &attr("daily"), &hash, &touch(script.clone()))
                .unwrap();
        }

        let reopened = FileLedger::open(&ledger_path).unwrap();
        let record = reopened.get(&source("gpo-1"), &attr("daily")).unwrap();
        assert_eq!(record.hash, hash);
        assert_eq!(record.paths, vec![script]);
    }

    #[test]
    fn test_delete_persists() {
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.json");
        let hash = content_hash(&["x"]).unwrap();

        let mut ledger = FileLedger::open(&ledger_path).unwrap();
        ledger
            .apply(&source("s"), &attr("daily"), &hash, &touch(dir.path().join("gp_a")))
            .unwrap();
        assert!(ledger.clean(&source("s"), &BTreeSet::new()).is_complete());

        let reopened = FileLedger::open(&ledger_path).unwrap();
        assert!(reopened.records().is_empty());
    }

    #[test]
    fn test_document_shape() {
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.json");
        let mut ledger = FileLedger::open(&ledger_path).unwrap();
        ledger
            .apply(
                &source("s"),
                &attr("daily"),
                &content_hash(&["x"]).unwrap(),
                &touch(dir.path().join("gp_a")),
            )
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(&ledger_path).unwrap()).unwrap();
        assert_eq!(raw["version"], 1);
        let record = &raw["records"][0];
        assert_eq!(record["source"], "s");
        assert_eq!(record["attribute"], "daily");
        assert!(record["hash"].as_str().unwrap().starts_with("sha256:"));
        assert!(record["applied_at"].is_string());
    }

    #[cfg(unix)]
    #[test]
    fn test_ledger_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.json");
        let mut ledger = FileLedger::open(&ledger_path).unwrap();
        ledger
            .apply(
                &source("s"),
                &attr("daily"),
                &content_hash(&["x"]).unwrap(),
                &touch(dir.path().join("gp_a")),
            )
            .unwrap();

        let mode = fs::metadata(&ledger_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.json");
        fs::write(&ledger_path, r#"{"version": 7, "records": []}"#).unwrap();

        let err = FileLedger::open(&ledger_path).unwrap_err();
        assert!(matches!(err, LedgerError::UnsupportedVersion { found: 7, .. }));
    }

    #[test]
    fn test_garbage_reported_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.json");
        fs::write(&ledger_path, "not json").unwrap();

        let err = FileLedger::open(&ledger_path).unwrap_err();
        assert!(matches!(err, LedgerError::Corrupt { .. }));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.json");
        let hash = content_hash(&["x"]).unwrap().to_string();
        let doc = serde_json::json!({
            "version": 1,
            "records": [
                {"source": "s", "attribute": "daily", "hash": hash, "paths": ["/a"], "applied_at": "2026-01-01T00:00:00Z"},
                {"source": "s", "attribute": "daily", "hash": hash, "paths": ["/b"], "applied_at": "2026-01-01T00:00:00Z"}
            ]
        });
        fs::write(&ledger_path, doc.to_string()).unwrap();

        let err = FileLedger::open(&ledger_path).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateRecord { .. }));
    }

    #[test]
    fn test_overlapping_paths_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.json");
        let hash = content_hash(&["x"]).unwrap().to_string();
        let doc = serde_json::json!({
            "version": 1,
            "records": [
                {"source": "s1", "attribute": "daily", "hash": hash, "paths": ["/a"], "applied_at": "2026-01-01T00:00:00Z"},
                {"source": "s2", "attribute": "daily", "hash": hash, "paths": ["/a"], "applied_at": "2026-01-01T00:00:00Z"}
            ]
        });
        fs::write(&ledger_path, doc.to_string()).unwrap();

        let err = FileLedger::open(&ledger_path).unwrap_err();
        assert!(matches!(err, LedgerError::PathClaimed { .. }));
    }
}
