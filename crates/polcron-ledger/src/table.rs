//! In-memory record table shared by both stores. Enforces the one-record-per-key
//! and disjoint-paths invariants on insert.

use std::collections::BTreeMap;

use polcron_core::{AttributeName, SourceId};

use crate::error::LedgerError;
use crate::record::AttributeRecord;

type Key = (SourceId, AttributeName);

#[derive(Debug, Clone, Default)]
pub(crate) struct LedgerTable {
    records: BTreeMap<Key, AttributeRecord>,
}

impl LedgerTable {
    pub(crate) fn get(&self, source: &SourceId, attribute: &AttributeName) -> Option<&AttributeRecord> {
        self.records.get(&(source.clone(), attribute.clone()))
    }

    pub(crate) fn attributes(&self, source: &SourceId) -> Vec<AttributeName> {
        self.records
            .keys()
            .filter(|(s, _)| s == source)
            .map(|(_, a)| a.clone())
            .collect()
    }

    pub(crate) fn sources(&self) -> Vec<SourceId> {
        let mut sources: Vec<SourceId> = self.records.keys().map(|(s, _)| s.clone()).collect();
        sources.dedup();
        sources
    }

    pub(crate) fn records(&self) -> impl Iterator<Item = &AttributeRecord> {
        self.records.values()
    }

    /// Insert or replace, returning the replaced record.
    pub(crate) fn insert(
        &mut self,
        record: AttributeRecord,
    ) -> Result<Option<AttributeRecord>, LedgerError> {
        let key = (record.source.clone(), record.attribute.clone());
        for (other_key, other) in &self.records {
            if *other_key == key {
                continue;
            }
            if let Some(path) = record.paths.iter().find(|p| other.paths.contains(p)) {
                return Err(LedgerError::PathClaimed {
                    path: path.clone(),
                    owner_source: other.source.clone(),
                    owner_attribute: other.attribute.clone(),
                });
            }
        }
        Ok(self.records.insert(key, record))
    }

    pub(crate) fn remove(&mut self, source: &SourceId, attribute: &AttributeName) -> Option<AttributeRecord> {
        self.records.remove(&(source.clone(), attribute.clone()))
    }

    /// Put back a record removed or replaced by a mutation that could not be persisted.
    pub(crate) fn restore(&mut self, key: (SourceId, AttributeName), previous: Option<AttributeRecord>) {
        match previous {
            Some(record) => {
                self.records.insert(key, record);
            }
            None => {
                self.records.remove(&key);
            }
        }
    }
}
