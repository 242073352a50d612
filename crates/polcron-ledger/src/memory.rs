//! # In-Memory Ledger

use polcron_core::{AttributeName, SourceId};

use crate::error::LedgerError;
use crate::ledger::AttributeLedger;
use crate::record::AttributeRecord;
use crate::table::LedgerTable;

/// A ledger that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    table: LedgerTable,
}

impl MemoryLedger {
    /// An empty ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttributeLedger for MemoryLedger {
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
        self.table.insert(record)
    }

    fn delete(
        &mut self,
        source: &SourceId,
        attribute: &AttributeName,
    ) -> Result<Option<AttributeRecord>, LedgerError> {
        Ok(self.table.remove(source, attribute))
    }
}
