//! # Attribute Records

use std::path::PathBuf;

use polcron_core::{AttributeName, ContentDigest, SourceId, Timestamp};
use serde::{Deserialize, Serialize};

/// What the ledger remembers about one applied `(source, attribute)` pair.
///
/// `hash` is the content hash of the ordered bodies that produced `paths`;
/// every path was created for this record and is owned by it alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRecord {
    /// Policy source that declared the attribute.
    pub source: SourceId,
    /// Attribute (category key) within the source.
    pub attribute: AttributeName,
    /// Content hash of the bodies that produced `paths`.
    pub hash: ContentDigest,
    /// Generated files, in body order.
    pub paths: Vec<PathBuf>,
    /// When the record was committed.
    pub applied_at: Timestamp,
}

impl AttributeRecord {
    /// Build a record stamped with the current time.
    pub fn new(
        source: SourceId,
        attribute: AttributeName,
        hash: ContentDigest,
        paths: Vec<PathBuf>,
    ) -> Self {
        Self {
            source,
            attribute,
            hash,
            paths,
            applied_at: Timestamp::now(),
        }
    }
}
