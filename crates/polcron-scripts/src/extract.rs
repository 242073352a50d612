//! # Policy Entry Extraction
//!
//! Reduces a parsed payload to the script bodies each category declares.
//! One pass over the entries appends each retained body to its key's
//! bucket, so declaration order within a key is preserved. That order feeds
//! both the content hash and the order files are generated in.
//!
//! Bodies are kept verbatim. Only the emptiness test trims.

use std::collections::BTreeMap;
use std::path::PathBuf;

use polcron_core::ScheduleCategory;
use polcron_preg::PolicyDocument;

use crate::sections::CategoryMap;

/// Short-name suffix that marks a key as a script category for reporting.
pub const DISPLAY_SUFFIX: &str = "Scripts";

/// One category's working set for one source in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryBucket {
    /// Full registry key; also the ledger attribute name.
    pub keyname: String,
    /// Schedule bucket the key maps to.
    pub category: ScheduleCategory,
    /// Directory scripts are generated in.
    pub directory: PathBuf,
    /// Non-blank bodies in declaration order.
    pub bodies: Vec<String>,
}

/// Group the recognized, non-blank entries of `doc` by registry key.
pub fn extract(doc: &PolicyDocument, map: &CategoryMap) -> BTreeMap<String, CategoryBucket> {
    let mut buckets: BTreeMap<String, CategoryBucket> = BTreeMap::new();
    for entry in &doc.entries {
        let Some(target) = map.lookup(&entry.keyname) else {
            continue;
        };
        let Some(body) = entry.data().filter(|d| !d.trim().is_empty()) else {
            tracing::debug!(key = %entry.keyname, value = %entry.valuename, "skipping blank entry");
            continue;
        };
        buckets
            .entry(entry.keyname.clone())
            .or_insert_with(|| CategoryBucket {
                keyname: entry.keyname.clone(),
                category: target.category,
                directory: target.directory.clone(),
                bodies: Vec::new(),
            })
            .bodies
            .push(body.into_owned());
    }
    buckets
}

/// Group non-blank entries by the short name of any key ending in
/// [`DISPLAY_SUFFIX`], whether or not the category map knows the key.
pub fn extract_display(doc: &PolicyDocument) -> BTreeMap<String, Vec<String>> {
    let mut output: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in &doc.entries {
        let short = entry.keyname.rsplit('\\').next().unwrap_or_default();
        if !short.ends_with(DISPLAY_SUFFIX) {
            continue;
        }
        if let Some(body) = entry.data().filter(|d| !d.trim().is_empty()) {
            output
                .entry(short.to_string())
                .or_default()
                .push(body.into_owned());
        }
    }
    output
}
