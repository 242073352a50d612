//! # Snapshot Reporter
//!
//! Read-only view of what one source declares. Never touches the ledger or
//! the category directories, and reports keys the category map does not
//! recognize so operators can spot them.

use std::collections::BTreeMap;
use std::path::Path;

use polcron_preg::PolicyParser;

use crate::extract::extract_display;

/// Short category name → bodies declared in the payload at `payload`.
///
/// Empty when the payload is missing or unusable.
pub fn snapshot<P: PolicyParser + ?Sized>(parser: &P, payload: &Path) -> BTreeMap<String, Vec<String>> {
    parser
        .parse(payload)
        .map(|doc| extract_display(&doc))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use polcron_preg::{PolicyDocument, PregParser, RegistryEntry, RegistryValue};

    use super::*;

    #[test]
    fn test_missing_payload_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(snapshot(&PregParser, &dir.path().join("Registry.pol")).is_empty());
    }

    #[test]
    fn test_reports_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let payload = dir.path().join("Registry.pol");
        PolicyDocument::new(vec![
            RegistryEntry::new(
                r"Software\Policies\Samba\Unix Settings\Daily Scripts",
                "1",
                RegistryValue::String("echo hi".into()),
            ),
            RegistryEntry::new(
                r"Software\Policies\Samba\Unix Settings\Daily Scripts",
                "2",
                RegistryValue::String("echo again".into()),
            ),
        ])
        .write(&payload)
        .unwrap();

        let shown = snapshot(&PregParser, &payload);
        assert_eq!(shown["Daily Scripts"], vec!["echo hi", "echo again"]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
