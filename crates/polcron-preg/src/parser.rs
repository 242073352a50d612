//! # Policy Parser Seam
//!
//! The reconciliation core only needs "give me the entries of this payload,
//! or nothing". `PolicyParser` is that contract; `PregParser` is the
//! filesystem-backed implementation.

use std::path::Path;

use crate::document::PolicyDocument;

/// Loads a policy payload into an ordered entry list.
pub trait PolicyParser {
    /// Parse the payload at `path`.
    ///
    /// Returns `None` when the payload is absent, unreadable or malformed.
    /// A source without a usable payload simply declares nothing this pass.
    fn parse(&self, path: &Path) -> Option<PolicyDocument>;
}

/// Reads `Registry.pol` files from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct PregParser;

impl PolicyParser for PregParser {
    fn parse(&self, path: &Path) -> Option<PolicyDocument> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no policy payload");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "policy payload unreadable");
                return None;
            }
        };
        match PolicyDocument::decode(&bytes) {
            Ok(doc) => {
                tracing::debug!(path = %path.display(), entries = doc.entries.len(), "parsed policy payload");
                Some(doc)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "policy payload malformed");
                None
            }
        }
    }
}
