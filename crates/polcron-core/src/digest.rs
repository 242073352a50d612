//! # Content Digest — Change Detection Hashes
//!
//! Defines `ContentDigest` and `DigestAlgorithm`. A digest recorded in the
//! attribute ledger is compared against the digest of the currently declared
//! bodies; equal digests mean "nothing changed, skip the rewrite".
//!
//! ## Invariant
//!
//! `content_hash()` hashes the canonical JSON array of the ordered bodies.
//! Reordering bodies, editing any character of any body, or adding or
//! removing a body produces different canonical bytes and therefore a
//! different digest.
//!
//! Digests serialize as `"sha256:<64 lowercase hex>"`, the same form as
//! `Display`, so the ledger file stays human-readable.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::{CanonicalizationError, IdentityError};

/// The hash algorithm used to produce a content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestAlgorithm {
    /// SHA-256.
    Sha256,
}

impl DigestAlgorithm {
    /// Returns the algorithm identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content digest with its algorithm tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentDigest {
    /// The hash algorithm that produced this digest.
    pub algorithm: DigestAlgorithm,
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Create a new content digest from raw bytes and algorithm.
    pub fn new(algorithm: DigestAlgorithm, bytes: [u8; 32]) -> Self {
        Self { algorithm, bytes }
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a bare 64-character hex string as a SHA-256 digest.
    pub fn from_hex(hex: &str) -> Result<Self, IdentityError> {
        let invalid = |reason: &str| IdentityError::InvalidDigest {
            value: hex.to_string(),
            reason: reason.to_string(),
        };
        if hex.len() != 64 {
            return Err(invalid("expected 64 hex characters"));
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk).map_err(|_| invalid("not ASCII"))?;
            bytes[i] = u8::from_str_radix(pair, 16).map_err(|_| invalid("not hex"))?;
        }
        Ok(Self::new(DigestAlgorithm::Sha256, bytes))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

impl FromStr for ContentDigest {
    type Err = IdentityError;

    /// Parse the tagged `sha256:<hex>` form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("sha256", hex)) => Self::from_hex(hex),
            _ => Err(IdentityError::InvalidDigest {
                value: s.to_string(),
                reason: "expected \"sha256:<hex>\"".to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ContentDigest {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContentDigest> for String {
    fn from(digest: ContentDigest) -> Self {
        digest.to_string()
    }
}

/// Compute a SHA-256 content digest from canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest::new(DigestAlgorithm::Sha256, bytes)
}

/// Deterministic hash over an ordered list of strings.
///
/// This is the ledger's change-detection hash for one attribute: the same
/// bodies in the same order always hash identically, and any change to the
/// list changes the result.
pub fn content_hash<S: AsRef<str>>(bodies: &[S]) -> Result<ContentDigest, CanonicalizationError> {
    let list: Vec<&str> = bodies.iter().map(AsRef::as_ref).collect();
    let canonical = CanonicalBytes::new(&list)?;
    Ok(sha256_digest(&canonical))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_deterministic() {
        let a = content_hash(&["echo hi", "echo bye"]).unwrap();
        let b = content_hash(&["echo hi".to_string(), "echo bye".to_string()]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.algorithm, DigestAlgorithm::Sha256);
    }

    #[test]
    fn test_order_changes_hash() {
        let a = content_hash(&["one", "two"]).unwrap();
        let b = content_hash(&["two", "one"]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_single_character_edit_changes_hash() {
        let a = content_hash(&["echo hi"]).unwrap();
        let b = content_hash(&["echo hI"]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_added_body_changes_hash() {
        let a = content_hash(&["echo hi"]).unwrap();
        let b = content_hash(&["echo hi", "echo hi"]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_known_vector() {
        // SHA-256 of the two bytes `[]`.
        let empty: [&str; 0] = [];
        let digest = content_hash(&empty).unwrap();
        assert_eq!(
            digest.to_hex(),
            "4f53cda18c2baa0c0354bb5f9a3ecbe5ed12ab4d8e11ba873c2f11161202b945"
        );
    }

    #[test]
    fn test_display_and_parse_agree() {
        let digest = content_hash(&["echo hi"]).unwrap();
        let s = digest.to_string();
        assert!(s.starts_with("sha256:"));
        assert_eq!(s.len(), 7 + 64);
        let parsed: ContentDigest = s.parse().unwrap();
        assert_eq!(parsed, digest);
    }

    #[test]
    fn test_serde_uses_tagged_string() {
        let digest = content_hash(&["echo hi"]).unwrap();
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{digest}\""));
        let back: ContentDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("sha256:abc".parse::<ContentDigest>().is_err());
        assert!("md5:00".parse::<ContentDigest>().is_err());
        assert!("".parse::<ContentDigest>().is_err());
        let bad = format!("sha256:{}", "zz".repeat(32));
        assert!(bad.parse::<ContentDigest>().is_err());
    }
}
