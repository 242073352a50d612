//! # Identity Newtypes
//!
//! Newtype wrappers for the identifiers that key the attribute ledger and the
//! extension registry. You cannot pass an `AttributeName` where a `SourceId`
//! is expected, and neither can be empty.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IdentityError;

/// Identifier of a policy source (for example a Group Policy Object name).
///
/// Opaque to this system: it is compared, stored and displayed, never parsed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceId(String);

impl SourceId {
    /// Create a source identifier. Surrounding whitespace is trimmed.
    pub fn new(id: impl AsRef<str>) -> Result<Self, IdentityError> {
        non_empty(id.as_ref(), "source id").map(Self)
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Name of a ledger attribute.
///
/// For the scripts extension the attribute is the full registry key of the
/// category (`...\Daily Scripts`), since a source declares at most one body
/// list per category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttributeName(String);

impl AttributeName {
    /// Create an attribute name. Surrounding whitespace is trimmed.
    pub fn new(name: impl AsRef<str>) -> Result<Self, IdentityError> {
        non_empty(name.as_ref(), "attribute name").map(Self)
    }

    /// Borrow the attribute text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// GUID identifying an installed policy extension.
///
/// Accepts bare, hyphenated, braced or URN forms on input; always displays
/// in the braced upper-case form used by extension registries,
/// e.g. `{5930022C-94FF-4ED5-A403-CFB4549DB6F0}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExtensionId(Uuid);

impl ExtensionId {
    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Build from the 128-bit value, for compile-time identifiers.
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

fn non_empty(raw: &str, kind: &'static str) -> Result<String, IdentityError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdentityError::Empty { kind });
    }
    Ok(trimmed.to_string())
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for AttributeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let braced = self.0.braced().to_string().to_uppercase();
        f.write_str(&braced)
    }
}

impl FromStr for SourceId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for AttributeName {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for ExtensionId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| IdentityError::InvalidGuid {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl TryFrom<String> for SourceId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for AttributeName {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for ExtensionId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SourceId> for String {
    fn from(id: SourceId) -> Self {
        id.0
    }
}

impl From<AttributeName> for String {
    fn from(name: AttributeName) -> Self {
        name.0
    }
}

impl From<ExtensionId> for String {
    fn from(id: ExtensionId) -> Self {
        id.to_string()
    }
}
