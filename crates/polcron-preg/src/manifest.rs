//! # Policy Manifests
//!
//! A YAML authoring format for payloads, so administrators and tests can
//! describe entries in text and compile them to `Registry.pol`:
//!
//! ```yaml
//! entries:
//!   - key: 'Software\Policies\Samba\Unix Settings\Daily Scripts'
//!     value: '1'
//!     data: 'echo hi'
//!   - key: 'Software\Policies\Samba\Unix Settings\Weekly Scripts'
//!     type: multi_string
//!     data: ['set -e', 'run-backup']
//! ```
//!
//! `type` defaults to `string`; `value` defaults to the empty name.

use std::path::Path;

use serde::Deserialize;

use crate::document::{PolicyDocument, RegistryEntry};
use crate::error::PregError;
use crate::value::{RegistryValue, ValueType};

/// A parsed manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyManifest {
    /// Entries in declaration order.
    #[serde(default)]
    pub entries: Vec<ManifestEntry>,
}

/// One manifest entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    /// Full registry key path.
    pub key: String,
    /// Value name.
    #[serde(default)]
    pub value: String,
    /// Registry value type.
    #[serde(rename = "type", default = "default_kind")]
    pub kind: ValueType,
    /// Value data; its accepted shape depends on `kind`.
    #[serde(default)]
    pub data: Option<ManifestData>,
}

/// Data shapes accepted in a manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ManifestData {
    /// An integer.
    Number(u64),
    /// A single string (hex digits for `binary`).
    Text(String),
    /// A list of strings (`multi_string`).
    Lines(Vec<String>),
}

fn default_kind() -> ValueType {
    ValueType::String
}

impl PolicyManifest {
    /// Parse a manifest from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, PregError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self, PregError> {
        let text = std::fs::read_to_string(path).map_err(|source| PregError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Convert every entry into a typed registry entry, preserving order.
    pub fn to_document(&self) -> Result<PolicyDocument, PregError> {
        let entries = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let value = entry.to_value().map_err(|reason| PregError::Manifest {
                    index,
                    key: entry.key.clone(),
                    reason,
                })?;
                Ok(RegistryEntry::new(&entry.key, &entry.value, value))
            })
            .collect::<Result<Vec<_>, PregError>>()?;
        Ok(PolicyDocument::new(entries))
    }
}

impl ManifestEntry {
    fn to_value(&self) -> Result<RegistryValue, String> {
        use ManifestData::{Lines, Number, Text};

        if self.key.trim().is_empty() {
            return Err("key must not be empty".to_string());
        }
        match (self.kind, &self.data) {
            (ValueType::None, None) => Ok(RegistryValue::None),
            (ValueType::String, Some(Text(s))) => Ok(RegistryValue::String(s.clone())),
            (ValueType::String, Some(Number(n))) => Ok(RegistryValue::String(n.to_string())),
            (ValueType::ExpandString, Some(Text(s))) => Ok(RegistryValue::ExpandString(s.clone())),
            (ValueType::MultiString, Some(Lines(lines))) => {
                if lines.iter().any(String::is_empty) {
                    return Err("multi_string lines must not be empty".to_string());
                }
                Ok(RegistryValue::MultiString(lines.clone()))
            }
            (ValueType::MultiString, Some(Text(s))) => {
                Ok(RegistryValue::MultiString(vec![s.clone()]))
            }
            (ValueType::Dword, Some(Number(n))) => u32::try_from(*n)
                .map(RegistryValue::Dword)
                .map_err(|_| format!("{n} does not fit in a dword")),
            (ValueType::DwordBigEndian, Some(Number(n))) => u32::try_from(*n)
                .map(RegistryValue::DwordBigEndian)
                .map_err(|_| format!("{n} does not fit in a dword")),
            (ValueType::Qword, Some(Number(n))) => Ok(RegistryValue::Qword(*n)),
            (ValueType::Binary, Some(Text(hex))) => decode_hex(hex).map(RegistryValue::Binary),
            (kind, None) => Err(format!("type {kind:?} requires data")),
            (kind, Some(_)) => Err(format!("data shape does not match type {kind:?}")),
        }
    }
}

fn decode_hex(hex: &str) -> Result<Vec<u8>, String> {
    let compact: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() % 2 != 0 {
        return Err("binary data must have an even number of hex digits".to_string());
    }
    (0..compact.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&compact[i..i + 2], 16)
                .map_err(|_| format!("invalid hex byte {:?}", &compact[i..i + 2]))
        })
        .collect()
}
