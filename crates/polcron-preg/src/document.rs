//! # PReg Document
//!
//! A policy payload is a header followed by an ordered list of entries:
//!
//! ```text
//! "PReg" | version: u32 LE (= 1) | entry*
//! entry = '[' key NUL ';' value NUL ';' type: u32 ';' size: u32 ';' data[size] ']'
//! ```
//!
//! Delimiters, key and value names are UTF-16LE. The decoder is strict:
//! anything structurally wrong is an error carrying the byte offset. Callers
//! that want "unreadable means empty" semantics go through
//! [`crate::parser::PolicyParser`] instead.

use std::path::Path;

use crate::error::PregError;
use crate::value::{utf16le, RegistryValue};

/// File signature of a PReg payload.
pub const PREG_SIGNATURE: &[u8; 4] = b"PReg";

/// The only PReg version in use.
pub const PREG_VERSION: u32 = 1;

const OPEN: u16 = '[' as u16;
const SEP: u16 = ';' as u16;
const CLOSE: u16 = ']' as u16;

/// One `(key, value name, value)` triple from a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Full registry key path, backslash-separated.
    pub keyname: String,
    /// Value name under the key.
    pub valuename: String,
    /// Typed value.
    pub value: RegistryValue,
}

impl RegistryEntry {
    /// Build an entry.
    pub fn new(
        keyname: impl Into<String>,
        valuename: impl Into<String>,
        value: RegistryValue,
    ) -> Self {
        Self {
            keyname: keyname.into(),
            valuename: valuename.into(),
            value,
        }
    }

    /// Textual data of the entry, if string-typed.
    pub fn data(&self) -> Option<std::borrow::Cow<'_, str>> {
        self.value.text()
    }
}

/// An ordered list of registry entries decoded from one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyDocument {
    /// Entries in payload order.
    pub entries: Vec<RegistryEntry>,
}

impl PolicyDocument {
    /// Build a document from entries.
    pub fn new(entries: Vec<RegistryEntry>) -> Self {
        Self { entries }
    }

    /// Whether the document holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Strictly decode a PReg payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, PregError> {
        let mut cursor = Cursor::new(bytes);
        let signature = cursor.take(4)?;
        if signature != PREG_SIGNATURE {
            return Err(PregError::BadSignature {
                found: signature.to_vec(),
            });
        }
        let version = cursor.u32()?;
        if version != PREG_VERSION {
            return Err(PregError::UnsupportedVersion(version));
        }

        let mut entries = Vec::new();
        while !cursor.at_end() {
            entries.push(decode_entry(&mut cursor)?);
        }
        Ok(Self { entries })
    }

    /// Encode this document as a PReg payload.
    pub fn encode(&self) -> Result<Vec<u8>, PregError> {
        let mut out = Vec::with_capacity(8 + self.entries.len() * 64);
        out.extend_from_slice(PREG_SIGNATURE);
        out.extend_from_slice(&PREG_VERSION.to_le_bytes());
        for entry in &self.entries {
            let data = entry.value.encode();
            let size = u32::try_from(data.len()).map_err(|_| PregError::Oversized {
                keyname: entry.keyname.clone(),
                len: data.len(),
            })?;
            push_unit(&mut out, OPEN);
            out.extend(utf16le(&entry.keyname));
            push_unit(&mut out, 0);
            push_unit(&mut out, SEP);
            out.extend(utf16le(&entry.valuename));
            push_unit(&mut out, 0);
            push_unit(&mut out, SEP);
            out.extend_from_slice(&entry.value.type_code().to_le_bytes());
            push_unit(&mut out, SEP);
            out.extend_from_slice(&size.to_le_bytes());
            push_unit(&mut out, SEP);
            out.extend_from_slice(&data);
            push_unit(&mut out, CLOSE);
        }
        Ok(out)
    }

    /// Read and strictly decode a payload file.
    pub fn read(path: &Path) -> Result<Self, PregError> {
        let bytes = std::fs::read(path).map_err(|source| PregError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&bytes)
    }

    /// Encode and write this document to a file.
    pub fn write(&self, path: &Path) -> Result<(), PregError> {
        let bytes = self.encode()?;
        std::fs::write(path, bytes).map_err(|source| PregError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn decode_entry(cursor: &mut Cursor<'_>) -> Result<RegistryEntry, PregError> {
    cursor.expect(OPEN, '[')?;
    let keyname = cursor.utf16z()?;
    cursor.expect(SEP, ';')?;
    let valuename = cursor.utf16z()?;
    cursor.expect(SEP, ';')?;
    let type_code = cursor.u32()?;
    cursor.expect(SEP, ';')?;
    let size = cursor.u32()? as usize;
    cursor.expect(SEP, ';')?;
    let data = cursor.take(size)?;
    cursor.expect(CLOSE, ']')?;

    let value = RegistryValue::decode(type_code, data).map_err(|reason| PregError::InvalidData {
        keyname: keyname.clone(),
        valuename: valuename.clone(),
        reason,
    })?;
    Ok(RegistryEntry {
        keyname,
        valuename,
        value,
    })
}

fn push_unit(out: &mut Vec<u8>, unit: u16) {
    out.extend_from_slice(&unit.to_le_bytes());
}

/// Bounds-checked little-endian reader.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], PregError> {
        let remaining = self.buf.len() - self.pos;
        if n > remaining {
            return Err(PregError::Truncated {
                offset: self.pos,
                needed: n - remaining,
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16, PregError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, PregError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn expect(&mut self, unit: u16, expected: char) -> Result<(), PregError> {
        let offset = self.pos;
        let found = self.u16()?;
        if found != unit {
            return Err(PregError::UnexpectedDelimiter {
                offset,
                expected,
                found,
            });
        }
        Ok(())
    }

    /// Read a NUL-terminated UTF-16LE string.
    fn utf16z(&mut self) -> Result<String, PregError> {
        let offset = self.pos;
        let mut units = Vec::new();
        loop {
            match self.u16()? {
                0 => break,
                unit => units.push(unit),
            }
        }
        String::from_utf16(&units).map_err(|_| PregError::InvalidUtf16 { offset })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAILY: &str = "Software\\Policies\\Samba\\Unix Settings\\Daily Scripts";

    fn sample() -> PolicyDocument {
        PolicyDocument::new(vec![
            RegistryEntry::new(DAILY, "1", RegistryValue::String("echo hi".into())),
            RegistryEntry::new("Software\\Policies\\Other", "Enabled", RegistryValue::Dword(1)),
        ])
    }

    #[test]
    fn test_header_only_is_empty_document() {
        let mut bytes = PREG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        let doc = PolicyDocument::decode(&bytes).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_encode_then_decode_preserves_entries_and_order() {
        let doc = sample();
        let decoded = PolicyDocument::decode(&doc.encode().unwrap()).unwrap();
        assert_eq!(decoded, doc);
        assert_eq!(decoded.entries[0].data().unwrap(), "echo hi");
    }

    #[test]
    fn test_entry_wire_layout() {
        let doc = PolicyDocument::new(vec![RegistryEntry::new("K", "V", RegistryValue::Dword(2))]);
        let bytes = doc.encode().unwrap();
        let parts: [&[u8]; 8] = [
            b"PReg",
            &[1, 0, 0, 0],
            &[b'[', 0, b'K', 0, 0, 0, b';', 0],
            &[b'V', 0, 0, 0, b';', 0],
            &[4, 0, 0, 0, b';', 0],
            &[4, 0, 0, 0, b';', 0],
            &[2, 0, 0, 0],
            &[b']', 0],
        ];
        assert_eq!(bytes, parts.concat());
    }

    #[test]
    fn test_bad_signature_rejected() {
        let err = PolicyDocument::decode(b"RegP\x01\x00\x00\x00").unwrap_err();
        assert!(matches!(err, PregError::BadSignature { .. }));
    }

    #[test]
    fn test_empty_buffer_is_truncated() {
        let err = PolicyDocument::decode(&[]).unwrap_err();
        assert!(matches!(err, PregError::Truncated { offset: 0, .. }));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let mut bytes = PREG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        assert!(matches!(
            PolicyDocument::decode(&bytes).unwrap_err(),
            PregError::UnsupportedVersion(2)
        ));
    }

    #[test]
    fn test_truncated_entry_rejected() {
        let bytes = sample().encode().unwrap();
        let err = PolicyDocument::decode(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, PregError::Truncated { .. }));
    }

    #[test]
    fn test_missing_close_bracket_rejected() {
        let mut bytes = sample().encode().unwrap();
        let last = bytes.len() - 2;
        bytes[last] = b')';
        let err = PolicyDocument::decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            PregError::UnexpectedDelimiter { expected: ']', .. }
        ));
    }

    #[test]
    fn test_bad_string_does_not_reject_other_entries() {
        let doc = PolicyDocument::new(vec![
            RegistryEntry::new(
                "Daily",
                "1",
                RegistryValue::Raw {
                    type_code: 1,
                    bytes: vec![b'a'],
                },
            ),
            RegistryEntry::new("Weekly", "1", RegistryValue::String("echo w".into())),
        ]);
        let decoded = PolicyDocument::decode(&doc.encode().unwrap()).unwrap();
        assert_eq!(decoded, doc);
        assert!(decoded.entries[0].data().is_none());
        assert_eq!(decoded.entries[1].data().unwrap(), "echo w");
    }

    #[test]
    fn test_invalid_dword_size_reports_key() {
        let doc = PolicyDocument::new(vec![RegistryEntry::new(
            "K",
            "V",
            RegistryValue::Raw {
                type_code: 4,
                bytes: vec![1, 2],
            },
        )]);
        let err = PolicyDocument::decode(&doc.encode().unwrap()).unwrap_err();
        match err {
            PregError::InvalidData { keyname, .. } => assert_eq!(keyname, "K"),
            other => panic!("expected InvalidData, got {other}"),
        }
    }

    #[test]
    fn test_read_and_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Registry.pol");
        sample().write(&path).unwrap();
        assert_eq!(PolicyDocument::read(&path).unwrap(), sample());
    }
}
