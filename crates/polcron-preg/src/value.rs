//! # Registry Values
//!
//! Typed view over the `(type, data)` pair of a PReg entry. String types are
//! stored as UTF-16LE with NUL terminators on the wire; integers are
//! little-endian except `REG_DWORD_BIG_ENDIAN`.
//!
//! String data that is not valid UTF-16 (odd length, lone surrogate) is kept
//! as [`RegistryValue::Raw`]: the entry survives without text, and the rest
//! of the payload still decodes. Fixed-width integers of the wrong size are
//! a framing error and reject the payload.
//!
//! Only string-typed values have a textual form (`RegistryValue::text`).
//! Script bodies are always read through that view, so a stray DWORD under a
//! script key is never mistaken for a body.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Registry value type codes used in PReg payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// `REG_NONE` (0).
    None,
    /// `REG_SZ` (1).
    String,
    /// `REG_EXPAND_SZ` (2).
    ExpandString,
    /// `REG_BINARY` (3).
    Binary,
    /// `REG_DWORD` (4).
    Dword,
    /// `REG_DWORD_BIG_ENDIAN` (5).
    DwordBigEndian,
    /// `REG_MULTI_SZ` (7).
    MultiString,
    /// `REG_QWORD` (11).
    Qword,
}

impl ValueType {
    /// The on-wire type code.
    pub fn code(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::String => 1,
            Self::ExpandString => 2,
            Self::Binary => 3,
            Self::Dword => 4,
            Self::DwordBigEndian => 5,
            Self::MultiString => 7,
            Self::Qword => 11,
        }
    }

    /// Map an on-wire type code to a known type.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::String),
            2 => Some(Self::ExpandString),
            3 => Some(Self::Binary),
            4 => Some(Self::Dword),
            5 => Some(Self::DwordBigEndian),
            7 => Some(Self::MultiString),
            11 => Some(Self::Qword),
            _ => None,
        }
    }
}

/// A decoded registry value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryValue {
    /// `REG_NONE` with no data.
    None,
    /// `REG_SZ`.
    String(String),
    /// `REG_EXPAND_SZ`, kept unexpanded.
    ExpandString(String),
    /// `REG_BINARY`.
    Binary(Vec<u8>),
    /// `REG_DWORD`.
    Dword(u32),
    /// `REG_DWORD_BIG_ENDIAN`.
    DwordBigEndian(u32),
    /// `REG_MULTI_SZ`.
    MultiString(Vec<String>),
    /// `REG_QWORD`.
    Qword(u64),
    /// Any other type code, `REG_NONE` carrying data, or string data that is
    /// not valid UTF-16, kept as raw bytes.
    Raw {
        /// The on-wire type code.
        type_code: u32,
        /// Raw data bytes.
        bytes: Vec<u8>,
    },
}

impl RegistryValue {
    /// The on-wire type code of this value.
    pub fn type_code(&self) -> u32 {
        match self {
            Self::None => ValueType::None.code(),
            Self::String(_) => ValueType::String.code(),
            Self::ExpandString(_) => ValueType::ExpandString.code(),
            Self::Binary(_) => ValueType::Binary.code(),
            Self::Dword(_) => ValueType::Dword.code(),
            Self::DwordBigEndian(_) => ValueType::DwordBigEndian.code(),
            Self::MultiString(_) => ValueType::MultiString.code(),
            Self::Qword(_) => ValueType::Qword.code(),
            Self::Raw { type_code, .. } => *type_code,
        }
    }

    /// Textual data, if this is a string-typed value.
    ///
    /// `REG_MULTI_SZ` strings are joined with `\n`, so a multi-line script
    /// can be published as one value.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::String(s) | Self::ExpandString(s) => Some(Cow::Borrowed(s)),
            Self::MultiString(lines) => Some(Cow::Owned(lines.join("\n"))),
            _ => None,
        }
    }

    /// Decode wire data of the given type.
    ///
    /// Returns a human-readable reason on failure; the caller attaches the
    /// entry's key and value name.
    pub(crate) fn decode(type_code: u32, data: &[u8]) -> Result<Self, String> {
        let Some(kind) = ValueType::from_code(type_code) else {
            return Ok(Self::Raw {
                type_code,
                bytes: data.to_vec(),
            });
        };
        match kind {
            ValueType::None if data.is_empty() => Ok(Self::None),
            ValueType::None => Ok(Self::Raw {
                type_code,
                bytes: data.to_vec(),
            }),
            ValueType::String => Ok(or_raw(type_code, data, decode_sz(data).map(Self::String))),
            ValueType::ExpandString => Ok(or_raw(
                type_code,
                data,
                decode_sz(data).map(Self::ExpandString),
            )),
            ValueType::Binary => Ok(Self::Binary(data.to_vec())),
            ValueType::Dword => fixed::<4>(data).map(|b| Self::Dword(u32::from_le_bytes(b))),
            ValueType::DwordBigEndian => {
                fixed::<4>(data).map(|b| Self::DwordBigEndian(u32::from_be_bytes(b)))
            }
            ValueType::Qword => fixed::<8>(data).map(|b| Self::Qword(u64::from_le_bytes(b))),
            ValueType::MultiString => Ok(or_raw(
                type_code,
                data,
                decode_multi_sz(data).map(Self::MultiString),
            )),
        }
    }

    /// Encode this value's wire data.
    pub(crate) fn encode(&self) -> Vec<u8> {
        match self {
            Self::None => Vec::new(),
            Self::String(s) | Self::ExpandString(s) => {
                let mut out = utf16le(s);
                out.extend_from_slice(&[0, 0]);
                out
            }
            Self::Binary(bytes) => bytes.clone(),
            Self::Dword(v) => v.to_le_bytes().to_vec(),
            Self::DwordBigEndian(v) => v.to_be_bytes().to_vec(),
            Self::Qword(v) => v.to_le_bytes().to_vec(),
            Self::MultiString(lines) => {
                let mut out = Vec::new();
                for line in lines {
                    out.extend(utf16le(line));
                    out.extend_from_slice(&[0, 0]);
                }
                out.extend_from_slice(&[0, 0]);
                out
            }
            Self::Raw { bytes, .. } => bytes.clone(),
        }
    }
}

fn or_raw(type_code: u32, data: &[u8], decoded: Result<RegistryValue, String>) -> RegistryValue {
    decoded.unwrap_or_else(|reason| {
        tracing::debug!(type_code, %reason, "string data kept as raw bytes");
        RegistryValue::Raw {
            type_code,
            bytes: data.to_vec(),
        }
    })
}

/// Encode text as UTF-16LE without a terminator.
pub(crate) fn utf16le(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

fn code_units(data: &[u8]) -> Result<Vec<u16>, String> {
    if data.len() % 2 != 0 {
        return Err(format!("odd byte length {} for UTF-16 data", data.len()));
    }
    Ok(data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

fn decode_sz(data: &[u8]) -> Result<String, String> {
    let mut units = code_units(data)?;
    while units.last() == Some(&0) {
        units.pop();
    }
    String::from_utf16(&units).map_err(|e| e.to_string())
}

fn decode_multi_sz(data: &[u8]) -> Result<Vec<String>, String> {
    let units = code_units(data)?;
    let mut lines = Vec::new();
    let mut current = Vec::new();
    for unit in units {
        if unit == 0 {
            if current.is_empty() {
                // Double NUL terminates the list.
                break;
            }
            lines.push(String::from_utf16(&current).map_err(|e| e.to_string())?);
            current.clear();
        } else {
            current.push(unit);
        }
    }
    if !current.is_empty() {
        lines.push(String::from_utf16(&current).map_err(|e| e.to_string())?);
    }
    Ok(lines)
}

fn fixed<const N: usize>(data: &[u8]) -> Result<[u8; N], String> {
    data.try_into()
        .map_err(|_| format!("expected {N} bytes, found {}", data.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_code_roundtrip() {
        for code in [0, 1, 2, 3, 4, 5, 7, 11] {
            let kind = ValueType::from_code(code).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert!(ValueType::from_code(6).is_none());
    }

    #[test]
    fn test_sz_wire_format() {
        let value = RegistryValue::String("hi".into());
        assert_eq!(value.encode(), vec![b'h', 0, b'i', 0, 0, 0]);
        assert_eq!(RegistryValue::decode(1, &value.encode()).unwrap(), value);
    }

    #[test]
    fn test_sz_without_terminator_accepted() {
        let decoded = RegistryValue::decode(1, &[b'o', 0, b'k', 0]).unwrap();
        assert_eq!(decoded, RegistryValue::String("ok".into()));
    }

    #[test]
    fn test_multi_sz_text_joins_lines() {
        let value = RegistryValue::MultiString(vec!["set -e".into(), "echo hi".into()]);
        let decoded = RegistryValue::decode(7, &value.encode()).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(decoded.text().unwrap(), "set -e\necho hi");
    }

    #[test]
    fn test_non_string_values_have_no_text() {
        assert!(RegistryValue::Dword(1).text().is_none());
        assert!(RegistryValue::Binary(vec![1, 2]).text().is_none());
        assert!(RegistryValue::None.text().is_none());
    }

    #[test]
    fn test_dword_length_checked() {
        assert_eq!(
            RegistryValue::decode(4, &7u32.to_le_bytes()).unwrap(),
            RegistryValue::Dword(7)
        );
        assert!(RegistryValue::decode(4, &[1, 2, 3]).is_err());
        assert_eq!(
            RegistryValue::decode(5, &[0, 0, 0, 9]).unwrap(),
            RegistryValue::DwordBigEndian(9)
        );
    }

    #[test]
    fn test_odd_length_string_kept_raw() {
        let decoded = RegistryValue::decode(1, &[b'a', 0, b'b']).unwrap();
        assert_eq!(
            decoded,
            RegistryValue::Raw {
                type_code: 1,
                bytes: vec![b'a', 0, b'b']
            }
        );
        assert!(decoded.text().is_none());
    }

    #[test]
    fn test_lone_surrogate_kept_raw() {
        // 0xD800 with no low surrogate after it.
        let data = [0x00, 0xD8, b'x', 0, 0, 0];
        let sz = RegistryValue::decode(2, &data).unwrap();
        assert!(matches!(sz, RegistryValue::Raw { type_code: 2, .. }));
        assert!(sz.text().is_none());

        let multi = RegistryValue::decode(7, &[b'o', 0, b'k', 0, 0, 0, 0x00, 0xD8, 0, 0, 0, 0]).unwrap();
        assert!(matches!(multi, RegistryValue::Raw { type_code: 7, .. }));
        assert_eq!(multi.encode(), vec![b'o', 0, b'k', 0, 0, 0, 0x00, 0xD8, 0, 0, 0, 0]);
    }

    #[test]
    fn test_unknown_type_kept_raw() {
        let decoded = RegistryValue::decode(99, &[1, 2, 3]).unwrap();
        assert_eq!(
            decoded,
            RegistryValue::Raw {
                type_code: 99,
                bytes: vec![1, 2, 3]
            }
        );
        assert_eq!(decoded.type_code(), 99);
    }

    #[test]
    fn test_none_with_data_kept_raw() {
        let decoded = RegistryValue::decode(0, &[5]).unwrap();
        assert!(matches!(decoded, RegistryValue::Raw { type_code: 0, .. }));
        assert_eq!(RegistryValue::decode(0, &[]).unwrap(), RegistryValue::None);
    }
}
