//! # Payload Error Types

use std::path::PathBuf;

use thiserror::Error;

/// Errors from decoding, encoding or loading policy payloads.
#[derive(Error, Debug)]
pub enum PregError {
    /// The first four bytes were not `PReg`.
    #[error("bad signature: expected \"PReg\", found {found:?}")]
    BadSignature {
        /// The bytes actually present.
        found: Vec<u8>,
    },

    /// The header version is not 1.
    #[error("unsupported PReg version {0}")]
    UnsupportedVersion(u32),

    /// The buffer ended inside a field.
    #[error("truncated payload at offset {offset}: needed {needed} more bytes")]
    Truncated {
        /// Byte offset where the read started.
        offset: usize,
        /// Bytes required beyond the end of the buffer.
        needed: usize,
    },

    /// A structural delimiter (`[`, `;`, `]`) was missing.
    #[error("expected {expected:?} at offset {offset}, found 0x{found:04x}")]
    UnexpectedDelimiter {
        /// Byte offset of the offending code unit.
        offset: usize,
        /// Delimiter that should have been there.
        expected: char,
        /// UTF-16 code unit actually found.
        found: u16,
    },

    /// A key, value name or string value was not valid UTF-16.
    #[error("invalid UTF-16 text at offset {offset}")]
    InvalidUtf16 {
        /// Byte offset where the string started.
        offset: usize,
    },

    /// Value data does not fit its declared type.
    #[error("invalid data for {keyname}\\{valuename}: {reason}")]
    InvalidData {
        /// Registry key of the entry.
        keyname: String,
        /// Value name of the entry.
        valuename: String,
        /// What was wrong.
        reason: String,
    },

    /// A value is too large for the 32-bit size field.
    #[error("value for {keyname} is {len} bytes, exceeding the 32-bit size field")]
    Oversized {
        /// Registry key of the entry.
        keyname: String,
        /// Encoded byte length.
        len: usize,
    },

    /// A manifest entry could not be converted into a registry value.
    #[error("manifest entry {index} ({key}): {reason}")]
    Manifest {
        /// Zero-based entry position.
        index: usize,
        /// Registry key of the entry.
        key: String,
        /// What was wrong.
        reason: String,
    },

    /// YAML parsing failed.
    #[error("manifest YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Filesystem access failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}
