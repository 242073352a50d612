//! # polcron-preg — Policy Payload Codec
//!
//! Reads and writes the binary registry policy format (`Registry.pol`, signature
//! `PReg`) that policy sources carry, and exposes the parser seam the
//! reconciliation core consumes.
//!
//! - **Value** (`value.rs`): typed registry values and their textual view.
//! - **Document** (`document.rs`): the ordered entry list with a strict
//!   decoder and a byte-exact encoder.
//! - **Parser** (`parser.rs`): the `PolicyParser` trait. Missing, unreadable
//!   or malformed payloads yield `None`, never an error.
//! - **Manifest** (`manifest.rs`): YAML authoring format compiled into a
//!   document.
//!
//! ## Crate Policy
//!
//! - Entry order is preserved exactly as stored; it is significant downstream.
//! - `decode(encode(doc)) == doc` for every document this crate can build.

pub mod document;
pub mod error;
pub mod manifest;
pub mod parser;
pub mod value;

pub use document::{PolicyDocument, RegistryEntry, PREG_SIGNATURE, PREG_VERSION};
pub use error::PregError;
pub use manifest::PolicyManifest;
pub use parser::{PolicyParser, PregParser};
pub use value::{RegistryValue, ValueType};
