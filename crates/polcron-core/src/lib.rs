//! # polcron-core — Foundational Types
//!
//! The leaf crate of the polcron workspace. It defines the small set of
//! primitives every other crate agrees on: who declared a policy, which
//! schedule bucket it targets, and how a declared body list is reduced to
//! a content hash.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype identifiers.** `SourceId`, `AttributeName` and `ExtensionId`
//!    are distinct types with validated constructors. A ledger key can never
//!    be built from a bare, empty string.
//!
//! 2. **`CanonicalBytes` for hashing.** Every content hash is computed over
//!    RFC 8785 canonical JSON, so an ordered body list has exactly one byte
//!    representation and the hash is injective over ordered lists.
//!
//! 3. **Single `ScheduleCategory` enum.** Hourly, daily, weekly and monthly
//!    are one definition with exhaustive `match` everywhere.
//!
//! 4. **UTC-only timestamps.** `Timestamp` is UTC with seconds precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `polcron-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod category;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use category::{ScheduleCategory, SCHEDULE_CATEGORY_COUNT};
pub use digest::{content_hash, sha256_digest, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, IdentityError, PolcronError};
pub use identity::{AttributeName, ExtensionId, SourceId};
pub use temporal::Timestamp;
