#![deny(missing_docs)]

//! # estate-core: Foundational Types for the Estate Vault Stack
//!
//! Every other crate in the workspace depends on `estate-core`; it depends on
//! nothing internal.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** [`Identity`], [`VaultId`] and
//!    [`RequestId`] are distinct types. A request id cannot be passed where a
//!    vault id is expected.
//!
//! 2. **[`CanonicalBytes`] is the sole path to signed or digested bytes.**
//!    Decryption proofs and event digests both flow through
//!    `CanonicalBytes::new()`.
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] is truncated to seconds and is
//!    the clock value that time-lock conditions are compared against.
//!
//! 4. **Structured errors.** [`ValidationError`] and
//!    [`CanonicalizationError`] via `thiserror`; no `.unwrap()` outside
//!    tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{Identity, RequestId, VaultId};
pub use temporal::Timestamp;
