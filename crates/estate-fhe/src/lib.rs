//! # estate-fhe: Ciphertext Capability
//!
//! The vault core never touches plaintext. Everything it knows about asset
//! values, shares and release conditions is a [`CiphertextHandle`] that only
//! an engine can operate on.
//!
//! ## Architecture
//!
//! - **Handles** (`handle.rs`): opaque 32-byte handles and the typed wrappers
//!   [`EncryptedU64`] and [`EncryptedBool`].
//!
//! - **Traits** (`traits.rs`): [`CiphertextArithmetic`] (add, mul, div, gt,
//!   equal, select, single-bit reveal) and [`DecryptionOracle`] (asynchronous
//!   request plus proof verification). A production TFHE backend and the
//!   reference engine are interchangeable behind these traits.
//!
//! - **Payload** (`payload.rs`): the word-encoded cleartext delivered by the
//!   oracle callback.
//!
//! - **Proof** (`proof.rs`): Ed25519 signatures by the oracle key over the
//!   canonical decryption statement.
//!
//! - **Clear** (`clear.rs`, feature `clear`): [`ClearEngine`] and
//!   [`ClearOracle`], a transparent implementation backed by a plaintext
//!   table. It provides NO confidentiality.

pub mod error;
pub mod handle;
pub mod payload;
pub mod proof;
pub mod traits;

#[cfg(feature = "clear")]
pub mod clear;

pub use error::FheError;
pub use handle::{CiphertextHandle, EncryptedBool, EncryptedU64};
pub use payload::CleartextPayload;
pub use proof::{DecryptionProof, OracleKeyPair, OraclePublicKey};
pub use traits::{CallbackSelector, CiphertextArithmetic, DecryptionOracle};

#[cfg(feature = "clear")]
pub use clear::{ClearEngine, ClearOracle, DecryptionResponse};
