//! # Capability Traits
//!
//! [`CiphertextArithmetic`] is the synchronous half of the capability:
//! homomorphic operations over handles, plus a single-bit reveal used when a
//! comparison result must gate a state transition.
//!
//! [`DecryptionOracle`] is the asynchronous half. A request only registers
//! intent; the cleartext arrives later through a callback carrying a proof
//! that [`DecryptionOracle::verify_decryption`] checks.
//!
//! Both traits require `Send + Sync` so a backend can be shared between
//! request handlers.

use serde::{Deserialize, Serialize};

use estate_core::RequestId;

use crate::error::FheError;
use crate::handle::{CiphertextHandle, EncryptedBool, EncryptedU64};
use crate::payload::CleartextPayload;
use crate::proof::DecryptionProof;

/// Homomorphic operations over encrypted integers.
///
/// Integer semantics follow the 64-bit unsigned ciphertext type: addition and
/// multiplication wrap, division floors.
pub trait CiphertextArithmetic: Send + Sync {
    /// Encrypt a public constant (no secrecy, but usable in arithmetic).
    fn encrypt_trivial(&self, value: u64) -> Result<EncryptedU64, FheError>;

    /// `a + b`.
    fn add(&self, a: &EncryptedU64, b: &EncryptedU64) -> Result<EncryptedU64, FheError>;

    /// `a * b`.
    fn mul(&self, a: &EncryptedU64, b: &EncryptedU64) -> Result<EncryptedU64, FheError>;

    /// `floor(a / divisor)` for a plaintext divisor.
    ///
    /// # Errors
    ///
    /// [`FheError::DivisionByZero`] when `divisor == 0`.
    fn div(&self, a: &EncryptedU64, divisor: u64) -> Result<EncryptedU64, FheError>;

    /// `a > b`.
    fn gt(&self, a: &EncryptedU64, b: &EncryptedU64) -> Result<EncryptedBool, FheError>;

    /// `a == b`.
    fn equal(&self, a: &EncryptedU64, b: &EncryptedU64) -> Result<EncryptedBool, FheError>;

    /// Conditional select (cmux): `condition ? if_true : if_false`.
    fn select(
        &self,
        condition: &EncryptedBool,
        if_true: &EncryptedU64,
        if_false: &EncryptedU64,
    ) -> Result<EncryptedU64, FheError>;

    /// Synchronously reveal one encrypted bit.
    fn reveal_bool(&self, value: &EncryptedBool) -> Result<bool, FheError>;
}

/// Entry point a fulfilled decryption is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackSelector {
    /// Reveal of a vault's asset fields to its owner.
    RevealAsset,
}

impl CallbackSelector {
    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RevealAsset => "reveal_asset",
        }
    }
}

impl std::fmt::Display for CallbackSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asynchronous decryption with verifiable responses.
pub trait DecryptionOracle: Send + Sync {
    /// Queue a decryption of `handles` for delivery to `callback`.
    ///
    /// Returns immediately with a fresh, unique request identifier.
    fn request_decryption(
        &self,
        handles: &[CiphertextHandle],
        callback: CallbackSelector,
    ) -> Result<RequestId, FheError>;

    /// Check that `proof` attests `payload` as the decryption of `handles`
    /// for `request_id`.
    ///
    /// Returns `Ok(false)` for a proof that does not verify. `Err` is
    /// reserved for failures to evaluate the check at all.
    fn verify_decryption(
        &self,
        request_id: RequestId,
        handles: &[CiphertextHandle],
        payload: &CleartextPayload,
        proof: &DecryptionProof,
    ) -> Result<bool, FheError>;
}
