//! # Decryption Proofs
//!
//! An oracle attests a decryption by signing, with Ed25519, the canonical
//! bytes of the statement
//!
//! ```json
//! {"cleartexts": "<hex payload>", "handles": ["<hex>", ...], "request_id": n}
//! ```
//!
//! Binding the request id and the handles prevents a valid response for one
//! vault (or one request) from being replayed into another.
//!
//! ## Security Invariant
//!
//! - The statement always flows through `CanonicalBytes`.
//! - `OracleKeyPair` does not implement `Serialize` and its `Debug` output
//!   hides the private key.

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use estate_core::{CanonicalBytes, RequestId};

use crate::error::FheError;
use crate::handle::{from_hex, to_hex, CiphertextHandle};
use crate::payload::CleartextPayload;

#[derive(Serialize)]
struct DecryptionStatement<'a> {
    request_id: RequestId,
    handles: &'a [CiphertextHandle],
    cleartexts: String,
}

/// Canonical bytes an oracle signs for a decryption response.
pub fn decryption_statement(
    request_id: RequestId,
    handles: &[CiphertextHandle],
    payload: &CleartextPayload,
) -> Result<CanonicalBytes, FheError> {
    let statement = DecryptionStatement {
        request_id,
        handles,
        cleartexts: payload.to_hex(),
    };
    Ok(CanonicalBytes::new(&statement)?)
}

/// The oracle's Ed25519 public key (32 bytes), hex-encoded in serde.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OraclePublicKey([u8; 32]);

impl OraclePublicKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, FheError> {
        let bytes = from_hex(s.trim()).map_err(FheError::InvalidKey)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| FheError::InvalidKey(format!("expected 32 bytes, got {}", v.len())))?;
        Ok(Self(arr))
    }

    fn to_verifying_key(self) -> Result<ed25519_dalek::VerifyingKey, FheError> {
        ed25519_dalek::VerifyingKey::from_bytes(&self.0)
            .map_err(|e| FheError::InvalidKey(e.to_string()))
    }
}

impl Serialize for OraclePublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for OraclePublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for OraclePublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OraclePublicKey({}...)", to_hex(&self.0[..4]))
    }
}

/// An Ed25519 signature attesting a decryption response.
#[derive(Clone, PartialEq, Eq)]
pub struct DecryptionProof([u8; 64]);

impl DecryptionProof {
    /// Wrap raw signature bytes as received from a relayer.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// The raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }
}

impl Serialize for DecryptionProof {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for DecryptionProof {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = from_hex(s.trim()).map_err(serde::de::Error::custom)?;
        let arr: [u8; 64] = bytes.try_into().map_err(|v: Vec<u8>| {
            serde::de::Error::custom(format!("proof must be 64 bytes, got {}", v.len()))
        })?;
        Ok(Self(arr))
    }
}

impl std::fmt::Debug for DecryptionProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DecryptionProof({}...)", to_hex(&self.0[..4]))
    }
}

/// The oracle signing key.
pub struct OracleKeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

impl OracleKeyPair {
    /// Generate a fresh random key pair.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Derive a key pair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// The matching public key.
    pub fn public_key(&self) -> OraclePublicKey {
        OraclePublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign the decryption statement for a response.
    pub fn sign_decryption(
        &self,
        request_id: RequestId,
        handles: &[CiphertextHandle],
        payload: &CleartextPayload,
    ) -> Result<DecryptionProof, FheError> {
        let statement = decryption_statement(request_id, handles, payload)?;
        let sig = self.signing_key.sign(statement.as_bytes());
        Ok(DecryptionProof(sig.to_bytes()))
    }
}

impl std::fmt::Debug for OracleKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OracleKeyPair(<private>)")
    }
}

/// Verify a decryption proof against a trusted oracle key.
///
/// Returns `Ok(false)` for any signature that does not verify, including one
/// made by a different key.
pub fn verify_decryption_proof(
    public_key: &OraclePublicKey,
    request_id: RequestId,
    handles: &[CiphertextHandle],
    payload: &CleartextPayload,
    proof: &DecryptionProof,
) -> Result<bool, FheError> {
    let vk = public_key.to_verifying_key()?;
    let statement = decryption_statement(request_id, handles, payload)?;
    let sig = ed25519_dalek::Signature::from_bytes(&proof.0);
    Ok(vk.verify(statement.as_bytes(), &sig).is_ok())
}
