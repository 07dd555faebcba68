//! # Ciphertext Handles
//!
//! A [`CiphertextHandle`] is an opaque 32-byte reference to a ciphertext held
//! by an engine. It reveals nothing about the value; it is safe to store,
//! log and emit in events.
//!
//! [`EncryptedU64`] and [`EncryptedBool`] add a type tag on top so the vault
//! core cannot pass a comparison result where an amount is expected.
//!
//! Handles serialize as lowercase hex strings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An opaque reference to a ciphertext.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CiphertextHandle([u8; 32]);

impl CiphertextHandle {
    /// Wrap raw handle bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw handle bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as a 64-character lowercase hex string.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, String> {
        let bytes = from_hex(s.trim())?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| format!("handle must be 32 bytes, got {}", v.len()))?;
        Ok(Self(arr))
    }
}

impl Serialize for CiphertextHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CiphertextHandle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for CiphertextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CiphertextHandle({}...)", to_hex(&self.0[..4]))
    }
}

impl std::fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// An encrypted unsigned 64-bit integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedU64(CiphertextHandle);

impl EncryptedU64 {
    /// Tag a handle as an encrypted u64. Engines validate the tag on use.
    pub fn from_handle(handle: CiphertextHandle) -> Self {
        Self(handle)
    }

    /// The underlying handle.
    pub fn handle(&self) -> CiphertextHandle {
        self.0
    }
}

/// An encrypted boolean, produced by comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedBool(CiphertextHandle);

impl EncryptedBool {
    /// Tag a handle as an encrypted boolean.
    pub fn from_handle(handle: CiphertextHandle) -> Self {
        Self(handle)
    }

    /// The underlying handle.
    pub fn handle(&self) -> CiphertextHandle {
        self.0
    }
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub(crate) fn from_hex(hex: &str) -> Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 {
        return Err("hex string must have even length".to_string());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .ok_or_else(|| format!("invalid hex at position {i}"))
                .and_then(|pair| {
                    u8::from_str_radix(pair, 16).map_err(|e| format!("invalid hex at position {i}: {e}"))
                })
        })
        .collect()
}
