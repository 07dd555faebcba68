//! # Identity Newtypes
//!
//! Newtype wrappers for the identifiers used by the vault stack.
//!
//! - [`Identity`]: an account identity (vault owner, executor, notary). The
//!   stack never interprets it beyond equality; wallet and account management
//!   live outside the core.
//! - [`VaultId`]: a positive, monotonically assigned vault number.
//! - [`RequestId`]: a decryption request number issued by the oracle.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const MAX_IDENTITY_LEN: usize = 128;

/// An account identity.
///
/// Accepted characters are ASCII alphanumerics plus `:`, `.`, `_` and `-`,
/// which covers hex addresses (`0xabc...`), DIDs (`did:key:z6Mk...`) and
/// plain test names (`alice`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Create an identity, validating its format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidIdentity`] for empty, oversized, or
    /// non-conforming input.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let well_formed = !s.is_empty()
            && s.len() <= MAX_IDENTITY_LEN
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '.' | '_' | '-'));
        if !well_formed {
            return Err(ValidationError::InvalidIdentity(s));
        }
        Ok(Self(s))
    }

    /// Access the identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Identity {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Identity> for String {
    fn from(id: Identity) -> Self {
        id.0
    }
}

impl std::str::FromStr for Identity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A vault identifier. Always positive; the registry assigns them
/// sequentially starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct VaultId(u64);

impl VaultId {
    /// The first identifier a registry hands out.
    pub const FIRST: VaultId = VaultId(1);

    /// Create a vault identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroVaultId`] for `0`.
    pub fn new(value: u64) -> Result<Self, ValidationError> {
        if value == 0 {
            return Err(ValidationError::ZeroVaultId);
        }
        Ok(Self(value))
    }

    /// The raw numeric value.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// The identifier following this one, or `None` at `u64::MAX`.
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl TryFrom<u64> for VaultId {
    type Error = ValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VaultId> for u64 {
    fn from(id: VaultId) -> Self {
        id.0
    }
}

impl std::fmt::Display for VaultId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vault:{}", self.0)
    }
}

/// A decryption request identifier, unique per oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    /// Wrap a raw request number.
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// The raw numeric value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "request:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_accepts_common_forms() {
        assert!(Identity::new("alice").is_ok());
        assert!(Identity::new("0x52908400098527886E0F7030069857D2E4169EE7").is_ok());
        assert!(Identity::new("did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK").is_ok());
    }

    #[test]
    fn identity_rejects_malformed() {
        assert!(Identity::new("").is_err());
        assert!(Identity::new("has space").is_err());
        assert!(Identity::new("semi;colon").is_err());
        assert!(Identity::new("a".repeat(MAX_IDENTITY_LEN + 1)).is_err());
    }

    #[test]
    fn identity_serde_validates() {
        let id: Identity = serde_json::from_str("\"bob\"").unwrap();
        assert_eq!(id.as_str(), "bob");
        assert!(serde_json::from_str::<Identity>("\"\"").is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"bob\"");
    }

    #[test]
    fn vault_id_rejects_zero() {
        assert!(VaultId::new(0).is_err());
        assert!(serde_json::from_str::<VaultId>("0").is_err());
    }

    #[test]
    fn vault_id_sequence() {
        let first = VaultId::FIRST;
        assert_eq!(first.get(), 1);
        let second = first.next().unwrap();
        assert_eq!(second.get(), 2);
        assert!(first < second);
    }

    #[test]
    fn vault_id_sequence_ends_at_max() {
        let last = VaultId::new(u64::MAX).unwrap();
        assert!(last.next().is_none());
    }

    #[test]
    fn vault_id_serializes_as_number() {
        let id = VaultId::new(7).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
        assert_eq!(format!("{id}"), "vault:7");
    }

    #[test]
    fn request_id_display() {
        assert_eq!(format!("{}", RequestId::from_raw(3)), "request:3");
    }
}
