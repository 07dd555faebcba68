//! # Cleartext Payload
//!
//! The oracle delivers decrypted values as a flat byte string of 32-byte
//! big-endian words, one per requested handle, in request order. A u64 sits
//! in the low 8 bytes of its word; booleans are `0` or `1`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FheError;
use crate::handle::{from_hex, to_hex};

const WORD: usize = 32;

/// Word-encoded cleartext values delivered by an oracle callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleartextPayload(Vec<u8>);

impl CleartextPayload {
    /// Wrap raw payload bytes as received from a relayer.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Encode values, one word each.
    pub fn encode_words(values: &[u64]) -> Self {
        let mut bytes = Vec::with_capacity(values.len() * WORD);
        for v in values {
            bytes.extend_from_slice(&[0u8; WORD - 8]);
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        Self(bytes)
    }

    /// Decode exactly `expected` words.
    ///
    /// # Errors
    ///
    /// [`FheError::MalformedPayload`] if the length is not `expected * 32` or
    /// a word does not fit in a u64.
    pub fn decode_words(&self, expected: usize) -> Result<Vec<u64>, FheError> {
        if self.0.len() != expected * WORD {
            return Err(FheError::MalformedPayload(format!(
                "expected {} bytes for {expected} words, got {}",
                expected * WORD,
                self.0.len()
            )));
        }
        self.0
            .chunks_exact(WORD)
            .enumerate()
            .map(|(i, word)| {
                let (high, low) = word.split_at(WORD - 8);
                if high.iter().any(|b| *b != 0) {
                    return Err(FheError::MalformedPayload(format!(
                        "word {i} exceeds 64 bits"
                    )));
                }
                let mut buf = [0u8; 8];
                buf.copy_from_slice(low);
                Ok(u64::from_be_bytes(buf))
            })
            .collect()
    }

    /// The raw payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex rendering, used in the signed decryption statement.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }
}

impl Serialize for CleartextPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CleartextPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        from_hex(s.trim())
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_one_word_per_value() {
        let p = CleartextPayload::encode_words(&[1, 2000, 42]);
        assert_eq!(p.as_bytes().len(), 96);
        assert_eq!(p.as_bytes()[31], 1);
        assert_eq!(p.decode_words(3).unwrap(), vec![1, 2000, 42]);
    }

    #[test]
    fn decode_rejects_wrong_word_count() {
        let p = CleartextPayload::encode_words(&[1, 2]);
        assert!(matches!(
            p.decode_words(3),
            Err(FheError::MalformedPayload(_))
        ));
    }

    #[test]
    fn decode_rejects_oversized_word() {
        let mut bytes = CleartextPayload::encode_words(&[7]).as_bytes().to_vec();
        bytes[0] = 1;
        let p = CleartextPayload::from_bytes(bytes);
        assert!(p.decode_words(1).is_err());
    }

    #[test]
    fn decode_handles_u64_max() {
        let p = CleartextPayload::encode_words(&[u64::MAX]);
        assert_eq!(p.decode_words(1).unwrap(), vec![u64::MAX]);
    }
}
