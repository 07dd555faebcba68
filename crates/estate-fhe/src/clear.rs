//! # Transparent Reference Engine
//!
//! [`ClearEngine`] implements [`CiphertextArithmetic`] over a shared table of
//! plaintexts keyed by opaque handles. [`ClearOracle`] implements
//! [`DecryptionOracle`] over the same table and signs its responses with a
//! real Ed25519 key, so proof verification in the vault core is exercised
//! exactly as it would be against a production oracle.
//!
//! ## Security Notice
//!
//! This engine provides NO confidentiality. Anyone holding the engine can
//! read every value. It exists for tests, scenario runs and local
//! development, and must be replaced by a real TFHE backend in deployment.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use estate_core::{sha256_digest, CanonicalBytes, RequestId};

use crate::error::FheError;
use crate::handle::{CiphertextHandle, EncryptedBool, EncryptedU64};
use crate::payload::CleartextPayload;
use crate::proof::{verify_decryption_proof, DecryptionProof, OracleKeyPair, OraclePublicKey};
use crate::traits::{CallbackSelector, CiphertextArithmetic, DecryptionOracle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cleartext {
    U64(u64),
    Bool(bool),
}

#[derive(Debug, Default)]
struct CleartextTable {
    next_seq: u64,
    values: HashMap<CiphertextHandle, Cleartext>,
}

impl CleartextTable {
    fn insert(&mut self, value: Cleartext) -> CiphertextHandle {
        self.next_seq += 1;
        let handle = handle_for(self.next_seq);
        self.values.insert(handle, value);
        handle
    }

    fn get(&self, handle: &CiphertextHandle) -> Result<Cleartext, FheError> {
        self.values
            .get(handle)
            .copied()
            .ok_or_else(|| FheError::UnknownHandle(handle.to_hex()))
    }

    fn get_u64(&self, value: &EncryptedU64) -> Result<u64, FheError> {
        match self.get(&value.handle())? {
            Cleartext::U64(v) => Ok(v),
            Cleartext::Bool(_) => Err(FheError::TypeMismatch {
                handle: value.handle().to_hex(),
                expected: "u64",
            }),
        }
    }

    fn get_bool(&self, value: &EncryptedBool) -> Result<bool, FheError> {
        match self.get(&value.handle())? {
            Cleartext::Bool(b) => Ok(b),
            Cleartext::U64(_) => Err(FheError::TypeMismatch {
                handle: value.handle().to_hex(),
                expected: "bool",
            }),
        }
    }

    fn push_u64(&mut self, v: u64) -> EncryptedU64 {
        EncryptedU64::from_handle(self.insert(Cleartext::U64(v)))
    }

    fn push_bool(&mut self, b: bool) -> EncryptedBool {
        EncryptedBool::from_handle(self.insert(Cleartext::Bool(b)))
    }
}

fn handle_for(seq: u64) -> CiphertextHandle {
    let label = serde_json::json!({"engine": "clear", "seq": seq});
    match CanonicalBytes::new(&label) {
        Ok(cb) => CiphertextHandle::from_bytes(*sha256_digest(&cb).as_bytes()),
        // Integer-only JSON always canonicalizes; keep the handle unique anyway.
        Err(_) => {
            let mut bytes = [0u8; 32];
            bytes[24..].copy_from_slice(&seq.to_be_bytes());
            CiphertextHandle::from_bytes(bytes)
        }
    }
}

/// Transparent homomorphic engine backed by a plaintext table.
///
/// Cloning shares the table.
#[derive(Debug, Clone, Default)]
pub struct ClearEngine {
    table: Arc<Mutex<CleartextTable>>,
}

impl ClearEngine {
    /// Create an engine with an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Client-side encryption of a private value.
    pub fn encrypt(&self, value: u64) -> EncryptedU64 {
        self.table.lock().push_u64(value)
    }

    /// Client-side decryption of an encrypted integer.
    pub fn decrypt(&self, value: &EncryptedU64) -> Result<u64, FheError> {
        self.table.lock().get_u64(value)
    }

    /// Client-side decryption of an encrypted boolean.
    pub fn decrypt_bool(&self, value: &EncryptedBool) -> Result<bool, FheError> {
        self.table.lock().get_bool(value)
    }

    /// Number of ciphertexts held.
    pub fn len(&self) -> usize {
        self.table.lock().values.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.table.lock().values.is_empty()
    }

    fn word_for(&self, handle: &CiphertextHandle) -> Result<u64, FheError> {
        Ok(match self.table.lock().get(handle)? {
            Cleartext::U64(v) => v,
            Cleartext::Bool(b) => u64::from(b),
        })
    }
}

impl CiphertextArithmetic for ClearEngine {
    fn encrypt_trivial(&self, value: u64) -> Result<EncryptedU64, FheError> {
        Ok(self.table.lock().push_u64(value))
    }

    fn add(&self, a: &EncryptedU64, b: &EncryptedU64) -> Result<EncryptedU64, FheError> {
        let mut t = self.table.lock();
        let sum = t.get_u64(a)?.wrapping_add(t.get_u64(b)?);
        Ok(t.push_u64(sum))
    }

    fn mul(&self, a: &EncryptedU64, b: &EncryptedU64) -> Result<EncryptedU64, FheError> {
        let mut t = self.table.lock();
        let product = t.get_u64(a)?.wrapping_mul(t.get_u64(b)?);
        Ok(t.push_u64(product))
    }

    fn div(&self, a: &EncryptedU64, divisor: u64) -> Result<EncryptedU64, FheError> {
        if divisor == 0 {
            return Err(FheError::DivisionByZero);
        }
        let mut t = self.table.lock();
        let quotient = t.get_u64(a)? / divisor;
        Ok(t.push_u64(quotient))
    }

    fn gt(&self, a: &EncryptedU64, b: &EncryptedU64) -> Result<EncryptedBool, FheError> {
        let mut t = self.table.lock();
        let result = t.get_u64(a)? > t.get_u64(b)?;
        Ok(t.push_bool(result))
    }

    fn equal(&self, a: &EncryptedU64, b: &EncryptedU64) -> Result<EncryptedBool, FheError> {
        let mut t = self.table.lock();
        let result = t.get_u64(a)? == t.get_u64(b)?;
        Ok(t.push_bool(result))
    }

    fn select(
        &self,
        condition: &EncryptedBool,
        if_true: &EncryptedU64,
        if_false: &EncryptedU64,
    ) -> Result<EncryptedU64, FheError> {
        let mut t = self.table.lock();
        let chosen = if t.get_bool(condition)? {
            t.get_u64(if_true)?
        } else {
            t.get_u64(if_false)?
        };
        Ok(t.push_u64(chosen))
    }

    fn reveal_bool(&self, value: &EncryptedBool) -> Result<bool, FheError> {
        self.table.lock().get_bool(value)
    }
}

/// A signed decryption response, as a relayer would deliver it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptionResponse {
    /// The request being answered.
    pub request_id: RequestId,
    /// Where the response is meant to be delivered.
    pub callback: CallbackSelector,
    /// The decrypted values.
    pub payload: CleartextPayload,
    /// Oracle signature over the decryption statement.
    pub proof: DecryptionProof,
}

#[derive(Debug)]
struct QueuedRequest {
    handles: Vec<CiphertextHandle>,
    callback: CallbackSelector,
}

#[derive(Debug, Default)]
struct OracleQueue {
    next_request: u64,
    queued: BTreeMap<RequestId, QueuedRequest>,
}

/// Transparent decryption oracle with real Ed25519 attestations.
///
/// Requests are queued until [`ClearOracle::fulfill`] is called, which models
/// the arbitrary delay between request and callback.
#[derive(Debug)]
pub struct ClearOracle {
    engine: ClearEngine,
    keypair: OracleKeyPair,
    queue: Mutex<OracleQueue>,
}

impl ClearOracle {
    /// Create an oracle reading from `engine`'s table and signing with
    /// `keypair`.
    pub fn new(engine: &ClearEngine, keypair: OracleKeyPair) -> Self {
        Self {
            engine: engine.clone(),
            keypair,
            queue: Mutex::new(OracleQueue::default()),
        }
    }

    /// The key responses are signed with.
    pub fn public_key(&self) -> OraclePublicKey {
        self.keypair.public_key()
    }

    /// Requests awaiting fulfillment, oldest first.
    pub fn queued(&self) -> Vec<RequestId> {
        self.queue.lock().queued.keys().copied().collect()
    }

    /// Decrypt and sign a queued request, removing it from the queue.
    ///
    /// # Errors
    ///
    /// [`FheError::UnknownRequest`] if the request was never queued or was
    /// already fulfilled.
    pub fn fulfill(&self, request_id: RequestId) -> Result<DecryptionResponse, FheError> {
        let request = self
            .queue
            .lock()
            .queued
            .remove(&request_id)
            .ok_or(FheError::UnknownRequest(request_id))?;
        let words = request
            .handles
            .iter()
            .map(|h| self.engine.word_for(h))
            .collect::<Result<Vec<_>, _>>()?;
        let payload = CleartextPayload::encode_words(&words);
        let proof = self
            .keypair
            .sign_decryption(request_id, &request.handles, &payload)?;
        tracing::debug!(%request_id, callback = %request.callback, "decryption fulfilled");
        Ok(DecryptionResponse {
            request_id,
            callback: request.callback,
            payload,
            proof,
        })
    }
}

impl DecryptionOracle for ClearOracle {
    fn request_decryption(
        &self,
        handles: &[CiphertextHandle],
        callback: CallbackSelector,
    ) -> Result<RequestId, FheError> {
        for h in handles {
            self.engine.word_for(h)?;
        }
        let mut queue = self.queue.lock();
        queue.next_request += 1;
        let request_id = RequestId::from_raw(queue.next_request);
        queue.queued.insert(
            request_id,
            QueuedRequest {
                handles: handles.to_vec(),
                callback,
            },
        );
        tracing::debug!(%request_id, handles = handles.len(), "decryption queued");
        Ok(request_id)
    }

    fn verify_decryption(
        &self,
        request_id: RequestId,
        handles: &[CiphertextHandle],
        payload: &CleartextPayload,
        proof: &DecryptionProof,
    ) -> Result<bool, FheError> {
        verify_decryption_proof(&self.public_key(), request_id, handles, payload, proof)
    }
}
