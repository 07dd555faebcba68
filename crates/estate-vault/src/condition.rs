//! # Release Conditions
//!
//! A release condition is an encrypted parameter attached to an instruction,
//! interpreted according to its [`ConditionKind`]. Evaluation happens under
//! encryption: an evaluator returns an [`EncryptedBool`], and only that single
//! bit is ever revealed.
//!
//! The only kind today is [`ConditionKind::TimeLock`]: the condition is a
//! Unix time in seconds and is met when the current time is strictly later.
//! The current time comes from an injected [`Clock`] so evaluation is
//! deterministic under test.

use std::collections::BTreeMap;

use estate_core::Timestamp;
use estate_fhe::{CiphertextArithmetic, EncryptedBool, EncryptedU64, FheError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A settable clock for tests and scenario replay.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<Timestamp>,
}

impl FixedClock {
    /// A clock stopped at `now`.
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: Timestamp) {
        *self.now.lock() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

// ---------------------------------------------------------------------------
// ConditionKind
// ---------------------------------------------------------------------------

/// How an encrypted release condition is interpreted.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// Unix seconds; met when now is strictly later.
    #[default]
    TimeLock,
}

impl ConditionKind {
    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TimeLock => "time_lock",
        }
    }
}

impl std::fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Evaluators
// ---------------------------------------------------------------------------

/// Evaluates one kind of encrypted release condition.
pub trait ConditionEvaluator: Send + Sync {
    /// The kind this evaluator handles.
    fn kind(&self) -> ConditionKind;

    /// Compute the encrypted "condition met" bit at time `now`.
    fn evaluate(
        &self,
        engine: &dyn CiphertextArithmetic,
        condition: &EncryptedU64,
        now: Timestamp,
    ) -> Result<EncryptedBool, FheError>;
}

/// `now > condition`, with `now` in Unix seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeLockEvaluator;

impl ConditionEvaluator for TimeLockEvaluator {
    fn kind(&self) -> ConditionKind {
        ConditionKind::TimeLock
    }

    fn evaluate(
        &self,
        engine: &dyn CiphertextArithmetic,
        condition: &EncryptedU64,
        now: Timestamp,
    ) -> Result<EncryptedBool, FheError> {
        let current = engine.encrypt_trivial(now.unix_secs())?;
        engine.gt(&current, condition)
    }
}

/// Evaluators keyed by condition kind.
pub struct ConditionEvaluators {
    by_kind: BTreeMap<ConditionKind, Box<dyn ConditionEvaluator>>,
}

impl ConditionEvaluators {
    /// No evaluators registered.
    pub fn empty() -> Self {
        Self {
            by_kind: BTreeMap::new(),
        }
    }

    /// The built-in set: time locks.
    pub fn standard() -> Self {
        let mut set = Self::empty();
        set.register(Box::new(TimeLockEvaluator));
        set
    }

    /// Register an evaluator, replacing any previous one for its kind.
    pub fn register(&mut self, evaluator: Box<dyn ConditionEvaluator>) {
        self.by_kind.insert(evaluator.kind(), evaluator);
    }

    /// The evaluator for `kind`.
    pub fn get(&self, kind: ConditionKind) -> Option<&dyn ConditionEvaluator> {
        self.by_kind.get(&kind).map(|e| e.as_ref())
    }
}

impl Default for ConditionEvaluators {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for ConditionEvaluators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.by_kind.keys()).finish()
    }
}
