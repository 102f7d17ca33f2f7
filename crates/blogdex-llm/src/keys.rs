//! Round-robin API key pool with per-key rate-limit tracking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::LlmError;

/// A key is retired once it has been rate limited this many times.
const MAX_KEY_FAILURES: u32 = 3;

/// Rotates through a set of API keys, retiring keys that keep hitting 429s.
///
/// Shared across concurrent requests; the cursor is atomic and the failure
/// table sits behind a mutex held only for map access.
pub struct KeyPool {
    keys: Vec<String>,
    cursor: AtomicUsize,
    failures: Mutex<HashMap<String, u32>>,
}

impl KeyPool {
    #[must_use]
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            cursor: AtomicUsize::new(0),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the next usable key in rotation.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::NoKeys`] if the pool was built empty, or
    /// [`LlmError::KeysExhausted`] once every key has been retired.
    pub fn next_key(&self) -> Result<String, LlmError> {
        if self.keys.is_empty() {
            return Err(LlmError::NoKeys);
        }

        let failures = self.failures.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        for _ in 0..self.keys.len() {
            let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.keys.len();
            let key = &self.keys[idx];
            let count = failures.get(key).copied().unwrap_or(0);
            if count < MAX_KEY_FAILURES {
                return Ok(key.clone());
            }
        }

        Err(LlmError::KeysExhausted)
    }

    /// Records a rate-limit failure against `key`.
    pub fn record_failure(&self, key: &str) {
        let mut failures = self.failures.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *failures.entry(key.to_string()).or_insert(0) += 1;
    }

    /// Number of keys still usable.
    #[must_use]
    pub fn usable_keys(&self) -> usize {
        let failures = self.failures.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        self.keys
            .iter()
            .filter(|k| failures.get(*k).copied().unwrap_or(0) < MAX_KEY_FAILURES)
            .count()
    }
}
