use crate::key::NamespacedName;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Entry {
    attempts: u32,
    last_failure: Instant,
}

/// Per-key exponential backoff for failed reconciliations.
///
/// Owned by the dispatcher, not the reconciler: a failing pass returns its
/// error immediately and the dispatcher decides when to try again.
///
/// A key that keeps failing is touched at least once per `max`. An entry idle
/// for longer than twice that belongs to an object nobody is retrying any
/// more (usually deleted), and is dropped on the next failure of any key.
#[derive(Debug)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    attempts: Mutex<HashMap<NamespacedName, Entry>>,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Delay before retrying `key`, doubling with every consecutive failure.
    pub fn next_delay(&self, key: &NamespacedName) -> Duration {
        self.next_delay_at(key, Instant::now())
    }

    fn next_delay_at(&self, key: &NamespacedName, now: Instant) -> Duration {
        let mut attempts = self.lock();
        let idle_limit = self.max.saturating_mul(2);
        attempts.retain(|k, e| k == key || now.saturating_duration_since(e.last_failure) <= idle_limit);

        let entry = attempts.entry(key.clone()).or_insert(Entry {
            attempts: 0,
            last_failure: now,
        });
        if now.saturating_duration_since(entry.last_failure) > idle_limit {
            entry.attempts = 0;
        }
        let delay = calculate_backoff(entry.attempts, self.base, self.max);
        entry.attempts = entry.attempts.saturating_add(1);
        entry.last_failure = now;
        delay
    }

    /// Forget the failure history of `key`, after a successful pass or once
    /// the object is gone.
    pub fn reset(&self, key: &NamespacedName) {
        self.lock().remove(key);
    }

    pub fn attempts(&self, key: &NamespacedName) -> u32 {
        self.lock().get(key).map(|e| e.attempts).unwrap_or(0)
    }

    /// Number of keys with a failure history.
    pub fn tracked(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<NamespacedName, Entry>> {
        self.attempts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// `min(base * 2^attempt, max)`, saturating instead of overflowing.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    base.checked_mul(factor).unwrap_or(max).min(max)
}
