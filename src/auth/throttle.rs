//! Per-username attempt throttling for login brute-force protection.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Tracked identities are bounded; once the map is full, entries whose
/// window has elapsed are swept before a new identity is admitted.
const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Clone, Copy, Debug)]
pub struct ThrottlePolicy {
    pub max_attempts: u32,
    pub reset_interval: Duration,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            reset_interval: Duration::from_secs(60),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed,
    Limited,
}

#[derive(Debug)]
struct AttemptState {
    count: u32,
    window_start: Instant,
}

/// Windowed attempt counter keyed by username.
///
/// The check-and-increment is atomic per identity: the map mutex is held
/// for the whole decision, and never across I/O. Attempts are counted
/// before credentials are verified, so successful logins consume a slot
/// like any other attempt.
#[derive(Debug)]
pub struct AttemptThrottle {
    policy: ThrottlePolicy,
    capacity: usize,
    state: Mutex<HashMap<String, AttemptState>>,
}

impl AttemptThrottle {
    #[must_use]
    pub fn new(policy: ThrottlePolicy) -> Self {
        Self {
            policy,
            capacity: DEFAULT_CAPACITY,
            state: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Record an attempt for `identity` and decide whether to admit it.
    ///
    /// Once `max_attempts` have been counted within the window, further
    /// attempts are rejected without incrementing until the window
    /// elapses. The window is anchored at the first counted attempt;
    /// rejected attempts do not extend it.
    pub fn check(&self, identity: &str) -> ThrottleDecision {
        self.check_at(identity, Instant::now())
    }

    fn check_at(&self, identity: &str, now: Instant) -> ThrottleDecision {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if state.len() >= self.capacity && !state.contains_key(identity) {
            let reset_interval = self.policy.reset_interval;
            state.retain(|_, entry| now.duration_since(entry.window_start) <= reset_interval);
        }

        let entry = state.entry(identity.to_string()).or_insert(AttemptState {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) > self.policy.reset_interval {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.policy.max_attempts {
            return ThrottleDecision::Limited;
        }

        entry.count += 1;

        ThrottleDecision::Allowed
    }
}
