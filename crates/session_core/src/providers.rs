//! Injected providers for time, identifiers, and randomness.
//!
//! Engines and the dispatch service take these as trait objects so their
//! behavior is deterministic under test: a fixed clock, a scripted id
//! sequence, and a pinned random source reproduce any scenario exactly.

use rand::Rng;
use std::sync::Mutex;
use uuid::Uuid;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current time as epoch milliseconds.
    fn now_millis(&self) -> u64;
}

/// Source of unique opaque identifiers.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Source of randomness for engines that need arbitrary choices.
pub trait RandomSource: Send + Sync {
    /// Uniform index in `0..bound`. `bound` must be non-zero.
    fn pick(&self, bound: usize) -> usize;
}

/// Wall-clock implementation of [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// UUID v4 identifiers rendered as 32 lowercase hex characters.
///
/// 128 bits of entropy, collision-resistant enough for session ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Thread-local RNG implementation of [`RandomSource`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick(&self, bound: usize) -> usize {
        rand::rng().random_range(0..bound)
    }
}

/// A clock pinned to one instant. Test double.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

/// A clock that replays a scripted sequence of instants, then repeats the
/// last one. Test double.
#[derive(Debug)]
pub struct SequenceClock {
    times: Vec<u64>,
    next: Mutex<usize>,
}

impl SequenceClock {
    pub fn new(times: Vec<u64>) -> Self {
        Self {
            times,
            next: Mutex::new(0),
        }
    }
}

impl Clock for SequenceClock {
    fn now_millis(&self) -> u64 {
        let mut next = match self.next.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let idx = (*next).min(self.times.len().saturating_sub(1));
        *next += 1;
        self.times.get(idx).copied().unwrap_or(0)
    }
}

/// An id generator that hands out a scripted sequence. Test double.
#[derive(Debug)]
pub struct SequenceIds {
    ids: Vec<String>,
    next: Mutex<usize>,
}

impl SequenceIds {
    pub fn new<I: Into<String>>(ids: Vec<I>) -> Self {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            next: Mutex::new(0),
        }
    }
}

impl IdGenerator for SequenceIds {
    fn generate(&self) -> String {
        let mut next = match self.next.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let idx = *next;
        *next += 1;
        self.ids
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("overflow-{idx}"))
    }
}

/// A random source that always returns the same index (clamped to the
/// requested bound). Test double.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub usize);

impl RandomSource for FixedRandom {
    fn pick(&self, bound: usize) -> usize {
        self.0.min(bound.saturating_sub(1))
    }
}
