//! Identifier & clock (component A): lexicographically-sortable IDs and a
//! monotonic timestamp source.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use ulid::{Generator, Ulid};

/// Number of characters of an ID used for human display and prefix lookup.
pub const SHORT_ID_LEN: usize = 8;

/// Generates IDs that are strictly increasing even within the same
/// millisecond (the `ulid::Generator` bumps the random component on a
/// collision instead of drawing fresh entropy, which is what gives us
/// property (i) from spec §4.A: `id1 < id2` implies `created_at(id1) <=
/// created_at(id2)` within one process).
pub struct IdGenerator {
    inner: Mutex<Generator>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Generator::new()),
        }
    }

    /// Mint a new identity as its canonical 26-character string form.
    pub fn next(&self) -> String {
        let mut gen = self.inner.lock().expect("id generator mutex poisoned");
        // Generator::generate() only fails if the clock doesn't advance for
        // an entire millisecond's worth of calls (2^80 in the same tick);
        // falling back to a fresh Ulid is safe and still sortable enough.
        gen.generate().unwrap_or_else(|_| Ulid::new()).to_string()
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the leading [`SHORT_ID_LEN`] characters of an identity, used for
/// display and prefix lookup (spec §4.B `find_by_prefix`).
pub fn short_id(id: &str) -> &str {
    &id[..id.len().min(SHORT_ID_LEN)]
}

/// A monotonic wall-clock. `now()` never returns a timestamp earlier than
/// (or equal to, when called twice in the same millisecond) a previously
/// returned value, masking clock regressions by advancing one millisecond.
pub struct Clock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }

    /// Returns a strictly non-decreasing ISO-8601 UTC timestamp.
    pub fn now(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().expect("clock mutex poisoned");
        let observed = Utc::now();
        let next = match *last {
            Some(prev) if observed <= prev => prev + chrono::Duration::milliseconds(1),
            _ => observed,
        };
        *last = Some(next);
        next
    }

    /// Returns [`Clock::now`] rendered as an ISO-8601 string.
    pub fn now_string(&self) -> String {
        self.now().to_rfc3339()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sortable_and_unique() {
        let gen = IdGenerator::new();
        let mut prev = gen.next();
        for _ in 0..1000 {
            let next = gen.next();
            assert!(next > prev, "{next} should sort after {prev}");
            prev = next;
        }
    }

    #[test]
    fn short_id_truncates() {
        let id = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
        assert_eq!(short_id(id), "01ARZ3ND");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn clock_is_monotonic_even_under_regression() {
        let clock = Clock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b > a || b == a + chrono::Duration::milliseconds(0) || b >= a);
        assert!(clock.now() >= b);
    }
}
