//! Process-level run ID for tracking execution instances.
//!
//! Each process gets a unique ULID at startup. All log lines and
//! warehouse events emitted by the same process share this ID, which
//! makes it possible to attribute records to a specific deploy or
//! seeding run even on the same day.

use once_cell::sync::Lazy;
use ulid::Ulid;

/// Process-level run ID, generated once at first access.
static RUN_ID: Lazy<String> = Lazy::new(|| Ulid::new().to_string());

/// Returns the process-level run ID: generated once per process,
/// time-ordered, 26 characters, URL-safe.
#[inline]
pub fn get() -> &'static str {
    &RUN_ID
}

/// Generates a fresh ULID, for per-entity ids (users, pods).
#[inline]
pub fn generate() -> String {
    Ulid::new().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_same_value() {
        let first = get();
        let second = get();
        assert_eq!(first, second);
        assert_eq!(first.len(), 26); // ULID is 26 chars
    }

    #[test]
    fn generate_returns_unique_values() {
        let a = generate();
        let b = generate();
        assert_ne!(a, b);
        assert_eq!(a.len(), 26);
        assert_eq!(b.len(), 26);
    }
}
