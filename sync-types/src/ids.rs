//! Identity and ordering types for habit-sync.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a habit.
///
/// Either assigned by the client when a habit is created offline, or
/// hydrated from the remote service. Opaque to this crate.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(String);

impl HabitId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh client-side identifier (UUID v4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for terminal output (first 8 characters).
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl From<&str> for HabitId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for HabitId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for HabitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HabitId({})", self.0)
    }
}

/// Sequence number assigned to an action when it is enqueued.
///
/// Strictly increasing for the lifetime of a queue, including across
/// restarts. Two structurally identical actions never share a `Seq`, so
/// removal after a successful replay always targets the right entry.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Seq(u64);

impl Seq {
    /// Create a sequence number with the given value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The first sequence number handed out by an empty queue.
    pub fn first() -> Self {
        Self(1)
    }

    /// Get the numeric value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The following sequence number.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Seq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Seq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seq({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_uuids() {
        let a = HabitId::generate();
        let b = HabitId::generate();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn habit_id_is_a_bare_json_string() {
        let id = HabitId::new("h1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"h1\"");
        let back: HabitId = serde_json::from_str("\"h1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn short_form_truncates_long_ids() {
        let id = HabitId::new("0123456789abcdef");
        assert_eq!(id.short(), "01234567");
        assert_eq!(HabitId::new("h1").short(), "h1");
    }

    #[test]
    fn seq_ordering_and_next() {
        let s = Seq::first();
        assert_eq!(s.value(), 1);
        assert!(s < s.next());
        assert_eq!(Seq::new(u64::MAX).next().value(), u64::MAX);
    }
}
