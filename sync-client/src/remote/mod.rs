//! Remote habit service abstraction.
//!
//! This module provides a pluggable seam for the server that owns the
//! authoritative habit list (HTTP, mock for testing).
//!
//! # Design
//!
//! The trait is async and request/response shaped:
//! - `list_habits()` fetches the full list
//! - `create_habit()`, `replace_habit()`, `delete_habit()` mirror the
//!   queued actions
//! - `increment_completion()` moves today's counter by one
//!
//! Mutating calls return the server's copy of the habit when the response
//! carries one, so the caller can adopt authoritative fields like `streak`.
//!
//! # Example
//!
//! ```ignore
//! let remote = MockRemote::new();
//! remote.create_habit(&habit).await?;
//! remote.increment_completion(&habit.id, CompletionDelta::Increment).await?;
//! let habits = remote.list_habits().await?;
//! ```

mod http;
mod mock;

pub use http::HttpRemote;
pub use mock::{MockRemote, RemoteCall};

use async_trait::async_trait;
use habit_sync_types::{Habit, HabitId};
use serde::Serialize;
use thiserror::Error;

/// Remote service errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The session is not (or no longer) authorized.
    #[error("unauthorized")]
    Unauthorized,

    /// The server answered with a non-success status.
    #[error("server returned status {0}")]
    Status(u16),

    /// The request never got an answer.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request timed out.
    #[error("request timeout")]
    Timeout,

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Check if this is an authorization failure.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RemoteError::Unauthorized)
    }
}

/// Direction of a completion-counter change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionDelta {
    /// +1
    Increment,
    /// -1
    Decrement,
}

impl CompletionDelta {
    /// Signed value sent to the server.
    pub fn value(&self) -> i32 {
        match self {
            CompletionDelta::Increment => 1,
            CompletionDelta::Decrement => -1,
        }
    }
}

/// Request body of the completion endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct CompletionBody {
    pub increment: i32,
}

impl From<CompletionDelta> for CompletionBody {
    fn from(delta: CompletionDelta) -> Self {
        Self {
            increment: delta.value(),
        }
    }
}

/// The server side of habit sync.
///
/// Implementations handle the wire mechanics (HTTP with a session cookie,
/// in-memory mock, etc).
#[async_trait]
pub trait RemoteHabits: Send + Sync {
    /// Fetch every habit of the signed-in user.
    async fn list_habits(&self) -> Result<Vec<Habit>, RemoteError>;

    /// Create a habit with its client-assigned id.
    async fn create_habit(&self, habit: &Habit) -> Result<Option<Habit>, RemoteError>;

    /// Delete a habit.
    async fn delete_habit(&self, id: &HabitId) -> Result<(), RemoteError>;

    /// Move today's completion counter by one.
    async fn increment_completion(
        &self,
        id: &HabitId,
        delta: CompletionDelta,
    ) -> Result<Option<Habit>, RemoteError>;

    /// Replace a habit with the given snapshot.
    async fn replace_habit(&self, id: &HabitId, habit: &Habit)
        -> Result<Option<Habit>, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_values() {
        assert_eq!(CompletionDelta::Increment.value(), 1);
        assert_eq!(CompletionDelta::Decrement.value(), -1);
    }

    #[test]
    fn completion_body_shape() {
        let body: CompletionBody = CompletionDelta::Decrement.into();
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"increment":-1}"#
        );
    }

    #[test]
    fn error_display() {
        assert_eq!(RemoteError::Status(503).to_string(), "server returned status 503");
        assert!(RemoteError::Unauthorized.is_unauthorized());
        assert!(!RemoteError::Timeout.is_unauthorized());
    }
}
