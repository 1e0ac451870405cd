//! Mock remote service for testing.
//!
//! Keeps a server-side habit list in memory, records every call and allows
//! failures to be injected per call.

use super::{CompletionDelta, RemoteError, RemoteHabits};
use async_trait::async_trait;
use habit_sync_types::{Habit, HabitId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A call received by [`MockRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    /// `list_habits()`
    List,
    /// `create_habit()`
    Create(HabitId),
    /// `delete_habit()`
    Delete(HabitId),
    /// `increment_completion()` with the signed delta
    Increment(HabitId, i32),
    /// `replace_habit()`
    Replace(HabitId),
}

/// Mock remote service.
///
/// Clones share the same server state.
#[derive(Debug, Default)]
pub struct MockRemote {
    inner: Arc<Mutex<MockRemoteInner>>,
}

#[derive(Debug, Default)]
struct MockRemoteInner {
    habits: Vec<Habit>,
    calls: Vec<RemoteCall>,
    /// Failures keyed by 1-based call number.
    scheduled_failures: HashMap<usize, RemoteError>,
    unreachable: bool,
    omit_bodies: bool,
    delay: Option<Duration>,
}

impl MockRemote {
    /// Create a mock with an empty server list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock whose server already holds these habits.
    pub fn with_habits(habits: Vec<Habit>) -> Self {
        let remote = Self::new();
        remote.set_habits(habits);
        remote
    }

    /// Replace the server-side habit list.
    pub fn set_habits(&self, habits: Vec<Habit>) {
        let mut inner = self.inner.lock().unwrap();
        inner.habits = habits;
    }

    /// Current server-side habit list.
    pub fn habits(&self) -> Vec<Habit> {
        let inner = self.inner.lock().unwrap();
        inner.habits.clone()
    }

    /// Server-side copy of one habit.
    pub fn habit(&self, id: &HabitId) -> Option<Habit> {
        let inner = self.inner.lock().unwrap();
        inner.habits.iter().find(|h| &h.id == id).cloned()
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<RemoteCall> {
        let inner = self.inner.lock().unwrap();
        inner.calls.clone()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.calls.len()
    }

    /// Forget the call log.
    pub fn clear_calls(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.clear();
        inner.scheduled_failures.clear();
    }

    /// Cause the next call to fail with the given error.
    pub fn fail_next(&self, error: RemoteError) {
        self.fail_nth_call(1, error);
    }

    /// Cause the n-th call from now (1 = next) to fail with the given error.
    pub fn fail_nth_call(&self, n: usize, error: RemoteError) {
        let mut inner = self.inner.lock().unwrap();
        let at = inner.calls.len() + n.max(1);
        inner.scheduled_failures.insert(at, error);
    }

    /// Cause the next call to be rejected as unauthorized.
    pub fn unauthorize_next(&self) {
        self.fail_next(RemoteError::Unauthorized);
    }

    /// Make every call fail with a transport error until turned off.
    pub fn set_unreachable(&self, unreachable: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.unreachable = unreachable;
    }

    /// Answer mutating calls without a habit body.
    pub fn omit_bodies(&self, omit: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.omit_bodies = omit;
    }

    /// Delay every call by this long before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        let mut inner = self.inner.lock().unwrap();
        inner.delay = delay;
    }

    /// Log the call, wait out any delay and return an injected failure.
    async fn begin(&self, call: RemoteCall) -> Result<(), RemoteError> {
        let (delay, outcome) = {
            let mut inner = self.inner.lock().unwrap();
            inner.calls.push(call);
            let number = inner.calls.len();

            let outcome = if inner.unreachable {
                Err(RemoteError::Transport("network unreachable".into()))
            } else if let Some(error) = inner.scheduled_failures.remove(&number) {
                Err(error)
            } else {
                Ok(())
            };
            (inner.delay, outcome)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        outcome
    }

    fn body(&self, habit: Habit) -> Option<Habit> {
        let inner = self.inner.lock().unwrap();
        if inner.omit_bodies {
            None
        } else {
            Some(habit)
        }
    }
}

impl Clone for MockRemote {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl RemoteHabits for MockRemote {
    async fn list_habits(&self) -> Result<Vec<Habit>, RemoteError> {
        self.begin(RemoteCall::List).await?;
        Ok(self.habits())
    }

    async fn create_habit(&self, habit: &Habit) -> Result<Option<Habit>, RemoteError> {
        self.begin(RemoteCall::Create(habit.id.clone())).await?;

        let stored = {
            let mut inner = self.inner.lock().unwrap();
            match inner.habits.iter_mut().find(|h| h.id == habit.id) {
                Some(existing) => *existing = habit.clone(),
                None => inner.habits.push(habit.clone()),
            }
            habit.clone()
        };
        Ok(self.body(stored))
    }

    async fn delete_habit(&self, id: &HabitId) -> Result<(), RemoteError> {
        self.begin(RemoteCall::Delete(id.clone())).await?;

        let mut inner = self.inner.lock().unwrap();
        inner.habits.retain(|h| &h.id != id);
        Ok(())
    }

    async fn increment_completion(
        &self,
        id: &HabitId,
        delta: CompletionDelta,
    ) -> Result<Option<Habit>, RemoteError> {
        self.begin(RemoteCall::Increment(id.clone(), delta.value()))
            .await?;

        let updated = {
            let mut inner = self.inner.lock().unwrap();
            let habit = inner
                .habits
                .iter_mut()
                .find(|h| &h.id == id)
                .ok_or(RemoteError::Status(404))?;

            let need = habit.completions_need;
            let before = habit.completions_today;
            let after = match delta {
                CompletionDelta::Increment => before.saturating_add(1).min(need),
                CompletionDelta::Decrement => before.saturating_sub(1),
            };
            habit.completions_today = after;

            // Server-side streak bookkeeping
            if before < need && after >= need {
                habit.streak = habit.streak.saturating_add(1);
            } else if before >= need && after < need {
                habit.streak = habit.streak.saturating_sub(1);
            }
            if after > before {
                habit.all_completions = habit.all_completions.saturating_add(1);
            } else if after < before {
                habit.all_completions = habit.all_completions.saturating_sub(1);
            }
            habit.clone()
        };
        Ok(self.body(updated))
    }

    async fn replace_habit(
        &self,
        id: &HabitId,
        habit: &Habit,
    ) -> Result<Option<Habit>, RemoteError> {
        self.begin(RemoteCall::Replace(id.clone())).await?;

        let updated = {
            let mut inner = self.inner.lock().unwrap();
            let existing = inner
                .habits
                .iter_mut()
                .find(|h| &h.id == id)
                .ok_or(RemoteError::Status(404))?;
            *existing = habit.clone();
            existing.clone()
        };
        Ok(self.body(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn habit(id: &str, need: u32) -> Habit {
        Habit::new(
            HabitId::new(id),
            "Test",
            Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap(),
        )
        .with_completions_need(need)
    }

    // ===========================================
    // MockRemote Basic Tests
    // ===========================================

    #[tokio::test]
    async fn create_then_list() {
        let remote = MockRemote::new();
        let created = remote.create_habit(&habit("h1", 1)).await.unwrap();

        assert_eq!(created.unwrap().id, HabitId::new("h1"));
        assert_eq!(remote.list_habits().await.unwrap().len(), 1);
        assert_eq!(
            remote.calls(),
            vec![RemoteCall::Create(HabitId::new("h1")), RemoteCall::List]
        );
    }

    #[tokio::test]
    async fn increment_clamps_and_tracks_streak() {
        let remote = MockRemote::with_habits(vec![habit("h1", 2)]);
        let id = HabitId::new("h1");

        remote
            .increment_completion(&id, CompletionDelta::Increment)
            .await
            .unwrap();
        let full = remote
            .increment_completion(&id, CompletionDelta::Increment)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(full.completions_today, 2);
        assert_eq!(full.streak, 1);

        let capped = remote
            .increment_completion(&id, CompletionDelta::Increment)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(capped.completions_today, 2);
        assert_eq!(capped.all_completions, 2);

        let back = remote
            .increment_completion(&id, CompletionDelta::Decrement)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(back.completions_today, 1);
        assert_eq!(back.streak, 0);
    }

    #[tokio::test]
    async fn increment_unknown_habit_is_404() {
        let remote = MockRemote::new();
        let result = remote
            .increment_completion(&HabitId::new("nope"), CompletionDelta::Increment)
            .await;
        assert_eq!(result, Err(RemoteError::Status(404)));
    }

    #[tokio::test]
    async fn delete_removes_server_copy() {
        let remote = MockRemote::with_habits(vec![habit("h1", 1)]);
        remote.delete_habit(&HabitId::new("h1")).await.unwrap();
        assert!(remote.habits().is_empty());
    }

    // ===========================================
    // Error Condition Tests
    // ===========================================

    #[tokio::test]
    async fn forced_failure_hits_only_next_call() {
        let remote = MockRemote::new();
        remote.fail_next(RemoteError::Status(500));

        assert_eq!(remote.list_habits().await, Err(RemoteError::Status(500)));
        assert!(remote.list_habits().await.is_ok());
        assert_eq!(remote.call_count(), 2);
    }

    #[tokio::test]
    async fn fail_nth_call_skips_earlier_calls() {
        let remote = MockRemote::new();
        remote.fail_nth_call(2, RemoteError::Timeout);

        assert!(remote.list_habits().await.is_ok());
        assert_eq!(remote.list_habits().await, Err(RemoteError::Timeout));
        assert!(remote.list_habits().await.is_ok());
    }

    #[tokio::test]
    async fn unauthorized_next() {
        let remote = MockRemote::new();
        remote.unauthorize_next();
        assert!(remote.list_habits().await.unwrap_err().is_unauthorized());
    }

    #[tokio::test]
    async fn unreachable_fails_everything_and_mutates_nothing() {
        let remote = MockRemote::new();
        remote.set_unreachable(true);

        assert!(matches!(
            remote.create_habit(&habit("h1", 1)).await,
            Err(RemoteError::Transport(_))
        ));
        remote.set_unreachable(false);
        assert!(remote.habits().is_empty());
    }

    #[tokio::test]
    async fn omitted_bodies() {
        let remote = MockRemote::new();
        remote.omit_bodies(true);
        assert_eq!(remote.create_habit(&habit("h1", 1)).await, Ok(None));
        assert_eq!(remote.habits().len(), 1);
    }

    // ===========================================
    // Clone and Shared State Tests
    // ===========================================

    #[tokio::test]
    async fn clone_shares_state() {
        let a = MockRemote::new();
        let b = a.clone();

        a.create_habit(&habit("h1", 1)).await.unwrap();
        assert_eq!(b.habits().len(), 1);
        assert_eq!(b.call_count(), 1);
    }
}
