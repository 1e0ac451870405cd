//! Reconciliation engine.
//!
//! Replays the action queue against the remote service one action at a
//! time, in enqueue order, and stops at the first failure. A confirmed
//! action is removed from the persisted queue by its sequence number; the
//! failed one and everything behind it stay queued for the next trigger.
//! Once the queue is empty, the server's habit list is merged back.

use std::collections::VecDeque;

use habit_sync_core::{DrainEvent, DrainStep, ReconnectEdge};
use habit_sync_types::{Habit, QueuedAction, Seq, SyncAction};

use crate::client::HabitSync;
use crate::kv::KeyValueStore;
use crate::remote::{CompletionDelta, RemoteError, RemoteHabits};

/// Outcome of one drain pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Actions confirmed by the server.
    pub applied: usize,
    /// Actions still queued afterwards.
    pub remaining: usize,
    /// Error that stopped the pass, if any.
    pub stalled: Option<String>,
    /// Whether the post-drain refresh merged a server list.
    pub refreshed: bool,
}

impl DrainReport {
    /// Everything owed was delivered.
    pub fn is_drained(&self) -> bool {
        self.remaining == 0 && self.stalled.is_none()
    }
}

impl<R, S> HabitSync<R, S>
where
    R: RemoteHabits + 'static,
    S: KeyValueStore + 'static,
{
    /// Drain the queue against the remote service.
    ///
    /// Actions are always replayed from the persisted queue in sequence
    /// order. `queue_override` is the snapshot returned by the enqueue that
    /// triggered this pass. It is never replayed ahead of older entries,
    /// and entries already applied by an earlier pass are skipped. Actions
    /// appended while the pass runs are drained in the same pass.
    ///
    /// Passes never overlap: a second caller waits for the first to finish.
    /// Failures are logged and reported, never returned as errors.
    pub async fn sync_with_server(&self, queue_override: Option<Vec<QueuedAction>>) -> DrainReport {
        let _drain = self.inner.drain_lock.lock().await;

        let mut steps: VecDeque<DrainStep> = {
            let mut local = self.local();
            if local.drain.is_draining() {
                // A cancelled pass left the machine mid-drain.
                local.drain_event(DrainEvent::Reset);
            }
            let queued = local.queue.len();
            if let Some(snapshot) = &queue_override {
                let settled = snapshot
                    .iter()
                    .filter(|e| !local.queue.contains(e.seq))
                    .count();
                if settled > 0 {
                    tracing::debug!(
                        "{} of {} triggering actions already applied",
                        settled,
                        snapshot.len()
                    );
                }
            }
            local.drain_event(DrainEvent::Started { queued }).into()
        };

        let mut report = DrainReport::default();
        if steps.is_empty() {
            tracing::debug!("Queue empty, nothing to sync");
            return report;
        }
        tracing::info!("Sync started");

        let mut last: Option<Seq> = None;
        while let Some(step) = steps.pop_front() {
            match step {
                DrainStep::DispatchNext => {
                    let Some(entry) = self.next_entry(last) else {
                        // Nothing left past `last`; settle the machine.
                        self.local().drain_event(DrainEvent::Reset);
                        break;
                    };
                    let (seq, next) = self.replay(entry, &mut report).await;
                    last = Some(seq);
                    steps.extend(next);
                }
                DrainStep::Refresh => match self.fetch_and_merge().await {
                    Ok(Some(count)) => {
                        tracing::debug!("Refreshed {} habits after sync", count);
                        report.refreshed = true;
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Failed to refresh habits after sync: {}", e),
                },
            }
        }

        report.remaining = self.local().queue.len();
        tracing::info!(
            "Sync finished: {} applied, {} remaining",
            report.applied,
            report.remaining
        );
        report
    }

    /// Oldest persisted entry after `last`.
    fn next_entry(&self, last: Option<Seq>) -> Option<QueuedAction> {
        self.local()
            .queue
            .snapshot()
            .into_iter()
            .find(|e| last.map_or(true, |seq| e.seq > seq))
    }

    /// Send one action and fold the outcome into local state.
    async fn replay(&self, entry: QueuedAction, report: &mut DrainReport) -> (Seq, Vec<DrainStep>) {
        let seq = entry.seq;
        let kind = entry.action.kind();
        let id = entry.action.habit_id().clone();

        match self.dispatch(&entry.action).await {
            Ok(server_copy) => {
                let mut local = self.local();
                if let Some(habit) = server_copy {
                    local.habits.replace(habit);
                }
                local.queue.dequeue(seq);
                if let Some(target) = entry.action.completion_target() {
                    local.pending.clear(target);
                }
                let remaining = local.queue.len();
                report.applied += 1;
                tracing::debug!("Applied {} for habit {} (seq={})", kind, id, seq);
                (seq, local.drain_event(DrainEvent::Applied { seq, remaining }))
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to sync {} for habit {} (seq={}): {}",
                    kind,
                    id,
                    seq,
                    e
                );
                report.stalled = Some(e.to_string());
                let mut local = self.local();
                let steps = local.drain_event(DrainEvent::Failed {
                    seq,
                    error: e.to_string(),
                });
                (seq, steps)
            }
        }
    }

    async fn dispatch(&self, action: &SyncAction) -> Result<Option<Habit>, RemoteError> {
        let remote = &self.inner.remote;
        match action {
            SyncAction::Create { habit } => remote.create_habit(habit).await,
            SyncAction::Complete { id } => {
                remote
                    .increment_completion(id, CompletionDelta::Increment)
                    .await
            }
            SyncAction::Uncomplete { id } => {
                remote
                    .increment_completion(id, CompletionDelta::Decrement)
                    .await
            }
            SyncAction::Update { habit } => remote.replace_habit(&habit.id, habit).await,
            SyncAction::Delete { id } => remote.delete_habit(id).await.map(|()| None),
        }
    }

    /// Pull the server's habit list and merge it into the local store.
    ///
    /// Server fields win except `completions_today`; actions still queued
    /// are re-applied on top. Returns the merged count, or `Ok(None)` when
    /// the session is unauthorized, in which case local state is kept.
    /// On error the store is left untouched.
    pub async fn fetch_and_merge(&self) -> Result<Option<usize>, RemoteError> {
        let server = match self.inner.remote.list_habits().await {
            Ok(server) => server,
            Err(RemoteError::Unauthorized) => {
                tracing::warn!("Unauthorized habit fetch, keeping local habits");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let mut local = self.local();
        let queued = local.queue.snapshot();
        local.habits.merge_from_server(server, &queued);
        Ok(Some(local.habits.len()))
    }

    /// Spawn a task that drains the queue on every offline→online edge.
    ///
    /// Runs until the connectivity sender is dropped.
    pub fn watch_connectivity(&self) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        let mut rx = self.inner.connectivity.clone();
        let initial = *rx.borrow_and_update();

        tokio::spawn(async move {
            let mut edge = ReconnectEdge::new(initial);
            tracing::info!("Connectivity watch started (online: {})", initial);

            while rx.changed().await.is_ok() {
                let online = *rx.borrow_and_update();
                if edge.observe(online) {
                    tracing::info!("Back online, draining queue");
                    let report = this.sync_with_server(None).await;
                    if let Some(error) = report.stalled {
                        tracing::warn!("Reconnect sync stalled: {}", error);
                    }
                }
            }
            tracing::debug!("Connectivity watch stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteCall;
    use crate::testing::{habit, offline, online};
    use habit_sync_core::DrainState;
    use habit_sync_types::HabitId;
    use std::time::Duration;

    fn id(s: &str) -> HabitId {
        HabitId::new(s)
    }

    // ===========================================
    // Drain Basics
    // ===========================================

    #[tokio::test]
    async fn empty_queue_does_not_touch_remote() {
        let fx = online();
        let report = fx.sync.sync_with_server(None).await;

        assert_eq!(report, DrainReport::default());
        assert!(fx.remote.calls().is_empty());
        assert_eq!(fx.sync.drain_state(), DrainState::Idle);
    }

    #[tokio::test]
    async fn drains_in_enqueue_order_then_refreshes() {
        let fx = offline();
        fx.sync.create_habit(habit("h1", 2)).await;
        fx.sync.complete_habit(&id("h1")).await;
        fx.sync.uncomplete_habit(&id("h1")).await;

        let report = fx.sync.sync_with_server(None).await;

        assert_eq!(report.applied, 3);
        assert!(report.is_drained());
        assert!(report.refreshed);
        assert_eq!(
            fx.remote.calls(),
            vec![
                RemoteCall::Create(id("h1")),
                RemoteCall::Increment(id("h1"), 1),
                RemoteCall::Increment(id("h1"), -1),
                RemoteCall::List,
            ]
        );
        assert!(!fx.sync.is_pending(&id("h1")));
    }

    #[tokio::test]
    async fn stops_on_first_failure() {
        let fx = offline();
        fx.remote.set_habits(vec![habit("a", 1), habit("b", 1), habit("c", 1)]);
        fx.sync.fetch_and_merge().await.unwrap();
        fx.remote.clear_calls();

        fx.sync.complete_habit(&id("a")).await;
        fx.sync.complete_habit(&id("b")).await;
        fx.sync.complete_habit(&id("c")).await;
        let before = fx.sync.queued_actions();

        fx.remote.fail_nth_call(2, RemoteError::Timeout);
        let report = fx.sync.sync_with_server(None).await;

        assert_eq!(report.applied, 1);
        assert_eq!(report.remaining, 2);
        assert_eq!(report.stalled.as_deref(), Some("request timeout"));
        assert!(!report.refreshed);
        assert_eq!(fx.sync.queued_actions(), before[1..].to_vec());
        // Nothing after the failed action was attempted.
        assert_eq!(fx.remote.call_count(), 2);
        assert!(matches!(
            fx.sync.drain_state(),
            DrainState::Stalled { seq, .. } if seq == before[1].seq
        ));
        assert!(!fx.sync.is_pending(&id("a")));
        assert!(fx.sync.is_pending(&id("b")));
    }

    #[tokio::test]
    async fn next_trigger_resumes_from_failed_action() {
        let fx = offline();
        fx.remote.set_habits(vec![habit("a", 1), habit("b", 1)]);
        fx.sync.fetch_and_merge().await.unwrap();
        fx.sync.complete_habit(&id("a")).await;
        fx.sync.complete_habit(&id("b")).await;

        fx.remote.fail_nth_call(2, RemoteError::Status(500));
        fx.sync.sync_with_server(None).await;
        fx.remote.clear_calls();

        let report = fx.sync.sync_with_server(None).await;
        assert!(report.is_drained());
        assert_eq!(
            fx.remote.calls(),
            vec![RemoteCall::Increment(id("b"), 1), RemoteCall::List]
        );
        assert_eq!(fx.remote.habit(&id("a")).unwrap().completions_today, 1);
    }

    #[tokio::test]
    async fn duplicate_actions_are_each_sent_once() {
        let fx = offline();
        fx.remote.set_habits(vec![habit("h1", 3)]);
        fx.sync.fetch_and_merge().await.unwrap();
        fx.sync.complete_habit(&id("h1")).await;
        fx.sync.complete_habit(&id("h1")).await;
        fx.remote.clear_calls();

        fx.remote.fail_nth_call(2, RemoteError::Timeout);
        fx.sync.sync_with_server(None).await;
        assert_eq!(fx.sync.queued_actions().len(), 1);

        fx.sync.sync_with_server(None).await;
        assert!(fx.sync.queued_actions().is_empty());
        assert_eq!(fx.remote.habit(&id("h1")).unwrap().completions_today, 2);
    }

    // ===========================================
    // Server Responses
    // ===========================================

    #[tokio::test]
    async fn server_copy_replaces_local() {
        let fx = offline();
        fx.remote.set_habits(vec![habit("h1", 1)]);
        fx.sync.fetch_and_merge().await.unwrap();
        fx.sync.complete_habit(&id("h1")).await;

        fx.sync.sync_with_server(None).await;

        // Streak is computed server-side.
        assert_eq!(fx.sync.habit(&id("h1")).unwrap().streak, 1);
    }

    #[tokio::test]
    async fn bodyless_responses_keep_local_copy() {
        let fx = offline();
        fx.sync.create_habit(habit("h1", 2)).await;
        fx.sync.complete_habit(&id("h1")).await;
        fx.remote.omit_bodies(true);
        // Refresh would overwrite the streak; make it unauthorized.
        fx.remote.fail_nth_call(3, RemoteError::Unauthorized);

        let report = fx.sync.sync_with_server(None).await;

        assert!(report.is_drained());
        assert!(!report.refreshed);
        assert_eq!(fx.sync.habit(&id("h1")).unwrap().completions_today, 1);
    }

    #[tokio::test]
    async fn unauthorized_replay_stalls() {
        let fx = offline();
        fx.sync.create_habit(habit("h1", 1)).await;
        fx.remote.unauthorize_next();

        let report = fx.sync.sync_with_server(None).await;

        assert_eq!(report.stalled.as_deref(), Some("unauthorized"));
        assert_eq!(report.remaining, 1);
    }

    // ===========================================
    // Refresh / Merge
    // ===========================================

    #[tokio::test]
    async fn fetch_keeps_local_completions_today() {
        let fx = offline();
        let mut server = habit("h1", 3);
        server.streak = 5;
        server.name = "Server name".into();
        fx.remote.set_habits(vec![server.clone()]);
        fx.sync.fetch_and_merge().await.unwrap();

        fx.sync.complete_habit(&id("h1")).await;
        fx.sync.complete_habit(&id("h1")).await;
        fx.sync.fetch_and_merge().await.unwrap();

        let merged = fx.sync.habit(&id("h1")).unwrap();
        let mut expected = server;
        expected.completions_today = 2;
        assert_eq!(merged, expected);
    }

    #[tokio::test]
    async fn unauthorized_fetch_keeps_store() {
        let fx = offline();
        fx.sync.create_habit(habit("local", 1)).await;
        fx.remote.unauthorize_next();

        assert_eq!(fx.sync.fetch_and_merge().await, Ok(None));
        assert_eq!(fx.sync.habits().len(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_store_and_reports() {
        let fx = offline();
        fx.sync.create_habit(habit("local", 1)).await;
        fx.remote.set_unreachable(true);

        assert!(fx.sync.fetch_and_merge().await.is_err());
        assert_eq!(fx.sync.habits().len(), 1);
    }

    #[tokio::test]
    async fn fetch_keeps_offline_created_habit() {
        let fx = offline();
        fx.remote.set_habits(vec![habit("server", 1)]);
        fx.sync.create_habit(habit("offline", 1)).await;

        fx.sync.fetch_and_merge().await.unwrap();

        let mut ids: Vec<String> = fx.sync.habits().into_iter().map(|h| h.id.to_string()).collect();
        ids.sort();
        assert_eq!(ids, vec!["offline", "server"]);
    }

    #[tokio::test]
    async fn refresh_failure_does_not_reopen_drain() {
        let fx = offline();
        fx.sync.create_habit(habit("h1", 1)).await;
        fx.remote.fail_nth_call(2, RemoteError::Status(502));

        let report = fx.sync.sync_with_server(None).await;

        assert!(report.is_drained());
        assert!(!report.refreshed);
        assert_eq!(fx.sync.drain_state(), DrainState::Idle);
    }

    // ===========================================
    // Overrides and Concurrency
    // ===========================================

    #[tokio::test]
    async fn stale_override_entries_are_skipped() {
        let fx = offline();
        fx.sync.create_habit(habit("h1", 1)).await;
        let stale = fx.sync.queued_actions();
        fx.sync.sync_with_server(None).await;
        fx.remote.clear_calls();

        let report = fx.sync.sync_with_server(Some(stale)).await;

        assert_eq!(report.applied, 0);
        assert!(fx.remote.calls().is_empty());
    }

    #[tokio::test]
    async fn override_batch_picks_up_later_appends() {
        let fx = offline();
        fx.sync.create_habit(habit("a", 1)).await;
        let snapshot = fx.sync.queued_actions();
        fx.sync.create_habit(habit("b", 1)).await;

        let report = fx.sync.sync_with_server(Some(snapshot)).await;

        assert_eq!(report.applied, 2);
        assert!(report.is_drained());
    }

    #[tokio::test]
    async fn override_never_jumps_ahead_of_older_entries() {
        let fx = offline();
        fx.remote.set_habits(vec![habit("a", 1), habit("b", 1)]);
        fx.sync.fetch_and_merge().await.unwrap();
        fx.sync.complete_habit(&id("a")).await;
        fx.sync.complete_habit(&id("b")).await;
        fx.remote.clear_calls();

        let newest = fx.sync.queued_actions()[1..].to_vec();
        let report = fx.sync.sync_with_server(Some(newest)).await;

        assert_eq!(
            fx.remote.calls(),
            vec![
                RemoteCall::Increment(id("a"), 1),
                RemoteCall::Increment(id("b"), 1),
                RemoteCall::List,
            ]
        );
        assert!(report.is_drained());
        assert_eq!(fx.sync.drain_state(), DrainState::Idle);
    }

    #[tokio::test]
    async fn concurrent_triggers_never_double_send() {
        let fx = online();
        fx.remote.set_delay(Some(Duration::from_millis(20)));

        let first = {
            let sync = fx.sync.clone();
            tokio::spawn(async move { sync.create_habit(habit("a", 1)).await })
        };
        let second = {
            let sync = fx.sync.clone();
            tokio::spawn(async move { sync.create_habit(habit("b", 1)).await })
        };
        first.await.unwrap();
        second.await.unwrap();
        fx.sync.settled().await;

        let creates = fx
            .remote
            .calls()
            .into_iter()
            .filter(|c| matches!(c, RemoteCall::Create(_)))
            .count();
        assert_eq!(creates, 2);
        assert!(fx.sync.queued_actions().is_empty());
        assert_eq!(fx.remote.habits().len(), 2);
    }

    // ===========================================
    // Connectivity
    // ===========================================

    #[tokio::test]
    async fn reconnect_drains_queue() {
        let fx = offline();
        fx.sync.create_habit(habit("h1", 1)).await;
        let watcher = fx.sync.watch_connectivity();

        fx.monitor.set_online(true);
        for _ in 0..100 {
            if fx.sync.queued_actions().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(fx.sync.queued_actions().is_empty());
        assert!(fx.remote.habit(&id("h1")).is_some());
        watcher.abort();
    }

    #[tokio::test]
    async fn restart_replays_on_reconnect() {
        let fx = offline();
        fx.remote.set_habits(vec![habit("h1", 2)]);
        fx.sync.fetch_and_merge().await.unwrap();
        fx.sync.complete_habit(&id("h1")).await;

        let restarted = fx.restart(false);
        restarted.sync.load();
        let watcher = restarted.sync.watch_connectivity();
        restarted.monitor.set_online(true);
        for _ in 0..100 {
            if restarted.sync.queued_actions().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(fx.remote.habit(&id("h1")).unwrap().completions_today, 1);
        watcher.abort();
    }
}
