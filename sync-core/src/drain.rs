//! Drain state machine for habit-sync.
//!
//! This module provides a pure, side-effect-free state machine for one
//! replay of the action queue against the remote service. The state machine
//! takes events as input and produces a new state plus a list of steps to
//! execute.
//!
//! The actual I/O (remote calls, persistence) is performed by sync-client,
//! not by this module.

use habit_sync_types::Seq;

/// Drain state machine - NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DrainState {
    /// Nothing in flight. Steady state once the queue is empty.
    #[default]
    Idle,
    /// Replaying the queue one action at a time.
    Draining {
        /// Actions confirmed by the server during this pass.
        applied: usize,
        /// Actions still queued.
        remaining: usize,
    },
    /// A replay failed. Waiting for the next trigger.
    Stalled {
        /// The action that failed.
        seq: Seq,
        /// Error message describing the failure.
        error: String,
    },
}

impl DrainState {
    /// Create a new state machine in the Idle state.
    pub fn new() -> Self {
        Self::Idle
    }

    /// Process an event and return the new state plus steps to execute.
    ///
    /// This is a pure function. The caller (sync-client) is responsible for
    /// executing the returned steps.
    pub fn on_event(self, event: DrainEvent) -> (Self, Vec<DrainStep>) {
        match (self, event) {
            // A pass already running absorbs the trigger.
            (state @ Self::Draining { .. }, DrainEvent::Started { .. }) => (state, vec![]),

            // From Idle or Stalled
            (_, DrainEvent::Started { queued: 0 }) => (Self::Idle, vec![]),
            (_, DrainEvent::Started { queued }) => (
                Self::Draining {
                    applied: 0,
                    remaining: queued,
                },
                vec![DrainStep::DispatchNext],
            ),

            // From Draining
            (Self::Draining { .. }, DrainEvent::Applied { remaining: 0, .. }) => {
                (Self::Idle, vec![DrainStep::Refresh])
            }
            (Self::Draining { applied, .. }, DrainEvent::Applied { remaining, .. }) => (
                Self::Draining {
                    applied: applied.saturating_add(1),
                    remaining,
                },
                vec![DrainStep::DispatchNext],
            ),
            (Self::Draining { .. }, DrainEvent::Failed { seq, error }) => {
                (Self::Stalled { seq, error }, vec![])
            }

            (_, DrainEvent::Reset) => (Self::Idle, vec![]),

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Check if a pass is in flight.
    pub fn is_draining(&self) -> bool {
        matches!(self, Self::Draining { .. })
    }

    /// Check if the last pass stopped on a failure.
    pub fn is_stalled(&self) -> bool {
        matches!(self, Self::Stalled { .. })
    }
}

/// Events that can occur during a drain pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainEvent {
    /// A trigger started a pass over a queue of this length.
    Started {
        /// Number of queued actions at the start of the pass.
        queued: usize,
    },
    /// The server confirmed an action.
    Applied {
        /// The confirmed action.
        seq: Seq,
        /// Actions still queued after removing it.
        remaining: usize,
    },
    /// Replaying an action failed.
    Failed {
        /// The failed action.
        seq: Seq,
        /// Error message describing the failure.
        error: String,
    },
    /// Local state was wiped.
    Reset,
}

/// Steps to be executed by the sync-client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStep {
    /// Replay the oldest queued action.
    DispatchNext,
    /// The queue is empty; pull the authoritative habit list.
    Refresh,
}
