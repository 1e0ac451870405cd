//! # habit-sync-core
//!
//! Pure logic for habit-sync (no I/O, instant tests).
//!
//! This crate implements the queue, state machine and merge rules of the
//! offline mutation engine without any network or disk I/O.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (remote calls, key-value storage) is performed by
//! `sync-client`, which interprets the steps produced by these state machines.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod connectivity;
pub mod drain;
pub mod merge;
pub mod pending;
pub mod queue;

pub use clock::{Clock, FixedClock, SystemClock};
pub use connectivity::ReconnectEdge;
pub use drain::{DrainEvent, DrainState, DrainStep};
pub use merge::{merge_server_habits, overlay_queued};
pub use pending::PendingSet;
pub use queue::{ActionQueue, QueueError};
