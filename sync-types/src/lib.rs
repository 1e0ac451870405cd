//! # habit-sync-types
//!
//! Data model for the habit-sync offline mutation queue.
//!
//! This crate provides the types shared by every habit-sync crate:
//! - [`HabitId`], [`Seq`] - Identity and ordering types
//! - [`Habit`], [`Completion`], [`WeekDay`], [`HabitCategory`] - The habit record
//! - [`SyncAction`], [`QueuedAction`] - Replayable mutation intents
//! - [`HabitError`] - Parse errors

#![warn(missing_docs)]
#![warn(clippy::all)]

mod action;
mod error;
mod habit;
mod ids;

pub use action::{ActionKind, QueuedAction, SyncAction};
pub use error::HabitError;
pub use habit::{Completion, DayProgress, Habit, HabitCategory, WeekDay, DEFAULT_COLOR};
pub use ids::{HabitId, Seq};
