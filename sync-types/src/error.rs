//! Error types for habit-sync data model parsing.

use thiserror::Error;

/// Errors produced when parsing model values from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HabitError {
    /// Unknown week-day name.
    #[error("invalid week day: {0}")]
    InvalidWeekDay(String),

    /// Unknown habit category.
    #[error("invalid habit category: {0}")]
    InvalidCategory(String),
}
