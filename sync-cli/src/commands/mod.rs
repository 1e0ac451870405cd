//! CLI command implementations.
//!
//! Every command takes the [`HabitSync`] handle built in `main`, so tests
//! can drive them over a `MockRemote` and a `MemoryStore`.

pub mod add;
pub mod edit;
pub mod init;
pub mod list;
pub mod remove;
pub mod reset;
pub mod status;
pub mod sync;
pub mod toggle;

use anyhow::{bail, Result};
use chrono::NaiveTime;
use habit_sync_client::{HabitSync, KeyValueStore, RemoteHabits};
use habit_sync_types::{Habit, HabitId, WeekDay};

/// Find the habit an id or unique id prefix refers to.
pub fn resolve_id<R, S>(sync: &HabitSync<R, S>, input: &str) -> Result<HabitId>
where
    R: RemoteHabits + 'static,
    S: KeyValueStore + 'static,
{
    let habits = sync.habits();
    if let Some(exact) = habits.iter().find(|h| h.id.as_str() == input) {
        return Ok(exact.id.clone());
    }

    let matches: Vec<&Habit> = habits
        .iter()
        .filter(|h| h.id.as_str().starts_with(input))
        .collect();
    match matches.as_slice() {
        [] => bail!("No habit matches '{}'", input),
        [one] => Ok(one.id.clone()),
        many => bail!(
            "'{}' is ambiguous ({} habits match), use more characters",
            input,
            many.len()
        ),
    }
}

/// Parse a comma-separated day list like `mon,wed,fri`.
pub fn parse_days(input: &str) -> Result<Vec<WeekDay>> {
    let days = input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<WeekDay>())
        .collect::<Result<Vec<_>, _>>()?;
    if days.is_empty() {
        bail!("At least one day is required");
    }
    Ok(days)
}

/// Validate an `HH:MM` time of day.
pub fn parse_time(input: &str) -> Result<String> {
    match NaiveTime::parse_from_str(input, "%H:%M") {
        Ok(time) => Ok(time.format("%H:%M").to_string()),
        Err(_) => bail!("Invalid time '{}', expected HH:MM", input),
    }
}

/// Compact day list, `daily` when every day is scheduled.
pub fn format_days(days: &[WeekDay]) -> String {
    if days.len() == WeekDay::ALL.len() {
        return "daily".to_string();
    }
    days.iter().map(|d| d.short()).collect::<Vec<_>>().join(",")
}
