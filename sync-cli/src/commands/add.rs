//! Create a habit.

use anyhow::Result;
use chrono::Utc;
use habit_sync_client::{HabitSync, KeyValueStore, RemoteHabits};
use habit_sync_types::{Habit, HabitCategory, HabitId};

use super::{parse_days, parse_time};

/// Fields of a new habit as given on the command line.
#[derive(Debug, Default)]
pub struct NewHabit {
    /// Display name.
    pub name: String,
    /// Completions needed per scheduled day.
    pub need: Option<u32>,
    /// Comma-separated days, every day when absent.
    pub days: Option<String>,
    /// Color tag.
    pub color: Option<String>,
    /// Category name.
    pub category: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Notification times (`HH:MM`).
    pub notify: Vec<String>,
}

impl NewHabit {
    /// Validate the fields and build a habit with a fresh id.
    pub fn build(self) -> Result<Habit> {
        let name = self.name.trim();
        if name.is_empty() {
            anyhow::bail!("Habit name must not be empty");
        }

        let mut habit = Habit::new(HabitId::generate(), name, Utc::now());
        if let Some(need) = self.need {
            habit = habit.with_completions_need(need);
        }
        if let Some(days) = self.days {
            habit = habit.with_days(parse_days(&days)?);
        }
        if let Some(color) = self.color {
            habit = habit.with_color(color);
        }
        if let Some(category) = self.category {
            habit = habit.with_category(category.parse::<HabitCategory>()?);
        }
        if let Some(description) = self.description {
            habit = habit.with_description(description);
        }
        if !self.notify.is_empty() {
            let times = self
                .notify
                .iter()
                .map(|t| parse_time(t))
                .collect::<Result<Vec<_>>>()?;
            habit = habit.with_notification_times(times);
        }
        Ok(habit)
    }
}

/// Run the add command.
pub async fn run<R, S>(sync: &HabitSync<R, S>, new: NewHabit) -> Result<Habit>
where
    R: RemoteHabits + 'static,
    S: KeyValueStore + 'static,
{
    let habit = new.build()?;
    sync.create_habit(habit.clone()).await;
    sync.settled().await;

    println!("Added '{}' ({})", habit.name, habit.id.short());
    if !sync.queued_actions().is_empty() {
        println!("  Not synced yet, will be sent when the server is reachable.");
    }
    Ok(habit)
}
