//! Edit a habit.

use anyhow::Result;
use habit_sync_client::{HabitSync, KeyValueStore, RemoteHabits};
use habit_sync_types::{Habit, HabitCategory};

use super::{parse_days, resolve_id};

/// Changes requested on the command line. `None` keeps the current value.
#[derive(Debug, Default)]
pub struct HabitEdit {
    /// New name.
    pub name: Option<String>,
    /// New completions needed per day.
    pub need: Option<u32>,
    /// New comma-separated day list.
    pub days: Option<String>,
    /// New color tag.
    pub color: Option<String>,
    /// New category name.
    pub category: Option<String>,
    /// New description.
    pub description: Option<String>,
}

impl HabitEdit {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.need.is_none()
            && self.days.is_none()
            && self.color.is_none()
            && self.category.is_none()
            && self.description.is_none()
    }

    /// Apply the changes to a copy of `habit`.
    pub fn apply(self, habit: Habit) -> Result<Habit> {
        let mut habit = habit;
        if let Some(name) = self.name {
            let name = name.trim();
            if name.is_empty() {
                anyhow::bail!("Habit name must not be empty");
            }
            habit.name = name.to_string();
        }
        if let Some(need) = self.need {
            habit = habit.with_completions_need(need);
            habit.completions_today = habit.completions_today.min(habit.completions_need);
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
        Ok(habit)
    }
}

/// Run the edit command.
pub async fn run<R, S>(sync: &HabitSync<R, S>, input: &str, edit: HabitEdit) -> Result<Habit>
where
    R: RemoteHabits + 'static,
    S: KeyValueStore + 'static,
{
    if edit.is_empty() {
        anyhow::bail!("Nothing to change. See 'habits edit --help'.");
    }
    let id = resolve_id(sync, input)?;
    let Some(current) = sync.habit(&id) else {
        anyhow::bail!("No habit matches '{}'", input);
    };

    let edited = edit.apply(current)?;
    sync.update_habit(edited.clone()).await;
    sync.settled().await;

    println!("Updated '{}' ({})", edited.name, id.short());
    Ok(edited)
}
