//! List habits with today's progress.

use std::collections::HashSet;

use anyhow::Result;
use habit_sync_client::{HabitSync, KeyValueStore, RemoteHabits};
use habit_sync_types::HabitId;

use super::format_days;

/// Run the list command.
///
/// When online, the server list is merged in first. A failed refresh falls
/// back to the local copy.
pub async fn run<R, S>(sync: &HabitSync<R, S>, today_only: bool) -> Result<()>
where
    R: RemoteHabits + 'static,
    S: KeyValueStore + 'static,
{
    if sync.is_online() {
        if let Err(e) = sync.fetch_and_merge().await {
            tracing::warn!("Could not refresh habits: {}", e);
            println!("(server unreachable, showing local copy)");
        }
    }

    let lines = render(sync, today_only);
    if lines.is_empty() {
        println!("No habits yet. Add one with 'habits add <name>'.");
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

/// One line per habit. Unsynced habits are marked with `*`.
pub fn render<R, S>(sync: &HabitSync<R, S>, today_only: bool) -> Vec<String>
where
    R: RemoteHabits + 'static,
    S: KeyValueStore + 'static,
{
    let unsynced: HashSet<HabitId> = sync
        .queued_actions()
        .into_iter()
        .map(|e| e.action.habit_id().clone())
        .collect();
    let habits = if today_only {
        sync.scheduled_today()
    } else {
        sync.habits()
    };

    habits
        .iter()
        .filter_map(|habit| {
            let progress = sync.progress(&habit.id)?;
            let check = if progress.is_complete() { "x" } else { " " };
            let marker = if unsynced.contains(&habit.id) { "*" } else { " " };
            Some(format!(
                "[{}] {:<8}{} {:<24} {}/{}  streak {:<3} {}",
                check,
                habit.id.short(),
                marker,
                habit.name,
                progress.done,
                progress.need,
                habit.streak,
                format_days(&habit.completion_days)
            ))
        })
        .collect()
}
