//! Show sync status.

use anyhow::Result;
use habit_sync_client::{HabitSync, KeyValueStore, RemoteHabits};
use habit_sync_core::DrainState;
use std::path::Path;

use crate::config::CliConfig;

/// Run the status command.
pub fn run<R, S>(sync: &HabitSync<R, S>, config: &CliConfig, data_dir: &Path) -> Result<()>
where
    R: RemoteHabits + 'static,
    S: KeyValueStore + 'static,
{
    println!("=== habits status ===");
    println!();

    println!("Server:");
    println!("  URL:     {}", config.server.base_url);
    println!("  Timeout: {}s", config.server.timeout_secs);
    println!(
        "  Mode:    {}",
        if sync.is_online() { "online" } else { "offline" }
    );
    println!();

    let habits = sync.habits();
    let done_today = sync
        .scheduled_today()
        .iter()
        .filter_map(|h| sync.progress(&h.id))
        .filter(|p| p.is_complete())
        .count();
    println!("Habits:");
    println!("  Total:      {}", habits.len());
    println!(
        "  Today:      {}/{} complete",
        done_today,
        sync.scheduled_today().len()
    );
    println!("  Data dir:   {}", data_dir.display());
    println!();

    let queued = sync.queued_actions();
    println!("Queue:");
    println!("  Unsynced:   {}", queued.len());
    for entry in &queued {
        println!(
            "    #{:<4} {:<10} {}",
            entry.seq.value(),
            entry.action.kind(),
            entry.action.habit_id().short()
        );
    }
    match sync.drain_state() {
        DrainState::Stalled { seq, error } => {
            println!("  Last sync:  stopped at #{} ({})", seq, error)
        }
        DrainState::Draining { remaining, .. } => {
            println!("  Last sync:  in progress ({} left)", remaining)
        }
        DrainState::Idle => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{habit, sync};
    use tempfile::tempdir;

    #[tokio::test]
    async fn status_with_queued_changes() {
        let dir = tempdir().unwrap();
        let (sync, _, _) = sync(false);
        sync.create_habit(habit("h1")).await;
        sync.complete_habit(&"h1".into()).await;

        let result = run(&sync, &CliConfig::default(), dir.path());
        assert!(result.is_ok());
    }

    #[test]
    fn status_when_empty() {
        let dir = tempdir().unwrap();
        let (sync, _, _) = sync(false);

        let result = run(&sync, &CliConfig::default(), dir.path());
        assert!(result.is_ok());
    }
}
