//! Forget every local habit and queued change.

use anyhow::Result;
use habit_sync_client::{HabitSync, KeyValueStore, RemoteHabits};

/// Run the reset command.
pub async fn run<R, S>(sync: &HabitSync<R, S>) -> Result<()>
where
    R: RemoteHabits + 'static,
    S: KeyValueStore + 'static,
{
    let dropped = sync.queued_actions().len();
    sync.reset_habits().await;

    println!("Local habits cleared");
    if dropped > 0 {
        println!("  {} unsynced changes were discarded.", dropped);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{habit, sync};

    #[tokio::test]
    async fn reset_clears_habits_and_queue() {
        let (sync, remote, _) = sync(false);
        sync.create_habit(habit("h1")).await;

        run(&sync).await.unwrap();

        assert!(sync.habits().is_empty());
        assert!(sync.queued_actions().is_empty());
        assert!(remote.calls().is_empty());
    }
}
