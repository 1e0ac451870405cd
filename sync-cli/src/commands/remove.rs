//! Delete a habit.

use anyhow::Result;
use habit_sync_client::{HabitSync, KeyValueStore, RemoteHabits};

use super::resolve_id;

/// Run the rm command.
pub async fn run<R, S>(sync: &HabitSync<R, S>, input: &str) -> Result<()>
where
    R: RemoteHabits + 'static,
    S: KeyValueStore + 'static,
{
    let id = resolve_id(sync, input)?;
    let name = sync.habit(&id).map(|h| h.name).unwrap_or_default();
    sync.delete_habit(&id).await;
    sync.settled().await;

    println!("Deleted '{}' ({})", name, id.short());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{habit, sync};
    use habit_sync_client::RemoteError;

    #[tokio::test]
    async fn failed_remote_delete_still_removes_locally() {
        let (sync, remote, _) = sync(true);
        sync.create_habit(habit("gym")).await;
        sync.settled().await;
        remote.fail_next(RemoteError::Status(503));

        run(&sync, "gym").await.unwrap();

        assert!(sync.habits().is_empty());
        assert_eq!(sync.queued_actions().len(), 1);
    }
}
