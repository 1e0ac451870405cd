//! Mark a completion, or take one back.

use anyhow::Result;
use habit_sync_client::{CompletionDelta, HabitSync, KeyValueStore, RemoteHabits};
use habit_sync_types::DayProgress;

use super::resolve_id;

/// Run the done/undo command.
pub async fn run<R, S>(
    sync: &HabitSync<R, S>,
    input: &str,
    delta: CompletionDelta,
) -> Result<DayProgress>
where
    R: RemoteHabits + 'static,
    S: KeyValueStore + 'static,
{
    let id = resolve_id(sync, input)?;
    match delta {
        CompletionDelta::Increment => sync.complete_habit(&id).await,
        CompletionDelta::Decrement => sync.uncomplete_habit(&id).await,
    }
    sync.settled().await;

    let (Some(habit), Some(progress)) = (sync.habit(&id), sync.progress(&id)) else {
        anyhow::bail!("Habit {} disappeared", id);
    };
    let mark = if progress.is_complete() { "done" } else { "open" };
    println!(
        "{}: {}/{} today ({})",
        habit.name, progress.done, progress.need, mark
    );
    if !progress.scheduled {
        println!("  Note: not scheduled for today.");
    }
    Ok(progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{habit, sync};

    #[tokio::test]
    async fn done_and_undo_move_counter_within_bounds() {
        let (sync, _, _) = sync(false);
        sync.create_habit(habit("water").with_completions_need(2)).await;

        let p = run(&sync, "wat", CompletionDelta::Increment).await.unwrap();
        assert_eq!(p.done, 1);
        run(&sync, "wat", CompletionDelta::Increment).await.unwrap();
        let p = run(&sync, "wat", CompletionDelta::Increment).await.unwrap();
        assert_eq!(p.done, 2);
        assert!(p.is_complete());

        for _ in 0..3 {
            run(&sync, "water", CompletionDelta::Decrement).await.unwrap();
        }
        assert_eq!(sync.progress(&"water".into()).unwrap().done, 0);
    }

    #[tokio::test]
    async fn online_done_is_sent_before_returning() {
        let (sync, remote, _) = sync(true);
        remote.set_habits(vec![habit("walk").with_completions_need(2)]);
        sync.fetch_and_merge().await.unwrap();

        let p = run(&sync, "walk", CompletionDelta::Increment).await.unwrap();

        assert_eq!(p.done, 1);
        assert!(sync.queued_actions().is_empty());
        assert_eq!(remote.habit(&"walk".into()).unwrap().completions_today, 1);
    }

    #[tokio::test]
    async fn unknown_habit_is_an_error() {
        let (sync, _, _) = sync(false);
        assert!(run(&sync, "nope", CompletionDelta::Increment).await.is_err());
        assert!(sync.queued_actions().is_empty());
    }
}
