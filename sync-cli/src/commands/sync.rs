//! Push queued changes and pull the server's habits.

use anyhow::Result;
use habit_sync_client::{DrainReport, HabitSync, KeyValueStore, RemoteHabits};

/// Run the sync command.
pub async fn run<R, S>(sync: &HabitSync<R, S>) -> Result<DrainReport>
where
    R: RemoteHabits + 'static,
    S: KeyValueStore + 'static,
{
    if !sync.is_online() {
        anyhow::bail!(
            "Offline, {} changes stay queued",
            sync.queued_actions().len()
        );
    }

    let mut report = sync.sync_with_server(None).await;
    if report.applied == 0 && report.is_drained() {
        // Nothing was queued, so the drain did not refresh.
        report.refreshed = sync.fetch_and_merge().await?.is_some();
    }

    println!("Sent {} changes, {} still queued", report.applied, report.remaining);
    if let Some(error) = &report.stalled {
        anyhow::bail!("Sync stopped: {}", error);
    }
    if report.refreshed {
        println!("Fetched {} habits from the server", sync.habits().len());
    } else {
        println!("Server habits not fetched (session expired?)");
    }
    Ok(report)
}
