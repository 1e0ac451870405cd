//! Merging the server's habit list into local state.

use std::collections::HashMap;

use habit_sync_types::{Habit, HabitId, QueuedAction, SyncAction};

/// Merge an authoritative server list with the local habits.
///
/// The server list decides membership and every field, except
/// `completions_today`: when a local habit with the same id exists, its
/// counter is kept so a refresh does not wipe same-day progress the server
/// has not reflected yet.
pub fn merge_server_habits(local: &[Habit], server: Vec<Habit>) -> Vec<Habit> {
    let local_today: HashMap<&HabitId, u32> = local
        .iter()
        .map(|h| (&h.id, h.completions_today))
        .collect();

    server
        .into_iter()
        .map(|mut habit| {
            if let Some(today) = local_today.get(&habit.id) {
                habit.completions_today = *today;
            }
            habit
        })
        .collect()
}

/// Re-apply still-queued intents on top of a merged server list.
///
/// The server has not seen these actions yet, so its list lags behind:
/// - a queued `delete` keeps the habit out
/// - a queued `create` keeps the local habit in
/// - a queued `update` keeps the local version
pub fn overlay_queued(merged: Vec<Habit>, local: &[Habit], queued: &[QueuedAction]) -> Vec<Habit> {
    let mut habits = merged;

    for entry in queued {
        match &entry.action {
            SyncAction::Delete { id } => habits.retain(|h| &h.id != id),
            SyncAction::Create { habit } | SyncAction::Update { habit } => {
                let Some(current) = local.iter().find(|h| h.id == habit.id) else {
                    continue;
                };
                match habits.iter_mut().find(|h| h.id == current.id) {
                    Some(slot) => *slot = current.clone(),
                    None => habits.push(current.clone()),
                }
            }
            SyncAction::Complete { .. } | SyncAction::Uncomplete { .. } => {}
        }
    }
    habits
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use habit_sync_types::{Seq, WeekDay};

    fn habit(id: &str, name: &str) -> Habit {
        Habit::new(
            HabitId::new(id),
            name,
            Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn server_fields_win_except_completions_today() {
        let mut local = habit("h1", "Old name");
        local.completions_today = 2;
        local.streak = 1;

        let mut server = habit("h1", "New name").with_days([WeekDay::Monday]);
        server.completions_today = 0;
        server.streak = 9;
        server.all_completions = 30;

        let merged = merge_server_habits(&[local], vec![server.clone()]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].completions_today, 2);
        let mut expected = server;
        expected.completions_today = 2;
        assert_eq!(merged[0], expected);
    }

    #[test]
    fn server_only_habits_keep_server_counter() {
        let mut server = habit("h2", "Walk");
        server.completions_today = 1;

        let merged = merge_server_habits(&[], vec![server]);
        assert_eq!(merged[0].completions_today, 1);
    }

    #[test]
    fn local_only_habits_are_dropped() {
        let local = vec![habit("gone", "Gone"), habit("kept", "Kept")];
        let merged = merge_server_habits(&local, vec![habit("kept", "Kept")]);

        let ids: Vec<&str> = merged.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["kept"]);
    }

    #[test]
    fn server_order_is_preserved() {
        let merged = merge_server_habits(
            &[habit("a", "A"), habit("b", "B")],
            vec![habit("b", "B"), habit("a", "A")],
        );
        let ids: Vec<&str> = merged.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    // ===========================================
    // Queued Intent Overlay
    // ===========================================

    fn queued(seq: u64, action: SyncAction) -> QueuedAction {
        QueuedAction::new(Seq::new(seq), action)
    }

    #[test]
    fn queued_create_keeps_local_habit() {
        let local = vec![habit("new", "Offline habit")];
        let merged = merge_server_habits(&local, vec![]);
        let queue = vec![queued(1, SyncAction::Create { habit: habit("new", "Offline habit") })];

        let result = overlay_queued(merged, &local, &queue);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, HabitId::new("new"));
    }

    #[test]
    fn queued_delete_keeps_habit_out() {
        let server = vec![habit("h1", "Doomed"), habit("h2", "Kept")];
        let queue = vec![queued(1, SyncAction::Delete { id: "h1".into() })];

        let result = overlay_queued(merge_server_habits(&[], server), &[], &queue);
        let ids: Vec<&str> = result.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["h2"]);
    }

    #[test]
    fn queued_update_keeps_local_version() {
        let local = vec![habit("h1", "Renamed")];
        let merged = merge_server_habits(&local, vec![habit("h1", "Old")]);
        let queue = vec![queued(1, SyncAction::Update { habit: habit("h1", "Renamed") })];

        let result = overlay_queued(merged, &local, &queue);
        assert_eq!(result[0].name, "Renamed");
    }

    #[test]
    fn toggles_do_not_change_membership() {
        let merged = merge_server_habits(&[], vec![habit("h1", "A")]);
        let queue = vec![queued(1, SyncAction::Complete { id: "h1".into() })];

        let result = overlay_queued(merged.clone(), &[], &queue);
        assert_eq!(result, merged);
    }
}
