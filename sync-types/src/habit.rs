//! Habit records and their daily completion bookkeeping.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{HabitError, HabitId};

/// Color assigned to habits created without an explicit one.
pub const DEFAULT_COLOR: &str = "rgba(54, 37, 92, 0.8)";

/// Day of the week a habit can be scheduled on.
///
/// Ordered Monday first so that a sorted list reads like a calendar row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekDay {
    /// Monday
    Monday,
    /// Tuesday
    Tuesday,
    /// Wednesday
    Wednesday,
    /// Thursday
    Thursday,
    /// Friday
    Friday,
    /// Saturday
    Saturday,
    /// Sunday
    Sunday,
}

impl WeekDay {
    /// Every day of the week, Monday first.
    pub const ALL: [WeekDay; 7] = [
        WeekDay::Monday,
        WeekDay::Tuesday,
        WeekDay::Wednesday,
        WeekDay::Thursday,
        WeekDay::Friday,
        WeekDay::Saturday,
        WeekDay::Sunday,
    ];

    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            WeekDay::Monday => "monday",
            WeekDay::Tuesday => "tuesday",
            WeekDay::Wednesday => "wednesday",
            WeekDay::Thursday => "thursday",
            WeekDay::Friday => "friday",
            WeekDay::Saturday => "saturday",
            WeekDay::Sunday => "sunday",
        }
    }

    /// Three-letter abbreviation.
    pub fn short(&self) -> &'static str {
        &self.as_str()[..3]
    }
}

impl From<chrono::Weekday> for WeekDay {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => WeekDay::Monday,
            chrono::Weekday::Tue => WeekDay::Tuesday,
            chrono::Weekday::Wed => WeekDay::Wednesday,
            chrono::Weekday::Thu => WeekDay::Thursday,
            chrono::Weekday::Fri => WeekDay::Friday,
            chrono::Weekday::Sat => WeekDay::Saturday,
            chrono::Weekday::Sun => WeekDay::Sunday,
        }
    }
}

impl FromStr for WeekDay {
    type Err = HabitError;

    /// Accepts full names and three-letter abbreviations, any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        WeekDay::ALL
            .into_iter()
            .find(|day| day.as_str() == lower || day.short() == lower)
            .ok_or_else(|| HabitError::InvalidWeekDay(s.to_string()))
    }
}

impl fmt::Display for WeekDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category tag of a habit (`type` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitCategory {
    /// Physical exercise
    Sport,
    /// Reading
    Reading,
    /// Diet and nutrition
    Food,
    /// Health
    Health,
    /// Learning
    Education,
    /// Work and productivity
    Productivity,
    /// Self care
    PersonalCare,
    /// Social life
    Social,
    /// Anything else
    #[default]
    Other,
}

impl HabitCategory {
    const ALL: [HabitCategory; 9] = [
        HabitCategory::Sport,
        HabitCategory::Reading,
        HabitCategory::Food,
        HabitCategory::Health,
        HabitCategory::Education,
        HabitCategory::Productivity,
        HabitCategory::PersonalCare,
        HabitCategory::Social,
        HabitCategory::Other,
    ];

    /// snake_case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HabitCategory::Sport => "sport",
            HabitCategory::Reading => "reading",
            HabitCategory::Food => "food",
            HabitCategory::Health => "health",
            HabitCategory::Education => "education",
            HabitCategory::Productivity => "productivity",
            HabitCategory::PersonalCare => "personal_care",
            HabitCategory::Social => "social",
            HabitCategory::Other => "other",
        }
    }
}

impl FromStr for HabitCategory {
    type Err = HabitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        HabitCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| HabitError::InvalidCategory(s.to_string()))
    }
}

impl fmt::Display for HabitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dated progress record for a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    /// Calendar day this record belongs to.
    #[serde(with = "day_format")]
    pub date: NaiveDate,
    /// Whether the day's target was reached.
    #[serde(default)]
    pub completed: bool,
    /// Progress toward the day's target. Authoritative over `completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_count: Option<u32>,
}

/// Progress of a habit on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayProgress {
    /// Completions recorded for the day.
    pub done: u32,
    /// Completions needed for the day.
    pub need: u32,
    /// Whether the habit is scheduled on that day at all.
    pub scheduled: bool,
}

impl DayProgress {
    /// Target reached.
    pub fn is_complete(&self) -> bool {
        self.done >= self.need
    }

    /// Progress as a whole percentage, capped at 100.
    pub fn percent(&self) -> u32 {
        if self.need == 0 {
            return 0;
        }
        (self.done.saturating_mul(100) / self.need).min(100)
    }
}

/// A user-defined recurring task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    /// Stable identifier.
    pub id: HabitId,
    /// Display name.
    pub name: String,
    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Color tag.
    #[serde(default)]
    pub color: String,
    /// Consecutive qualifying periods, computed by the server.
    #[serde(default)]
    pub streak: u32,
    /// Days the habit is scheduled on, ordered Monday first.
    #[serde(default)]
    pub completion_days: Vec<WeekDay>,
    /// Category tag.
    #[serde(rename = "type", default)]
    pub category: HabitCategory,
    /// Legacy single reminder time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
    /// Notification times (`HH:MM`).
    #[serde(default)]
    pub notifications_time: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Target completions per scheduled day.
    #[serde(default = "default_completions_need")]
    pub completions_need: u32,
    /// Cached counter of today's completions.
    #[serde(default)]
    pub completions_today: u32,
    /// Lifetime completion total.
    #[serde(default)]
    pub all_completions: u32,
    /// Dated completion records, when the server sends them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completions: Option<Vec<Completion>>,
}

fn default_completions_need() -> u32 {
    1
}

impl Habit {
    /// Create a habit scheduled every day with a target of one completion.
    pub fn new(id: HabitId, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            color: DEFAULT_COLOR.to_string(),
            streak: 0,
            completion_days: WeekDay::ALL.to_vec(),
            category: HabitCategory::Other,
            reminder_time: None,
            notifications_time: Vec::new(),
            created_at,
            completions_need: 1,
            completions_today: 0,
            all_completions: 0,
            completions: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the color tag.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Set the scheduled days. Duplicates are dropped and the days sorted.
    pub fn with_days(mut self, days: impl IntoIterator<Item = WeekDay>) -> Self {
        let mut days: Vec<WeekDay> = days.into_iter().collect();
        days.sort();
        days.dedup();
        self.completion_days = days;
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: HabitCategory) -> Self {
        self.category = category;
        self
    }

    /// Set the daily target. Values below one are raised to one.
    pub fn with_completions_need(mut self, need: u32) -> Self {
        self.completions_need = need.max(1);
        self
    }

    /// Set the legacy reminder time.
    pub fn with_reminder_time(mut self, time: impl Into<String>) -> Self {
        self.reminder_time = Some(time.into());
        self
    }

    /// Set the notification times.
    pub fn with_notification_times(mut self, times: Vec<String>) -> Self {
        self.notifications_time = times;
        self
    }

    /// Optimistically count one more completion for today.
    ///
    /// Never exceeds `completions_need`.
    pub fn record_completion(&mut self) {
        self.completions_today = self
            .completions_today
            .saturating_add(1)
            .min(self.completions_need);
    }

    /// Optimistically take back one of today's completions.
    ///
    /// Never goes below zero.
    pub fn revert_completion(&mut self) {
        self.completions_today = self.completions_today.saturating_sub(1);
    }

    /// Whether the habit is scheduled on the given day.
    pub fn is_scheduled_on(&self, day: WeekDay) -> bool {
        self.completion_days.contains(&day)
    }

    /// Progress on `date`, as seen on `today`.
    ///
    /// For today the optimistic `completions_today` counter is authoritative,
    /// since the server's record lags behind unconfirmed toggles. Past days
    /// come from the completion records.
    pub fn progress_on(&self, date: NaiveDate, today: NaiveDate) -> DayProgress {
        use chrono::Datelike;

        let done = if date == today {
            self.completions_today.min(self.completions_need)
        } else {
            let record = self
                .completions
                .as_deref()
                .unwrap_or_default()
                .iter()
                .find(|c| c.date == date);
            match record {
                Some(Completion {
                    current_count: Some(count),
                    ..
                }) => *count,
                Some(Completion {
                    completed: true, ..
                }) => self.completions_need,
                _ => 0,
            }
        };

        DayProgress {
            done,
            need: self.completions_need,
            scheduled: self.is_scheduled_on(date.weekday().into()),
        }
    }

    /// Lifetime completions.
    ///
    /// Sums `current_count` over the completion records when there are any,
    /// otherwise falls back to the server's `all_completions` counter.
    pub fn lifetime_completions(&self) -> u32 {
        match self.completions.as_deref() {
            Some(records) if !records.is_empty() => records
                .iter()
                .map(|c| c.current_count.unwrap_or(0))
                .sum(),
            _ => self.all_completions,
        }
    }
}

/// `YYYY-MM-DD` on output; on input anything starting with a date.
mod day_format {
    use chrono::NaiveDate;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let day = raw.get(..10).unwrap_or(&raw);
        NaiveDate::parse_from_str(day, FORMAT).map_err(D::Error::custom)
    }
}
