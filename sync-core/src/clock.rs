//! Injectable source of "now" and "today".
//!
//! Every day-boundary decision goes through a [`Clock`], so tests can pin
//! the calendar day instead of depending on the wall clock.

use chrono::{DateTime, Local, NaiveDate, Utc};
use habit_sync_types::WeekDay;

/// Source of the current instant and calendar day.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar day as the user sees it.
    fn today(&self) -> NaiveDate;

    /// Day of the week of [`Clock::today`].
    fn weekday(&self) -> WeekDay {
        use chrono::Datelike;
        self.today().weekday().into()
    }
}

/// Wall clock. Days follow the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    /// Freeze at this instant. `today()` is its UTC date.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Freeze at midday UTC of the given day.
    pub fn on(day: NaiveDate) -> Self {
        let noon = day.and_hms_opt(12, 0, 0).unwrap_or_default();
        Self {
            now: noon.and_utc(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_reports_its_day() {
        let day = NaiveDate::from_ymd_opt(2025, 12, 3).unwrap();
        let clock = FixedClock::on(day);

        assert_eq!(clock.today(), day);
        assert_eq!(clock.weekday(), WeekDay::Wednesday);
        assert_eq!(clock.now().date_naive(), day);
    }

    #[test]
    fn system_clock_is_close_to_now() {
        let clock = SystemClock;
        let drift = Utc::now() - clock.now();
        assert!(drift.num_seconds().abs() < 5);
    }
}
