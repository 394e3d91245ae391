//! Statistics module for Smokeless
//!
//! Every figure shown to the user (today's count, the weekly chart, daily
//! average, savings, streaks) is derived here from the raw event log and the
//! settings record. Nothing in this module keeps state between calls; each
//! function recomputes from the full log it is handed.
//!
//! Day boundaries depend on the user's time zone, so the functions hang off an
//! [`Aggregator`] that carries one. Production code uses
//! [`Aggregator::local`]; tests pin a fixed offset.

mod dashboard;
mod day;
mod money;
mod streak;

pub use dashboard::{format_elapsed, Dashboard};
pub use day::{count_in_range, DayCount};
pub use money::{round_to, FinanceReport};
pub use streak::{DEFAULT_STREAK_LOOKBACK_DAYS, DEFAULT_ZERO_DAY_LOOKBACK_DAYS};

use chrono::{Local, TimeZone};

/// Length of a day bucket in milliseconds.
pub const DAY_MS: i64 = 86_400_000;

/// Weekday labels indexed from Sunday.
pub const DAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Derives day-bucketed metrics in a fixed time zone.
#[derive(Debug, Clone)]
pub struct Aggregator<Tz: TimeZone = Local> {
    tz: Tz,
}

impl Aggregator<Local> {
    /// Aggregator bucketing by the machine's local midnight.
    pub fn local() -> Self {
        Self { tz: Local }
    }
}

impl Default for Aggregator<Local> {
    fn default() -> Self {
        Self::local()
    }
}

impl<Tz: TimeZone> Aggregator<Tz> {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }
}

/// Whole days elapsed since `first`, at least one.
///
/// Partial days round up, so an event logged a minute ago counts as one day.
pub fn days_elapsed(first: i64, now: i64) -> i64 {
    let diff = now.saturating_sub(first);
    if diff <= 0 {
        return 1;
    }
    ((diff + DAY_MS - 1) / DAY_MS).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_elapsed_rounds_up_and_floors_at_one() {
        assert_eq!(days_elapsed(0, 0), 1);
        assert_eq!(days_elapsed(0, 1), 1);
        assert_eq!(days_elapsed(0, DAY_MS), 1);
        assert_eq!(days_elapsed(0, DAY_MS + 1), 2);
        assert_eq!(days_elapsed(10 * DAY_MS, 0), 1);
    }
}
