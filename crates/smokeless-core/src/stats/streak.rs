//! Streaks and zero-consumption days.

use chrono::TimeZone;

use super::{Aggregator, DAY_MS};
use crate::events::Event;

/// How many days back a streak is searched for.
pub const DEFAULT_STREAK_LOOKBACK_DAYS: u32 = 60;

/// Window scanned for a day without any events, today excluded.
pub const DEFAULT_ZERO_DAY_LOOKBACK_DAYS: u32 = 30;

impl<Tz: TimeZone> Aggregator<Tz> {
    /// Consecutive qualifying days counted backwards from today.
    ///
    /// A day qualifies when its count is within `daily_limit` and at least one
    /// event was logged. Today is the exception: it qualifies with zero
    /// events, so an untouched morning does not break the streak.
    pub fn streak_length(&self, events: &[Event], now: i64, daily_limit: i64, max_lookback: u32) -> u32 {
        let mut streak = 0;
        for i in 0..i64::from(max_lookback) {
            let count = self.count_on_day(events, now - i * DAY_MS) as i64;
            if count <= daily_limit && (count > 0 || i == 0) {
                streak += 1;
            } else {
                break;
            }
        }
        streak
    }

    /// `1` if any of the previous `lookback - 1` days had no events, else `0`.
    pub fn zero_day_within_lookback(&self, events: &[Event], now: i64, lookback: u32) -> u32 {
        let found = (1..i64::from(lookback)).any(|i| self.count_on_day(events, now - i * DAY_MS) == 0);
        u32::from(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const NOON: i64 = 1_710_331_200_000;

    fn events_on(day_offset: i64, count: usize) -> Vec<Event> {
        (0..count)
            .map(|n| {
                let ts = NOON - day_offset * DAY_MS + n as i64 * 60_000;
                Event {
                    id: format!("{day_offset}-{n}"),
                    timestamp: ts,
                }
            })
            .collect()
    }

    #[test]
    fn empty_today_still_counts() {
        let agg = Aggregator::new(Utc);
        let mut events = events_on(2, 3);
        events.extend(events_on(1, 2));

        assert_eq!(agg.streak_length(&events, NOON, 5, DEFAULT_STREAK_LOOKBACK_DAYS), 3);
    }

    #[test]
    fn day_over_limit_breaks_streak() {
        let agg = Aggregator::new(Utc);
        let mut events = events_on(2, 3);
        events.extend(events_on(1, 6));
        events.extend(events_on(0, 1));

        assert_eq!(agg.streak_length(&events, NOON, 5, DEFAULT_STREAK_LOOKBACK_DAYS), 1);
    }

    #[test]
    fn today_over_limit_means_no_streak() {
        let agg = Aggregator::new(Utc);
        let events = events_on(0, 4);
        assert_eq!(agg.streak_length(&events, NOON, 3, DEFAULT_STREAK_LOOKBACK_DAYS), 0);
    }

    #[test]
    fn streak_capped_by_lookback() {
        let agg = Aggregator::new(Utc);
        let events: Vec<Event> = (0..10).flat_map(|d| events_on(d, 1)).collect();
        assert_eq!(agg.streak_length(&events, NOON, 5, 4), 4);
        assert_eq!(agg.streak_length(&events, NOON, 5, 60), 10);
    }

    #[test]
    fn zero_day_ignores_today() {
        let agg = Aggregator::new(Utc);
        // Every day from yesterday back 29 days has an event; today is empty.
        let events: Vec<Event> = (1..30).flat_map(|d| events_on(d, 1)).collect();
        assert_eq!(agg.zero_day_within_lookback(&events, NOON, DEFAULT_ZERO_DAY_LOOKBACK_DAYS), 0);
    }

    #[test]
    fn zero_day_found_in_window() {
        let agg = Aggregator::new(Utc);
        let events: Vec<Event> = (1..30).filter(|d| *d != 12).flat_map(|d| events_on(d, 1)).collect();
        assert_eq!(agg.zero_day_within_lookback(&events, NOON, DEFAULT_ZERO_DAY_LOOKBACK_DAYS), 1);
    }
}
