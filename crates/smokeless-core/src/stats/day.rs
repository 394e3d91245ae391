//! Day buckets and per-day counts.

use chrono::{Datelike, LocalResult, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use super::{Aggregator, DAY_LABELS, DAY_MS};
use crate::events::Event;

/// One bar of the weekly chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub day: String,
    pub count: usize,
}

/// Number of events with `start <= timestamp < end`.
pub fn count_in_range(events: &[Event], start: i64, end: i64) -> usize {
    events
        .iter()
        .filter(|e| e.timestamp >= start && e.timestamp < end)
        .count()
}

impl<Tz: TimeZone> Aggregator<Tz> {
    /// Local midnight of the calendar day containing `ts`.
    pub fn day_bucket_start(&self, ts: i64) -> i64 {
        let LocalResult::Single(dt) = self.tz.timestamp_millis_opt(ts) else {
            return ts;
        };
        let midnight = dt.date_naive().and_time(NaiveTime::MIN);
        match self.tz.from_local_datetime(&midnight).earliest() {
            Some(start) => start.timestamp_millis(),
            // Midnight skipped by a DST jump; fall back to wall-clock offset.
            None => {
                let since_midnight = i64::from(dt.num_seconds_from_midnight()) * 1_000
                    + i64::from(dt.timestamp_subsec_millis());
                ts - since_midnight
            }
        }
    }

    /// Events falling in the day bucket that contains `ts`.
    pub fn count_on_day(&self, events: &[Event], ts: i64) -> usize {
        let start = self.day_bucket_start(ts);
        count_in_range(events, start, start + DAY_MS)
    }

    pub fn today_count(&self, events: &[Event], now: i64) -> usize {
        self.count_on_day(events, now)
    }

    /// Events logged in today's bucket, oldest first.
    pub fn today_events<'a>(&self, events: &'a [Event], now: i64) -> Vec<&'a Event> {
        let start = self.day_bucket_start(now);
        let end = start + DAY_MS;
        events
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp < end)
            .collect()
    }

    /// Sunday-first weekday label for the day containing `ts`.
    pub fn day_label(&self, ts: i64) -> &'static str {
        match self.tz.timestamp_millis_opt(ts) {
            LocalResult::Single(dt) => {
                DAY_LABELS[dt.weekday().num_days_from_sunday() as usize]
            }
            _ => DAY_LABELS[0],
        }
    }

    /// Counts for the last seven days, oldest first, today last.
    pub fn week_series(&self, events: &[Event], now: i64) -> Vec<DayCount> {
        (0..7i64)
            .rev()
            .map(|i| {
                let day_ts = now - i * DAY_MS;
                DayCount {
                    day: self.day_label(day_ts).to_string(),
                    count: self.count_on_day(events, day_ts),
                }
            })
            .collect()
    }
}
