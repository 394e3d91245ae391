//! Home-screen summary.

use chrono::TimeZone;
use serde::{Deserialize, Serialize};

use super::{round_to, Aggregator, DayCount};
use crate::events::Event;
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub today_count: usize,
    pub daily_limit: i64,
    /// `today_count / daily_limit`, 0 when the limit is not positive.
    pub limit_progress: f64,
    pub remaining_today: i64,
    pub last_event_at: Option<i64>,
    pub since_last_ms: Option<i64>,
    pub since_last: Option<String>,
    pub daily_average: f64,
    pub week: Vec<DayCount>,
}

impl<Tz: TimeZone> Aggregator<Tz> {
    pub fn dashboard(&self, events: &[Event], settings: &Settings, now: i64) -> Dashboard {
        let today_count = self.today_count(events, now);
        let limit = settings.daily_limit;
        let limit_progress = if limit > 0 {
            round_to(today_count as f64 / limit as f64, 2)
        } else {
            0.0
        };
        let last_event_at = events.last().map(|e| e.timestamp);
        let since_last_ms = last_event_at.map(|ts| (now - ts).max(0));

        Dashboard {
            today_count,
            daily_limit: limit,
            limit_progress,
            remaining_today: (limit.max(0) - today_count as i64).max(0),
            last_event_at,
            since_last_ms,
            since_last: since_last_ms.map(format_elapsed),
            daily_average: self.daily_average(events, now),
            week: self.week_series(events, now),
        }
    }
}

/// Short human duration: `just now`, `12m`, `3h 5m`, `2d 4h`.
pub fn format_elapsed(ms: i64) -> String {
    let minutes = ms.max(0) / 60_000;
    let hours = minutes / 60;
    let days = hours / 24;
    if days > 0 {
        format!("{days}d {}h", hours % 24)
    } else if hours > 0 {
        format!("{hours}h {}m", minutes % 60)
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        "just now".to_string()
    }
}
