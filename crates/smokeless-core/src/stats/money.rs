//! Averages, reduction and savings.
//!
//! "Days elapsed" is always measured from the first logged event, not from
//! account creation, so the baseline shifts for new users and every figure
//! here is zero until something has been logged.

use chrono::TimeZone;
use serde::{Deserialize, Serialize};

use super::{days_elapsed, Aggregator};
use crate::events::Event;
use crate::settings::Settings;

/// Round to `places` decimals, half away from zero. Non-finite input gives 0.
pub fn round_to(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(places);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        0.0
    }
}

/// Cigarettes not smoked relative to `daily_limit` per elapsed day.
///
/// Returns 0 for an empty log.
pub fn reduction_total(events: &[Event], settings: &Settings, now: i64) -> u64 {
    let Some(first) = events.first() else {
        return 0;
    };
    let expected = days_elapsed(first.timestamp, now).saturating_mul(settings.effective_daily_limit());
    let smoked = i64::try_from(events.len()).unwrap_or(i64::MAX);
    expected.saturating_sub(smoked).max(0) as u64
}

/// Money not spent, before any display rounding.
fn saved_amount(events: &[Event], settings: &Settings, now: i64) -> f64 {
    reduction_total(events, settings, now) as f64 * settings.price_per_unit()
}

/// Savings rounded to a whole currency unit.
pub fn savings_whole(events: &[Event], settings: &Settings, now: i64) -> u64 {
    round_to(saved_amount(events, settings, now), 0).max(0.0) as u64
}

/// Events per elapsed day, one decimal.
pub fn daily_average(events: &[Event], now: i64) -> f64 {
    let Some(first) = events.first() else {
        return 0.0;
    };
    let days = days_elapsed(first.timestamp, now);
    round_to(events.len() as f64 / days as f64, 1)
}

/// Savings for display, two decimals.
pub fn total_saved(events: &[Event], settings: &Settings, now: i64) -> f64 {
    if events.is_empty() {
        return 0.0;
    }
    round_to(saved_amount(events, settings, now), 2)
}

/// Cost breakdown and projections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceReport {
    pub price_per_unit: f64,
    pub today_cost: f64,
    pub daily_average: f64,
    pub daily_average_cost: f64,
    pub weekly_cost: f64,
    pub monthly_cost: f64,
    pub yearly_cost: f64,
    pub total_saved: f64,
    pub potential_daily_saving: f64,
    pub potential_yearly_saving: f64,
}

impl<Tz: TimeZone> Aggregator<Tz> {
    pub fn daily_average(&self, events: &[Event], now: i64) -> f64 {
        daily_average(events, now)
    }

    pub fn total_saved(&self, events: &[Event], settings: &Settings, now: i64) -> f64 {
        total_saved(events, settings, now)
    }

    pub fn reduction_total(&self, events: &[Event], settings: &Settings, now: i64) -> u64 {
        reduction_total(events, settings, now)
    }

    pub fn savings_whole(&self, events: &[Event], settings: &Settings, now: i64) -> u64 {
        savings_whole(events, settings, now)
    }

    pub fn finance_report(&self, events: &[Event], settings: &Settings, now: i64) -> FinanceReport {
        let ppu = settings.price_per_unit();
        let avg = daily_average(events, now);
        let today = self.today_count(events, now) as f64;
        let daily_average_cost = round_to(avg * ppu, 2);
        let limit = settings.effective_daily_limit() as f64;
        let potential_daily_saving = round_to((limit - avg.min(limit)) * ppu, 2);

        FinanceReport {
            price_per_unit: round_to(ppu, 2),
            today_cost: round_to(today * ppu, 2),
            daily_average: avg,
            daily_average_cost,
            weekly_cost: round_to(daily_average_cost * 7.0, 2),
            monthly_cost: round_to(daily_average_cost * 30.0, 2),
            yearly_cost: round_to(daily_average_cost * 365.0, 2),
            total_saved: total_saved(events, settings, now),
            potential_daily_saving,
            potential_yearly_saving: round_to(potential_daily_saving * 365.0, 2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::DAY_MS;
    use chrono::Utc;

    const NOW: i64 = 1_710_331_200_000;

    fn settings(limit: i64, price: f64, per_pack: i64) -> Settings {
        Settings {
            daily_limit: limit,
            pack_price: price,
            cigarettes_per_pack: per_pack,
            user_name: String::new(),
            created_at: NOW - 3 * DAY_MS,
        }
    }

    fn evs(timestamps: &[i64]) -> Vec<Event> {
        timestamps
            .iter()
            .map(|ts| Event {
                id: ts.to_string(),
                timestamp: *ts,
            })
            .collect()
    }

    #[test]
    fn empty_log_is_all_zero() {
        let s = settings(10, 100.0, 20);
        assert_eq!(daily_average(&[], NOW), 0.0);
        assert_eq!(total_saved(&[], &s, NOW), 0.0);
        assert_eq!(reduction_total(&[], &s, NOW), 0);
        assert_eq!(savings_whole(&[], &s, NOW), 0);
    }

    #[test]
    fn daily_average_one_decimal() {
        // 3 events over ceil(2.5) = 3 days
        let events = evs(&[NOW - 5 * DAY_MS / 2, NOW - DAY_MS, NOW]);
        assert_eq!(daily_average(&events, NOW), 1.0);

        // 2 events over 3 days = 0.666..
        let events = evs(&[NOW - 5 * DAY_MS / 2, NOW]);
        assert_eq!(daily_average(&events, NOW), 0.7);
    }

    #[test]
    fn total_saved_uses_price_per_unit() {
        // 2 days elapsed, limit 10 -> 20 expected, 4 smoked -> 16 saved * 5
        let events = evs(&[NOW - DAY_MS - 1, NOW - 10, NOW - 5, NOW]);
        let s = settings(10, 100.0, 20);
        assert_eq!(reduction_total(&events, &s, NOW), 16);
        assert_eq!(total_saved(&events, &s, NOW), 80.0);
        assert_eq!(savings_whole(&events, &s, NOW), 80);
    }

    #[test]
    fn over_limit_never_goes_negative() {
        let events = evs(&[NOW - 3, NOW - 2, NOW - 1, NOW]);
        let s = settings(2, 100.0, 20);
        assert_eq!(reduction_total(&events, &s, NOW), 0);
        assert_eq!(total_saved(&events, &s, NOW), 0.0);
    }

    #[test]
    fn savings_rounding_granularity() {
        // 1 unit saved at 75/20 = 3.75
        let events = evs(&[NOW]);
        let s = settings(2, 75.0, 20);
        assert_eq!(total_saved(&events, &s, NOW), 3.75);
        assert_eq!(savings_whole(&events, &s, NOW), 4);
    }

    #[test]
    fn zero_pack_size_does_not_produce_nan() {
        let events = evs(&[NOW]);
        let s = settings(5, 75.0, 0);
        assert_eq!(total_saved(&events, &s, NOW), 0.0);
        let report = Aggregator::new(Utc).finance_report(&events, &s, NOW);
        assert!(report.yearly_cost.is_finite());
        assert_eq!(report.price_per_unit, 0.0);
    }

    #[test]
    fn negative_limit_is_treated_as_zero() {
        let events = evs(&[NOW]);
        let s = settings(-5, 75.0, 20);
        assert_eq!(reduction_total(&events, &s, NOW), 0);
    }

    #[test]
    fn finance_projections() {
        // one event today, first event today -> avg 1.0, ppu 5
        let events = evs(&[NOW]);
        let s = settings(10, 100.0, 20);
        let report = Aggregator::new(Utc).finance_report(&events, &s, NOW);

        assert_eq!(report.price_per_unit, 5.0);
        assert_eq!(report.today_cost, 5.0);
        assert_eq!(report.daily_average_cost, 5.0);
        assert_eq!(report.weekly_cost, 35.0);
        assert_eq!(report.monthly_cost, 150.0);
        assert_eq!(report.yearly_cost, 1825.0);
        assert_eq!(report.total_saved, 45.0);
        assert_eq!(report.potential_daily_saving, 45.0);
        assert_eq!(report.potential_yearly_saving, 16425.0);
    }

    #[test]
    fn round_to_handles_non_finite() {
        assert_eq!(round_to(f64::NAN, 2), 0.0);
        assert_eq!(round_to(f64::INFINITY, 0), 0.0);
        assert_eq!(round_to(2.25, 1), 2.3);
        assert_eq!(round_to(12.344, 2), 12.34);
    }
}
