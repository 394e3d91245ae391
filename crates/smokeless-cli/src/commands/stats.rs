use clap::Subcommand;
use serde_json::json;
use smokeless_core::Config;

use super::{open_session, print_json, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's count and events
    Today,
    /// Counts for the last seven days, oldest first
    Week,
    /// Average per day since the first event
    Average,
    /// Money saved against the daily limit
    Saved,
    /// Cost breakdown and projections
    Finance,
    /// Everything the home screen shows
    Dashboard,
}

pub fn run(action: StatsAction) -> CliResult {
    let session = open_session()?;

    match action {
        StatsAction::Today => print_json(&json!({
            "count": session.today_count(),
            "daily_limit": session.settings().daily_limit,
            "events": session.today_events(),
        })),
        StatsAction::Week => print_json(&session.week_series()),
        StatsAction::Average => print_json(&json!({
            "daily_average": session.daily_average(),
        })),
        StatsAction::Saved => {
            let config = Config::load_or_default();
            print_json(&json!({
                "total_saved": session.total_saved(),
                "currency": config.currency.symbol,
            }))
        }
        StatsAction::Finance => print_json(&session.finance_report()),
        StatsAction::Dashboard => print_json(&session.dashboard()),
    }
}
