use serde_json::json;

use super::{open_session, print_json, CliResult};

/// Log one cigarette now.
pub fn log() -> CliResult {
    let mut session = open_session()?;
    let outcome = session.log_event()?;
    print_json(&json!({
        "event": outcome.value,
        "today_count": session.today_count(),
        "daily_limit": session.settings().daily_limit,
        "unlocked": outcome.unlocked,
    }))
}

/// Remove the most recent event.
pub fn undo() -> CliResult {
    let mut session = open_session()?;
    let removed = session.undo()?;
    if removed.is_none() {
        eprintln!("nothing to undo");
    }
    print_json(&json!({
        "removed": removed,
        "today_count": session.today_count(),
    }))
}
