use serde_json::json;

use super::{open_session, print_json, CliResult};

/// Delete all events and achievements and restore default settings.
pub fn run(yes: bool) -> CliResult {
    if !yes {
        return Err("refusing to reset without --yes".into());
    }
    let mut session = open_session()?;
    session.reset_all()?;
    print_json(&json!({
        "reset": true,
        "settings": session.settings(),
    }))
}
