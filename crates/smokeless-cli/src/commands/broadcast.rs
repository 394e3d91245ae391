use clap::Subcommand;
use serde_json::json;

use super::{open_session, print_json, CliResult};

#[derive(Subcommand)]
pub enum BroadcastAction {
    /// Store a broadcast and push it to every registered device
    Send {
        title: String,
        body: String,
    },
    /// Show the most recent broadcasts, newest first
    List,
}

pub fn run(action: BroadcastAction) -> CliResult {
    let mut session = open_session()?;

    match action {
        BroadcastAction::Send { title, body } => {
            let report = session.send_broadcast(&title, &body)?;
            print_json(&json!({
                "broadcast": session.broadcasts().first(),
                "delivery": report,
            }))
        }
        BroadcastAction::List => print_json(session.broadcasts()),
    }
}
