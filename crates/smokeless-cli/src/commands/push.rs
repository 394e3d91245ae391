use clap::Subcommand;
use serde_json::json;

use super::{open_session, print_json, CliResult};

#[derive(Subcommand)]
pub enum PushAction {
    /// Register this device's push token
    Register {
        token: String,
        /// Device platform, e.g. "android" or "ios"
        #[arg(long, default_value = "")]
        platform: String,
    },
}

pub fn run(action: PushAction) -> CliResult {
    let session = open_session()?;

    match action {
        PushAction::Register { token, platform } => {
            if !session.register_push_token(&token, &platform) {
                return Err("push registration failed".into());
            }
            print_json(&json!({
                "user_id": session.user_id(),
                "registered": true,
            }))
        }
    }
}
