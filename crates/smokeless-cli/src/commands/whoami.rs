use serde_json::json;
use smokeless_core::storage::data_dir;

use super::{open_session, print_json, CliResult};

pub fn run() -> CliResult {
    let session = open_session()?;
    print_json(&json!({
        "user_id": session.user_id(),
        "data_dir": data_dir()?,
    }))
}
