pub mod achievements;
pub mod broadcast;
pub mod config;
pub mod crisis;
pub mod events;
pub mod push;
pub mod reset;
pub mod settings;
pub mod stats;
pub mod whoami;

use serde::Serialize;
use smokeless_core::storage::data_dir;
use smokeless_core::{
    Aggregator, Config, ExpoPushGateway, FileIdentity, NoopPushGateway, PushGateway, Session,
    SessionOptions, SqliteStore, SystemClock,
};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub type CliSession = Session<SqliteStore, Box<dyn PushGateway>, SystemClock>;

/// Open the current user's session against the on-disk database.
pub fn open_session() -> Result<CliSession, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let dir = data_dir()?;
    let store = SqliteStore::open_at(&dir.join("smokeless.db"))?;

    let push: Box<dyn PushGateway> = if config.push.enabled {
        Box::new(ExpoPushGateway::new(
            config.push.endpoint.clone(),
            config.push.timeout(),
        ))
    } else {
        Box::new(NoopPushGateway)
    };

    let mut options = SessionOptions::with_aggregator(Aggregator::local());
    options.streak_lookback_days = config.analytics.streak_lookback_days;
    options.zero_day_lookback_days = config.analytics.zero_day_lookback_days;
    options.admin_user_id = config.admin.resolved_user_id();

    let session = Session::start(&FileIdentity::new(dir), store, push, SystemClock, options)?;
    Ok(session)
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
