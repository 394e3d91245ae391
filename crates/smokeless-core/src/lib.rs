//! # Smokeless Core Library
//!
//! Core logic for Smokeless, a personal cigarette-consumption tracker. Every
//! operation is available through the standalone `smokeless-cli` binary; any
//! other front end is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Events**: an append-only, per-user log of timestamped cigarettes
//! - **Stats**: day-bucketed counts, averages, savings and streaks, derived on
//!   demand from the log and the user's settings
//! - **Achievements**: a fixed catalog of badges with one-way unlocks
//! - **Storage**: the [`Store`] contract with SQLite and in-memory backends,
//!   plus TOML configuration
//! - **Push**: best-effort fan-out of admin broadcasts to registered devices
//!
//! ## Key Components
//!
//! - [`Session`]: per-user orchestration of all of the above
//! - [`Aggregator`]: time-zone aware metric derivation
//! - [`SqliteStore`]: persistence
//! - [`Config`]: application configuration management

pub mod achievements;
pub mod broadcast;
pub mod clock;
pub mod error;
pub mod events;
pub mod identity;
pub mod push;
pub mod session;
pub mod settings;
pub mod stats;
pub mod storage;

pub use achievements::{AchievementDefinition, AchievementState, Category, Evaluator, CATALOG};
pub use broadcast::AdminBroadcast;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, IdentityError, ValidationError};
pub use events::{Event, EventLog};
pub use identity::{FileIdentity, IdentityProvider, StaticIdentity};
pub use push::{DeliveryReport, ExpoPushGateway, NoopPushGateway, PushGateway, PushRegistration};
pub use session::{ActionOutcome, Session, SessionOptions};
pub use settings::{Settings, SettingsPatch};
pub use stats::{Aggregator, Dashboard, DayCount, FinanceReport};
pub use storage::{Config, MemoryStore, SqliteStore, Store};
