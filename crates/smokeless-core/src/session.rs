//! Per-user session orchestration.
//!
//! A [`Session`] owns the in-memory copy of one user's data and routes every
//! user action through storage first and memory second: if a write fails the
//! in-memory state is left exactly as it was. Derived figures are never
//! cached; each accessor recomputes from the full event log.

use chrono::{Local, TimeZone};

use crate::achievements::{
    reconcile, seed_states, AchievementDefinition, AchievementState, EvaluationContext, Evaluator,
    CATALOG,
};
use crate::broadcast::{self, AdminBroadcast};
use crate::clock::Clock;
use crate::error::{CoreError, Result};
use crate::events::{Event, EventLog};
use crate::identity::IdentityProvider;
use crate::push::{DeliveryReport, PushGateway, PushRegistration};
use crate::settings::{self, Settings, SettingsPatch};
use crate::stats::{
    Aggregator, Dashboard, DayCount, FinanceReport, DEFAULT_STREAK_LOOKBACK_DAYS,
    DEFAULT_ZERO_DAY_LOOKBACK_DAYS,
};
use crate::storage::Store;

/// Tunables a session is started with.
#[derive(Debug, Clone)]
pub struct SessionOptions<Tz: TimeZone = Local> {
    pub aggregator: Aggregator<Tz>,
    pub definitions: &'static [AchievementDefinition],
    pub streak_lookback_days: u32,
    pub zero_day_lookback_days: u32,
    /// The only user allowed to send broadcasts.
    pub admin_user_id: Option<String>,
}

impl Default for SessionOptions<Local> {
    fn default() -> Self {
        Self::with_aggregator(Aggregator::local())
    }
}

impl<Tz: TimeZone> SessionOptions<Tz> {
    pub fn with_aggregator(aggregator: Aggregator<Tz>) -> Self {
        Self {
            aggregator,
            definitions: &CATALOG,
            streak_lookback_days: DEFAULT_STREAK_LOOKBACK_DAYS,
            zero_day_lookback_days: DEFAULT_ZERO_DAY_LOOKBACK_DAYS,
            admin_user_id: None,
        }
    }

    pub fn with_admin(mut self, user_id: impl Into<String>) -> Self {
        self.admin_user_id = Some(user_id.into());
        self
    }
}

/// Outcome of an action that may have moved achievements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome<T> {
    pub value: T,
    /// Achievement ids unlocked by this action.
    pub unlocked: Vec<String>,
}

pub struct Session<S: Store, P: PushGateway, C: Clock, Tz: TimeZone = Local> {
    user_id: String,
    store: S,
    push: P,
    clock: C,
    options: SessionOptions<Tz>,
    events: EventLog,
    settings: Settings,
    achievements: Vec<AchievementState>,
    broadcasts: Vec<AdminBroadcast>,
    crisis_count: u32,
}

impl<S: Store, P: PushGateway, C: Clock, Tz: TimeZone> Session<S, P, C, Tz> {
    /// Establish identity and load everything for that user.
    ///
    /// Read failures degrade to defaults/empty collections. Only a missing
    /// identity fails the start.
    ///
    /// # Errors
    /// Returns [`CoreError::Identity`] if no user id can be obtained.
    pub fn start(
        identity: &dyn IdentityProvider,
        store: S,
        push: P,
        clock: C,
        options: SessionOptions<Tz>,
    ) -> Result<Self> {
        let user_id = identity.ensure_identity()?;
        tracing::debug!(%user_id, "starting session");

        let mut session = Self {
            user_id,
            store,
            push,
            clock,
            options,
            events: EventLog::new(),
            settings: Settings::defaults(0),
            achievements: Vec::new(),
            broadcasts: Vec::new(),
            crisis_count: 0,
        };
        session.reload();
        Ok(session)
    }

    /// Load all four collections from storage, replacing memory.
    fn reload(&mut self) {
        let now = self.clock.now_ms();
        self.events = EventLog::load_all(&self.store, &self.user_id);
        self.settings = settings::load(&self.store, &self.user_id, now);
        self.achievements = self.load_achievements();
        self.broadcasts = broadcast::load_recent(&self.store);
    }

    fn load_achievements(&self) -> Vec<AchievementState> {
        let definitions = self.options.definitions;
        let stored = match self.store.list_achievements(&self.user_id) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(user_id = %self.user_id, error = %e, "failed to load achievements");
                return seed_states(definitions);
            }
        };

        let (states, added) = if stored.is_empty() {
            (seed_states(definitions), true)
        } else {
            reconcile(definitions, stored)
        };
        if added {
            if let Err(e) = self.store.upsert_achievements(&self.user_id, &states) {
                tracing::warn!(user_id = %self.user_id, error = %e, "failed to seed achievements");
            }
        }
        states
    }

    /// Run the evaluator against current memory and persist any change.
    ///
    /// Memory is only updated once the write succeeds.
    fn evaluate_achievements(&mut self) -> Result<Vec<String>> {
        let evaluator = Evaluator::new(&self.options.aggregator, self.options.definitions)
            .with_lookbacks(
                self.options.streak_lookback_days,
                self.options.zero_day_lookback_days,
            );
        let ctx = EvaluationContext {
            events: self.events.events(),
            settings: &self.settings,
            crisis_count: self.crisis_count,
            now: self.clock.now_ms(),
        };
        let evaluation = evaluator.evaluate(&self.achievements, &ctx);
        if !evaluation.changed {
            return Ok(Vec::new());
        }

        let unlocked: Vec<String> = evaluation
            .newly_unlocked(&self.achievements)
            .into_iter()
            .map(str::to_string)
            .collect();
        self.store
            .upsert_achievements(&self.user_id, &evaluation.states)?;
        self.achievements = evaluation.states;
        Ok(unlocked)
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Log one cigarette now, then re-evaluate achievements.
    ///
    /// # Errors
    /// Fails if the event cannot be stored. If the event is stored but the
    /// achievement write fails, the event stays logged and the error is
    /// returned.
    pub fn log_event(&mut self) -> Result<ActionOutcome<Event>> {
        let now = self.clock.now_ms();
        let event = self.events.append(&self.store, &self.user_id, now)?;
        tracing::debug!(event_id = %event.id, "event logged");
        let unlocked = self.evaluate_achievements()?;
        Ok(ActionOutcome {
            value: event,
            unlocked,
        })
    }

    /// Remove the most recent event. Achievements are not re-evaluated, so
    /// nothing unlocked is ever revoked by an undo.
    ///
    /// # Errors
    /// Fails if the delete cannot be stored.
    pub fn undo(&mut self) -> Result<Option<Event>> {
        let removed = self.events.remove_last(&self.store, &self.user_id)?;
        if let Some(ref event) = removed {
            tracing::debug!(event_id = %event.id, "event undone");
        }
        Ok(removed)
    }

    /// Merge and persist a settings change. Does not re-evaluate achievements.
    ///
    /// # Errors
    /// Fails if the settings cannot be stored.
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Result<&Settings> {
        self.settings = settings::update(&self.store, &self.user_id, &self.settings, patch)?;
        Ok(&self.settings)
    }

    /// Count a finished crisis activity and re-evaluate achievements.
    ///
    /// The counter lives only as long as this session.
    ///
    /// # Errors
    /// Fails if changed achievements cannot be stored; the counter is still
    /// incremented.
    pub fn complete_crisis(&mut self) -> Result<ActionOutcome<u32>> {
        self.crisis_count += 1;
        let unlocked = self.evaluate_achievements()?;
        Ok(ActionOutcome {
            value: self.crisis_count,
            unlocked,
        })
    }

    /// Store a broadcast and fan it out to every registered device.
    ///
    /// Delivery is best-effort; the broadcast is kept whatever the outcome.
    ///
    /// # Errors
    /// Returns [`CoreError::Unauthorized`] unless this session belongs to the
    /// admin. Fails on blank title/body or if the broadcast cannot be stored.
    pub fn send_broadcast(&mut self, title: &str, body: &str) -> Result<DeliveryReport> {
        if !self.is_admin() {
            tracing::warn!(user_id = %self.user_id, "broadcast rejected for non-admin");
            return Err(CoreError::Unauthorized(
                "only the admin may send broadcasts".into(),
            ));
        }
        let record = AdminBroadcast::new(title, body, self.clock.now_ms())?;
        self.store.insert_broadcast(&record)?;

        let recipients = self.store.list_push_tokens().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to list push recipients");
            Vec::new()
        });
        let report = self.push.broadcast(&recipients, &record.title, &record.body);
        tracing::info!(
            broadcast_id = %record.id,
            success = report.success_count,
            failed = report.failed_count,
            "broadcast sent"
        );

        self.broadcasts.insert(0, record);
        self.broadcasts.truncate(broadcast::BROADCAST_WINDOW);
        Ok(report)
    }

    /// Register this user's device for broadcasts. Failures are logged only.
    pub fn register_push_token(&self, token: &str, platform: &str) -> bool {
        let token = token.trim();
        if token.is_empty() {
            tracing::warn!("ignoring empty push token");
            return false;
        }
        let registration = PushRegistration {
            user_id: self.user_id.clone(),
            token: token.to_string(),
            platform: platform.to_string(),
            updated_at: self.clock.now_ms(),
        };
        match self.store.upsert_push_token(&registration) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "push registration failed");
                false
            }
        }
    }

    /// Discard memory and reload everything from storage.
    pub fn refresh(&mut self) {
        self.reload();
    }

    /// Delete the event log and achievements and reset settings. The crisis
    /// counter restarts at zero on success.
    ///
    /// Succeeds only if all three steps succeed. Memory is reloaded from
    /// storage afterwards in either case, so it reflects whatever was
    /// actually deleted.
    ///
    /// # Errors
    /// Returns [`CoreError::ResetIncomplete`] naming the first failed step.
    pub fn reset_all(&mut self) -> Result<()> {
        let result = self.reset_steps();
        match &result {
            Ok(()) => {
                self.crisis_count = 0;
                tracing::info!(user_id = %self.user_id, "all user data reset");
            }
            Err(e) => tracing::warn!(user_id = %self.user_id, error = %e, "reset failed"),
        }
        self.reload();
        result
    }

    fn reset_steps(&self) -> Result<()> {
        let incomplete = |step: &'static str| {
            move |e: CoreError| CoreError::ResetIncomplete {
                step,
                message: e.to_string(),
            }
        };
        self.store
            .delete_all_events(&self.user_id)
            .map_err(incomplete("events"))?;
        self.store
            .delete_all_achievements(&self.user_id)
            .map_err(incomplete("achievements"))?;
        self.store
            .put_settings(&self.user_id, &Settings::defaults(self.clock.now_ms()))
            .map_err(incomplete("settings"))?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_admin(&self) -> bool {
        self.options.admin_user_id.as_deref() == Some(self.user_id.as_str())
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn achievements(&self) -> &[AchievementState] {
        &self.achievements
    }

    /// Catalog entries paired with this user's state.
    pub fn achievement_view(&self) -> Vec<(&'static AchievementDefinition, &AchievementState)> {
        self.options
            .definitions
            .iter()
            .filter_map(|d| {
                self.achievements
                    .iter()
                    .find(|s| s.id == d.id)
                    .map(|s| (d, s))
            })
            .collect()
    }

    pub fn broadcasts(&self) -> &[AdminBroadcast] {
        &self.broadcasts
    }

    pub fn crisis_count(&self) -> u32 {
        self.crisis_count
    }

    pub fn last_event_at(&self) -> Option<i64> {
        self.events.last_event_at()
    }

    pub fn today_count(&self) -> usize {
        self.options
            .aggregator
            .today_count(self.events.events(), self.clock.now_ms())
    }

    pub fn today_events(&self) -> Vec<&Event> {
        self.options
            .aggregator
            .today_events(self.events.events(), self.clock.now_ms())
    }

    pub fn week_series(&self) -> Vec<DayCount> {
        self.options
            .aggregator
            .week_series(self.events.events(), self.clock.now_ms())
    }

    pub fn daily_average(&self) -> f64 {
        self.options
            .aggregator
            .daily_average(self.events.events(), self.clock.now_ms())
    }

    pub fn total_saved(&self) -> f64 {
        self.options
            .aggregator
            .total_saved(self.events.events(), &self.settings, self.clock.now_ms())
    }

    pub fn finance_report(&self) -> FinanceReport {
        self.options
            .aggregator
            .finance_report(self.events.events(), &self.settings, self.clock.now_ms())
    }

    pub fn dashboard(&self) -> Dashboard {
        self.options
            .aggregator
            .dashboard(self.events.events(), &self.settings, self.clock.now_ms())
    }
}
