//! Progress evaluation and one-way unlocks.

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use super::catalog::{AchievementDefinition, Category};
use crate::events::Event;
use crate::settings::Settings;
use crate::stats::{Aggregator, DEFAULT_STREAK_LOOKBACK_DAYS, DEFAULT_ZERO_DAY_LOOKBACK_DAYS};

/// Per-user progress on one catalog entry.
///
/// `unlocked_at` is terminal: once set it is never cleared or moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementState {
    pub id: String,
    pub unlocked_at: Option<i64>,
    pub progress: u64,
}

impl AchievementState {
    pub fn locked(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            unlocked_at: None,
            progress: 0,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }
}

/// Inputs for one evaluation pass.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub events: &'a [Event],
    pub settings: &'a Settings,
    pub crisis_count: u32,
    pub now: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub states: Vec<AchievementState>,
    pub changed: bool,
}

impl Evaluation {
    /// Ids that went from locked to unlocked, compared with `before`.
    pub fn newly_unlocked<'a>(&'a self, before: &[AchievementState]) -> Vec<&'a str> {
        self.states
            .iter()
            .filter(|s| s.is_unlocked())
            .filter(|s| {
                !before
                    .iter()
                    .any(|b| b.id == s.id && b.is_unlocked())
            })
            .map(|s| s.id.as_str())
            .collect()
    }
}

/// Maps aggregator metrics onto the catalog.
pub struct Evaluator<'a, Tz: TimeZone = Local> {
    aggregator: &'a Aggregator<Tz>,
    definitions: &'a [AchievementDefinition],
    streak_lookback: u32,
    zero_day_lookback: u32,
}

impl<'a, Tz: TimeZone> Evaluator<'a, Tz> {
    pub fn new(aggregator: &'a Aggregator<Tz>, definitions: &'a [AchievementDefinition]) -> Self {
        Self {
            aggregator,
            definitions,
            streak_lookback: DEFAULT_STREAK_LOOKBACK_DAYS,
            zero_day_lookback: DEFAULT_ZERO_DAY_LOOKBACK_DAYS,
        }
    }

    pub fn with_lookbacks(mut self, streak_days: u32, zero_day_days: u32) -> Self {
        self.streak_lookback = streak_days;
        self.zero_day_lookback = zero_day_days;
        self
    }

    /// Current metric value for `category`.
    ///
    /// Event-derived categories report 0 while the log is empty; only the
    /// crisis counter can make progress without events.
    pub fn progress_for(&self, category: Category, ctx: &EvaluationContext<'_>) -> u64 {
        if ctx.events.is_empty() && category != Category::Crisis {
            return 0;
        }
        let agg = self.aggregator;
        match category {
            Category::Streak => u64::from(agg.streak_length(
                ctx.events,
                ctx.now,
                ctx.settings.daily_limit,
                self.streak_lookback,
            )),
            Category::Reduce => agg.reduction_total(ctx.events, ctx.settings, ctx.now),
            Category::Savings => agg.savings_whole(ctx.events, ctx.settings, ctx.now),
            Category::Crisis => u64::from(ctx.crisis_count),
            Category::Zero => {
                u64::from(agg.zero_day_within_lookback(ctx.events, ctx.now, self.zero_day_lookback))
            }
        }
    }

    /// Recompute progress for every locked state and unlock those at target.
    ///
    /// Unlocked states, and states whose id is not in the catalog, pass
    /// through untouched.
    pub fn evaluate(&self, states: &[AchievementState], ctx: &EvaluationContext<'_>) -> Evaluation {
        let mut changed = false;
        let mut updated = Vec::with_capacity(states.len());

        for state in states {
            let mut state = state.clone();
            if state.is_unlocked() {
                updated.push(state);
                continue;
            }
            let Some(def) = self.definitions.iter().find(|d| d.id == state.id) else {
                updated.push(state);
                continue;
            };

            let progress = self.progress_for(def.category, ctx);
            if progress != state.progress {
                state.progress = progress;
                changed = true;
            }
            if progress >= def.target {
                state.unlocked_at = Some(ctx.now);
                changed = true;
                tracing::info!(achievement = def.id, progress, "achievement unlocked");
            }
            updated.push(state);
        }

        tracing::debug!(changed, crisis_count = ctx.crisis_count, "achievements evaluated");
        Evaluation {
            states: updated,
            changed,
        }
    }
}

/// Fresh locked states for every definition.
pub fn seed_states(definitions: &[AchievementDefinition]) -> Vec<AchievementState> {
    definitions
        .iter()
        .map(|d| AchievementState::locked(d.id))
        .collect()
}

/// Align stored states with the catalog: catalog order, missing ids added as
/// locked, unknown ids dropped. Returns whether anything was added.
pub fn reconcile(
    definitions: &[AchievementDefinition],
    stored: Vec<AchievementState>,
) -> (Vec<AchievementState>, bool) {
    let mut added = false;
    let states = definitions
        .iter()
        .map(|d| match stored.iter().find(|s| s.id == d.id) {
            Some(s) => s.clone(),
            None => {
                added = true;
                AchievementState::locked(d.id)
            }
        })
        .collect();
    (states, added)
}
