//! Achievement catalog and evaluation.
//!
//! Twelve badges in five categories. Each category reads one metric from the
//! [`Aggregator`](crate::stats::Aggregator) (or the session's crisis
//! counter); a badge unlocks the first time its metric reaches the target and
//! stays unlocked for good.

mod catalog;
mod evaluator;

pub use catalog::{find, AchievementDefinition, Category, CATALOG};
pub use evaluator::{
    reconcile, seed_states, AchievementState, Evaluation, EvaluationContext, Evaluator,
};
