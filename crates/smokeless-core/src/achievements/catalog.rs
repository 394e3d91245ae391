//! The fixed achievement catalog.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which metric an achievement's progress is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Consecutive days within the daily limit
    Streak,
    /// Cigarettes avoided relative to the limit
    Reduce,
    /// Money saved, whole currency units
    Savings,
    /// Crisis activities completed this session
    Crisis,
    /// A day without any cigarettes in the last month
    Zero,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Streak => "streak",
            Category::Reduce => "reduce",
            Category::Savings => "savings",
            Category::Crisis => "crisis",
            Category::Zero => "zero",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "streak" => Ok(Category::Streak),
            "reduce" => Ok(Category::Reduce),
            "savings" => Ok(Category::Savings),
            "crisis" => Ok(Category::Crisis),
            "zero" => Ok(Category::Zero),
            other => Err(format!("unknown achievement category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AchievementDefinition {
    pub id: &'static str,
    pub category: Category,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub target: u64,
}

const fn def(
    id: &'static str,
    category: Category,
    title: &'static str,
    description: &'static str,
    icon: &'static str,
    target: u64,
) -> AchievementDefinition {
    AchievementDefinition {
        id,
        category,
        title,
        description,
        icon,
        target,
    }
}

pub static CATALOG: [AchievementDefinition; 12] = [
    def("first_day", Category::Streak, "First Step", "Stayed within your limit for a day", "🌟", 1),
    def("week_streak", Category::Streak, "One Week", "7 days in a row within your limit", "🔥", 7),
    def("month_streak", Category::Streak, "One Month", "30 days in a row within your limit", "💪", 30),
    def("reduce_10", Category::Reduce, "Cut 10", "10 cigarettes fewer in total", "📉", 10),
    def("reduce_50", Category::Reduce, "Cut 50", "50 cigarettes fewer in total", "🎯", 50),
    def("reduce_100", Category::Reduce, "Cut 100", "100 cigarettes fewer in total", "🏆", 100),
    def("save_100", Category::Savings, "Saved 100", "Saved 100 in cigarette money", "💰", 100),
    def("save_500", Category::Savings, "Saved 500", "Saved 500 in cigarette money", "💎", 500),
    def("save_1000", Category::Savings, "Saved 1000", "Saved 1000 in cigarette money", "👑", 1000),
    def("crisis_1", Category::Crisis, "Crisis Hunter", "Finished your first crisis activity", "🛡️", 1),
    def("crisis_10", Category::Crisis, "Crisis Master", "Finished 10 crisis activities", "⚔️", 10),
    def("no_smoke_day", Category::Zero, "Zero Day", "A whole day without smoking", "🌈", 1),
];

/// Look up a definition by id.
pub fn find(id: &str) -> Option<&'static AchievementDefinition> {
    CATALOG.iter().find(|d| d.id == id)
}
