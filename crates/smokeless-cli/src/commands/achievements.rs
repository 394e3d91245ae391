use clap::Subcommand;
use serde::Serialize;
use smokeless_core::Category;

use super::{open_session, print_json, CliResult};

#[derive(Subcommand)]
pub enum AchievementsAction {
    /// List badges with progress
    List {
        /// Only badges not yet unlocked
        #[arg(long, conflicts_with = "unlocked")]
        locked: bool,
        /// Only unlocked badges
        #[arg(long)]
        unlocked: bool,
    },
}

#[derive(Serialize)]
struct AchievementRow<'a> {
    id: &'a str,
    category: Category,
    title: &'a str,
    description: &'a str,
    icon: &'a str,
    target: u64,
    progress: u64,
    unlocked_at: Option<i64>,
}

pub fn run(action: AchievementsAction) -> CliResult {
    let session = open_session()?;

    match action {
        AchievementsAction::List { locked, unlocked } => {
            let rows: Vec<AchievementRow<'_>> = session
                .achievement_view()
                .into_iter()
                .filter(|(_, state)| {
                    if locked {
                        !state.is_unlocked()
                    } else if unlocked {
                        state.is_unlocked()
                    } else {
                        true
                    }
                })
                .map(|(def, state)| AchievementRow {
                    id: def.id,
                    category: def.category,
                    title: def.title,
                    description: def.description,
                    icon: def.icon,
                    target: def.target,
                    progress: state.progress,
                    unlocked_at: state.unlocked_at,
                })
                .collect();
            print_json(&rows)
        }
    }
}
