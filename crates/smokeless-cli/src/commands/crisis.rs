use clap::Subcommand;
use rand::seq::SliceRandom;
use serde_json::json;

use super::{open_session, print_json, CliResult};

/// Shown after a finished crisis activity.
const MOTIVATIONAL_MESSAGES: [&str; 12] = [
    "💪 You can do this! It only takes a few minutes.",
    "🌟 You get stronger with every passing second.",
    "🧘 Take a deep breath and relax...",
    "📈 Get through this moment and you are one step closer!",
    "🏆 You have made it before, you can make it now.",
    "🌈 Every crisis you get through makes you stronger.",
    "💎 Your body will thank you.",
    "🌱 Small steps create big changes.",
    "⭐ The best gift you gave yourself today.",
    "🎯 Focus, concentrate, it will pass.",
    "🔥 The strength inside you is bigger than the craving!",
    "🎉 Celebrate every time you say no!",
];

#[derive(Subcommand)]
pub enum CrisisAction {
    /// Record a finished crisis activity
    Complete,
}

fn pick_message() -> &'static str {
    MOTIVATIONAL_MESSAGES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(MOTIVATIONAL_MESSAGES[0])
}

pub fn run(action: CrisisAction) -> CliResult {
    let mut session = open_session()?;

    match action {
        CrisisAction::Complete => {
            let outcome = session.complete_crisis()?;
            print_json(&json!({
                "crisis_count": outcome.value,
                "unlocked": outcome.unlocked,
                "message": pick_message(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_comes_from_the_list() {
        for _ in 0..50 {
            assert!(MOTIVATIONAL_MESSAGES.contains(&pick_message()));
        }
    }
}
