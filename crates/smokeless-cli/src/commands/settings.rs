use clap::Subcommand;
use smokeless_core::SettingsPatch;

use super::{open_session, print_json, CliResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show current settings
    Show,
    /// Change one or more settings
    Set {
        /// Cigarettes allowed per day
        #[arg(long)]
        daily_limit: Option<String>,
        /// Price of one pack (a comma decimal separator is accepted)
        #[arg(long)]
        pack_price: Option<String>,
        /// Cigarettes in one pack
        #[arg(long)]
        per_pack: Option<String>,
        /// Display name
        #[arg(long)]
        name: Option<String>,
    },
}

pub fn run(action: SettingsAction) -> CliResult {
    let mut session = open_session()?;

    match action {
        SettingsAction::Show => print_json(session.settings()),
        SettingsAction::Set {
            daily_limit,
            pack_price,
            per_pack,
            name,
        } => {
            let patch = SettingsPatch::parse(
                daily_limit.as_deref(),
                pack_price.as_deref(),
                per_pack.as_deref(),
                name.as_deref(),
            )?;
            if patch.is_empty() {
                return Err("nothing to change; pass at least one option".into());
            }
            let updated = session.update_settings(&patch)?;
            print_json(updated)
        }
    }
}
