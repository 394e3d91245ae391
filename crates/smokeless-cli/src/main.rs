use clap::{Parser, Subcommand};
use smokeless_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "smokeless-cli", version, about = "Smokeless CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log one cigarette now
    Log,
    /// Remove the most recently logged cigarette
    Undo,
    /// Consumption statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Achievement badges
    Achievements {
        #[command(subcommand)]
        action: commands::achievements::AchievementsAction,
    },
    /// Crisis activities
    Crisis {
        #[command(subcommand)]
        action: commands::crisis::CrisisAction,
    },
    /// Daily limit, pack price and display name
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Admin broadcasts
    Broadcast {
        #[command(subcommand)]
        action: commands::broadcast::BroadcastAction,
    },
    /// Push notification registration
    Push {
        #[command(subcommand)]
        action: commands::push::PushAction,
    },
    /// Delete all events and achievements and restore default settings
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
    /// Show this device's user id
    Whoami,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SMOKELESS_LOG")
        .or_else(|_| EnvFilter::try_new(Config::load_or_default().log.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Log => commands::events::log(),
        Commands::Undo => commands::events::undo(),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Achievements { action } => commands::achievements::run(action),
        Commands::Crisis { action } => commands::crisis::run(action),
        Commands::Settings { action } => commands::settings::run(action),
        Commands::Broadcast { action } => commands::broadcast::run(action),
        Commands::Push { action } => commands::push::run(action),
        Commands::Reset { yes } => commands::reset::run(yes),
        Commands::Whoami => commands::whoami::run(),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
