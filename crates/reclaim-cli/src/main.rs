use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "reclaim-cli", version, about = "Reclaim CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean-time streak tracking
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// Session lockdown countdown
    Lockdown {
        #[command(subcommand)]
        action: commands::lockdown::LockdownAction,
    },
    /// Journaling
    Journal {
        #[command(subcommand)]
        action: commands::journal::JournalAction,
    },
    /// Profile and onboarding
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Streak { action } => commands::streak::run(action),
        Commands::Lockdown { action } => commands::lockdown::run(action),
        Commands::Journal { action } => commands::journal::run(action),
        Commands::Profile { action } => commands::profile::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
