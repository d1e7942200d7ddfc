use clap::Subcommand;
use reclaim_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Update configuration values
    Set {
        #[arg(long)]
        lockdown_secs: Option<u64>,
        #[arg(long)]
        protein_target: Option<u32>,
        /// Hosted backend base URL; clear with an empty string
        #[arg(long)]
        backend_url: Option<String>,
        #[arg(long)]
        haptics: Option<bool>,
    },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Set {
            lockdown_secs,
            protein_target,
            backend_url,
            haptics,
        } => {
            let mut config = Config::load()?;
            if let Some(secs) = lockdown_secs {
                config.lockdown.duration_secs = secs;
            }
            if let Some(target) = protein_target {
                config.nutrition.default_protein_target_g = target;
            }
            if let Some(url) = backend_url {
                config.backend.base_url = if url.is_empty() {
                    None
                } else {
                    url::Url::parse(&url)?;
                    Some(url)
                };
            }
            if let Some(haptics) = haptics {
                config.notifications.haptics = haptics;
            }
            config.save()?;
            println!("Configuration saved.");
        }
    }
    Ok(())
}
