use chrono::Utc;
use clap::Subcommand;
use reclaim_core::streak;

use super::CliContext;

#[derive(Subcommand)]
pub enum StreakAction {
    /// Print the current clean-time description
    Status,
    /// Log a relapse (moves the streak anchor to now)
    Relapse,
    /// Mark the beginning of recovery
    Start,
}

pub fn run(action: StreakAction) -> Result<(), Box<dyn std::error::Error>> {
    super::block_on(async move {
        let mut ctx = CliContext::load().await?;
        let now = Utc::now();

        match action {
            StreakAction::Status => {
                println!("{}", streak::elapsed_description(&ctx.user, now));
            }
            StreakAction::Relapse => {
                streak::log_relapse(&*ctx.store, &mut ctx.user, now, None).await?;
                ctx.save()?;
                println!("Relapse logged. Clean time restarts now.");
            }
            StreakAction::Start => {
                streak::start_recovery(&*ctx.store, &mut ctx.user, now, None).await?;
                ctx.save()?;
                println!("Recovery start recorded.");
            }
        }
        Ok(())
    })?
}
