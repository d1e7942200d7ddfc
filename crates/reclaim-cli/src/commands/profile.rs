use chrono::Utc;
use clap::Subcommand;
use reclaim_core::onboarding::{complete_onboarding, OnboardingAnswers};

use super::CliContext;

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Print the user record as JSON
    Show,
    /// Complete onboarding with the given answers
    Onboard {
        #[arg(long)]
        sex: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        height_cm: Option<f64>,
        #[arg(long)]
        weight_kg: Option<f64>,
        #[arg(long)]
        diet: Option<String>,
        /// Repeatable
        #[arg(long)]
        goal: Vec<String>,
        #[arg(long)]
        protein_target: Option<u32>,
        #[arg(long)]
        referral_code: Option<String>,
    },
}

pub fn run(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    super::block_on(async move {
        let mut ctx = CliContext::load().await?;

        match action {
            ProfileAction::Show => {
                println!("{}", serde_json::to_string_pretty(&ctx.user)?);
            }
            ProfileAction::Onboard {
                sex,
                age,
                height_cm,
                weight_kg,
                diet,
                goal,
                protein_target,
                referral_code,
            } => {
                let protein_target =
                    protein_target.or(Some(ctx.config.nutrition.default_protein_target_g));
                let answers = OnboardingAnswers {
                    sex,
                    age,
                    height_cm,
                    weight_kg,
                    diet,
                    goals: goal,
                    daily_protein_target_g: protein_target,
                    referral_code,
                };
                complete_onboarding(&*ctx.store, &mut ctx.user, answers, Utc::now(), None).await?;
                ctx.save()?;
                println!("Onboarding complete.");
            }
        }
        Ok(())
    })?
}
