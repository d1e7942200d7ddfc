use clap::Subcommand;
use reclaim_core::{JournalCategory, JournalService};
use std::sync::Arc;

use super::CliContext;

#[derive(Subcommand)]
pub enum JournalAction {
    /// Add an entry
    Add {
        /// One of: thoughts, feelings, gratitude, progress
        #[arg(long)]
        category: JournalCategory,
        /// Entry text
        #[arg(long)]
        content: String,
    },
    /// List entries, newest first
    List,
    /// Rewrite an entry's content
    Edit {
        #[arg(long)]
        id: String,
        #[arg(long)]
        content: String,
    },
    /// Delete an entry
    Delete {
        #[arg(long)]
        id: String,
    },
}

pub fn run(action: JournalAction) -> Result<(), Box<dyn std::error::Error>> {
    super::block_on(async move {
        let ctx = CliContext::load().await?;
        let service = JournalService::new(Arc::clone(&ctx.store));

        match action {
            JournalAction::Add { category, content } => {
                let entry = service.add(&ctx.user.id, category, &content).await?;
                ctx.save()?;
                println!("Added {} entry {}", entry.category, entry.id);
            }
            JournalAction::List => {
                let entries = service.list(&ctx.user.id).await?;
                if entries.is_empty() {
                    println!("No entries yet.");
                }
                for entry in entries {
                    println!(
                        "{}  [{}]  {}  {}",
                        entry.id,
                        entry.category,
                        entry.created_at.format("%Y-%m-%d %H:%M"),
                        entry.content
                    );
                }
            }
            JournalAction::Edit { id, content } => {
                service.edit(&ctx.user.id, &id, &content).await?;
                ctx.save()?;
                println!("Updated entry {id}");
            }
            JournalAction::Delete { id } => {
                service.delete(&ctx.user.id, &id).await?;
                ctx.save()?;
                println!("Deleted entry {id}");
            }
        }
        Ok(())
    })?
}
