use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use reclaim_core::{Haptics, LockdownHandle, PulseKind};

use super::CliContext;

#[derive(Subcommand)]
pub enum LockdownAction {
    /// Run a lockdown countdown in the foreground
    Run {
        /// Countdown length in seconds (defaults to the configured duration)
        #[arg(long)]
        secs: Option<u64>,
        /// Trigger the emergency exit after this many seconds (for scripting)
        #[arg(long)]
        exit_after: Option<u64>,
    },
    /// Print the configured lockdown duration
    Status,
}

/// Terminal bell stands in for the phone's haptic pulse.
struct TerminalHaptics;

impl Haptics for TerminalHaptics {
    fn pulse(&self, kind: PulseKind) {
        let label = match kind {
            PulseKind::Success => "session complete",
            PulseKind::Warning => "early exit",
        };
        print!("\x07");
        println!("[{label}]");
    }
}

pub fn run(action: LockdownAction) -> Result<(), Box<dyn std::error::Error>> {
    super::block_on(async move {
        let ctx = CliContext::load().await?;

        match action {
            LockdownAction::Status => {
                println!(
                    "Configured lockdown duration: {} seconds",
                    ctx.config.lockdown.duration_secs
                );
            }
            LockdownAction::Run { secs, exit_after } => {
                let duration = secs.unwrap_or(ctx.config.lockdown.duration_secs);
                let haptics_on = ctx.config.notifications.haptics;
                let completed = Arc::new(AtomicBool::new(false));
                let exited = Arc::new(AtomicBool::new(false));

                println!("Lockdown started: {duration} seconds. Stay with it.");
                let handle = {
                    let completed = Arc::clone(&completed);
                    let exited = Arc::clone(&exited);
                    LockdownHandle::start(
                        duration,
                        None,
                        move || {
                            completed.store(true, Ordering::SeqCst);
                            if haptics_on {
                                TerminalHaptics.pulse(PulseKind::Success);
                            }
                        },
                        move |remaining| {
                            exited.store(true, Ordering::SeqCst);
                            if haptics_on {
                                TerminalHaptics.pulse(PulseKind::Warning);
                            }
                            println!("Exited early with {remaining} seconds left.");
                        },
                    )
                };

                if let Some(after) = exit_after {
                    tokio::time::sleep(Duration::from_secs(after)).await;
                    handle.exit();
                }
                handle.join().await;

                if completed.load(Ordering::SeqCst) {
                    println!("Lockdown complete.");
                } else if exited.load(Ordering::SeqCst) {
                    println!("Lockdown ended early.");
                }
            }
        }
        Ok(())
    })?
}
