pub mod config;
pub mod journal;
pub mod lockdown;
pub mod profile;
pub mod streak;

mod context;

pub(crate) use context::CliContext;

/// Commands are sync at the clap boundary; each one spins up a runtime
/// for the async core calls.
pub(crate) fn block_on<F: std::future::Future>(fut: F) -> Result<F::Output, std::io::Error> {
    let rt = tokio::runtime::Runtime::new()?;
    Ok(rt.block_on(fut))
}
