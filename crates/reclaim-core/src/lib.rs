//! # Reclaim Core Library
//!
//! Core business logic for Reclaim, a recovery-support application.
//! It implements a CLI-first philosophy where all operations are available
//! via a standalone CLI binary, with any GUI shell being a thin layer over
//! the same core library.
//!
//! ## Architecture
//!
//! - **Streak tracker**: pure elapsed-time computation over two optional
//!   anchor timestamps, plus the relapse-reset transition
//! - **Lockdown timer**: single-shot countdown state machine with a tokio
//!   driver that fires completion/early-exit callbacks exactly once
//! - **Account bootstrap**: race-free "create the user document if
//!   missing" over a reactive three-valued store read
//! - **Store**: narrow document-store boundary with in-memory and HTTP
//!   implementations; persistence and query semantics belong to the
//!   hosted backend
//!
//! ## Key Components
//!
//! - [`AuthBootstrap`]: bootstrap coordinator
//! - [`LockdownTimer`] / [`LockdownHandle`]: countdown state machine and driver
//! - [`streak::elapsed`]: clean-time computation
//! - [`Config`]: application configuration management

pub mod analytics;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod events;
pub mod journal;
pub mod lockdown;
pub mod model;
pub mod onboarding;
pub mod store;
pub mod streak;

pub use analytics::{Analytics, Haptics, NoopAnalytics, NoopHaptics, PulseKind};
pub use bootstrap::{AuthBootstrap, BootstrapStatus, IdentityProvider, IdentityState};
pub use config::Config;
pub use error::{AuthError, ConfigError, CoreError, StoreError, ValidationError};
pub use events::Event;
pub use journal::JournalService;
pub use lockdown::{LockdownHandle, LockdownState, LockdownTimer};
pub use model::{JournalCategory, JournalEntry, NewUserRecord, Profile, UserRecord};
pub use store::{Lookup, MemoryStore, RemoteStore, UserPatch, UserStore};
pub use streak::Elapsed;
