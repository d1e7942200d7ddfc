use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::JournalCategory;

/// Every notable state change in the core produces an Event.
/// Screens render them; analytics forwards them fire-and-forget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    LockdownStarted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero. Fired exactly once per session.
    LockdownCompleted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// Emergency exit before the countdown finished.
    LockdownEarlyExit {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    RelapseLogged {
        at: DateTime<Utc>,
    },
    RecoveryStarted {
        at: DateTime<Utc>,
    },
    UserCreated {
        identity_token: String,
        at: DateTime<Utc>,
    },
    JournalEntryAdded {
        category: JournalCategory,
        at: DateTime<Utc>,
    },
    OnboardingCompleted {
        at: DateTime<Utc>,
    },
}
