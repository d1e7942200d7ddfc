//! Streak and relapse tracking.
//!
//! Elapsed clean time is a pure function of two optional timestamps plus
//! "now". The anchor is the last relapse when one exists, otherwise the
//! recovery start date, otherwise now -- a brand-new user shows zero.
//!
//! Logging a relapse overwrites the anchor through the store; no relapse
//! history is kept. A failed write leaves the previous anchor in effect so
//! the visible streak is never reset optimistically.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::{track_event, Analytics};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::model::UserRecord;
use crate::store::{UserPatch, UserStore};

/// Whole days and whole remaining hours of clean time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elapsed {
    pub days: u64,
    pub hours: u64,
}

impl Elapsed {
    pub const ZERO: Elapsed = Elapsed { days: 0, hours: 0 };

    /// Render as `"D day(s) and H hour(s)"`, or `"H hour(s)"` when no
    /// whole day has passed. Singular exactly at 1, per unit.
    pub fn describe(&self) -> String {
        let hours = pluralize(self.hours, "hour");
        if self.days > 0 {
            format!("{} and {}", pluralize(self.days, "day"), hours)
        } else {
            hours
        }
    }
}

impl std::fmt::Display for Elapsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

fn pluralize(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

/// Compute clean time at `now`.
///
/// `now` earlier than the anchor (clock skew) clamps to zero; skew is not
/// an error.
pub fn elapsed(
    now: DateTime<Utc>,
    recovery_start: Option<DateTime<Utc>>,
    last_relapse: Option<DateTime<Utc>>,
) -> Elapsed {
    let anchor = last_relapse.or(recovery_start).unwrap_or(now);
    let seconds = (now - anchor).num_seconds().max(0) as u64;
    Elapsed {
        days: seconds / 86_400,
        hours: (seconds % 86_400) / 3_600,
    }
}

/// Clean-time description for a user record.
pub fn elapsed_description(record: &UserRecord, now: DateTime<Utc>) -> String {
    elapsed(now, record.recovery_start_date, record.last_relapse_date).describe()
}

/// Log a relapse: overwrite `last_relapse_date` with `now` through the
/// store. Returns the new anchor. The record is only mutated after the
/// write succeeds; on failure the caller's record (and thus the displayed
/// streak) is untouched.
pub async fn log_relapse<S: UserStore>(
    store: &S,
    record: &mut UserRecord,
    now: DateTime<Utc>,
    analytics: Option<&Arc<dyn Analytics>>,
) -> Result<DateTime<Utc>> {
    let updated = store
        .patch_user(&record.id, UserPatch::relapse(now))
        .await
        .map_err(CoreError::from)?;
    *record = updated;
    if let Some(analytics) = analytics {
        track_event(analytics.as_ref(), &Event::RelapseLogged { at: now });
    }
    Ok(now)
}

/// Mark the beginning of recovery. Set once; later relapses move the
/// anchor via `log_relapse` instead.
pub async fn start_recovery<S: UserStore>(
    store: &S,
    record: &mut UserRecord,
    now: DateTime<Utc>,
    analytics: Option<&Arc<dyn Analytics>>,
) -> Result<DateTime<Utc>> {
    let updated = store
        .patch_user(&record.id, UserPatch::recovery_start(now))
        .await
        .map_err(CoreError::from)?;
    *record = updated;
    if let Some(analytics) = analytics {
        track_event(analytics.as_ref(), &Event::RecoveryStarted { at: now });
    }
    Ok(now)
}
