//! Persisted document schema.
//!
//! These types mirror the documents held by the external store. The store
//! assigns `id` and `created_at`; everything else is written by this client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a stored document.
pub type DocumentId = String;

/// A user account document.
///
/// At most one exists per `identity_token`. Enforced by the
/// lookup-then-create flow in [`crate::bootstrap`], not by a database
/// constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Store-assigned document id.
    pub id: DocumentId,
    /// Stable external-identity key. Immutable after creation.
    pub identity_token: String,
    /// Set true once onboarding completes.
    #[serde(default)]
    pub onboarded: bool,
    /// Beginning of the current streak if no relapse has occurred.
    #[serde(default)]
    pub recovery_start_date: Option<DateTime<Utc>>,
    /// Overwritten every time a relapse is logged. Once set, takes
    /// precedence over `recovery_start_date` for elapsed-time computation.
    #[serde(default)]
    pub last_relapse_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
}

/// Profile and preference fields. All optional; present after onboarding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub diet: Option<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub daily_protein_target_g: Option<u32>,
    #[serde(default)]
    pub referral_code: Option<String>,
}

/// Creation payload for a new user document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserRecord {
    pub identity_token: String,
}

impl NewUserRecord {
    pub fn new(identity_token: impl Into<String>) -> Self {
        Self {
            identity_token: identity_token.into(),
        }
    }
}

/// Fixed journaling categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalCategory {
    Thoughts,
    Feelings,
    Gratitude,
    Progress,
}

impl JournalCategory {
    pub const ALL: [JournalCategory; 4] = [
        JournalCategory::Thoughts,
        JournalCategory::Feelings,
        JournalCategory::Gratitude,
        JournalCategory::Progress,
    ];

    /// Human-readable display name.
    pub fn label(&self) -> &'static str {
        match self {
            JournalCategory::Thoughts => "Thoughts",
            JournalCategory::Feelings => "Feelings",
            JournalCategory::Gratitude => "Gratitude",
            JournalCategory::Progress => "Progress",
        }
    }
}

impl std::str::FromStr for JournalCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "thoughts" => Ok(JournalCategory::Thoughts),
            "feelings" => Ok(JournalCategory::Feelings),
            "gratitude" => Ok(JournalCategory::Gratitude),
            "progress" => Ok(JournalCategory::Progress),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

impl std::fmt::Display for JournalCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single journal entry. Belongs to exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: DocumentId,
    pub user_id: DocumentId,
    pub content: String,
    pub category: JournalCategory,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!(
            "Gratitude".parse::<JournalCategory>().unwrap(),
            JournalCategory::Gratitude
        );
        assert_eq!(
            "progress".parse::<JournalCategory>().unwrap(),
            JournalCategory::Progress
        );
        assert!("mood".parse::<JournalCategory>().is_err());
    }

    #[test]
    fn user_record_tolerates_missing_optional_fields() {
        let json = r#"{
            "id": "u-1",
            "identity_token": "tok",
            "created_at": "2026-01-01T00:00:00Z"
        }"#;
        let record: UserRecord = serde_json::from_str(json).unwrap();
        assert!(!record.onboarded);
        assert!(record.recovery_start_date.is_none());
        assert!(record.last_relapse_date.is_none());
        assert!(record.profile.goals.is_empty());
    }
}
