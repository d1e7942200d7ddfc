//! Profile completion flow.
//!
//! Onboarding collects the profile scalars, validates them, and applies
//! one patch: `onboarded = true`, the profile, and -- when the user has
//! no anchor yet -- `recovery_start_date = now`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::analytics::{track_event, Analytics};
use crate::error::{CoreError, Result, ValidationError};
use crate::events::Event;
use crate::model::{Profile, UserRecord};
use crate::store::{UserPatch, UserStore};

/// Answers collected by the onboarding screens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnboardingAnswers {
    pub sex: Option<String>,
    pub age: Option<u32>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub diet: Option<String>,
    pub goals: Vec<String>,
    pub daily_protein_target_g: Option<u32>,
    pub referral_code: Option<String>,
}

impl OnboardingAnswers {
    /// Reject physically impossible inputs. Absent values are fine; the
    /// profile fields carry no invariant beyond "present after onboarding".
    pub fn validate(&self) -> Result<()> {
        fn positive(field: &str, value: Option<f64>) -> Result<()> {
            match value {
                Some(v) if v <= 0.0 => Err(CoreError::Validation(ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: "must be positive".to_string(),
                })),
                _ => Ok(()),
            }
        }
        if self.age == Some(0) {
            return Err(CoreError::Validation(ValidationError::InvalidValue {
                field: "age".to_string(),
                message: "must be positive".to_string(),
            }));
        }
        positive("height_cm", self.height_cm)?;
        positive("weight_kg", self.weight_kg)?;
        Ok(())
    }

    fn into_profile(self) -> Profile {
        Profile {
            sex: self.sex,
            age: self.age,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            diet: self.diet,
            goals: self.goals,
            daily_protein_target_g: self.daily_protein_target_g,
            referral_code: self.referral_code,
        }
    }
}

/// Apply completed onboarding to the user record.
pub async fn complete_onboarding<S: UserStore>(
    store: &S,
    record: &mut UserRecord,
    answers: OnboardingAnswers,
    now: DateTime<Utc>,
    analytics: Option<&Arc<dyn Analytics>>,
) -> Result<()> {
    answers.validate()?;

    let patch = UserPatch {
        onboarded: Some(true),
        profile: Some(answers.into_profile()),
        // The streak starts at onboarding unless an anchor already exists.
        recovery_start_date: if record.recovery_start_date.is_none() {
            Some(now)
        } else {
            None
        },
        ..Default::default()
    };

    let updated = store.patch_user(&record.id, patch).await?;
    *record = updated;

    if let Some(analytics) = analytics {
        track_event(analytics.as_ref(), &Event::OnboardingCompleted { at: now });
    }
    Ok(())
}
