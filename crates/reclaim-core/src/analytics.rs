//! Fire-and-forget side channels: analytics and haptic feedback.
//!
//! Both are injected capabilities constructed once at process start.
//! Nothing on the core control path awaits them or propagates their
//! failures -- a broken analytics sink must never break a screen.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::events::Event;

/// Analytics client lifecycle. All methods are best-effort no-ops by
/// default; implementations swallow their own failures.
pub trait Analytics: Send + Sync {
    /// Called once at process start.
    fn initialize(&self) {}

    /// Associate subsequent events with a user.
    fn identify(&self, _identity_token: &str) {}

    /// Emit a named event with optional properties.
    fn track(&self, _name: &str, _properties: HashMap<String, Value>) {}

    /// Called on sign-out.
    fn reset(&self) {}
}

/// Haptic feedback pulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseKind {
    /// Session finished normally.
    Success,
    /// Emergency exit or relapse logged.
    Warning,
}

/// Haptic/notification feedback. Fire-and-forget; no return value is
/// consumed by the core.
pub trait Haptics: Send + Sync {
    fn pulse(&self, _kind: PulseKind) {}
}

/// Does nothing. The default wiring outside the mobile shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAnalytics;

impl Analytics for NoopAnalytics {}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHaptics;

impl Haptics for NoopHaptics {}

/// Map a core event onto an analytics call. Centralizing the mapping
/// keeps event names consistent across screens.
pub fn track_event(analytics: &dyn Analytics, event: &Event) {
    let (name, properties) = match event {
        Event::LockdownStarted { duration_secs, .. } => (
            "lockdown_started",
            HashMap::from([("duration_secs".to_string(), Value::from(*duration_secs))]),
        ),
        Event::LockdownCompleted { duration_secs, .. } => (
            "lockdown_completed",
            HashMap::from([("duration_secs".to_string(), Value::from(*duration_secs))]),
        ),
        Event::LockdownEarlyExit { remaining_secs, .. } => (
            "lockdown_early_exit",
            HashMap::from([("remaining_secs".to_string(), Value::from(*remaining_secs))]),
        ),
        Event::RelapseLogged { .. } => ("relapse_logged", HashMap::new()),
        Event::RecoveryStarted { .. } => ("recovery_started", HashMap::new()),
        Event::UserCreated { .. } => ("user_created", HashMap::new()),
        Event::JournalEntryAdded { category, .. } => (
            "journal_entry_added",
            HashMap::from([("category".to_string(), Value::from(category.label()))]),
        ),
        Event::OnboardingCompleted { .. } => ("onboarding_completed", HashMap::new()),
    };
    analytics.track(name, properties);
}

/// Records every call. Test double.
#[derive(Debug, Default)]
pub struct RecordingAnalytics {
    calls: Mutex<Vec<(String, HashMap<String, Value>)>>,
}

impl RecordingAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(String, HashMap<String, Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn event_names(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

impl Analytics for RecordingAnalytics {
    fn track(&self, name: &str, properties: HashMap<String, Value>) {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), properties));
    }
}
