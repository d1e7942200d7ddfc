//! Session lockdown countdown.
//!
//! Two layers, so the state machine stays testable without a clock:
//!
//! - [`LockdownTimer`]: pure single-shot countdown. The caller drives it
//!   by calling `tick()` once per elapsed second; the decrement and the
//!   zero-check happen in the same call, so completion cannot double-fire
//!   and no tick can be skipped.
//! - [`LockdownHandle`]: tokio driver that owns a timer, ticks it on a
//!   one-second interval, and fires the completion or early-exit callback
//!   exactly once. Dropping or disposing the handle cancels any pending
//!   tick; no callback runs after teardown.
//!
//! This is a UI countdown only. It asserts no enforcement over other
//! applications.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::analytics::{track_event, Analytics};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockdownState {
    Running,
    Completed,
    EarlyExited,
}

/// Single-shot countdown state machine.
///
/// `Running(remaining) -> .. -> Running(0) -> Completed`, or
/// `Running(_) -> EarlyExited` via [`LockdownTimer::exit`]. Terminal
/// states ignore further ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockdownTimer {
    duration_secs: u64,
    remaining_secs: u64,
    state: LockdownState,
}

impl LockdownTimer {
    /// A zero duration still starts `Running` and completes on the first
    /// tick: every session lasts at least one tick.
    pub fn new(duration_secs: u64) -> Self {
        Self {
            duration_secs,
            remaining_secs: duration_secs,
            state: LockdownState::Running,
        }
    }

    pub fn state(&self) -> LockdownState {
        self.state
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    /// Advance by one second. Returns the completion event on the tick
    /// that reaches zero, and `None` on every other call (including any
    /// call after a terminal state was reached).
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != LockdownState::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.state = LockdownState::Completed;
            return Some(Event::LockdownCompleted {
                duration_secs: self.duration_secs,
                at: Utc::now(),
            });
        }
        None
    }

    /// Emergency exit. Returns the early-exit event once; `None` from a
    /// terminal state.
    pub fn exit(&mut self) -> Option<Event> {
        if self.state != LockdownState::Running {
            return None;
        }
        self.state = LockdownState::EarlyExited;
        Some(Event::LockdownEarlyExit {
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }
}

/// Handle to a running countdown driven by a tokio task.
pub struct LockdownHandle {
    remaining: Arc<AtomicU64>,
    exit_signal: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl LockdownHandle {
    /// Spawn the countdown. `on_complete` fires exactly once when the
    /// countdown reaches zero; `on_early_exit` fires exactly once (with
    /// the seconds still remaining) if [`LockdownHandle::exit`] is called
    /// first. At most one of the two ever fires. Session events go to
    /// `analytics` fire-and-forget.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<C, E>(
        duration_secs: u64,
        analytics: Option<Arc<dyn Analytics>>,
        on_complete: C,
        on_early_exit: E,
    ) -> Self
    where
        C: FnOnce() + Send + 'static,
        E: FnOnce(u64) + Send + 'static,
    {
        let remaining = Arc::new(AtomicU64::new(duration_secs));
        let exit_signal = Arc::new(Notify::new());

        let task = {
            let remaining = Arc::clone(&remaining);
            let exit_signal = Arc::clone(&exit_signal);
            tokio::spawn(async move {
                let mut timer = LockdownTimer::new(duration_secs);
                if let Some(analytics) = &analytics {
                    track_event(
                        analytics.as_ref(),
                        &Event::LockdownStarted {
                            duration_secs,
                            at: Utc::now(),
                        },
                    );
                }
                let mut interval = tokio::time::interval(Duration::from_secs(1));
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // The first interval tick completes immediately; consume it
                // so the countdown starts a full second out.
                interval.tick().await;

                loop {
                    tokio::select! {
                        // Exit wins over a simultaneously-due tick, so a
                        // pending tick can never fire after the exit.
                        biased;
                        _ = exit_signal.notified() => {
                            if let Some(event) = timer.exit() {
                                if let Some(analytics) = &analytics {
                                    track_event(analytics.as_ref(), &event);
                                }
                                on_early_exit(timer.remaining_secs());
                            }
                            return;
                        }
                        _ = interval.tick() => {
                            let completed = timer.tick();
                            remaining.store(timer.remaining_secs(), Ordering::Relaxed);
                            if let Some(event) = completed {
                                if let Some(analytics) = &analytics {
                                    track_event(analytics.as_ref(), &event);
                                }
                                on_complete();
                                return;
                            }
                        }
                    }
                }
            })
        };

        Self {
            remaining,
            exit_signal,
            task: Some(task),
        }
    }

    /// Seconds left on the countdown, as last observed by the driver.
    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::Relaxed)
    }

    /// Request the emergency early exit. Idempotent; has no effect once
    /// the countdown completed.
    pub fn exit(&self) {
        self.exit_signal.notify_one();
    }

    /// Tear the countdown down without firing either callback.
    pub fn dispose(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Wait for the driver task to finish (completion or early exit).
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for LockdownHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
