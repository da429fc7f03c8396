//! Timer session state machine.
//!
//! A session moves `idle → running ⇄ paused → idle`. Elapsed time is the
//! accumulated paused seconds plus, while running, the wall-clock span
//! since the last (re)start. Pausing folds the running span into
//! `paused_seconds`; resuming resets `started_at` so no span is counted
//! twice. All transitions take `now` as a parameter so they stay
//! deterministic under test.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Sessions older than this (measured from the last `started_at`) are
/// discarded on load instead of restored.
pub const STALE_AFTER_HOURS: i64 = 24;

#[derive(Debug, Error, PartialEq)]
pub enum TimerTransitionError {
    #[error("timer is not running")]
    NotRunning,
    #[error("timer is not paused")]
    NotPaused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    Running,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSession {
    pub client_id: Uuid,
    pub client_name: String,
    pub project_name: Option<String>,
    pub description: String,
    pub billable: bool,
    pub hourly_rate: f64,
    pub started_at: DateTime<Utc>,
    pub paused_seconds: i64,
    pub is_paused: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartTimerParams {
    pub client_id: Uuid,
    pub client_name: String,
    pub project_name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_billable")]
    pub billable: bool,
    #[serde(default)]
    pub hourly_rate: f64,
}

fn default_billable() -> bool {
    true
}

impl TimerSession {
    pub fn start(params: StartTimerParams, now: DateTime<Utc>) -> Self {
        TimerSession {
            client_id: params.client_id,
            client_name: params.client_name,
            project_name: params.project_name,
            description: params.description,
            billable: params.billable,
            hourly_rate: params.hourly_rate,
            started_at: now,
            paused_seconds: 0,
            is_paused: false,
        }
    }

    pub fn state(&self) -> TimerState {
        if self.is_paused {
            TimerState::Paused
        } else {
            TimerState::Running
        }
    }

    /// Folds the current running span into `paused_seconds` and freezes
    /// the session.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), TimerTransitionError> {
        if self.is_paused {
            return Err(TimerTransitionError::NotRunning);
        }
        self.paused_seconds += (now - self.started_at).num_seconds().max(0);
        self.is_paused = true;
        Ok(())
    }

    /// Restarts the clock from `now`; the accumulated seconds stay put.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), TimerTransitionError> {
        if !self.is_paused {
            return Err(TimerTransitionError::NotPaused);
        }
        self.started_at = now;
        self.is_paused = false;
        Ok(())
    }

    /// Total elapsed seconds as of `now`.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        if self.is_paused {
            self.paused_seconds
        } else {
            self.paused_seconds + (now - self.started_at).num_seconds().max(0)
        }
    }

    /// Elapsed time in hours, rounded to two decimals the way the saved
    /// time entry records it.
    pub fn elapsed_hours(&self, now: DateTime<Utc>) -> f64 {
        let hours = self.elapsed_seconds(now) as f64 / 3600.0;
        (hours * 100.0).round() / 100.0
    }

    /// A session is stale once its last start is 24 hours in the past.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        (now - self.started_at).num_hours() >= STALE_AFTER_HOURS
    }
}

/// Formats elapsed seconds as `HH:MM:SS` for display.
pub fn format_elapsed(total_seconds: i64) -> String {
    let total_seconds = total_seconds.max(0);
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn start_at(now: DateTime<Utc>) -> TimerSession {
        TimerSession::start(
            StartTimerParams {
                client_id: Uuid::new_v4(),
                client_name: "Acme BV".to_string(),
                project_name: None,
                description: "support".to_string(),
                billable: true,
                hourly_rate: 90.0,
            },
            now,
        )
    }

    fn t0() -> DateTime<Utc> {
        "2025-09-17T09:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_elapsed_grows_while_running() {
        let session = start_at(t0());
        let a = session.elapsed_seconds(t0() + Duration::seconds(10));
        let b = session.elapsed_seconds(t0() + Duration::seconds(95));
        assert_eq!(a, 10);
        assert_eq!(b, 95);
        assert!(b > a);
    }

    #[test]
    fn test_pause_freezes_elapsed() {
        let mut session = start_at(t0());
        session.pause(t0() + Duration::seconds(60)).unwrap();

        assert_eq!(session.state(), TimerState::Paused);
        assert_eq!(session.elapsed_seconds(t0() + Duration::seconds(61)), 60);
        assert_eq!(session.elapsed_seconds(t0() + Duration::hours(3)), 60);
    }

    #[test]
    fn test_resume_does_not_double_count() {
        let mut session = start_at(t0());
        session.pause(t0() + Duration::seconds(60)).unwrap();
        // A long break while paused must not leak into the total.
        session.resume(t0() + Duration::seconds(600)).unwrap();

        assert_eq!(session.state(), TimerState::Running);
        assert_eq!(session.elapsed_seconds(t0() + Duration::seconds(630)), 90);
    }

    #[test]
    fn test_multiple_pause_resume_cycles_accumulate() {
        let mut session = start_at(t0());
        session.pause(t0() + Duration::seconds(30)).unwrap();
        session.resume(t0() + Duration::seconds(100)).unwrap();
        session.pause(t0() + Duration::seconds(145)).unwrap();

        assert_eq!(session.paused_seconds, 75);
        assert_eq!(session.elapsed_seconds(t0() + Duration::hours(1)), 75);
    }

    #[test]
    fn test_pause_while_paused_is_rejected() {
        let mut session = start_at(t0());
        session.pause(t0() + Duration::seconds(10)).unwrap();
        assert_eq!(
            session.pause(t0() + Duration::seconds(20)),
            Err(TimerTransitionError::NotRunning)
        );
    }

    #[test]
    fn test_resume_while_running_is_rejected() {
        let mut session = start_at(t0());
        assert_eq!(
            session.resume(t0() + Duration::seconds(20)),
            Err(TimerTransitionError::NotPaused)
        );
    }

    #[test]
    fn test_elapsed_hours_rounds_to_two_decimals() {
        let session = start_at(t0());
        // 4500 seconds = 1.25h exactly
        assert_eq!(session.elapsed_hours(t0() + Duration::seconds(4500)), 1.25);
        // 4000 seconds = 1.111... → 1.11
        assert_eq!(session.elapsed_hours(t0() + Duration::seconds(4000)), 1.11);
    }

    #[test]
    fn test_staleness_boundary_at_24_hours() {
        let session = start_at(t0());
        assert!(!session.is_stale(t0() + Duration::hours(23)));
        assert!(session.is_stale(t0() + Duration::hours(24)));
        assert!(session.is_stale(t0() + Duration::hours(48)));
    }

    #[test]
    fn test_paused_session_staleness_measured_from_last_start() {
        let mut session = start_at(t0());
        session.pause(t0() + Duration::hours(1)).unwrap();
        session.resume(t0() + Duration::hours(20)).unwrap();
        // started_at was reset at resume, so the 24h window restarts there.
        assert!(!session.is_stale(t0() + Duration::hours(30)));
        assert!(session.is_stale(t0() + Duration::hours(45)));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(61), "00:01:01");
        assert_eq!(format_elapsed(3661), "01:01:01");
        assert_eq!(format_elapsed(90000), "25:00:00");
    }
}
