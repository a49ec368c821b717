//! In-memory workout session tally.
//!
//! Tracks repetitions reported by a [`crate::RepTracker`] over one workout and
//! converts them into earned minutes. Nothing is persisted.

use repsense_core::{Error, Result, SessionId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: SessionId,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub reps: u32,
    pub minutes_per_rep: u32,
    /// Tracker count seen at the last sync
    last_tracker_count: u32,
}

/// Final numbers of a finished session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub reps: u32,
    pub minutes_earned: u32,
    pub duration_secs: f64,
}

impl WorkoutSession {
    pub fn start(minutes_per_rep: u32) -> Self {
        Self::start_at(Timestamp::now(), minutes_per_rep)
    }

    pub fn start_at(started_at: Timestamp, minutes_per_rep: u32) -> Self {
        let session = Self {
            id: SessionId::new(),
            started_at,
            ended_at: None,
            reps: 0,
            minutes_per_rep,
            last_tracker_count: 0,
        };
        tracing::info!("Workout session started: {:?}", session.id);
        session
    }

    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Credit reps from the tracker's running count.
    ///
    /// A count lower than the previous sync means the tracker was reset; the
    /// new count is then credited from zero, so the tally never decreases.
    pub fn sync_reps(&mut self, tracker_count: u32) -> Result<u32> {
        if !self.is_active() {
            return Err(Error::SessionFinished);
        }

        let gained = tracker_count
            .checked_sub(self.last_tracker_count)
            .unwrap_or(tracker_count);
        self.reps = self.reps.saturating_add(gained);
        self.last_tracker_count = tracker_count;
        Ok(self.reps)
    }

    pub fn minutes_earned(&self) -> u32 {
        self.reps.saturating_mul(self.minutes_per_rep)
    }

    pub fn finish(&mut self) -> Result<SessionSummary> {
        self.finish_at(Timestamp::now())
    }

    pub fn finish_at(&mut self, ended_at: Timestamp) -> Result<SessionSummary> {
        if !self.is_active() {
            return Err(Error::SessionFinished);
        }

        self.ended_at = Some(ended_at);
        let summary = SessionSummary {
            id: self.id,
            reps: self.reps,
            minutes_earned: self.minutes_earned(),
            duration_secs: ended_at
                .as_nanos()
                .saturating_sub(self.started_at.as_nanos())
                .max(0) as f64
                / 1e9,
        };

        tracing::info!(
            "Workout session {:?} finished: {} reps, {} minutes earned",
            summary.id,
            summary.reps,
            summary.minutes_earned
        );

        Ok(summary)
    }
}
