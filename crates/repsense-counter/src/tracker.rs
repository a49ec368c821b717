//! Per-frame facade: pose snapshot in, repetition count out.

use repsense_core::{PoseSnapshot, Result, Timestamp};
use serde::{Deserialize, Serialize};

use crate::config::CounterConfig;
use crate::counter::PhaseCounter;
use crate::features::{FeatureExtractor, FrameFeatures};
use crate::feedback::FormFeedback;
use crate::phase::{Phase, PhaseTransition};

/// Read-only view of the tracker after the latest frame, for UI binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerStatus {
    pub rep_count: u32,
    pub phase: Phase,
    pub phase_label: String,
    pub feedback: FormFeedback,
    pub feedback_message: String,
    pub form_ok: bool,
    pub last_angle: Option<f64>,
    pub frames_processed: u64,
    pub last_frame: Option<Timestamp>,
}

/// Feature extraction followed by the phase counter, once per frame.
///
/// One tracker per subject. Calls must be serialized by the host.
#[derive(Debug, Clone)]
pub struct RepTracker {
    extractor: FeatureExtractor,
    counter: PhaseCounter,
    /// Consecutive frames whose phase signal was invalid
    invalid_streak: u32,
    frames_processed: u64,
    last_features: Option<FrameFeatures>,
    last_frame: Option<Timestamp>,
}

impl RepTracker {
    pub fn new(config: CounterConfig) -> Result<Self> {
        let extractor = FeatureExtractor::from_config(&config);
        let counter = PhaseCounter::new(config)?;

        Ok(Self {
            extractor,
            counter,
            invalid_streak: 0,
            frames_processed: 0,
            last_features: None,
            last_frame: None,
        })
    }

    /// Process one frame and return the repetition count
    pub fn process(&mut self, pose: &PoseSnapshot) -> u32 {
        let features = self.extractor.extract(pose);

        self.frames_processed += 1;
        self.last_frame = Some(pose.timestamp);
        self.last_features = Some(features);

        if features.combined.valid {
            self.invalid_streak = 0;
        } else {
            self.invalid_streak = self.invalid_streak.saturating_add(1);
            if self.invalid_streak == self.counter.config().visibility_timeout_frames {
                tracing::warn!(
                    "Tracked joints not visible for {} consecutive frames",
                    self.invalid_streak
                );
            }
        }

        self.counter.ingest_features(&features)
    }

    pub fn rep_count(&self) -> u32 {
        self.counter.rep_count()
    }

    pub fn phase(&self) -> Phase {
        self.counter.phase()
    }

    pub fn phase_label(&self) -> &'static str {
        self.counter.phase_label()
    }

    /// Counter feedback, overridden while the tracked joints are out of view
    pub fn feedback(&self) -> FormFeedback {
        if self.visibility_lost() {
            FormFeedback::PoorVisibility
        } else {
            self.counter.feedback()
        }
    }

    pub fn in_good_form(&self) -> bool {
        !self.visibility_lost() && self.counter.in_good_form()
    }

    pub fn visibility_lost(&self) -> bool {
        self.invalid_streak >= self.counter.config().visibility_timeout_frames
    }

    pub fn last_angle(&self) -> Option<f64> {
        self.counter.last_angle()
    }

    pub fn last_transition(&self) -> Option<PhaseTransition> {
        self.counter.last_transition()
    }

    pub fn last_features(&self) -> Option<&FrameFeatures> {
        self.last_features.as_ref()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn counter(&self) -> &PhaseCounter {
        &self.counter
    }

    pub fn status(&self) -> TrackerStatus {
        let feedback = self.feedback();
        TrackerStatus {
            rep_count: self.rep_count(),
            phase: self.phase(),
            phase_label: self.phase_label().to_string(),
            feedback,
            feedback_message: feedback.message().to_string(),
            form_ok: feedback.is_form_ok(),
            last_angle: self.last_angle(),
            frames_processed: self.frames_processed,
            last_frame: self.last_frame,
        }
    }

    /// Clear all counting state; the configuration is kept
    pub fn reset(&mut self) {
        tracing::info!(
            "Resetting tracker after {} reps over {} frames",
            self.counter.rep_count(),
            self.frames_processed
        );

        self.counter.reset();
        self.invalid_streak = 0;
        self.frames_processed = 0;
        self.last_features = None;
        self.last_frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BilateralPolicy, CounterProfile};
    use repsense_core::{Keypoint, Position2D};

    /// Both arms with the given elbow angle, torso vertical
    fn pose_with_elbow_angle(frame: i64, degrees: f64, confidence: f32) -> PoseSnapshot {
        let rad = degrees.to_radians();
        let mut pose = PoseSnapshot::new(Timestamp::from_millis(frame * 33));

        for (shoulder, elbow, wrist, x, dir) in [
            (Keypoint::LeftShoulder, Keypoint::LeftElbow, Keypoint::LeftWrist, 0.4, -1.0),
            (Keypoint::RightShoulder, Keypoint::RightElbow, Keypoint::RightWrist, 0.6, 1.0),
        ] {
            // Upper arm hangs straight down from the shoulder
            let s = Position2D::new(x, 0.2);
            let e = Position2D::new(x, 0.4);
            let w = Position2D::new(x + dir * 0.2 * rad.sin(), 0.4 - 0.2 * rad.cos());

            pose = pose
                .with_landmark(shoulder, s, confidence)
                .with_landmark(elbow, e, confidence)
                .with_landmark(wrist, w, confidence);
        }

        pose.with_landmark(Keypoint::LeftHip, Position2D::new(0.4, 0.8), confidence)
            .with_landmark(Keypoint::RightHip, Position2D::new(0.6, 0.8), confidence)
    }

    fn run(tracker: &mut RepTracker, angles: &[f64]) -> u32 {
        let mut count = tracker.rep_count();
        for &angle in angles {
            let frame = tracker.frames_processed() as i64;
            count = tracker.process(&pose_with_elbow_angle(frame, angle, 0.95));
        }
        count
    }

    fn rep() -> Vec<f64> {
        vec![150.0, 150.0, 150.0, 60.0, 60.0, 60.0, 150.0, 150.0, 150.0]
    }

    #[test]
    fn test_synthetic_pose_geometry() {
        let extractor = FeatureExtractor::default();
        for angle in [30.0, 60.0, 90.0, 150.0, 175.0] {
            let features = extractor.extract(&pose_with_elbow_angle(0, angle, 0.9));
            assert!((features.combined.degrees - angle).abs() < 1e-6);
        }
    }

    #[test]
    fn test_literal_scenario_from_poses() {
        let mut tracker = RepTracker::new(CounterConfig::default()).unwrap();
        assert_eq!(run(&mut tracker, &rep()), 1);
        assert_eq!(tracker.phase(), Phase::Up);
        assert_eq!(tracker.frames_processed(), 9);
    }

    #[test]
    fn test_low_confidence_frames_are_skipped() {
        let mut tracker = RepTracker::new(CounterConfig::default()).unwrap();
        run(&mut tracker, &[150.0, 150.0, 150.0, 60.0, 60.0, 60.0]);

        // Confident-looking extension reported below the confidence floor
        for i in 0..10 {
            tracker.process(&pose_with_elbow_angle(100 + i, 160.0, 0.3));
        }
        assert_eq!(tracker.rep_count(), 0);
        assert_eq!(tracker.phase(), Phase::Down);

        run(&mut tracker, &[150.0, 150.0, 150.0]);
        assert_eq!(tracker.rep_count(), 1);
    }

    #[test]
    fn test_one_sided_occlusion() {
        let mut tracker = RepTracker::new(CounterConfig::default()).unwrap();
        run(&mut tracker, &[60.0, 60.0, 60.0]);

        let mut pose = pose_with_elbow_angle(50, 150.0, 0.95);
        pose.remove(Keypoint::RightWrist);
        for _ in 0..5 {
            tracker.process(&pose);
        }
        // Half a reading never completes a rep under the default policy
        assert_eq!(tracker.rep_count(), 0);

        let config = CounterConfig {
            bilateral: BilateralPolicy::AllowSingleSide,
            ..Default::default()
        };
        let mut tracker = RepTracker::new(config).unwrap();
        run(&mut tracker, &[60.0, 60.0, 60.0]);
        for _ in 0..3 {
            tracker.process(&pose);
        }
        assert_eq!(tracker.rep_count(), 1);
    }

    #[test]
    fn test_visibility_feedback() {
        let mut tracker = RepTracker::new(CounterConfig::default()).unwrap();
        run(&mut tracker, &[150.0, 150.0, 150.0]);

        let empty = PoseSnapshot::new(Timestamp::from_millis(0));
        for _ in 0..14 {
            tracker.process(&empty);
        }
        assert!(!tracker.visibility_lost());
        assert_eq!(tracker.feedback(), FormFeedback::GoDown);

        tracker.process(&empty);
        assert!(tracker.visibility_lost());
        assert_eq!(tracker.feedback(), FormFeedback::PoorVisibility);
        assert!(!tracker.in_good_form());
        // Phase survives the outage
        assert_eq!(tracker.phase(), Phase::Up);

        run(&mut tracker, &[150.0]);
        assert!(!tracker.visibility_lost());
        assert!(tracker.in_good_form());
    }

    #[test]
    fn test_reset_replays_identically() {
        let mut tracker = RepTracker::new(CounterConfig::default()).unwrap();
        let sequence: Vec<f64> = rep().into_iter().chain(rep()).collect();

        let first = run(&mut tracker, &sequence);
        assert_eq!(first, 2);

        tracker.reset();
        assert_eq!(tracker.rep_count(), 0);
        assert_eq!(tracker.phase(), Phase::Neutral);
        assert_eq!(tracker.frames_processed(), 0);
        assert!(tracker.last_features().is_none());

        assert_eq!(run(&mut tracker, &sequence), first);
    }

    #[test]
    fn test_strict_profile_torso_gate() {
        let config = CounterConfig::from_profile(CounterProfile::Strict);
        let mut tracker = RepTracker::new(config).unwrap();
        run(&mut tracker, &[160.0, 160.0]);
        assert_eq!(tracker.phase(), Phase::Up);

        // Hips drift far sideways: torso no longer straight
        for i in 0..5 {
            let mut pose = pose_with_elbow_angle(10 + i, 50.0, 0.95);
            pose.insert(repsense_core::Landmark::new(
                Keypoint::LeftHip,
                Position2D::new(1.4, 0.8),
                0.95,
            ));
            pose.insert(repsense_core::Landmark::new(
                Keypoint::RightHip,
                Position2D::new(1.6, 0.8),
                0.95,
            ));
            tracker.process(&pose);
        }

        assert_eq!(tracker.phase(), Phase::Up);
        assert_eq!(tracker.feedback(), FormFeedback::KeepTorsoStraight);
        assert!(!tracker.status().form_ok);
    }

    #[test]
    fn test_status_serializes_for_ui() {
        let mut tracker = RepTracker::new(CounterConfig::default()).unwrap();
        run(&mut tracker, &rep());

        let status = tracker.status();
        assert_eq!(status.rep_count, 1);
        assert_eq!(status.phase, Phase::Up);
        assert_eq!(status.feedback, FormFeedback::GoDown);
        assert!(status.form_ok);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["rep_count"], 1);
        assert_eq!(json["phase"], "up");
        assert_eq!(json["feedback"], "go_down");
    }
}
