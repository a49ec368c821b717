//! Per-frame feature extraction.
//!
//! Turns a [`PoseSnapshot`] into the angle samples the phase counter consumes.
//! Stateless: every method is a pure function of its inputs.

use repsense_core::{
    interior_angle, vertical_straightness, AngleSample, Keypoint, Landmark, PoseSnapshot,
};
use serde::{Deserialize, Serialize};

use crate::config::{BilateralPolicy, CounterConfig, JointChain, TrackedJoint};

/// Everything extracted from one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameFeatures {
    pub left: AngleSample,
    pub right: AngleSample,
    /// Combined phase signal after the bilateral policy
    pub combined: AngleSample,
    /// Torso straightness, invalid when shoulders or hips are unreliable
    pub torso: AngleSample,
}

/// Confidence-gated angle extractor
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    min_confidence: f32,
    tracked_joint: TrackedJoint,
    bilateral: BilateralPolicy,
}

impl FeatureExtractor {
    pub fn new(min_confidence: f32, tracked_joint: TrackedJoint, bilateral: BilateralPolicy) -> Self {
        Self {
            min_confidence,
            tracked_joint,
            bilateral,
        }
    }

    pub fn from_config(config: &CounterConfig) -> Self {
        Self::new(config.min_confidence, config.tracked_joint, config.bilateral)
    }

    /// Angle at `b` between `a` and `c`.
    ///
    /// Invalid (180°) when any landmark is missing, below the confidence
    /// threshold, or the geometry is degenerate.
    pub fn compute_angle(
        &self,
        a: Option<&Landmark>,
        b: Option<&Landmark>,
        c: Option<&Landmark>,
    ) -> AngleSample {
        let (Some(a), Some(b), Some(c)) = (self.reliable(a), self.reliable(b), self.reliable(c))
        else {
            return AngleSample::invalid();
        };

        AngleSample::from_option(interior_angle(a.position, b.position, c.position))
    }

    /// Combine left and right samples under the configured policy
    pub fn bilateral_average(&self, left: AngleSample, right: AngleSample) -> AngleSample {
        match (left.value(), right.value(), self.bilateral) {
            (Some(l), Some(r), _) => AngleSample::new((l + r) / 2.0),
            (Some(l), None, BilateralPolicy::AllowSingleSide) => AngleSample::new(l),
            (None, Some(r), BilateralPolicy::AllowSingleSide) => AngleSample::new(r),
            _ => AngleSample::invalid(),
        }
    }

    /// Straightness of the shoulder-midpoint to hip-midpoint segment
    pub fn torso_straightness(&self, pose: &PoseSnapshot) -> AngleSample {
        let joints = [
            Keypoint::LeftShoulder,
            Keypoint::RightShoulder,
            Keypoint::LeftHip,
            Keypoint::RightHip,
        ]
        .map(|kp| self.reliable(pose.get(kp)));

        let [Some(ls), Some(rs), Some(lh), Some(rh)] = joints else {
            return AngleSample::invalid();
        };

        let shoulders = ls.position.midpoint(&rs.position);
        let hips = lh.position.midpoint(&rh.position);

        AngleSample::from_option(vertical_straightness(shoulders, hips))
    }

    pub fn chain_angle(&self, pose: &PoseSnapshot, chain: JointChain) -> AngleSample {
        self.compute_angle(
            pose.get(chain.proximal),
            pose.get(chain.vertex),
            pose.get(chain.distal),
        )
    }

    /// Extract all features of one frame
    pub fn extract(&self, pose: &PoseSnapshot) -> FrameFeatures {
        let (left_chain, right_chain) = self.tracked_joint.chains();
        let left = self.chain_angle(pose, left_chain);
        let right = self.chain_angle(pose, right_chain);

        FrameFeatures {
            left,
            right,
            combined: self.bilateral_average(left, right),
            torso: self.torso_straightness(pose),
        }
    }

    fn reliable<'a>(&self, landmark: Option<&'a Landmark>) -> Option<&'a Landmark> {
        landmark.filter(|lm| lm.is_reliable(self.min_confidence))
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::from_config(&CounterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repsense_core::{Position2D, Timestamp, DEFAULT_ANGLE_DEG};

    fn lm(keypoint: Keypoint, x: f64, y: f64, confidence: f32) -> Landmark {
        Landmark::new(keypoint, Position2D::new(x, y), confidence)
    }

    /// Arms bent at 90° on both sides, torso vertical
    fn bent_pose(confidence: f32) -> PoseSnapshot {
        PoseSnapshot::new(Timestamp::from_nanos(0))
            .with_landmark(Keypoint::LeftShoulder, Position2D::new(0.4, 0.2), confidence)
            .with_landmark(Keypoint::LeftElbow, Position2D::new(0.4, 0.4), confidence)
            .with_landmark(Keypoint::LeftWrist, Position2D::new(0.2, 0.4), confidence)
            .with_landmark(Keypoint::RightShoulder, Position2D::new(0.6, 0.2), confidence)
            .with_landmark(Keypoint::RightElbow, Position2D::new(0.6, 0.4), confidence)
            .with_landmark(Keypoint::RightWrist, Position2D::new(0.8, 0.4), confidence)
            .with_landmark(Keypoint::LeftHip, Position2D::new(0.4, 0.8), confidence)
            .with_landmark(Keypoint::RightHip, Position2D::new(0.6, 0.8), confidence)
    }

    #[test]
    fn test_compute_angle_valid() {
        let extractor = FeatureExtractor::default();
        let a = lm(Keypoint::LeftShoulder, 0.0, 0.0, 0.9);
        let b = lm(Keypoint::LeftElbow, 0.5, 0.0, 0.9);
        let c = lm(Keypoint::LeftWrist, 1.0, 0.0, 0.9);

        let sample = extractor.compute_angle(Some(&a), Some(&b), Some(&c));
        assert!(sample.valid);
        assert!((sample.degrees - 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_compute_angle_missing_joint() {
        let extractor = FeatureExtractor::default();
        let a = lm(Keypoint::LeftShoulder, 0.0, 0.0, 0.9);
        let b = lm(Keypoint::LeftElbow, 0.5, 0.0, 0.9);

        let sample = extractor.compute_angle(Some(&a), Some(&b), None);
        assert_eq!(sample, AngleSample::invalid());
    }

    #[test]
    fn test_compute_angle_low_confidence() {
        let extractor = FeatureExtractor::default();
        let a = lm(Keypoint::LeftShoulder, 0.0, 0.0, 0.9);
        let b = lm(Keypoint::LeftElbow, 0.5, 0.0, 0.69);
        let c = lm(Keypoint::LeftWrist, 0.5, 0.5, 0.9);

        let sample = extractor.compute_angle(Some(&a), Some(&b), Some(&c));
        assert!(!sample.valid);
        assert_eq!(sample.degrees, DEFAULT_ANGLE_DEG);

        // Exactly at threshold passes
        let b = lm(Keypoint::LeftElbow, 0.5, 0.0, 0.7);
        assert!(extractor.compute_angle(Some(&a), Some(&b), Some(&c)).valid);
    }

    #[test]
    fn test_compute_angle_degenerate() {
        let extractor = FeatureExtractor::default();
        let a = lm(Keypoint::LeftShoulder, 0.5, 0.0, 0.9);
        let b = lm(Keypoint::LeftElbow, 0.5, 0.0, 0.9);
        let c = lm(Keypoint::LeftWrist, 0.5, 0.5, 0.9);

        assert_eq!(
            extractor.compute_angle(Some(&a), Some(&b), Some(&c)),
            AngleSample::invalid()
        );
    }

    #[test]
    fn test_bilateral_requires_both_sides() {
        let extractor = FeatureExtractor::default();

        let both = extractor.bilateral_average(AngleSample::new(60.0), AngleSample::new(80.0));
        assert_eq!(both.value(), Some(70.0));

        // One real reading must not be averaged with the 180° default
        let one = extractor.bilateral_average(AngleSample::new(60.0), AngleSample::invalid());
        assert!(!one.valid);

        let none = extractor.bilateral_average(AngleSample::invalid(), AngleSample::invalid());
        assert!(!none.valid);
    }

    #[test]
    fn test_bilateral_single_side_policy() {
        let extractor =
            FeatureExtractor::new(0.7, TrackedJoint::Elbow, BilateralPolicy::AllowSingleSide);

        let left_only = extractor.bilateral_average(AngleSample::new(60.0), AngleSample::invalid());
        assert_eq!(left_only.value(), Some(60.0));

        let right_only =
            extractor.bilateral_average(AngleSample::invalid(), AngleSample::new(150.0));
        assert_eq!(right_only.value(), Some(150.0));

        let none = extractor.bilateral_average(AngleSample::invalid(), AngleSample::invalid());
        assert!(!none.valid);
    }

    #[test]
    fn test_extract_full_pose() {
        let extractor = FeatureExtractor::default();
        let features = extractor.extract(&bent_pose(0.95));

        assert!((features.left.degrees - 90.0).abs() < 1e-6);
        assert!((features.right.degrees - 90.0).abs() < 1e-6);
        assert_eq!(features.combined.value().map(|v| v.round()), Some(90.0));
        assert!((features.torso.degrees - 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_extract_occluded_side() {
        let extractor = FeatureExtractor::default();
        let mut pose = bent_pose(0.95);
        pose.remove(Keypoint::RightWrist);

        let features = extractor.extract(&pose);
        assert!(features.left.valid);
        assert!(!features.right.valid);
        assert!(!features.combined.valid);
        // Torso does not depend on wrists
        assert!(features.torso.valid);
    }

    #[test]
    fn test_torso_invalid_without_hips() {
        let extractor = FeatureExtractor::default();
        let mut pose = bent_pose(0.95);
        pose.remove(Keypoint::LeftHip);

        assert!(!extractor.torso_straightness(&pose).valid);
    }

    #[test]
    fn test_knee_tracking() {
        let extractor =
            FeatureExtractor::new(0.5, TrackedJoint::Knee, BilateralPolicy::RequireBoth);
        let pose = PoseSnapshot::new(Timestamp::from_nanos(0))
            .with_landmark(Keypoint::LeftHip, Position2D::new(0.4, 0.5), 0.9)
            .with_landmark(Keypoint::LeftKnee, Position2D::new(0.4, 0.7), 0.9)
            .with_landmark(Keypoint::LeftAnkle, Position2D::new(0.4, 0.9), 0.9)
            .with_landmark(Keypoint::RightHip, Position2D::new(0.6, 0.5), 0.9)
            .with_landmark(Keypoint::RightKnee, Position2D::new(0.6, 0.7), 0.9)
            .with_landmark(Keypoint::RightAnkle, Position2D::new(0.6, 0.9), 0.9);

        let features = extractor.extract(&pose);
        assert!((features.combined.degrees - 180.0).abs() < 1e-3);
        assert!(features.combined.valid);
    }
}
