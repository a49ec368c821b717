//! Counter configuration.
//!
//! A single configuration struct covers both tuning variants of the counter
//! (lenient and strict) through [`CounterProfile`] presets. Configurations are
//! fixed for the lifetime of a counter and are validated before use.

use repsense_core::{Error, Keypoint, Result};
use serde::{Deserialize, Serialize};

/// Joint whose interior angle drives the phase signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedJoint {
    /// Shoulder-elbow-wrist (push-ups, curls, presses)
    #[default]
    Elbow,
    /// Hip-knee-ankle (squats, lunges)
    Knee,
}

/// Three keypoints forming one angle, with the vertex in the middle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointChain {
    pub proximal: Keypoint,
    pub vertex: Keypoint,
    pub distal: Keypoint,
}

impl TrackedJoint {
    /// Left and right chains for this joint
    pub fn chains(&self) -> (JointChain, JointChain) {
        match self {
            TrackedJoint::Elbow => (
                JointChain {
                    proximal: Keypoint::LeftShoulder,
                    vertex: Keypoint::LeftElbow,
                    distal: Keypoint::LeftWrist,
                },
                JointChain {
                    proximal: Keypoint::RightShoulder,
                    vertex: Keypoint::RightElbow,
                    distal: Keypoint::RightWrist,
                },
            ),
            TrackedJoint::Knee => (
                JointChain {
                    proximal: Keypoint::LeftHip,
                    vertex: Keypoint::LeftKnee,
                    distal: Keypoint::LeftAnkle,
                },
                JointChain {
                    proximal: Keypoint::RightHip,
                    vertex: Keypoint::RightKnee,
                    distal: Keypoint::RightAnkle,
                },
            ),
        }
    }
}

/// How left and right angles combine into one phase signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BilateralPolicy {
    /// Mean of both sides; invalid unless both sides are valid
    #[default]
    RequireBoth,
    /// Mean when both are valid, otherwise the single valid side
    AllowSingleSide,
}

/// Torso straightness gate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorsoGateConfig {
    /// Minimum straightness in degrees (180 = shoulders directly above hips)
    pub min_straightness: f64,
    /// Hold the current phase while the torso gate fails
    pub block_transitions: bool,
}

impl Default for TorsoGateConfig {
    fn default() -> Self {
        Self {
            min_straightness: 150.0,
            block_transitions: false,
        }
    }
}

/// Fallback to neutral after sustained out-of-form frames.
///
/// A dead-zone frame only counts as out of form when the angle has stopped
/// moving toward the opposite threshold, so a slow but steady rep is never
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormLossConfig {
    /// Consecutive out-of-form valid frames before dropping to neutral
    pub max_frames: u32,
    /// Minimum per-frame progress (degrees) for a dead-zone frame to count
    /// as moving
    pub stall_tolerance_deg: f64,
}

impl Default for FormLossConfig {
    fn default() -> Self {
        Self {
            max_frames: 30,
            stall_tolerance_deg: 0.5,
        }
    }
}

/// Named tuning presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterProfile {
    /// Lenient thresholds with a 3-frame debounce
    #[default]
    Standard,
    /// Narrower angle bands, torso gating and form-loss fallback
    Strict,
}

/// Complete counter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Minimum landmark confidence for an angle to be valid
    pub min_confidence: f32,

    /// Angle at or below which the candidate phase is DOWN (degrees)
    pub down_threshold: f64,

    /// Angle at or above which the candidate phase is UP (degrees)
    pub up_threshold: f64,

    /// Consecutive agreeing frames required to commit a phase change
    pub min_stable_frames: u32,

    pub tracked_joint: TrackedJoint,

    pub bilateral: BilateralPolicy,

    /// Optional torso straightness gate
    pub torso_gate: Option<TorsoGateConfig>,

    /// Optional buffered form-loss fallback
    pub form_loss: Option<FormLossConfig>,

    /// Consecutive invalid frames before feedback reports poor visibility
    pub visibility_timeout_frames: u32,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self::from_profile(CounterProfile::Standard)
    }
}

impl CounterConfig {
    pub fn from_profile(profile: CounterProfile) -> Self {
        match profile {
            CounterProfile::Standard => Self {
                min_confidence: 0.7,
                down_threshold: 70.0,
                up_threshold: 130.0,
                min_stable_frames: 3,
                tracked_joint: TrackedJoint::Elbow,
                bilateral: BilateralPolicy::RequireBoth,
                torso_gate: None,
                form_loss: None,
                visibility_timeout_frames: 15,
            },
            CounterProfile::Strict => Self {
                min_confidence: 0.5,
                down_threshold: 60.0,
                up_threshold: 140.0,
                min_stable_frames: 2,
                tracked_joint: TrackedJoint::Elbow,
                bilateral: BilateralPolicy::RequireBoth,
                torso_gate: Some(TorsoGateConfig {
                    min_straightness: 150.0,
                    block_transitions: true,
                }),
                form_loss: Some(FormLossConfig::default()),
                visibility_timeout_frames: 15,
            },
        }
    }

    /// Check every invariant the counter relies on
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(Error::InvalidConfidence(self.min_confidence));
        }

        check_angle("down_threshold", self.down_threshold)?;
        check_angle("up_threshold", self.up_threshold)?;

        if self.down_threshold >= self.up_threshold {
            return Err(Error::InvertedThresholds {
                down: self.down_threshold,
                up: self.up_threshold,
            });
        }

        if self.min_stable_frames < 1 {
            return Err(Error::InvalidStabilityWindow(self.min_stable_frames));
        }

        if let Some(gate) = &self.torso_gate {
            check_angle("torso_gate.min_straightness", gate.min_straightness)?;
        }

        if let Some(form_loss) = &self.form_loss {
            if form_loss.max_frames < 1 {
                return Err(Error::Config("form_loss.max_frames must be at least 1".into()));
            }
            if !(form_loss.stall_tolerance_deg.is_finite() && form_loss.stall_tolerance_deg >= 0.0)
            {
                return Err(Error::Config(
                    "form_loss.stall_tolerance_deg must be a non-negative number".into(),
                ));
            }
        }

        if self.visibility_timeout_frames < 1 {
            return Err(Error::Config(
                "visibility_timeout_frames must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Whether `degrees` falls strictly between the two thresholds
    pub fn in_dead_zone(&self, degrees: f64) -> bool {
        degrees > self.down_threshold && degrees < self.up_threshold
    }

    /// Load configuration from file, with `REPSENSE_*` environment overrides
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("REPSENSE").try_parsing(true))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Self::finish(settings)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("REPSENSE").try_parsing(true))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Self::finish(settings)
    }

    fn finish(settings: config::Config) -> Result<Self> {
        let config: Self = settings
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

fn check_angle(name: &'static str, value: f64) -> Result<()> {
    if (0.0..=180.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::ThresholdOutOfRange { name, value })
    }
}
