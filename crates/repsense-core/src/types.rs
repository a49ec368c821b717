//! Fundamental types for the repsense system.

use chrono::{DateTime, Utc};
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Workout session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Timestamp wrapper with nanosecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_nanos_opt().unwrap_or(0))
    }

    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.0)
    }
}

/// 2D landmark position in frame-local coordinates.
///
/// Units are whatever the pose producer emits (pixels or normalized);
/// only consistency across landmarks of one frame matters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position2D {
    pub x: f64,
    pub y: f64,
}

impl Position2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn to_nalgebra(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    /// Vector pointing from `self` to `other`
    pub fn vector_to(&self, other: &Self) -> Vector2<f64> {
        other.to_nalgebra() - self.to_nalgebra()
    }

    pub fn midpoint(&self, other: &Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        self.vector_to(other).norm()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// 17-joint skeletal keypoint definition (COCO format)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Keypoint {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl Keypoint {
    pub const COUNT: usize = 17;

    pub const ALL: [Keypoint; Keypoint::COUNT] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    pub fn from_index(idx: u8) -> Option<Self> {
        Self::ALL.get(idx as usize).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Keypoint detection with confidence score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub keypoint: Keypoint,
    pub position: Position2D,
    /// Detection confidence in [0, 1]
    pub confidence: f32,
}

impl Landmark {
    pub fn new(keypoint: Keypoint, position: Position2D, confidence: f32) -> Self {
        Self {
            keypoint,
            position,
            confidence,
        }
    }

    /// True when the detection clears `min_confidence` and has finite coordinates.
    /// NaN confidence never passes.
    pub fn is_reliable(&self, min_confidence: f32) -> bool {
        self.confidence >= min_confidence && self.position.is_finite()
    }
}

/// All landmarks reported for a single processed frame.
///
/// Joints the producer did not report are `None` and read as confidence 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseSnapshot {
    pub timestamp: Timestamp,
    pub landmarks: [Option<Landmark>; Keypoint::COUNT],
}

impl PoseSnapshot {
    /// Number of values per keypoint in a flat buffer: x, y, confidence
    pub const FLAT_STRIDE: usize = 3;

    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            landmarks: [None; Keypoint::COUNT],
        }
    }

    /// Builder-style insertion, handy for hosts and tests
    pub fn with_landmark(mut self, keypoint: Keypoint, position: Position2D, confidence: f32) -> Self {
        self.insert(Landmark::new(keypoint, position, confidence));
        self
    }

    /// Build a snapshot from a flat `[x, y, confidence] * 17` buffer in COCO order.
    ///
    /// Entries with confidence <= 0 are treated as missing.
    pub fn from_flat(timestamp: Timestamp, data: &[f32]) -> Result<Self> {
        let expected = Keypoint::COUNT * Self::FLAT_STRIDE;
        if data.len() != expected {
            return Err(Error::InvalidInput(format!(
                "landmark buffer length {} (expected {})",
                data.len(),
                expected
            )));
        }

        let mut snapshot = Self::new(timestamp);
        for (keypoint, chunk) in Keypoint::ALL.iter().zip(data.chunks_exact(Self::FLAT_STRIDE)) {
            let confidence = chunk[2];
            if confidence > 0.0 {
                snapshot.insert(Landmark::new(
                    *keypoint,
                    Position2D::new(chunk[0] as f64, chunk[1] as f64),
                    confidence,
                ));
            }
        }

        Ok(snapshot)
    }

    pub fn insert(&mut self, landmark: Landmark) {
        self.landmarks[landmark.keypoint.index()] = Some(landmark);
    }

    pub fn remove(&mut self, keypoint: Keypoint) -> Option<Landmark> {
        self.landmarks[keypoint.index()].take()
    }

    pub fn get(&self, keypoint: Keypoint) -> Option<&Landmark> {
        self.landmarks[keypoint.index()].as_ref()
    }

    /// Confidence of a joint, 0 when missing
    pub fn confidence(&self, keypoint: Keypoint) -> f32 {
        self.get(keypoint).map_or(0.0, |lm| lm.confidence)
    }

    pub fn landmark_count(&self) -> usize {
        self.landmarks.iter().flatten().count()
    }
}
