//! Joint-angle geometry on 2D landmark positions.
//!
//! Everything here is a pure function of its inputs. Degenerate or
//! non-finite geometry never produces NaN; it yields `None` (or an invalid
//! [`AngleSample`]) instead.

use serde::{Deserialize, Serialize};

use crate::types::Position2D;

/// Angle reported when a measurement is unavailable (fully extended joint)
pub const DEFAULT_ANGLE_DEG: f64 = 180.0;

/// Vectors shorter than this are treated as zero length
pub const DEGENERATE_EPSILON: f64 = 1e-9;

/// One derived angle measurement in degrees, in [0, 180]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleSample {
    pub degrees: f64,
    /// True only when every landmark feeding the angle was present and confident
    pub valid: bool,
}

impl AngleSample {
    pub fn new(degrees: f64) -> Self {
        Self {
            degrees,
            valid: true,
        }
    }

    /// Missing-data sample: reads as fully extended so it never looks like a fold
    pub fn invalid() -> Self {
        Self {
            degrees: DEFAULT_ANGLE_DEG,
            valid: false,
        }
    }

    /// Valid sample from an optional measurement
    pub fn from_option(degrees: Option<f64>) -> Self {
        degrees.map_or_else(Self::invalid, Self::new)
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Angle when valid
    pub fn value(&self) -> Option<f64> {
        self.valid.then_some(self.degrees)
    }
}

impl Default for AngleSample {
    fn default() -> Self {
        Self::invalid()
    }
}

/// Interior angle at `vertex` between the rays to `a` and `c`, in degrees.
///
/// cos(θ) = (v1 · v2) / (|v1| × |v2|), clamped to [-1, 1] before `acos`.
/// Returns `None` for zero-length rays or non-finite input.
pub fn interior_angle(a: Position2D, vertex: Position2D, c: Position2D) -> Option<f64> {
    if !(a.is_finite() && vertex.is_finite() && c.is_finite()) {
        return None;
    }

    let v1 = vertex.vector_to(&a);
    let v2 = vertex.vector_to(&c);

    let mag1 = v1.norm();
    let mag2 = v2.norm();
    if mag1 < DEGENERATE_EPSILON || mag2 < DEGENERATE_EPSILON {
        return None;
    }

    let cos_angle = (v1.dot(&v2) / (mag1 * mag2)).clamp(-1.0, 1.0);
    let degrees = cos_angle.acos().to_degrees();

    // Overflowing magnitudes can still slip a NaN through the division
    degrees.is_finite().then_some(degrees)
}

/// Straightness of the segment `upper`→`lower` relative to image vertical.
///
/// 180° means perfectly vertical alignment; 90° means horizontal.
/// Computed as 180° − atan(|Δx| / |Δy|).
pub fn vertical_straightness(upper: Position2D, lower: Position2D) -> Option<f64> {
    if !(upper.is_finite() && lower.is_finite()) {
        return None;
    }

    let dx = (upper.x - lower.x).abs();
    let dy = (upper.y - lower.y).abs();

    if dy < DEGENERATE_EPSILON {
        return Some(90.0);
    }

    Some(DEFAULT_ANGLE_DEG - (dx / dy).atan().to_degrees())
}
