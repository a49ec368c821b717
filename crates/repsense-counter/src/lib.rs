//! # RepSense Counter
//!
//! Repetition counting for bodyweight exercises from 2D pose landmarks.
//!
//! ## Pipeline
//!
//! 1. **Features** - Confidence-gated joint angles per frame, combined across
//!    both sides of the body
//! 2. **Phase counter** - Debounced UP/DOWN state machine over the combined
//!    angle; a rep is counted on each committed DOWN to UP transition
//! 3. **Tracker** - Per-frame facade adding visibility tracking and a
//!    serializable status for UI binding
//! 4. **Session** - In-memory tally of reps and earned minutes
//!
//! ## Thresholds
//!
//! Angles at or below `down_threshold` read as DOWN, at or above
//! `up_threshold` as UP. Anything between is a dead zone that holds the
//! current phase.

pub mod config;
pub mod counter;
pub mod features;
pub mod feedback;
pub mod phase;
pub mod session;
pub mod tracker;

pub use config::*;
pub use counter::*;
pub use features::*;
pub use feedback::*;
pub use phase::*;
pub use session::*;
pub use tracker::*;
