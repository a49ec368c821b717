//! # Repsense-Core
//!
//! Core types and geometry for the repsense repetition counter:
//! pose landmarks as delivered by an upstream pose estimator, and the
//! joint-angle math the counter is driven by.

pub mod error;
pub mod geometry;
pub mod types;

pub use error::{Error, Result};
pub use geometry::*;
pub use types::*;
