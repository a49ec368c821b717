//! Exercise phases and committed transitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete exercise position derived from the tracked joint angle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No confirmed position yet (initial state)
    #[default]
    Neutral,
    /// Joint extended
    Up,
    /// Joint flexed
    Down,
}

impl Phase {
    /// Display label for UI binding
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Neutral => "Get in position",
            Phase::Up => "UP - Go down",
            Phase::Down => "DOWN - Push up!",
        }
    }

    /// Short machine-friendly name
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Neutral => "neutral",
            Phase::Up => "up",
            Phase::Down => "down",
        }
    }

    pub fn is_engaged(&self) -> bool {
        matches!(self, Phase::Up | Phase::Down)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A committed phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
}

impl PhaseTransition {
    pub fn new(from: Phase, to: Phase) -> Self {
        Self { from, to }
    }

    /// Only DOWN → UP completes a repetition
    pub fn completes_rep(&self) -> bool {
        self.from == Phase::Down && self.to == Phase::Up
    }
}
