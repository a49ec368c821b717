//! Coarse form feedback for UI binding.
//!
//! Wording is free to change; tests and hosts should match on the
//! [`FormFeedback`] variant rather than the message text.

use serde::{Deserialize, Serialize};

use crate::config::CounterConfig;
use crate::phase::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormFeedback {
    /// No confirmed position yet
    GetInPosition,
    /// Extended and ready to descend
    GoDown,
    /// Descending but not yet deep enough
    GoLower,
    /// At the bottom, ready to push back up
    PushUp,
    /// Rising from the bottom but not yet fully extended
    NotEnoughExtension,
    /// Torso gate failing
    KeepTorsoStraight,
    /// Required joints missing or low confidence for a sustained period
    PoorVisibility,
}

impl FormFeedback {
    /// Derive feedback from the latest valid angle, the committed phase and
    /// the latest torso reading.
    pub fn derive(
        config: &CounterConfig,
        phase: Phase,
        last_angle: Option<f64>,
        torso_ok: Option<bool>,
    ) -> Self {
        if torso_ok == Some(false) {
            return FormFeedback::KeepTorsoStraight;
        }

        let Some(angle) = last_angle else {
            return FormFeedback::GetInPosition;
        };

        if angle <= config.down_threshold {
            FormFeedback::PushUp
        } else if angle >= config.up_threshold {
            FormFeedback::GoDown
        } else {
            match phase {
                Phase::Up => FormFeedback::GoLower,
                Phase::Down => FormFeedback::NotEnoughExtension,
                Phase::Neutral => FormFeedback::GetInPosition,
            }
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            FormFeedback::GetInPosition => "Get into position",
            FormFeedback::GoDown => "Good! Now go down",
            FormFeedback::GoLower => "Keep going down",
            FormFeedback::PushUp => "Good! Now push up",
            FormFeedback::NotEnoughExtension => "Hold - not enough extension",
            FormFeedback::KeepTorsoStraight => "Keep your body straight!",
            FormFeedback::PoorVisibility => "Move into view of the camera",
        }
    }

    /// Coarse form signal: false when the subject is out of form or not visible
    pub fn is_form_ok(&self) -> bool {
        !matches!(
            self,
            FormFeedback::KeepTorsoStraight | FormFeedback::PoorVisibility
        )
    }
}
