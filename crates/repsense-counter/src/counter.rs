//! Debounced phase state machine and repetition counter.
//!
//! ## Per-frame update
//!
//! 1. Invalid samples are skipped: no state changes, count returned as-is.
//! 2. The angle is classified into a candidate phase:
//!    `angle <= down` → DOWN, `angle >= up` → UP, otherwise the current phase
//!    (the dead zone holds the last confirmed phase).
//! 3. Debounce: agreeing candidates increment the stability counter, a new
//!    candidate restarts it at 1.
//! 4. Once the candidate has been stable for `min_stable_frames` and differs
//!    from the current phase, the transition is committed. Only DOWN → UP
//!    increments the repetition count.

use repsense_core::{AngleSample, Result};

use crate::config::CounterConfig;
use crate::features::FrameFeatures;
use crate::feedback::FormFeedback;
use crate::phase::{Phase, PhaseTransition};

/// Repetition counter for a single tracked subject.
///
/// Not internally synchronized: feed it from one thread at a time.
#[derive(Debug, Clone)]
pub struct PhaseCounter {
    config: CounterConfig,
    current_phase: Phase,
    /// Candidate phase not yet committed
    pending_phase: Phase,
    /// Consecutive frames supporting `pending_phase`
    stable_frames: u32,
    rep_count: u32,
    last_transition: Option<PhaseTransition>,
    /// Latest valid phase-signal angle
    last_angle: Option<f64>,
    /// Latest torso reading, `None` when unknown
    last_torso: Option<f64>,
    /// Consecutive out-of-form frames while engaged
    form_loss_frames: u32,
}

impl PhaseCounter {
    /// Create a counter; fails if the configuration is malformed
    pub fn new(config: CounterConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            current_phase: Phase::Neutral,
            pending_phase: Phase::Neutral,
            stable_frames: 0,
            rep_count: 0,
            last_transition: None,
            last_angle: None,
            last_torso: None,
            form_loss_frames: 0,
        })
    }

    /// Ingest one phase-signal sample and return the current repetition count.
    ///
    /// This path carries no torso reading: a valid sample clears the last
    /// one, so a configured torso gate sees an unknown torso and never fails.
    /// Use [`Self::ingest_features`] to apply the gate.
    pub fn ingest(&mut self, sample: AngleSample) -> u32 {
        self.ingest_with_torso(sample, AngleSample::invalid())
    }

    /// Ingest a full frame, including its torso reading
    pub fn ingest_features(&mut self, features: &FrameFeatures) -> u32 {
        self.ingest_with_torso(features.combined, features.torso)
    }

    fn ingest_with_torso(&mut self, sample: AngleSample, torso: AngleSample) -> u32 {
        let Some(angle) = sample.value() else {
            tracing::trace!("Skipping invalid frame, phase held at {}", self.current_phase);
            return self.rep_count;
        };

        let previous_angle = self.last_angle.replace(angle);
        self.last_torso = torso.value();

        let torso_failing = self.torso_failing();
        let blocked = torso_failing
            && self
                .config
                .torso_gate
                .is_some_and(|gate| gate.block_transitions);

        let candidate = if blocked {
            self.current_phase
        } else {
            self.classify(angle)
        };

        if candidate == self.pending_phase {
            self.stable_frames = self.stable_frames.saturating_add(1);
        } else {
            self.pending_phase = candidate;
            self.stable_frames = 1;
        }

        if self.stable_frames >= self.config.min_stable_frames
            && self.pending_phase != self.current_phase
        {
            self.commit(self.pending_phase, angle);
        }

        self.track_form_loss(angle, previous_angle, torso_failing);

        self.rep_count
    }

    /// Map an angle to its candidate phase
    fn classify(&self, angle: f64) -> Phase {
        if angle <= self.config.down_threshold {
            Phase::Down
        } else if angle >= self.config.up_threshold {
            Phase::Up
        } else {
            self.current_phase
        }
    }

    fn commit(&mut self, to: Phase, angle: f64) {
        let transition = PhaseTransition::new(self.current_phase, to);
        self.current_phase = to;
        self.last_transition = Some(transition);

        tracing::debug!(
            "Phase {} -> {} at {:.1}° after {} stable frames",
            transition.from,
            transition.to,
            angle,
            self.stable_frames
        );

        if transition.completes_rep() {
            self.rep_count = self.rep_count.saturating_add(1);
            tracing::info!("Repetition completed, count: {}", self.rep_count);
        }
    }

    fn track_form_loss(&mut self, angle: f64, previous_angle: Option<f64>, torso_failing: bool) {
        let Some(form_loss) = self.config.form_loss else {
            return;
        };

        let stalled = self.config.in_dead_zone(angle)
            && !self.progressing(angle, previous_angle, form_loss.stall_tolerance_deg);
        let out_of_form = torso_failing || stalled;
        if !(self.current_phase.is_engaged() && out_of_form) {
            self.form_loss_frames = 0;
            return;
        }

        self.form_loss_frames += 1;
        if self.form_loss_frames >= form_loss.max_frames {
            let transition = PhaseTransition::new(self.current_phase, Phase::Neutral);
            tracing::debug!(
                "Form lost for {} frames, phase {} -> {}",
                self.form_loss_frames,
                transition.from,
                transition.to
            );

            self.current_phase = Phase::Neutral;
            self.pending_phase = Phase::Neutral;
            self.stable_frames = 0;
            self.form_loss_frames = 0;
            self.last_transition = Some(transition);
        }
    }

    /// Whether the angle moved toward the threshold opposite the committed phase
    fn progressing(&self, angle: f64, previous_angle: Option<f64>, tolerance: f64) -> bool {
        let Some(previous) = previous_angle else {
            return false;
        };

        match self.current_phase {
            Phase::Down => angle - previous > tolerance,
            Phase::Up => previous - angle > tolerance,
            Phase::Neutral => false,
        }
    }

    fn torso_failing(&self) -> bool {
        match (self.config.torso_gate, self.last_torso) {
            (Some(gate), Some(torso)) => torso < gate.min_straightness,
            _ => false,
        }
    }

    /// Return all state to construction values
    pub fn reset(&mut self) {
        self.current_phase = Phase::Neutral;
        self.pending_phase = Phase::Neutral;
        self.stable_frames = 0;
        self.rep_count = 0;
        self.last_transition = None;
        self.last_angle = None;
        self.last_torso = None;
        self.form_loss_frames = 0;
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn phase(&self) -> Phase {
        self.current_phase
    }

    pub fn phase_label(&self) -> &'static str {
        self.current_phase.label()
    }

    pub fn pending_phase(&self) -> Phase {
        self.pending_phase
    }

    pub fn stable_frames(&self) -> u32 {
        self.stable_frames
    }

    pub fn last_transition(&self) -> Option<PhaseTransition> {
        self.last_transition
    }

    pub fn last_angle(&self) -> Option<f64> {
        self.last_angle
    }

    pub fn last_torso(&self) -> Option<f64> {
        self.last_torso
    }

    pub fn feedback(&self) -> FormFeedback {
        let torso_ok = self
            .config
            .torso_gate
            .and(self.last_torso)
            .map(|_| !self.torso_failing());

        FormFeedback::derive(&self.config, self.current_phase, self.last_angle, torso_ok)
    }

    /// Engaged in the exercise and not failing the torso gate
    pub fn in_good_form(&self) -> bool {
        self.current_phase.is_engaged() && !self.torso_failing()
    }

    pub fn config(&self) -> &CounterConfig {
        &self.config
    }
}
