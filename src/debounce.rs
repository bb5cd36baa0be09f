//! Temporal debounce engine.
//!
//! Turns a per-frame evidence stream into a hysteretic `Alert`/`Drowsy`
//! signal. Entry and recovery use independent consecutive-frame
//! thresholds, and detector dropouts are absorbed by an asymmetric
//! missing-frame policy: a short gap neither releases an ongoing alarm
//! nor destroys evidence already accumulated, while a gap beyond the
//! configured tolerance makes prior evidence stale.
//!
//! `update()` is a pure, bounded-time computation over one owned
//! [`DebounceState`] per subject. Single-writer-per-key discipline is the
//! caller's contract; subjects share no mutable state.

use thiserror::Error;

use crate::score::{Evidence, LowConfidencePolicy};
use crate::AlertState;

/// Invalid threshold values. Fatal at session start; the engine refuses
/// to initialize, and no frame is ever processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("intensity_threshold must be within [0, 1], got {0}")]
    IntensityOutOfRange(f32),
    #[error("consecutive_positive_frames must be at least 1")]
    ZeroEntryDebounce,
    #[error("recovery_frames must be at least 1")]
    ZeroRecoveryDebounce,
    #[error("rearm_gap_frames must be at least 1 when set")]
    ZeroRearmGap,
}

/// Immutable per-session debounce configuration.
///
/// Validated at construction; a 0-frame entry or recovery threshold would
/// degenerate the state machine to immediate, unstable switching and is
/// rejected.
#[derive(Clone, Copy, Debug)]
pub struct Thresholds {
    intensity_threshold: f32,
    consecutive_positive_frames: u32,
    consecutive_missing_frames: u32,
    recovery_frames: u32,
    low_confidence_policy: LowConfidencePolicy,
    rearm_gap_frames: Option<u32>,
}

impl Thresholds {
    pub fn new(
        intensity_threshold: f32,
        consecutive_positive_frames: u32,
        consecutive_missing_frames: u32,
        recovery_frames: u32,
    ) -> Result<Self, ConfigError> {
        if !intensity_threshold.is_finite() || !(0.0..=1.0).contains(&intensity_threshold) {
            return Err(ConfigError::IntensityOutOfRange(intensity_threshold));
        }
        if consecutive_positive_frames == 0 {
            return Err(ConfigError::ZeroEntryDebounce);
        }
        if recovery_frames == 0 {
            return Err(ConfigError::ZeroRecoveryDebounce);
        }
        Ok(Self {
            intensity_threshold,
            consecutive_positive_frames,
            consecutive_missing_frames,
            recovery_frames,
            low_confidence_policy: LowConfidencePolicy::default(),
            rearm_gap_frames: None,
        })
    }

    pub fn with_low_confidence_policy(mut self, policy: LowConfidencePolicy) -> Self {
        self.low_confidence_policy = policy;
        self
    }

    /// Enable automatic re-arm after a detection gap of `gap` frames.
    pub fn with_rearm_gap(mut self, gap: u32) -> Result<Self, ConfigError> {
        if gap == 0 {
            return Err(ConfigError::ZeroRearmGap);
        }
        self.rearm_gap_frames = Some(gap);
        Ok(self)
    }

    pub fn intensity_threshold(&self) -> f32 {
        self.intensity_threshold
    }

    pub fn consecutive_positive_frames(&self) -> u32 {
        self.consecutive_positive_frames
    }

    pub fn consecutive_missing_frames(&self) -> u32 {
        self.consecutive_missing_frames
    }

    pub fn recovery_frames(&self) -> u32 {
        self.recovery_frames
    }

    pub fn low_confidence_policy(&self) -> LowConfidencePolicy {
        self.low_confidence_policy
    }

    pub fn rearm_gap_frames(&self) -> Option<u32> {
        self.rearm_gap_frames
    }

    /// Cap for the missing-run counter: counting further than every
    /// threshold that reads it buys nothing.
    fn missing_run_cap(&self) -> u32 {
        let tolerance_cap = self.consecutive_missing_frames.saturating_add(1);
        match self.rearm_gap_frames {
            Some(gap) => tolerance_cap.max(gap.saturating_add(1)),
            None => tolerance_cap,
        }
    }
}

/// Per-subject debounce state. Owned exclusively by the engine's caller
/// and mutated only through [`DebounceEngine::update`].
#[derive(Clone, Debug)]
pub struct DebounceState {
    state: AlertState,
    positive_run: u32,
    negative_run: u32,
    missing_run: u32,
    last_transition_seq: Option<u64>,
    last_valid_seq: Option<u64>,
}

impl DebounceState {
    pub fn new() -> Self {
        Self {
            state: AlertState::Alert,
            positive_run: 0,
            negative_run: 0,
            missing_run: 0,
            last_transition_seq: None,
            last_valid_seq: None,
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    /// Frame sequence number of the last state transition, if any.
    pub fn last_transition_seq(&self) -> Option<u64> {
        self.last_transition_seq
    }

    /// Frame sequence number of the last valid (non-missing) observation.
    pub fn last_valid_seq(&self) -> Option<u64> {
        self.last_valid_seq
    }

    /// Zero all counters and force the state back to `Alert`.
    ///
    /// Used on session restart and when a subject re-enters view after a
    /// prolonged absence. A forced reset is a lifecycle action, not a
    /// debounce transition, so it emits no event.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for DebounceState {
    fn default() -> Self {
        Self::new()
    }
}

/// An `Alert <-> Drowsy` state change produced by a single update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateChange {
    pub from: AlertState,
    pub to: AlertState,
}

/// The debounce state machine. Holds only the immutable thresholds;
/// per-subject mutable state lives in [`DebounceState`].
#[derive(Clone, Debug)]
pub struct DebounceEngine {
    thresholds: Thresholds,
}

impl DebounceEngine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Apply one frame of evidence to a subject's state.
    ///
    /// Returns `Some(StateChange)` exactly when this frame crosses a
    /// debounce threshold; all other frames return `None`.
    pub fn update(
        &self,
        state: &mut DebounceState,
        seq: u64,
        evidence: Evidence,
    ) -> Option<StateChange> {
        if evidence == Evidence::Missing {
            if state.missing_run < self.thresholds.missing_run_cap() {
                state.missing_run += 1;
            }
            if state.missing_run > self.thresholds.consecutive_missing_frames {
                // The gap is inconclusive: evidence accumulated before it
                // is stale. State itself persists; a driver who closed
                // their eyes is not rescued by the camera losing the face.
                state.positive_run = 0;
                state.negative_run = 0;
            }
            // Missing frames never transition.
            return None;
        }

        if let Some(gap) = self.thresholds.rearm_gap_frames {
            if state.missing_run > gap {
                log::debug!("re-arming at seq {} after {}-frame gap", seq, state.missing_run);
                state.reset();
            }
        }
        state.missing_run = 0;
        state.last_valid_seq = Some(seq);

        if evidence == Evidence::Positive {
            state.negative_run = 0;
            if state.positive_run < self.thresholds.consecutive_positive_frames {
                state.positive_run += 1;
            }
        } else {
            state.positive_run = 0;
            if state.negative_run < self.thresholds.recovery_frames {
                state.negative_run += 1;
            }
        }

        let next = match state.state {
            AlertState::Alert
                if state.positive_run >= self.thresholds.consecutive_positive_frames =>
            {
                AlertState::Drowsy
            }
            AlertState::Drowsy if state.negative_run >= self.thresholds.recovery_frames => {
                AlertState::Alert
            }
            unchanged => unchanged,
        };

        if next == state.state {
            return None;
        }
        let change = StateChange {
            from: state.state,
            to: next,
        };
        state.state = next;
        state.last_transition_seq = Some(seq);
        Some(change)
    }
}
