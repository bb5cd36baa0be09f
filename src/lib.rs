//! vigil-monitor - temporal decision core for driver vigilance monitoring.
//!
//! A detector (external: geometric eye-aspect-ratio math or an ML
//! classifier) produces one noisy score per frame. This crate turns that
//! stream into a debounced alert signal:
//!
//! ```text
//! frame -> DetectorBackend -> RawScore | no detection
//!       -> score adapter   -> Evidence (positive / negative / missing)
//!       -> DebounceEngine  -> AlertState + TransitionEvent
//! ```
//!
//! The engine never trips on a single frame: entering `Drowsy` requires
//! `consecutive_positive_frames` of sustained evidence, and returning to
//! `Alert` requires an independent `recovery_frames` run, so the reported
//! state cannot flap at the decision boundary. Detector dropouts are
//! absorbed by the missing-frame policy rather than treated as recovery.
//!
//! Out of scope (external collaborators): landmark extraction, model
//! loading, camera IO, display, dashboards, alert persistence.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod config;
pub mod debounce;
pub mod detect;
pub mod score;
pub mod session;

pub use config::MonitorConfig;
pub use debounce::{ConfigError, DebounceEngine, DebounceState, Thresholds};
pub use score::{Evidence, LowConfidencePolicy, PredictedLabel, RawScore, ScoreKind};
pub use session::{LogSink, MonitorSession, TransitionSink};

/// Debounced state reported for one subject.
///
/// `Alert` is the initial state. Transitions happen only through
/// [`DebounceEngine::update`], never on a single frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    Alert,
    Drowsy,
}

/// Stable identifier for one tracked face/driver across frames.
///
/// Identity association is the external tracker's job; the core only
/// requires that the same subject carries the same key on every frame.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectKey(String);

impl SubjectKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// One detector output for one frame.
///
/// `seq` is a monotonic frame-sequence number supplied by the detector.
/// `score: None` means no face/eyes were found this frame, which is
/// distinct from a confident "not drowsy" score.
///
/// Ephemeral: produced once, consumed once by [`MonitorSession::observe`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameObservation {
    pub seq: u64,
    pub score: Option<RawScore>,
}

impl FrameObservation {
    /// Valid observation carrying a detector score.
    pub fn detected(seq: u64, score: RawScore) -> Self {
        Self {
            seq,
            score: Some(score),
        }
    }

    /// No-detection frame (face/eyes not found).
    pub fn missing(seq: u64) -> Self {
        Self { seq, score: None }
    }

    /// False when no face/eyes were found this frame.
    pub fn is_valid(&self) -> bool {
        self.score.is_some()
    }
}

/// Emitted exactly once per actual `Alert <-> Drowsy` transition, in
/// observation order. Frames that do not cross a threshold emit nothing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub subject: SubjectKey,
    pub from: AlertState,
    pub to: AlertState,
    /// Frame sequence number of the triggering observation.
    pub seq: u64,
    pub trigger: FrameObservation,
}
