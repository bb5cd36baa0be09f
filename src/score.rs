//! Score adapter: normalizes heterogeneous detector outputs onto one
//! detector-agnostic evidence scale.
//!
//! The debounce engine only needs to know whether a frame counts as
//! positive evidence of drowsiness, negative evidence, or no evidence at
//! all (detection dropout). Both the geometric eye-aspect-ratio method
//! and a classifier confidence map onto [`Evidence`] here, so either can
//! drive the same state machine without touching it.

use serde::{Deserialize, Serialize};

use crate::debounce::Thresholds;
use crate::FrameObservation;

/// Class predicted by a drowsiness classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictedLabel {
    Drowsy,
    NotDrowsy,
}

/// Semantic kind of a raw detector score.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreKind {
    GeometricRatio,
    ClassifierConfidence,
}

/// Raw per-frame detector output, tagged with its semantic kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawScore {
    /// Eye-aspect-ratio style openness ratio. Lower means more closed.
    GeometricRatio { ratio: f32 },
    /// Classifier output: predicted class plus confidence in [0, 1].
    ClassifierConfidence {
        label: PredictedLabel,
        confidence: f32,
    },
}

impl RawScore {
    pub fn kind(&self) -> ScoreKind {
        match self {
            RawScore::GeometricRatio { .. } => ScoreKind::GeometricRatio,
            RawScore::ClassifierConfidence { .. } => ScoreKind::ClassifierConfidence,
        }
    }
}

/// What one frame contributes to the debounce counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Evidence {
    /// Frame counts toward the entry debounce (eyes closed / drowsy).
    Positive,
    /// Valid frame counting toward recovery.
    Negative,
    /// No detection this frame. Handled by the dropout policy, never a
    /// fault.
    Missing,
}

/// How to treat a classifier frame whose confidence falls below the
/// intensity threshold. The source prototypes disagree on this, so it is
/// an explicit policy rather than a silent choice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LowConfidencePolicy {
    /// Low-confidence frames count as positive evidence.
    FailSafe,
    /// Low-confidence frames count as negative evidence.
    #[default]
    FailOpen,
}

/// Normalize one observation into debounce evidence.
///
/// Pure function of the observation plus static configuration. Returns
/// `None` when the score is malformed (non-finite, out of range); the
/// caller logs and skips such frames without touching any counter.
pub fn frame_evidence(observation: &FrameObservation, thresholds: &Thresholds) -> Option<Evidence> {
    let Some(score) = observation.score else {
        return Some(Evidence::Missing);
    };
    match score {
        RawScore::GeometricRatio { ratio } => {
            if !ratio.is_finite() || ratio < 0.0 {
                return None;
            }
            // Ratio below the closure threshold counts as closed eyes.
            if ratio < thresholds.intensity_threshold() {
                Some(Evidence::Positive)
            } else {
                Some(Evidence::Negative)
            }
        }
        RawScore::ClassifierConfidence { label, confidence } => {
            if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
                return None;
            }
            if confidence < thresholds.intensity_threshold() {
                return Some(match thresholds.low_confidence_policy() {
                    LowConfidencePolicy::FailSafe => Evidence::Positive,
                    LowConfidencePolicy::FailOpen => Evidence::Negative,
                });
            }
            if label == PredictedLabel::Drowsy {
                Some(Evidence::Positive)
            } else {
                Some(Evidence::Negative)
            }
        }
    }
}
