//! Synthetic detector backends.
//!
//! Stand-ins for a real landmark or classifier model, in the same spirit
//! as a `stub://` camera source: `ScriptedBackend` replays a fixed ratio
//! sequence (tests, offline replay), `SyntheticEarBackend` generates a
//! periodic eyes-closed stretch with occasional dropouts so the daemon
//! exercises the whole pipeline without hardware.

use anyhow::Result;

use crate::score::{RawScore, ScoreKind};

use super::backend::DetectorBackend;

/// Replays a scripted sequence of openness ratios. `None` entries are
/// no-detection frames. The script repeats from the start when
/// exhausted.
pub struct ScriptedBackend {
    name: &'static str,
    script: Vec<Option<f32>>,
    cursor: usize,
}

impl ScriptedBackend {
    pub fn new(name: &'static str, script: Vec<Option<f32>>) -> Self {
        Self {
            name,
            script,
            cursor: 0,
        }
    }
}

impl DetectorBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> ScoreKind {
        ScoreKind::GeometricRatio
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<Option<RawScore>> {
        if self.script.is_empty() {
            return Ok(None);
        }
        let entry = self.script[self.cursor % self.script.len()];
        self.cursor += 1;
        Ok(entry.map(|ratio| RawScore::GeometricRatio { ratio }))
    }
}

/// Deterministic synthetic EAR wave for the stub daemon.
///
/// Eyes stay open at `open_ratio` most of the time, close to
/// `closed_ratio` for `closed_span` frames once per `period`, and every
/// `dropout_every`-th frame loses the face entirely.
pub struct SyntheticEarBackend {
    frame: u64,
    period: u64,
    closed_span: u64,
    open_ratio: f32,
    closed_ratio: f32,
    dropout_every: u64,
}

impl SyntheticEarBackend {
    pub fn new(period: u64, closed_span: u64, dropout_every: u64) -> Self {
        Self {
            frame: 0,
            period: period.max(1),
            closed_span,
            open_ratio: 0.32,
            closed_ratio: 0.18,
            dropout_every,
        }
    }
}

impl Default for SyntheticEarBackend {
    fn default() -> Self {
        // At 10 fps: ~4 s of closed eyes every 30 s, one dropout every 97
        // frames.
        Self::new(300, 40, 97)
    }
}

impl DetectorBackend for SyntheticEarBackend {
    fn name(&self) -> &'static str {
        "synthetic-ear"
    }

    fn kind(&self) -> ScoreKind {
        ScoreKind::GeometricRatio
    }

    fn detect(&mut self, _pixels: &[u8], _width: u32, _height: u32) -> Result<Option<RawScore>> {
        let frame = self.frame;
        self.frame += 1;

        if self.dropout_every != 0 && frame % self.dropout_every == self.dropout_every - 1 {
            return Ok(None);
        }
        let ratio = if frame % self.period < self.closed_span {
            self.closed_ratio
        } else {
            self.open_ratio
        };
        Ok(Some(RawScore::GeometricRatio { ratio }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_backend_replays_and_wraps() {
        let mut backend = ScriptedBackend::new("scripted-ear", vec![Some(0.2), None]);

        let first = backend.detect(&[], 0, 0).expect("detect");
        assert_eq!(first, Some(RawScore::GeometricRatio { ratio: 0.2 }));
        let second = backend.detect(&[], 0, 0).expect("detect");
        assert_eq!(second, None);
        let third = backend.detect(&[], 0, 0).expect("detect");
        assert_eq!(third, Some(RawScore::GeometricRatio { ratio: 0.2 }));
    }

    #[test]
    fn synthetic_backend_closes_eyes_periodically() {
        let mut backend = SyntheticEarBackend::new(10, 3, 0);
        let mut closed = 0;
        for _ in 0..10 {
            if let Some(RawScore::GeometricRatio { ratio }) =
                backend.detect(&[], 0, 0).expect("detect")
            {
                if ratio < 0.25 {
                    closed += 1;
                }
            }
        }
        assert_eq!(closed, 3);
    }

    #[test]
    fn synthetic_backend_drops_detections_on_schedule() {
        let mut backend = SyntheticEarBackend::new(1000, 0, 5);
        let mut missing = 0;
        for _ in 0..10 {
            if backend.detect(&[], 0, 0).expect("detect").is_none() {
                missing += 1;
            }
        }
        assert_eq!(missing, 2);
    }
}
