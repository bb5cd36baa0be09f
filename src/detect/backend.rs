use anyhow::Result;

use crate::score::{RawScore, ScoreKind};

/// Detector backend trait.
///
/// A backend owns its model invocation and landmark math; the core only
/// requires one raw score per frame, or `None` when no face/eyes were
/// found. Backends must treat the pixel slice as read-only and
/// ephemeral, and must not block: the whole per-frame path has to
/// complete well under one frame interval.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Semantic kind of the scores this backend produces.
    fn kind(&self) -> ScoreKind;

    /// Run detection on a frame. `Ok(None)` is a normal no-detection
    /// frame, not an error.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Option<RawScore>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
