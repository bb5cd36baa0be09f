//! Pluggable detector seam.
//!
//! Any detector producing one raw score (or no detection) per frame
//! plugs in through [`DetectorBackend`] without touching the debounce
//! logic. Geometry/landmark math, model invocation and subject tracking
//! are the backend's own concern.

pub mod backend;
pub mod registry;
pub mod synthetic;

pub use backend::DetectorBackend;
pub use registry::BackendRegistry;
pub use synthetic::{ScriptedBackend, SyntheticEarBackend};
