use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;

use crate::debounce::Thresholds;
use crate::score::LowConfidencePolicy;
use crate::SubjectKey;

const DEFAULT_DRIVER_SUBJECT: &str = "subject:driver";
const DEFAULT_TARGET_FPS: u32 = 10;
const DEFAULT_INTENSITY_THRESHOLD: f32 = 0.25;
const DEFAULT_POSITIVE_FRAMES: u32 = 20;
const DEFAULT_MISSING_FRAMES: u32 = 5;
const DEFAULT_RECOVERY_FRAMES: u32 = 20;
const DEFAULT_REARM_GAP_FRAMES: u32 = 150;

#[derive(Debug, Deserialize, Default)]
struct MonitorConfigFile {
    driver_subject: Option<String>,
    target_fps: Option<u32>,
    thresholds: Option<ThresholdsFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ThresholdsFile {
    intensity_threshold: Option<f32>,
    consecutive_positive_frames: Option<u32>,
    consecutive_missing_frames: Option<u32>,
    recovery_frames: Option<u32>,
    low_confidence_policy: Option<LowConfidencePolicy>,
    rearm_gap_frames: Option<u32>,
}

/// Validated daemon configuration: file (via `VIGIL_CONFIG`), then env
/// overrides, then validation. Invalid threshold values fail fast here,
/// before any frame is processed.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub driver_subject: SubjectKey,
    pub target_fps: u32,
    pub thresholds: Thresholds,
}

impl MonitorConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("VIGIL_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut raw = RawConfig::from_file(file_cfg.unwrap_or_default());
        raw.apply_env()?;
        raw.validate()
    }
}

#[derive(Debug)]
struct RawConfig {
    driver_subject: String,
    target_fps: u32,
    intensity_threshold: f32,
    consecutive_positive_frames: u32,
    consecutive_missing_frames: u32,
    recovery_frames: u32,
    low_confidence_policy: LowConfidencePolicy,
    rearm_gap_frames: u32,
}

impl RawConfig {
    fn from_file(file: MonitorConfigFile) -> Self {
        let thresholds = file.thresholds.unwrap_or_default();
        Self {
            driver_subject: file
                .driver_subject
                .unwrap_or_else(|| DEFAULT_DRIVER_SUBJECT.to_string()),
            target_fps: file.target_fps.unwrap_or(DEFAULT_TARGET_FPS),
            intensity_threshold: thresholds
                .intensity_threshold
                .unwrap_or(DEFAULT_INTENSITY_THRESHOLD),
            consecutive_positive_frames: thresholds
                .consecutive_positive_frames
                .unwrap_or(DEFAULT_POSITIVE_FRAMES),
            consecutive_missing_frames: thresholds
                .consecutive_missing_frames
                .unwrap_or(DEFAULT_MISSING_FRAMES),
            recovery_frames: thresholds.recovery_frames.unwrap_or(DEFAULT_RECOVERY_FRAMES),
            low_confidence_policy: thresholds.low_confidence_policy.unwrap_or_default(),
            rearm_gap_frames: thresholds
                .rearm_gap_frames
                .unwrap_or(DEFAULT_REARM_GAP_FRAMES),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(subject) = std::env::var("VIGIL_DRIVER_SUBJECT") {
            if !subject.trim().is_empty() {
                self.driver_subject = subject;
            }
        }
        if let Some(fps) = parse_env_u32("VIGIL_TARGET_FPS")? {
            self.target_fps = fps;
        }
        if let Ok(threshold) = std::env::var("VIGIL_INTENSITY_THRESHOLD") {
            self.intensity_threshold = threshold.parse().map_err(|_| {
                anyhow!("VIGIL_INTENSITY_THRESHOLD must be a number in [0, 1]")
            })?;
        }
        if let Some(frames) = parse_env_u32("VIGIL_POSITIVE_FRAMES")? {
            self.consecutive_positive_frames = frames;
        }
        if let Some(frames) = parse_env_u32("VIGIL_MISSING_FRAMES")? {
            self.consecutive_missing_frames = frames;
        }
        if let Some(frames) = parse_env_u32("VIGIL_RECOVERY_FRAMES")? {
            self.recovery_frames = frames;
        }
        if let Some(frames) = parse_env_u32("VIGIL_REARM_GAP_FRAMES")? {
            self.rearm_gap_frames = frames;
        }
        if let Ok(policy) = std::env::var("VIGIL_LOW_CONFIDENCE_POLICY") {
            self.low_confidence_policy = parse_policy(&policy)?;
        }
        Ok(())
    }

    fn validate(self) -> Result<MonitorConfig> {
        if self.driver_subject.trim().is_empty() {
            return Err(anyhow!("driver_subject must not be empty"));
        }
        if self.target_fps == 0 {
            return Err(anyhow!("target_fps must be greater than zero"));
        }
        let thresholds = Thresholds::new(
            self.intensity_threshold,
            self.consecutive_positive_frames,
            self.consecutive_missing_frames,
            self.recovery_frames,
        )?
        .with_low_confidence_policy(self.low_confidence_policy)
        .with_rearm_gap(self.rearm_gap_frames)?;
        Ok(MonitorConfig {
            driver_subject: SubjectKey::new(self.driver_subject),
            target_fps: self.target_fps,
            thresholds,
        })
    }
}

fn read_config_file(path: &Path) -> Result<MonitorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn parse_env_u32(key: &str) -> Result<Option<u32>> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => {
            let parsed: u32 = value
                .trim()
                .parse()
                .map_err(|_| anyhow!("{} must be a non-negative integer", key))?;
            Ok(Some(parsed))
        }
        _ => Ok(None),
    }
}

fn parse_policy(value: &str) -> Result<LowConfidencePolicy> {
    match value.trim().to_lowercase().as_str() {
        "fail_safe" | "failsafe" => Ok(LowConfidencePolicy::FailSafe),
        "fail_open" | "failopen" => Ok(LowConfidencePolicy::FailOpen),
        other => Err(anyhow!(
            "unknown low-confidence policy '{}' (expected fail_safe or fail_open)",
            other
        )),
    }
}
