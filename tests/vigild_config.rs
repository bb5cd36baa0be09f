use std::sync::Mutex;

use tempfile::NamedTempFile;

use vigil_monitor::config::MonitorConfig;
use vigil_monitor::LowConfidencePolicy;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "VIGIL_CONFIG",
        "VIGIL_DRIVER_SUBJECT",
        "VIGIL_TARGET_FPS",
        "VIGIL_INTENSITY_THRESHOLD",
        "VIGIL_POSITIVE_FRAMES",
        "VIGIL_MISSING_FRAMES",
        "VIGIL_RECOVERY_FRAMES",
        "VIGIL_REARM_GAP_FRAMES",
        "VIGIL_LOW_CONFIDENCE_POLICY",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = MonitorConfig::load().expect("default config");
    assert_eq!(cfg.driver_subject.as_str(), "subject:driver");
    assert_eq!(cfg.target_fps, 10);
    assert_eq!(cfg.thresholds.consecutive_positive_frames(), 20);
    assert_eq!(cfg.thresholds.recovery_frames(), 20);
    assert_eq!(cfg.thresholds.consecutive_missing_frames(), 5);
    assert_eq!(cfg.thresholds.rearm_gap_frames(), Some(150));
    assert_eq!(
        cfg.thresholds.low_confidence_policy(),
        LowConfidencePolicy::FailOpen
    );
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "driver_subject": "subject:cab_17",
        "target_fps": 15,
        "thresholds": {
            "intensity_threshold": 0.30,
            "consecutive_positive_frames": 12,
            "consecutive_missing_frames": 3,
            "recovery_frames": 24,
            "low_confidence_policy": "fail_safe",
            "rearm_gap_frames": 90
        }
    }"#;
    std::fs::write(file.path(), json).expect("write config");

    std::env::set_var("VIGIL_CONFIG", file.path());
    std::env::set_var("VIGIL_RECOVERY_FRAMES", "30");

    let cfg = MonitorConfig::load().expect("config should load");
    assert_eq!(cfg.driver_subject.as_str(), "subject:cab_17");
    assert_eq!(cfg.target_fps, 15);
    assert_eq!(cfg.thresholds.intensity_threshold(), 0.30);
    assert_eq!(cfg.thresholds.consecutive_positive_frames(), 12);
    assert_eq!(cfg.thresholds.consecutive_missing_frames(), 3);
    // Env wins over the file value of 24.
    assert_eq!(cfg.thresholds.recovery_frames(), 30);
    assert_eq!(cfg.thresholds.rearm_gap_frames(), Some(90));
    assert_eq!(
        cfg.thresholds.low_confidence_policy(),
        LowConfidencePolicy::FailSafe
    );

    clear_env();
}

#[test]
fn zero_entry_debounce_fails_fast() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("VIGIL_POSITIVE_FRAMES", "0");
    let err = MonitorConfig::load().unwrap_err();
    assert!(format!("{err}").contains("consecutive_positive_frames"));

    clear_env();
}

#[test]
fn malformed_policy_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("VIGIL_LOW_CONFIDENCE_POLICY", "fail_fast");
    let err = MonitorConfig::load().unwrap_err();
    assert!(format!("{err}").contains("low-confidence policy"));

    clear_env();
}

#[test]
fn unreadable_config_file_is_an_error() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("VIGIL_CONFIG", "/nonexistent/vigil.json");
    let err = MonitorConfig::load().unwrap_err();
    assert!(format!("{err}").contains("failed to read config file"));

    clear_env();
}
