use std::time::Duration;

use serial_test::serial;
use tempfile::TempDir;

use super::*;

fn clear_env() {
    for key in [
        "ROVER_POLLER_PERIOD_MS",
        "ROVER_MAX_RETRIES",
        "ROVER_COMMIT_ATTRIBUTION_TRAILER",
        "ROVER_CURSOR_TAIL_SIZE",
        "ROVER_AI_CALL_TIMEOUT_SECS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn defaults_when_no_file_and_no_env() {
    clear_env();
    let dir = TempDir::new().expect("tempdir");
    let config = DaemonConfig::load(dir.path()).expect("load");
    assert_eq!(config.engine.max_retries, 3);
    assert_eq!(config.log_rotate_bytes, ROTATE_AT_BYTES);
}

#[test]
#[serial]
fn a_project_toml_file_overrides_defaults() {
    clear_env();
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(
        dir.path().join("rover.toml"),
        "max_retries = 7\ncommit_attribution_trailer = true\n\n[stages.poller]\nperiod_ms = 15000\n",
    )
    .expect("write rover.toml");

    let config = DaemonConfig::load(dir.path()).expect("load");
    assert_eq!(config.engine.max_retries, 7);
    assert!(config.engine.commit_attribution_trailer);
    assert_eq!(config.engine.poller.period, Duration::from_millis(15000));
}

#[test]
#[serial]
fn an_env_var_overrides_the_file() {
    clear_env();
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("rover.toml"), "max_retries = 7\n").expect("write rover.toml");
    std::env::set_var("ROVER_MAX_RETRIES", "9");

    let config = DaemonConfig::load(dir.path()).expect("load");
    assert_eq!(config.engine.max_retries, 9);
    std::env::remove_var("ROVER_MAX_RETRIES");
}

#[test]
#[serial]
fn a_malformed_toml_file_is_system_fatal() {
    clear_env();
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("rover.toml"), "not valid toml [[[").expect("write rover.toml");

    let err = DaemonConfig::load(dir.path()).expect_err("malformed config should fail");
    assert_eq!(err.severity, rover_core::Severity::SystemFatal);
}

#[test]
#[serial]
fn overriding_the_cursor_tail_size_is_rejected() {
    clear_env();
    let dir = TempDir::new().expect("tempdir");
    std::env::set_var("ROVER_CURSOR_TAIL_SIZE", "50");

    let err = DaemonConfig::load(dir.path()).expect_err("non-200 cursor tail should fail");
    assert_eq!(err.severity, rover_core::Severity::SystemFatal);
    std::env::remove_var("ROVER_CURSOR_TAIL_SIZE");
}

#[test]
#[serial]
fn a_zero_period_is_rejected() {
    clear_env();
    std::env::set_var("ROVER_POLLER_PERIOD_MS", "0");
    let dir = TempDir::new().expect("tempdir");

    let err = DaemonConfig::load(dir.path()).expect_err("zero period should fail");
    assert_eq!(err.severity, rover_core::Severity::SystemFatal);
    std::env::remove_var("ROVER_POLLER_PERIOD_MS");
}
