use super::*;
use rover_core::SpanId;
use tempfile::tempdir;

fn sample_entry() -> LogEntry {
    LogEntry {
        ts_ms: 0,
        trace_id: SpanId::new(),
        span_id: SpanId::new(),
        action_id: None,
        step: Step::Event,
        action: None,
        summary: "x".repeat(100),
    }
}

#[test]
fn appends_a_line_per_entry() {
    let dir = tempdir().expect("tempdir");
    let log = RotatingLog::new(dir.path().join("log.jsonl"));
    log.append(&sample_entry()).expect("append");
    log.append(&sample_entry()).expect("append");
    let content = fs::read_to_string(dir.path().join("log.jsonl")).expect("read");
    assert_eq!(content.lines().count(), 2);
}

#[test]
fn rotates_when_over_the_limit() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("log.jsonl");
    let log = RotatingLog::with_limit(path.clone(), 50);
    log.append(&sample_entry()).expect("first append");
    // first append alone exceeds the 50 byte limit, so the *next* append rotates
    log.append(&sample_entry()).expect("second append");
    assert!(dir.path().join("log.1.jsonl").exists());
    assert!(path.exists());
}

#[test]
fn keeps_at_most_three_rotated_copies() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("log.jsonl");
    let log = RotatingLog::with_limit(path.clone(), 50);
    for _ in 0..10 {
        log.append(&sample_entry()).expect("append");
    }
    assert!(dir.path().join("log.1.jsonl").exists());
    assert!(dir.path().join("log.2.jsonl").exists());
    assert!(dir.path().join("log.3.jsonl").exists());
    assert!(!dir.path().join("log.4.jsonl").exists());
}
