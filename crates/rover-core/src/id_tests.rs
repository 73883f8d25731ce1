use super::*;

#[test]
fn task_id_carries_its_prefix() {
    let id = TaskId::new();
    assert!(id.as_str().starts_with("task_"));
}

#[test]
fn task_id_round_trips_through_json() {
    let id = TaskId::new();
    let json = serde_json::to_string(&id).expect("serialize");
    let back: TaskId = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(id, back);
}

#[test]
fn span_id_round_trips_through_json() {
    let id = SpanId::new();
    let json = serde_json::to_string(&id).expect("serialize");
    let back: SpanId = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(id, back);
}

#[test]
fn span_id_parses_from_str() {
    let id = SpanId::new();
    let parsed: SpanId = id.to_string().parse().expect("parse");
    assert_eq!(id, parsed);
}

#[test]
fn distinct_ids_are_not_equal() {
    assert_ne!(TaskId::new(), TaskId::new());
    assert_ne!(SpanId::new(), SpanId::new());
}
