use super::*;

#[test]
fn root_span_has_no_parent() {
    let span = Span::root(SpanId::new(), Step::Event, 0, "issue opened");
    assert!(span.is_root());
    assert_eq!(span.status, SpanStatus::Running);
}

#[test]
fn child_span_records_its_parent() {
    let parent = SpanId::new();
    let span = Span::child(SpanId::new(), parent, Step::Coordinate, 10, "deciding");
    assert_eq!(span.parent, Some(parent));
    assert!(!span.is_root());
}

#[test]
fn complete_sets_terminal_status_and_timestamp() {
    let mut span = Span::root(SpanId::new(), Step::Event, 0, "started");
    span.complete(100, "done");
    assert_eq!(span.status, SpanStatus::Completed);
    assert_eq!(span.completed_ms, Some(100));
    assert_eq!(span.summary, "done");
}

#[test]
fn fields_includes_span_id_step_and_status() {
    let span = Span::root(SpanId::new(), Step::Workflow, 0, "launch");
    let fields = span.fields();
    assert!(fields.iter().any(|(k, _)| *k == "span_id"));
    assert!(fields.iter().any(|(k, v)| *k == "step" && v == "workflow"));
}
