use super::*;
use rover_core::{ActionKind, FakeClock, Step};
use tempfile::tempdir;

#[test]
fn root_span_and_action_chain_to_a_pending_entry() {
    let dir = tempdir().expect("tempdir");
    let store = Store::open(dir.path());
    store.ensure().expect("ensure");
    let clock = FakeClock::new(100);

    let span_writer = SpanWriter::new(&store, &clock);
    let action_writer = ActionWriter::new(&store, &clock);

    let root = span_writer.root(Step::Event, "issue opened").expect("root span");
    let action = action_writer
        .write(ActionKind::Coordinate, root.id, "new issue")
        .expect("action");
    enqueue_action(&store, &clock, root.id, &action, Step::Event, "queued").expect("enqueue");

    let pending = store.get_pending().expect("pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].action, ActionKind::Coordinate);
    assert_eq!(pending[0].span_id, root.id);
}

#[test]
fn saved_span_reflects_finalization() {
    let dir = tempdir().expect("tempdir");
    let store = Store::open(dir.path());
    store.ensure().expect("ensure");
    let clock = FakeClock::new(0);
    let writer = SpanWriter::new(&store, &clock);

    let mut span = writer.root(Step::Event, "started").expect("root");
    span.complete(10, "finished");
    writer.save(&span).expect("save");

    let back = store.read_span(&span.id).expect("read");
    assert_eq!(back.summary, "finished");
}
