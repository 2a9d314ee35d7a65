use super::*;
use crate::animation::anim::AnimFrame;
use crate::animation::ease::Ease;

#[derive(Default)]
struct Log {
    events: Vec<String>,
}

fn named(name: &'static str, duration_ms: f64) -> Anim<Log> {
    Anim::new(
        move |log: &mut Log, f: AnimFrame| log.events.push(format!("{name}:{}", f.progress)),
        duration_ms,
        Ease::Linear,
    )
    .on_end(move |log| log.events.push(format!("{name}:end")))
}

#[test]
fn concurrent_animations_all_tick() {
    let mut log = Log::default();
    let mut lanes = AnimLanes::default();
    lanes.start(named("a", 100.0), Lane::Concurrent, &mut log);
    lanes.start(named("b", 200.0), Lane::Concurrent, &mut log);

    lanes.tick(&mut log, 0.0, 0.0);
    lanes.tick(&mut log, 50.0, 50.0);
    assert_eq!(log.events, vec!["a:0.5", "b:0.25"]);

    let ended = lanes.tick(&mut log, 100.0, 50.0);
    assert_eq!(ended, 1);
    assert_eq!(lanes.concurrent_len(), 1);
    assert!(log.events.ends_with(&["a:1".to_owned(), "a:end".to_owned(), "b:0.5".to_owned()]));
}

#[test]
fn only_backlog_head_receives_ticks() {
    let mut log = Log::default();
    let mut lanes = AnimLanes::default();
    let first = lanes.start(named("first", 100.0), Lane::Backlog { force: false }, &mut log);
    let second = lanes.start(named("second", 100.0), Lane::Backlog { force: false }, &mut log);
    assert_eq!(lanes.backlog_head(), Some(first));

    lanes.tick(&mut log, 0.0, 0.0);
    lanes.tick(&mut log, 50.0, 50.0);
    assert_eq!(log.events, vec!["first:0.5"]);

    lanes.tick(&mut log, 100.0, 50.0);
    assert_eq!(lanes.backlog_head(), Some(second));
    assert_eq!(log.events, vec!["first:0.5", "first:1", "first:end"]);

    // The new head arms on its first tick, then progresses.
    lanes.tick(&mut log, 120.0, 20.0);
    lanes.tick(&mut log, 170.0, 50.0);
    assert_eq!(log.events.last().map(String::as_str), Some("second:0.5"));
}

#[test]
fn forcing_ends_previous_head_exactly_once() {
    let mut log = Log::default();
    let mut lanes = AnimLanes::default();
    lanes.start(named("drag1", 1000.0), Lane::Backlog { force: true }, &mut log);
    lanes.tick(&mut log, 0.0, 0.0);
    lanes.tick(&mut log, 100.0, 100.0);

    let second = lanes.start(named("drag2", 1000.0), Lane::Backlog { force: true }, &mut log);
    assert_eq!(lanes.backlog_head(), Some(second));
    assert_eq!(lanes.backlog_len(), 1);
    let ends = log.events.iter().filter(|e| *e == "drag1:end").count();
    assert_eq!(ends, 1);
    assert_eq!(log.events, vec!["drag1:0.1", "drag1:1", "drag1:end"]);
}

#[test]
fn forcing_keeps_queued_entries_behind_new_head() {
    let mut log = Log::default();
    let mut lanes = AnimLanes::default();
    lanes.start(named("a", 10.0), Lane::Backlog { force: false }, &mut log);
    let queued = lanes.start(named("b", 10.0), Lane::Backlog { force: false }, &mut log);
    let forced = lanes.start(named("c", 10.0), Lane::Backlog { force: true }, &mut log);
    assert_eq!(lanes.backlog_head(), Some(forced));
    assert!(lanes.contains(queued));
    assert_eq!(lanes.backlog_len(), 2);
}

#[test]
fn cancel_and_cancel_all_fire_completion_only() {
    let mut log = Log::default();
    let mut lanes = AnimLanes::default();
    let a = lanes.start(named("a", 100.0), Lane::Concurrent, &mut log);
    lanes.start(named("b", 100.0), Lane::Backlog { force: false }, &mut log);
    lanes.start(named("c", 100.0), Lane::Backlog { force: false }, &mut log);

    assert!(lanes.cancel(a, &mut log));
    assert!(!lanes.cancel(a, &mut log));
    assert_eq!(lanes.cancel_all(&mut log), 2);
    assert!(lanes.is_empty());
    assert_eq!(log.events, vec!["a:end", "b:end", "c:end"]);
}

#[test]
fn append_preserves_lanes() {
    let mut log = Log::default();
    let mut base = AnimLanes::default();
    let mut staged = AnimLanes::default();
    base.start(named("a", 10.0), Lane::Backlog { force: false }, &mut log);
    staged.start(named("b", 10.0), Lane::Backlog { force: false }, &mut log);
    staged.start(named("c", 10.0), Lane::Concurrent, &mut log);
    let head = base.backlog_head();
    base.append(&mut staged);
    assert!(staged.is_empty());
    assert_eq!(base.backlog_head(), head);
    assert_eq!(base.len(), 3);
}
