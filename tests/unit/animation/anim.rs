use std::cell::Cell;
use std::rc::Rc;

use super::*;

#[derive(Default)]
struct Tracker {
    updates: Vec<AnimFrame>,
    ends: u32,
}

fn recording(duration_ms: f64, ease: Ease) -> Anim<Tracker> {
    Anim::new(|p: &mut Tracker, f| p.updates.push(f), duration_ms, ease).on_end(|p| p.ends += 1)
}

#[test]
fn linear_progress_follows_elapsed_time() {
    let mut tracker = Tracker::default();
    let mut anim = recording(1000.0, Ease::Linear);

    assert_eq!(anim.tick(&mut tracker, 0.0, 0.0), TickOutcome::Armed);
    assert!(tracker.updates.is_empty());
    assert_eq!(anim.state(), AnimState::Running);

    for t in [250.0, 500.0, 750.0] {
        assert_eq!(anim.tick(&mut tracker, t, 250.0), TickOutcome::Progressed);
    }
    assert_eq!(anim.tick(&mut tracker, 1000.0, 250.0), TickOutcome::Ended);

    let got: Vec<f64> = tracker.updates.iter().map(|f| f.progress).collect();
    let want = [0.25, 0.5, 0.75, 1.0];
    assert_eq!(got.len(), want.len());
    for (g, w) in got.iter().zip(want) {
        assert!((g - w).abs() < 1e-9, "got {g}, want {w}");
    }
    assert_eq!(tracker.ends, 1);
    assert_eq!(anim.state(), AnimState::Ended);
}

#[test]
fn finite_progress_never_reaches_one_early() {
    let mut tracker = Tracker::default();
    let mut anim = recording(100.0, Ease::InOutQuad);
    anim.tick(&mut tracker, 10.0, 0.0);
    let mut t = 10.0;
    while anim.state() != AnimState::Ended {
        t += 7.0;
        anim.tick(&mut tracker, t, 7.0);
    }
    let (last, rest) = tracker.updates.split_last().unwrap();
    assert_eq!(last.progress, 1.0);
    assert!(t >= 110.0);
    let mut prev = 0.0;
    for f in rest {
        assert!(f.progress < 1.0);
        assert!(f.progress >= prev);
        prev = f.progress;
    }
}

#[test]
fn infinite_animation_loops_once_per_cycle() {
    let mut tracker = Tracker::default();
    let mut anim = Anim::looping(|p: &mut Tracker, f| p.updates.push(f), 100.0, Ease::Linear);
    assert!(anim.is_infinite());

    let mut outcomes = Vec::new();
    for t in [0.0, 50.0, 100.0, 110.0, 160.0, 210.0] {
        outcomes.push(anim.tick(&mut tracker, t, 10.0));
    }
    assert_eq!(
        outcomes,
        vec![
            TickOutcome::Armed,
            TickOutcome::Progressed,
            TickOutcome::Looped,
            TickOutcome::Armed,
            TickOutcome::Progressed,
            TickOutcome::Looped,
        ]
    );
    let boundaries: Vec<&AnimFrame> = tracker.updates.iter().filter(|f| f.progress == 1.0).collect();
    assert_eq!(boundaries.len(), 2);
    assert_eq!(boundaries[0].play_count, 0);
    assert_eq!(boundaries[1].play_count, 1);
    assert_eq!(anim.play_count(), 2);
    assert_eq!(anim.state(), AnimState::Unstarted);
}

#[test]
fn cancel_runs_completion_once_without_update() {
    let mut tracker = Tracker::default();
    let mut anim = recording(1000.0, Ease::Linear);
    anim.tick(&mut tracker, 0.0, 0.0);
    anim.tick(&mut tracker, 100.0, 100.0);
    anim.cancel(&mut tracker);
    anim.cancel(&mut tracker);
    anim.end(&mut tracker);
    assert_eq!(anim.tick(&mut tracker, 2000.0, 16.0), TickOutcome::Ended);
    assert_eq!(tracker.updates.len(), 1);
    assert_eq!(tracker.ends, 1);
}

#[test]
fn end_delivers_final_progress_then_completion() {
    let order = Rc::new(Cell::new(0u8));
    let seen_update = order.clone();
    let seen_end = order.clone();
    let mut anim: Anim<()> = Anim::new(
        move |_, f| {
            assert_eq!(f.progress, 1.0);
            assert_eq!(seen_update.get(), 0);
            seen_update.set(1);
        },
        500.0,
        Ease::OutBack,
    )
    .on_end(move |_| {
        assert_eq!(seen_end.get(), 1);
        seen_end.set(2);
    });
    anim.end(&mut ());
    assert_eq!(order.get(), 2);
}

#[test]
fn non_finite_duration_falls_back_to_zero() {
    let mut tracker = Tracker::default();
    let mut anim = recording(f64::NAN, Ease::Linear);
    assert_eq!(anim.duration_ms(), 0.0);
    anim.tick(&mut tracker, 5.0, 0.0);
    assert_eq!(anim.tick(&mut tracker, 5.0, 0.0), TickOutcome::Ended);
    assert_eq!(tracker.ends, 1);
}

#[test]
fn ids_are_unique() {
    let a: Anim<()> = Anim::new(|_, _| {}, 1.0, Ease::Linear);
    let b: Anim<()> = Anim::new(|_, _| {}, 1.0, Ease::Linear);
    assert_ne!(a.id(), b.id());
}
