use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::animation::ease::Ease;
use crate::foundation::core::Point;
use crate::render::recording::{RecordingSurface, SurfaceCall, SurfaceLog};
use crate::render::style::Category;
use crate::scene::object::Drawable;

fn driver(config: EngineConfig) -> (FrameDriver, SurfaceLog) {
    let surface = RecordingSurface::new(Viewport::new(200.0, 200.0));
    let log = surface.log();
    (FrameDriver::new(config, Box::new(surface)), log)
}

#[test]
fn stopped_driver_draws_nothing() {
    let (mut d, log) = driver(EngineConfig::default());
    assert!(d.tick(0.0).is_none());
    assert!(log.calls().is_empty());
    assert_eq!(d.scene().viewport(), Viewport::new(200.0, 200.0));
}

#[test]
fn start_and_stop_are_idempotent_and_skip_paused_time() {
    let (mut d, _) = driver(EngineConfig::default());
    d.start();
    d.start();
    d.tick(0.0);
    d.tick(16.0);
    d.stop();
    d.stop();
    assert!(!d.is_running());
    assert!(d.tick(5_000.0).is_none());

    d.start();
    let first = d.tick(10_000.0).unwrap();
    assert_eq!(first.info.delta_ms, 0.0);
    assert_eq!(d.scene_time_ms(), 16.0);
    let next = d.tick(10_016.0).unwrap();
    assert_eq!(next.info.delta_ms, 16.0);
    assert_eq!(d.frame_count(), 4);
}

#[test]
fn long_stalls_are_clamped() {
    let (mut d, _) = driver(EngineConfig::default());
    d.start();
    d.tick(0.0);
    let r = d.tick(5_000.0).unwrap();
    assert_eq!(r.info.delta_ms, 130.0);
    assert_eq!(d.scene_time_ms(), 130.0);
}

#[test]
fn fps_limit_throttles_and_carries_remainder() {
    let (mut d, _) = driver(EngineConfig {
        fps_limit: Some(10.0),
        ..EngineConfig::default()
    });
    d.start();
    let drawn: Vec<bool> = [0.0, 40.0, 80.0, 120.0, 160.0, 200.0]
        .into_iter()
        .map(|t| d.tick(t).is_some())
        .collect();
    assert_eq!(drawn, vec![true, false, false, true, false, true]);
    assert_eq!(d.frame_count(), 3);
}

#[test]
fn speed_modifier_scales_scene_time() {
    let (mut d, _) = driver(EngineConfig {
        speed_modifier: 2.0,
        ..EngineConfig::default()
    });
    d.start();
    d.tick(0.0);
    let r = d.tick(50.0).unwrap();
    assert_eq!(r.info.now_ms, 100.0);
    assert_eq!(r.info.delta_ms, 100.0);
}

#[test]
fn frame_phases_run_in_fixed_order() {
    let (mut d, log) = driver(EngineConfig::default());
    let events = Rc::new(RefCell::new(Vec::new()));

    let ev = Rc::clone(&events);
    d.scene_mut().add(
        Drawable::dot(Point::new(10.0, 10.0)).on_update(move |_, _| ev.borrow_mut().push("update")),
    );
    let ev = Rc::clone(&events);
    d.on_frame(move |_, render, _| {
        assert_eq!(render.pending_buckets(Category::Fill), 0);
        ev.borrow_mut().push("callback");
    });
    let ev = Rc::clone(&events);
    d.play_anim(
        Anim::looping(
            move |_: &mut Scene, _| ev.borrow_mut().push("scene-anim"),
            -10.0,
            Ease::Linear,
        ),
        Lane::Concurrent,
    );

    d.start();
    d.tick(0.0);
    d.tick(5.0);
    assert_eq!(
        *events.borrow(),
        vec!["update", "callback", "update", "callback", "scene-anim"]
    );

    let calls = log.calls();
    assert_eq!(calls.first(), Some(&SurfaceCall::Clear));
    assert_eq!(calls.last(), Some(&SurfaceCall::EndFrame));
    let fill = calls
        .iter()
        .position(|c| matches!(c, SurfaceCall::FillPath { .. }))
        .unwrap();
    let end = calls.iter().position(|c| *c == SurfaceCall::EndFrame).unwrap();
    assert!(fill < end);
}

#[test]
fn scene_animations_can_be_cancelled() {
    let (mut d, _) = driver(EngineConfig::default());
    let id = d.play_anim(
        Anim::new(|_: &mut Scene, _| {}, 100.0, Ease::Linear),
        Lane::Backlog { force: false },
    );
    assert!(d.cancel_anim(id));
    assert!(d.scene_anims().is_empty());
}

#[test]
fn run_fixed_counts_drawn_frames() {
    let (mut d, _) = driver(EngineConfig::default());
    d.scene_mut().add(Drawable::dot(Point::new(10.0, 10.0)));
    let stats = d.run_fixed(10, 60.0);
    assert_eq!(stats.frames, 10);
    assert_eq!(stats.draw_calls, 10);
    assert_eq!(stats.style_changes, 10);

    let more = d.run_fixed(5, 60.0);
    assert_eq!(more.frames, 5);
    assert!((d.scene_time_ms() - 14.0 * 1000.0 / 60.0).abs() < 1e-6);
}
