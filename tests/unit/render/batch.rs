use super::*;
use crate::foundation::core::{Rgba, Viewport};
use crate::render::recording::{RecordingSurface, SurfaceCall, SurfaceLog};
use crate::render::style::{Filter, Paint, VisualEffects};

fn render() -> (Render, SurfaceLog) {
    let surface = RecordingSurface::new(Viewport::default());
    let log = surface.log();
    (Render::new(Box::new(surface)), log)
}

fn square(x: f64, y: f64) -> BezPath {
    Rect::new(x, y, x + 10.0, y + 10.0).to_path(0.1)
}

fn red(a: f64) -> StyleInput {
    StyleInput::color(Rgba::new(255.0, 0.0, 0.0, a))
}

#[test]
fn identical_fills_share_one_bucket() {
    let (mut r, _) = render();
    r.fill(&square(0.0, 0.0), &red(1.0));
    r.fill(&square(20.0, 0.0), &red(1.0));
    assert_eq!(r.pending_buckets(Category::Fill), 1);
    let (_, path) = r.buckets(Category::Fill).next().unwrap();
    let moves = path
        .elements()
        .iter()
        .filter(|el| matches!(el, kurbo::PathEl::MoveTo(_)))
        .count();
    assert_eq!(moves, 2);

    r.fill(&square(40.0, 0.0), &red(0.5));
    assert_eq!(r.pending_buckets(Category::Fill), 2);
}

#[test]
fn flush_applies_each_style_once() {
    let (mut r, log) = render();
    for i in 0..5 {
        r.fill(&square(i as f64 * 12.0, 0.0), &red(1.0));
        r.stroke(&square(i as f64 * 12.0, 0.0), &red(1.0));
    }
    let stats = r.flush();
    assert_eq!(stats.style_changes, 2);
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(stats.batched_shapes, 10);
    assert_eq!(log.style_changes(), 2);
    assert_eq!(log.draw_count(), 2);
}

#[test]
fn strokes_flush_before_fills_in_insertion_order() {
    let (mut r, log) = render();
    r.fill(&square(0.0, 0.0), &red(1.0));
    r.stroke(&square(0.0, 0.0), &red(1.0));
    r.fill(&square(0.0, 0.0), &StyleInput::color(Rgba::WHITE));
    r.flush();

    let calls = log.calls();
    let order: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            SurfaceCall::ApplyStyle {
                category,
                signature,
                ..
            } => Some((*category, signature.as_str().starts_with("c:255,0,0"))),
            _ => None,
        })
        .collect();
    assert_eq!(
        order,
        vec![
            (Category::Stroke, true),
            (Category::Fill, true),
            (Category::Fill, false)
        ]
    );
}

#[test]
fn invisible_styles_are_dropped() {
    let (mut r, log) = render();
    r.fill(&square(0.0, 0.0), &red(0.001));
    let faded = StyleInput::Literal {
        paint: Paint::Color(Rgba::WHITE),
        effects: VisualEffects {
            opacity: Some(0.0),
            ..VisualEffects::default()
        },
        line: None,
    };
    r.stroke(&square(0.0, 0.0), &faded);
    assert_eq!(r.pending_buckets(Category::Fill), 0);
    assert_eq!(r.pending_buckets(Category::Stroke), 0);
    let stats = r.flush();
    assert_eq!(stats.dropped, 2);
    assert_eq!(log.draw_count(), 0);
}

#[test]
fn isolated_styles_draw_immediately() {
    let (mut r, log) = render();
    let isolated = StyleInput::Literal {
        paint: Paint::Color(Rgba::WHITE),
        effects: VisualEffects {
            filter: Some(Filter::parse_or_none("url(#glow)")),
            ..VisualEffects::default()
        },
        line: None,
    };
    r.fill(&square(0.0, 0.0), &isolated);
    assert_eq!(log.draw_count(), 1);
    assert_eq!(r.pending_buckets(Category::Fill), 0);
    let stats = r.flush();
    assert_eq!(stats.pass_through, 1);
}

#[test]
fn late_ops_run_after_buckets() {
    let (mut r, log) = render();
    let media = MediaHandle::solid(2, 2, [255; 4]).unwrap();
    let style = r.resolve(&StyleInput::color(Rgba::WHITE), Rect::ZERO);
    r.queue_late(DrawOp::Media {
        media,
        dest: Rect::new(0.0, 0.0, 2.0, 2.0),
        transform: Affine::IDENTITY,
        style,
    });
    r.fill(&square(0.0, 0.0), &red(1.0));
    assert_eq!(r.pending_late(), 1);
    let stats = r.flush();
    assert_eq!(stats.late_ops, 1);

    let calls = log.calls();
    let fill = calls
        .iter()
        .position(|c| matches!(c, SurfaceCall::FillPath { .. }))
        .unwrap();
    let media = calls
        .iter()
        .position(|c| matches!(c, SurfaceCall::DrawMedia { .. }))
        .unwrap();
    assert!(fill < media);
    assert!(matches!(calls[media - 1], SurfaceCall::PushTransform(_)));
    assert!(matches!(calls[media + 1], SurfaceCall::PopTransform));
}

#[test]
fn flush_resets_the_batch() {
    let (mut r, log) = render();
    r.fill(&square(0.0, 0.0), &red(1.0));
    r.flush();
    log.take();
    let stats = r.flush();
    assert_eq!(stats, FlushStats::default());
    assert!(log.calls().is_empty());
}

#[test]
fn failing_draws_are_counted_and_skipped() {
    let surface = RecordingSurface::new(Viewport::default()).failing_media();
    let log = surface.log();
    let mut r = Render::new(Box::new(surface));
    let style = r.resolve(&StyleInput::color(Rgba::WHITE), Rect::ZERO);
    r.pass_through(DrawOp::Media {
        media: MediaHandle::solid(1, 1, [255; 4]).unwrap(),
        dest: Rect::new(0.0, 0.0, 1.0, 1.0),
        transform: Affine::IDENTITY,
        style,
    });
    r.fill(&square(0.0, 0.0), &red(1.0));
    let stats = r.flush();
    assert_eq!(stats.errors, 1);
    assert_eq!(log.count(|c| matches!(c, SurfaceCall::FillPath { .. })), 1);
}

#[test]
fn empty_paths_are_ignored() {
    let (mut r, _) = render();
    r.fill(&BezPath::new(), &red(1.0));
    assert_eq!(r.pending_buckets(Category::Fill), 0);
}

#[test]
fn min_visible_alpha_is_configurable() {
    let surface = RecordingSurface::new(Viewport::default());
    let mut r = Render::new(Box::new(surface)).with_min_visible_alpha(0.5);
    r.fill(&square(0.0, 0.0), &red(0.4));
    r.fill(&square(0.0, 0.0), &red(0.6));
    assert_eq!(r.pending_buckets(Category::Fill), 1);
}
