use super::*;
use crate::foundation::core::Rgba;
use crate::scene::object::ActivationMargin;

#[test]
fn shapes_keep_only_dots() {
    let s = Drawable::shape(
        Point::ZERO,
        [
            Drawable::dot(Point::ZERO),
            Drawable::text(Point::ZERO, "x", Default::default()),
            Drawable::dot(Point::new(1.0, 1.0)),
        ],
    );
    assert_eq!(s.shape_data().unwrap().pending.len(), 2);
    assert_eq!(s.margin(), Some(ActivationMargin::Unbounded));
}

#[test]
fn builders_set_group_state() {
    let s = Drawable::shape(Point::ZERO, Vec::<Drawable>::new())
        .with_limit(50.0)
        .with_fill(Rgba::WHITE)
        .hide_dots()
        .with_draw_effect(|_, _, _| {});
    let data = s.shape_data().unwrap();
    assert_eq!(data.limit, Some(50.0));
    assert_eq!(data.fill, Some(Paint::Color(Rgba::WHITE)));
    assert!(!data.draw_dots);
    assert!(data.draw_effect.is_some());
    assert_eq!(data.first(), None);
}

#[test]
fn generated_dots_span_the_width() {
    let mut rng = Rng64::new(1);
    let mut seen = Vec::new();
    let dots = generate_dots(
        |x| x / 10.0,
        Point::new(10.0, 100.0),
        100.0,
        25.0,
        [-2.0, 2.0],
        &mut rng,
        |dot, i| {
            seen.push(i);
            dot.set_radius(3.0);
        },
    );
    assert_eq!(dots.len(), 5);
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    assert_eq!(dots[4].x(), 110.0);
    for (i, d) in dots.iter().enumerate() {
        let base = 100.0 + (i as f64 * 25.0) / 10.0;
        assert!((d.y() - base).abs() <= 2.0);
        assert_eq!(d.appearance().radius, Some(3.0));
    }
}

#[test]
fn generation_rejects_bad_gaps() {
    let mut rng = Rng64::new(1);
    let dots = generate_dots(|_| 0.0, Point::ZERO, 100.0, 0.0, [0.0, 0.0], &mut rng, |_, _| {});
    assert!(dots.is_empty());
}

#[test]
fn bounds_cover_every_circle() {
    let r = aggregate_bounds([(Point::new(0.0, 0.0), 1.0), (Point::new(10.0, 5.0), 2.0)]).unwrap();
    assert_eq!(r, Rect::new(-1.0, -1.0, 12.0, 7.0));
    assert!(aggregate_bounds(std::iter::empty::<(Point, f64)>()).is_none());
}
