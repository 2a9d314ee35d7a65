use super::*;
use crate::foundation::core::Rgba;
use crate::render::style::{Paint, StyleBook, StyleInput, VisualEffects};

fn resolved(color: Rgba) -> ResolvedStyle {
    StyleBook::default().resolve(&StyleInput::color(color), Rect::ZERO)
}

fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> BezPath {
    kurbo::Shape::to_path(&Rect::new(x0, y0, x1, y1), 0.1)
}

#[test]
fn rejects_degenerate_sizes() {
    assert!(CpuSurface::new(0, 10).is_err());
    assert!(CpuSurface::new(70_000, 10).is_err());
    assert!(CpuSurface::new(4, 4).is_ok());
}

#[test]
fn fills_solid_color() {
    let mut s = CpuSurface::new(20, 20).unwrap();
    s.clear().unwrap();
    s.apply_style(&resolved(Rgba::new(255.0, 0.0, 0.0, 1.0)), Category::Fill)
        .unwrap();
    s.fill_path(&square(0.0, 0.0, 10.0, 10.0)).unwrap();
    s.end_frame().unwrap();

    let frame = s.snapshot();
    assert_eq!(frame.pixel(5, 5), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(15, 15).map(|p| p[3]), Some(0));
    assert_eq!(frame.pixel(20, 0), None);
}

#[test]
fn clear_color_paints_background() {
    let mut s = CpuSurface::new(4, 4)
        .unwrap()
        .with_clear_rgba(Some([0, 0, 255, 255]));
    s.clear().unwrap();
    s.end_frame().unwrap();
    assert_eq!(s.snapshot().pixel(2, 2), Some([0, 0, 255, 255]));
}

#[test]
fn draws_without_a_style_fail() {
    let mut s = CpuSurface::new(4, 4).unwrap();
    s.clear().unwrap();
    assert!(s.fill_path(&square(0.0, 0.0, 2.0, 2.0)).is_err());
}

#[test]
fn media_is_scaled_into_dest() {
    let mut s = CpuSurface::new(8, 8).unwrap();
    s.clear().unwrap();
    s.apply_style(&resolved(Rgba::WHITE), Category::Fill).unwrap();
    let media = MediaHandle::solid(2, 2, [0, 255, 0, 255]).unwrap();
    s.draw_media(&media, Rect::new(0.0, 0.0, 4.0, 4.0)).unwrap();
    s.end_frame().unwrap();
    let frame = s.snapshot();
    assert_eq!(frame.pixel(1, 1), Some([0, 255, 0, 255]));
    assert_eq!(frame.pixel(6, 6).map(|p| p[3]), Some(0));
}

#[test]
fn transforms_stack() {
    let mut s = CpuSurface::new(4, 4).unwrap();
    s.push_transform(Affine::translate((1.0, 0.0)));
    s.push_transform(Affine::translate((0.0, 2.0)));
    assert_eq!(s.current_transform(), Affine::translate((1.0, 2.0)));
    s.pop_transform();
    assert_eq!(s.current_transform(), Affine::translate((1.0, 0.0)));
    s.pop_transform();
    s.pop_transform();
    assert_eq!(s.current_transform(), Affine::IDENTITY);
}

#[test]
fn straight_conversion_undoes_premultiplication() {
    let frame = FrameRgba {
        width: 1,
        height: 2,
        data: vec![64, 0, 0, 128, 0, 0, 0, 0],
    };
    assert_eq!(frame.to_straight_rgba8(), vec![128, 0, 0, 128, 0, 0, 0, 0]);
}

#[test]
fn text_is_skipped_without_error() {
    let mut s = CpuSurface::new(4, 4).unwrap();
    s.clear().unwrap();
    assert!(
        s.draw_text("hi", Point::new(1.0, 1.0), &TextStyle::default())
            .is_ok()
    );
}

#[test]
fn replaced_gradient_is_rasterized_again() {
    let mut book = StyleBook::default();
    let red = Rgba::new(255.0, 0.0, 0.0, 1.0);
    let blue = Rgba::new(0.0, 0.0, 255.0, 1.0);
    let id = book.add_gradient(Gradient::linear(0.0, [(0.0, red), (1.0, red)]));
    let input = StyleInput::Literal {
        paint: Paint::Dynamic(id),
        effects: VisualEffects::default(),
        line: None,
    };
    let bounds = Rect::new(0.0, 0.0, 10.0, 10.0);
    let mut s = CpuSurface::new(10, 10).unwrap();
    let mut draw = |book: &StyleBook| {
        s.clear().unwrap();
        s.apply_style(&book.resolve(&input, bounds), Category::Fill)
            .unwrap();
        s.fill_path(&square(0.0, 0.0, 10.0, 10.0)).unwrap();
        s.end_frame().unwrap();
        s.snapshot().pixel(5, 5).unwrap()
    };

    let before = draw(&book);
    assert!(before[0] > 200 && before[2] < 50, "{before:?}");
    book.set_gradient(id, Gradient::linear(0.0, [(0.0, blue), (1.0, blue)]))
        .unwrap();
    let after = draw(&book);
    assert!(after[2] > 200 && after[0] < 50, "{after:?}");
}
