use super::*;
use crate::foundation::core::Rgba;

#[test]
fn linear_gradient_t_spans_the_bounds() {
    let b = Rect::new(10.0, 0.0, 30.0, 10.0);
    let kind = GradientKind::Linear { angle_deg: 0.0 };
    assert!((gradient_t(kind, b, Point::new(10.0, 5.0)) - 0.0).abs() < 1e-9);
    assert!((gradient_t(kind, b, Point::new(20.0, 5.0)) - 0.5).abs() < 1e-9);
    assert!((gradient_t(kind, b, Point::new(30.0, 5.0)) - 1.0).abs() < 1e-9);

    let vertical = GradientKind::Linear { angle_deg: 90.0 };
    assert!((gradient_t(vertical, b, Point::new(12.0, 10.0)) - 1.0).abs() < 1e-9);
}

#[test]
fn radial_gradient_t_grows_from_center() {
    let b = Rect::new(0.0, 0.0, 6.0, 8.0);
    assert_eq!(gradient_t(GradientKind::Radial, b, b.center()), 0.0);
    assert!((gradient_t(GradientKind::Radial, b, Point::new(0.0, 0.0)) - 1.0).abs() < 1e-9);
}

#[test]
fn degenerate_bounds_do_not_divide_by_zero() {
    let b = Rect::new(5.0, 5.0, 5.0, 5.0);
    assert_eq!(gradient_t(GradientKind::Radial, b, Point::ZERO), 0.0);
    assert_eq!(
        gradient_t(GradientKind::Linear { angle_deg: 0.0 }, b, Point::ZERO),
        0.0
    );
}

#[test]
fn rasterized_gradient_runs_left_to_right() {
    let g = Gradient::linear(
        0.0,
        [
            (0.0, Rgba::new(0.0, 0.0, 0.0, 1.0)),
            (1.0, Rgba::new(255.0, 255.0, 255.0, 1.0)),
        ],
    );
    let bytes = rasterize_gradient(&g, Rect::new(0.0, 0.0, 4.0, 1.0), 4, 1);
    assert_eq!(bytes.len(), 16);
    assert!(bytes[0] < bytes[4] && bytes[4] < bytes[8] && bytes[8] < bytes[12]);
    assert!(bytes.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn blur_spreads_a_single_pixel() {
    let (w, h) = (5u32, 5u32);
    let mut bytes = vec![0u8; 5 * 5 * 4];
    let center = (2 * 5 + 2) * 4;
    bytes[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);
    apply_filters(&mut bytes, w, h, &[FilterOp::Blur(1.0)]).unwrap();
    assert!(bytes[center + 3] < 255);
    assert!(bytes[center + 3 + 4] > 0);
}

#[test]
fn invert_and_grayscale_matrices() {
    let mut px = vec![255u8, 0, 0, 255];
    apply_filters(&mut px, 1, 1, &[FilterOp::Invert(1.0)]).unwrap();
    assert_eq!(px, vec![0, 255, 255, 255]);

    let mut px = vec![10u8, 200, 90, 255];
    apply_filters(&mut px, 1, 1, &[FilterOp::Grayscale(1.0)]).unwrap();
    assert_eq!(px[0], px[1]);
    assert_eq!(px[1], px[2]);
}

#[test]
fn opacity_filter_scales_alpha() {
    let mut px = vec![255u8, 255, 255, 255];
    apply_filters(&mut px, 1, 1, &[FilterOp::Opacity(0.5)]).unwrap();
    assert_eq!(px, vec![128, 128, 128, 128]);
}

#[test]
fn identity_filters_are_noops() {
    let src = vec![40u8, 80, 120, 200];
    let mut px = src.clone();
    apply_filters(
        &mut px,
        1,
        1,
        &[
            FilterOp::Brightness(1.0),
            FilterOp::HueRotate(0.0),
            FilterOp::Url("#x".into()),
        ],
    )
    .unwrap();
    for (a, b) in px.iter().zip(&src) {
        assert!(a.abs_diff(*b) <= 1);
    }
}

#[test]
fn pixmap_rejects_bad_lengths() {
    assert!(pixmap_from_premul_bytes(&[0; 7], 1, 2).is_err());
    assert!(pixmap_from_premul_bytes(&[0; 8], 1, 2).is_ok());
}
