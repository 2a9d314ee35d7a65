use super::*;

#[test]
fn rgba_premul_matches_rounded_straight_channels() {
    let c = Rgba::new(200.0, 100.0, 0.0, 0.5);
    assert_eq!(c.to_rgba8(), [200, 100, 0, 128]);
    assert_eq!(c.to_rgba8_premul(), [100, 50, 0, 128]);
}

#[test]
fn rgba_serializes_as_array() {
    let c: Rgba = serde_json::from_str("[10, 20, 30, 1]").unwrap();
    assert_eq!(c, Rgba::new(10.0, 20.0, 30.0, 1.0));
    assert_eq!(serde_json::to_string(&c).unwrap(), "[10.0,20.0,30.0,1.0]");
}

#[test]
fn non_finite_channels_collapse_to_zero() {
    let c = Rgba::new(f64::NAN, 300.0, -5.0, f64::INFINITY);
    assert_eq!(c.to_rgba8(), [0, 255, 0, 0]);
}

#[test]
fn viewport_padding_boundaries() {
    let v = Viewport::new(100.0, 50.0);
    assert!(v.contains_with_padding(Point::new(0.0, 0.0), 0.0));
    assert!(v.contains_with_padding(Point::new(100.0, 50.0), 0.0));
    assert!(!v.contains_with_padding(Point::new(100.1, 10.0), 0.0));
    assert!(v.contains_with_padding(Point::new(-19.0, 60.0), 20.0));
    assert_eq!(v.responsive_pos([0.5, 1.2]), Point::new(50.0, 60.0));
}
