use kurbo::Shape;

use crate::foundation::core::{BezPath, Point};
use crate::render::batch::Render;
use crate::render::style::StyleInput;

/// Flattening tolerance for curves handed to the batcher.
pub const PATH_TOLERANCE: f64 = 0.1;

pub fn circle_path(center: Point, radius: f64) -> BezPath {
    if !(radius.is_finite() && radius > 0.0) {
        return BezPath::new();
    }
    kurbo::Circle::new(center, radius).to_path(PATH_TOLERANCE)
}

pub fn line_path(from: Point, to: Point) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(from);
    path.line_to(to);
    path
}

/// Closed polygon through `points`; fewer than three points give an empty path.
pub fn polygon_path(points: impl IntoIterator<Item = Point>) -> BezPath {
    let mut path = BezPath::new();
    let mut n = 0;
    for p in points {
        if n == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
        n += 1;
    }
    if n < 3 {
        return BezPath::new();
    }
    path.close_path();
    path
}

/// Batched straight line.
pub fn draw_line(render: &mut Render, from: Point, to: Point, style: &StyleInput) {
    render.stroke(&line_path(from, to), style);
}

/// Batched ring around `center`, e.g. the halo of a hovered dot.
pub fn draw_outer_ring(render: &mut Render, center: Point, radius: f64, style: &StyleInput) {
    render.stroke(&circle_path(center, radius), style);
}
