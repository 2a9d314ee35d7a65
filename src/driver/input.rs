use crate::foundation::core::Point;
use crate::foundation::math::distance;

/// Pointer state injected by the host once per tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pointer {
    /// `None` while the pointer is outside the surface.
    pub pos: Option<Point>,
    /// Primary button held.
    pub clicked: bool,
}

impl Pointer {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            pos: Some(Point::new(x, y)),
            clicked: false,
        }
    }

    pub fn pressed(self) -> Self {
        Self {
            clicked: true,
            ..self
        }
    }

    /// Distance to `p`, infinite when the pointer is away.
    pub fn distance_to(&self, p: Point) -> f64 {
        self.pos.map_or(f64::INFINITY, |pos| distance(pos, p))
    }
}
