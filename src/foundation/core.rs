pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Straight-alpha color: `r`, `g`, `b` in `[0, 255]`, `a` in `[0, 1]`.
///
/// Serialized as a `[r, g, b, a]` array, the same shape hosts use for literal colors.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const WHITE: Self = Self::new(255.0, 255.0, 255.0, 1.0);
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    /// Channels clamped and rounded to bytes, alpha kept straight.
    pub fn to_rgba8(self) -> [u8; 4] {
        fn channel(v: f64) -> u8 {
            if v.is_finite() {
                v.clamp(0.0, 255.0).round() as u8
            } else {
                0
            }
        }
        let a = if self.a.is_finite() {
            self.a.clamp(0.0, 1.0)
        } else {
            0.0
        };
        [
            channel(self.r),
            channel(self.g),
            channel(self.b),
            (a * 255.0).round() as u8,
        ]
    }

    /// Premultiplied RGBA8 (`r,g,b` already multiplied by `a`).
    pub fn to_rgba8_premul(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }
        let [r, g, b, a] = self.to_rgba8();
        [premul(r, a), premul(g, a), premul(b, a), a]
    }
}

impl From<[f64; 4]> for Rgba {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Rgba> for [f64; 4] {
    fn from(c: Rgba) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

/// Visible drawing surface area in scene units (CSS pixels on a canvas host).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub fn center(self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Position expressed as fractions of the viewport size (`[0.5, 1.2]` is centered, below the
    /// bottom edge).
    pub fn responsive_pos(self, fractions: [f64; 2]) -> Point {
        Point::new(self.width * fractions[0], self.height * fractions[1])
    }

    /// `true` when `pos` lies inside the viewport grown by `padding` on every side.
    pub fn contains_with_padding(self, pos: Point, padding: f64) -> bool {
        pos.x >= -padding
            && pos.x <= self.width + padding
            && pos.y >= -padding
            && pos.y <= self.height + padding
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
