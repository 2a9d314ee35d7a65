use crate::foundation::core::{Affine, Point, Rect};
use crate::foundation::math::Rng64;
use crate::render::batch::Render;
use crate::render::style::Paint;
use crate::scene::frame::FrameCtx;
use crate::scene::object::{Anchor, Drawable, ObjId, ObjKind};

/// Per-dot context handed to a shape's draw effect.
#[derive(Clone, Copy, Debug)]
pub struct DotCtx<'a> {
    pub frame: &'a FrameCtx<'a>,
    /// `ratio(dist, limit)`: 0 at the pointer, 1 at or beyond the shape's limit.
    pub ratio: f64,
    /// Pointer distance to the dot as drawn.
    pub dist: f64,
    /// Member dots of the same shape with their positions at the start of the dot pass.
    pub siblings: &'a [(ObjId, Point)],
    pub shape_pos: Point,
    /// Maps member coordinates to where they are drawn (identity for untransformed shapes).
    pub transform: Affine,
}

pub type DrawEffectFn = Box<dyn FnMut(&mut Render, &mut Drawable, &DotCtx<'_>)>;

/// Object group state: member dots plus the defaults they fall back to.
pub struct ShapeData {
    pub(crate) members: Vec<ObjId>,
    pub(crate) pending: Vec<Drawable>,
    /// Pointer interaction distance; the engine default when unset.
    pub limit: Option<f64>,
    pub(crate) draw_effect: Option<DrawEffectFn>,
    /// Polygon fill through the member dots.
    pub fill: Option<Paint>,
    /// Draw each member as a filled circle.
    pub draw_dots: bool,
}

impl std::fmt::Debug for ShapeData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeData")
            .field("members", &self.members)
            .field("pending", &self.pending.len())
            .field("limit", &self.limit)
            .field("fill", &self.fill)
            .field("draw_dots", &self.draw_dots)
            .finish_non_exhaustive()
    }
}

impl ShapeData {
    pub fn members(&self) -> &[ObjId] {
        &self.members
    }

    pub fn first(&self) -> Option<ObjId> {
        self.members.first().copied()
    }

    pub fn last(&self) -> Option<ObjId> {
        self.members.last().copied()
    }
}

impl Drawable {
    /// A group of dots positioned relative to `pos`. Member positions are offsets from the
    /// shape, and members follow it when it moves.
    pub fn shape(pos: Point, dots: impl IntoIterator<Item = Drawable>) -> Self {
        let pending = dots
            .into_iter()
            .filter(|d| {
                let ok = matches!(d.kind, ObjKind::Dot(_));
                if !ok {
                    tracing::warn!("shapes only hold dots, skipping member");
                }
                ok
            })
            .collect();
        Self::with_kind(
            pos,
            ObjKind::Shape(ShapeData {
                members: Vec::new(),
                pending,
                limit: None,
                draw_effect: None,
                fill: None,
                draw_dots: true,
            }),
        )
        .with_margin(crate::scene::object::ActivationMargin::Unbounded)
    }

    pub fn shape_data(&self) -> Option<&ShapeData> {
        match &self.kind {
            ObjKind::Shape(s) => Some(s),
            _ => None,
        }
    }

    pub fn shape_data_mut(&mut self) -> Option<&mut ShapeData> {
        match &mut self.kind {
            ObjKind::Shape(s) => Some(s),
            _ => None,
        }
    }

    pub fn with_limit(mut self, limit: f64) -> Self {
        if let Some(s) = self.shape_data_mut() {
            s.limit = Some(limit);
        }
        self
    }

    pub fn with_fill(mut self, paint: impl Into<Paint>) -> Self {
        if let Some(s) = self.shape_data_mut() {
            s.fill = Some(paint.into());
        }
        self
    }

    pub fn hide_dots(mut self) -> Self {
        if let Some(s) = self.shape_data_mut() {
            s.draw_dots = false;
        }
        self
    }

    /// Called for every active member dot each frame, before the dot is drawn.
    pub fn with_draw_effect(
        mut self,
        effect: impl FnMut(&mut Render, &mut Drawable, &DotCtx<'_>) + 'static,
    ) -> Self {
        match self.shape_data_mut() {
            Some(s) => s.draw_effect = Some(Box::new(effect)),
            None => tracing::warn!("draw effects only apply to shapes"),
        }
        self
    }

    /// Take the members out for insertion, anchoring each to this shape.
    pub(crate) fn take_pending_members(&mut self) -> Vec<Drawable> {
        let Some(s) = self.shape_data_mut() else {
            return Vec::new();
        };
        std::mem::take(&mut s.pending)
    }
}

/// Dots spread along `y_fn` from `start` across `width`, one every `gap` pixels, each shifted
/// vertically by a random amount in `y_variation`. `per_dot` receives each dot and its index.
pub fn generate_dots(
    y_fn: impl Fn(f64) -> f64,
    start: Point,
    width: f64,
    gap: f64,
    y_variation: [f64; 2],
    rng: &mut Rng64,
    mut per_dot: impl FnMut(&mut Drawable, usize),
) -> Vec<Drawable> {
    if !(gap.is_finite() && gap > 0.0 && width.is_finite() && width >= 0.0) {
        tracing::warn!(gap, width, "invalid dot generation parameters");
        return Vec::new();
    }
    let count = (width / gap).floor() as usize + 1;
    (0..count)
        .map(|i| {
            let x = i as f64 * gap;
            let y = y_fn(x) + rng.range(y_variation[0], y_variation[1]);
            let mut dot = Drawable::dot(Point::new(start.x + x, start.y + y));
            per_dot(&mut dot, i);
            dot
        })
        .collect()
}

/// Union of `(center, radius)` circles.
pub fn aggregate_bounds(circles: impl IntoIterator<Item = (Point, f64)>) -> Option<Rect> {
    circles
        .into_iter()
        .map(|(c, r)| Rect::from_center_size(c, (2.0 * r, 2.0 * r)))
        .reduce(|a, b| a.union(b))
}

pub(crate) fn member_anchor(shape: ObjId) -> Anchor {
    Anchor::Object(shape)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/shape.rs"]
mod tests;
