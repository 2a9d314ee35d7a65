use std::collections::HashMap;

use kurbo::Shape;

use crate::assets::media::MediaHandle;
use crate::foundation::core::{Affine, BezPath, Point, Rect};
use crate::foundation::error::DotfxResult;
use crate::render::style::{
    Category, Gradient, PaintId, ProfileId, ResolvedStyle, Signature, StyleBook, StyleInput,
    StyleProfile,
};
use crate::render::surface::{Surface, TextStyle};

/// Styles whose effective alpha is below this are not drawn at all.
pub const DEFAULT_MIN_VISIBLE_ALPHA: f64 = 0.004;

/// A draw that cannot be merged into a bucket.
#[derive(Clone, Debug)]
pub enum DrawOp {
    Path {
        category: Category,
        /// Geometry already in surface space.
        path: BezPath,
        style: ResolvedStyle,
    },
    Media {
        media: MediaHandle,
        dest: Rect,
        transform: Affine,
        style: ResolvedStyle,
    },
    Text {
        text: String,
        origin: Point,
        font: TextStyle,
        transform: Affine,
        style: ResolvedStyle,
    },
}

impl DrawOp {
    fn style(&self) -> &ResolvedStyle {
        match self {
            Self::Path { style, .. } | Self::Media { style, .. } | Self::Text { style, .. } => {
                style
            }
        }
    }
}

/// Per-flush accounting, reset by every [`Render::flush`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct FlushStats {
    /// Distinct style applications issued to the surface.
    pub style_changes: usize,
    /// Draw calls issued to the surface (batched, pass-through and late).
    pub draw_calls: usize,
    /// Shapes merged into buckets.
    pub batched_shapes: usize,
    pub pass_through: usize,
    pub late_ops: usize,
    /// Draws skipped because their style was invisible.
    pub dropped: usize,
    /// Surface calls that failed and were skipped.
    pub errors: usize,
}

struct Bucket {
    style: ResolvedStyle,
    path: BezPath,
}

/// Insertion-ordered signature buckets for one category.
#[derive(Default)]
struct BucketSet {
    index: HashMap<Signature, usize>,
    buckets: Vec<(Signature, Bucket)>,
}

impl BucketSet {
    fn accumulate(&mut self, signature: Signature, style: ResolvedStyle, path: &BezPath) {
        let slot = match self.index.get(&signature) {
            Some(&i) => i,
            None => {
                self.index.insert(signature.clone(), self.buckets.len());
                self.buckets.push((
                    signature,
                    Bucket {
                        style,
                        path: BezPath::new(),
                    },
                ));
                self.buckets.len() - 1
            }
        };
        let bucket = &mut self.buckets[slot].1;
        for el in path.elements() {
            bucket.path.push(*el);
        }
    }

    fn take(&mut self) -> Vec<(Signature, Bucket)> {
        self.index.clear();
        std::mem::take(&mut self.buckets)
    }

    fn len(&self) -> usize {
        self.buckets.len()
    }
}

/// Frame-scoped batch accumulator in front of a [`Surface`].
///
/// Stroke and fill requests with identical resolved styles are merged into one path and drawn
/// with a single style application at [`Render::flush`]. Requests whose style cannot be shared
/// (external filters) draw immediately; media and text are either drawn immediately or queued to
/// run after the batched geometry.
pub struct Render {
    surface: Box<dyn Surface>,
    styles: StyleBook,
    strokes: BucketSet,
    fills: BucketSet,
    late: Vec<DrawOp>,
    min_visible_alpha: f64,
    stats: FlushStats,
}

impl std::fmt::Debug for Render {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Render")
            .field("strokes", &self.strokes.len())
            .field("fills", &self.fills.len())
            .field("late", &self.late.len())
            .field("min_visible_alpha", &self.min_visible_alpha)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Render {
    pub fn new(surface: Box<dyn Surface>) -> Self {
        Self {
            surface,
            styles: StyleBook::default(),
            strokes: BucketSet::default(),
            fills: BucketSet::default(),
            late: Vec::new(),
            min_visible_alpha: DEFAULT_MIN_VISIBLE_ALPHA,
            stats: FlushStats::default(),
        }
    }

    pub fn with_min_visible_alpha(mut self, alpha: f64) -> Self {
        self.min_visible_alpha = if alpha.is_finite() { alpha.max(0.0) } else { 0.0 };
        self
    }

    pub fn styles(&self) -> &StyleBook {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut StyleBook {
        &mut self.styles
    }

    pub fn add_profile(&mut self, profile: StyleProfile) -> ProfileId {
        self.styles.add_profile(profile)
    }

    pub fn add_gradient(&mut self, gradient: Gradient) -> PaintId {
        self.styles.add_gradient(gradient)
    }

    pub fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> &mut dyn Surface {
        self.surface.as_mut()
    }

    /// Statistics accumulated since the last flush.
    pub fn stats(&self) -> FlushStats {
        self.stats
    }

    pub fn resolve(&self, style: &StyleInput, bounds: Rect) -> ResolvedStyle {
        self.styles.resolve(style, bounds)
    }

    pub fn is_visible(&self, style: &ResolvedStyle) -> bool {
        style.effective_alpha() >= self.min_visible_alpha
    }

    pub fn stroke(&mut self, path: &BezPath, style: &StyleInput) {
        self.submit(Category::Stroke, path, style);
    }

    pub fn fill(&mut self, path: &BezPath, style: &StyleInput) {
        self.submit(Category::Fill, path, style);
    }

    fn submit(&mut self, category: Category, path: &BezPath, input: &StyleInput) {
        if path.elements().is_empty() {
            return;
        }
        let style = self.styles.resolve(input, path.bounding_box());
        if !self.is_visible(&style) {
            self.stats.dropped += 1;
            return;
        }
        if style.requires_isolation() {
            self.pass_through(DrawOp::Path {
                category,
                path: path.clone(),
                style,
            });
            return;
        }

        let signature = style.signature(category);
        let set = match category {
            Category::Stroke => &mut self.strokes,
            Category::Fill => &mut self.fills,
        };
        set.accumulate(signature, style, path);
        self.stats.batched_shapes += 1;
    }

    /// Draw `op` right now, bypassing the buckets.
    pub fn pass_through(&mut self, op: DrawOp) {
        if !self.is_visible(op.style()) {
            self.stats.dropped += 1;
            return;
        }
        self.stats.pass_through += 1;
        self.execute(&op);
    }

    /// Queue `op` to run after the batched geometry of this frame.
    pub fn queue_late(&mut self, op: DrawOp) {
        if !self.is_visible(op.style()) {
            self.stats.dropped += 1;
            return;
        }
        self.late.push(op);
    }

    fn execute(&mut self, op: &DrawOp) {
        let result = match op {
            DrawOp::Path {
                category,
                path,
                style,
            } => self.apply_style(style, *category).and_then(|()| match category {
                Category::Stroke => self.surface.stroke_path(path),
                Category::Fill => self.surface.fill_path(path),
            }),
            DrawOp::Media {
                media,
                dest,
                transform,
                style,
            } => self.apply_style(style, Category::Fill).and_then(|()| {
                self.surface.push_transform(*transform);
                let r = self.surface.draw_media(media, *dest);
                self.surface.pop_transform();
                r
            }),
            DrawOp::Text {
                text,
                origin,
                font,
                transform,
                style,
            } => self.apply_style(style, Category::Fill).and_then(|()| {
                self.surface.push_transform(*transform);
                let r = self.surface.draw_text(text, *origin, font);
                self.surface.pop_transform();
                r
            }),
        };
        self.stats.draw_calls += 1;
        if let Err(err) = result {
            self.stats.errors += 1;
            tracing::warn!(%err, "surface draw failed, skipping");
        }
    }

    fn apply_style(&mut self, style: &ResolvedStyle, category: Category) -> DotfxResult<()> {
        self.stats.style_changes += 1;
        self.surface.apply_style(style, category)
    }

    /// Emit every bucket (strokes, then fills, each in first-insertion order), then the late
    /// queue, and start a fresh batch. Returns the stats of the finished batch.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn flush(&mut self) -> FlushStats {
        for (category, buckets) in [
            (Category::Stroke, self.strokes.take()),
            (Category::Fill, self.fills.take()),
        ] {
            for (_, bucket) in buckets {
                self.execute(&DrawOp::Path {
                    category,
                    path: bucket.path,
                    style: bucket.style,
                });
            }
        }

        let late = std::mem::take(&mut self.late);
        self.stats.late_ops += late.len();
        for op in &late {
            self.execute(op);
        }

        let stats = std::mem::take(&mut self.stats);
        tracing::trace!(?stats, "flushed batch");
        stats
    }

    pub fn pending_buckets(&self, category: Category) -> usize {
        match category {
            Category::Stroke => self.strokes.len(),
            Category::Fill => self.fills.len(),
        }
    }

    /// Pending buckets of `category` in emission order.
    pub fn buckets(&self, category: Category) -> impl Iterator<Item = (&Signature, &BezPath)> {
        let set = match category {
            Category::Stroke => &self.strokes,
            Category::Fill => &self.fills,
        };
        set.buckets.iter().map(|(sig, b)| (sig, &b.path))
    }

    pub fn pending_late(&self) -> usize {
        self.late.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/batch.rs"]
mod tests;
