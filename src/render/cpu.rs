use std::collections::HashMap;

use crate::assets::media::MediaHandle;
use crate::foundation::core::{Affine, BezPath, Point, Rect, Viewport};
use crate::foundation::error::{DotfxError, DotfxResult};
use crate::render::raster::{
    affine_to_cpu, apply_filters, bezpath_to_cpu, image_paint, rasterize_gradient,
};
use crate::render::style::{
    Category, CompositeOp, Gradient, LineCap, LineJoin, LineStyle, PaintId, ResolvedPaint,
    ResolvedStyle,
};
use crate::render::surface::{Surface, TextStyle};

/// Premultiplied RGBA8 snapshot of a rendered frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRgba {
    /// Un-premultiplied copy, as expected by image encoders.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct GradientKey {
    paint: PaintId,
    revision: u32,
    bounds: [u64; 4],
}

struct ActiveStyle {
    style: ResolvedStyle,
    category: Category,
}

/// Raster surface on `vello_cpu`.
///
/// Draw calls accumulate in a render context and are rasterized at [`Surface::end_frame`].
/// Draws whose style carries filters are rendered offscreen, filtered, and composited back as an
/// image. Text draws need a font collaborator and are skipped.
pub struct CpuSurface {
    width: u16,
    height: u16,
    clear_rgba: Option<[u8; 4]>,
    ctx: vello_cpu::RenderContext,
    scratch: Option<vello_cpu::RenderContext>,
    pixmap: vello_cpu::Pixmap,
    transforms: Vec<Affine>,
    active: Option<ActiveStyle>,
    gradient_cache: HashMap<GradientKey, vello_cpu::Image>,
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("clear_rgba", &self.clear_rgba)
            .field("transforms", &self.transforms.len())
            .finish_non_exhaustive()
    }
}

const GRADIENT_CACHE_LIMIT: usize = 64;

impl CpuSurface {
    pub fn new(width: u32, height: u32) -> DotfxResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| DotfxError::surface("surface width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| DotfxError::surface("surface height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(DotfxError::surface("surface must be non-empty"));
        }
        Ok(Self {
            width: w,
            height: h,
            clear_rgba: None,
            ctx: vello_cpu::RenderContext::new(w, h),
            scratch: None,
            pixmap: vello_cpu::Pixmap::new(w, h),
            transforms: Vec::new(),
            active: None,
            gradient_cache: HashMap::new(),
        })
    }

    /// Background painted by every [`Surface::clear`]; `None` keeps it transparent.
    pub fn with_clear_rgba(mut self, clear: Option<[u8; 4]>) -> Self {
        self.clear_rgba = clear;
        self
    }

    /// Pixels of the last finished frame.
    pub fn snapshot(&self) -> FrameRgba {
        FrameRgba {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.pixmap.data_as_u8_slice().to_vec(),
        }
    }

    fn current_transform(&self) -> Affine {
        self.transforms.last().copied().unwrap_or(Affine::IDENTITY)
    }

    fn gradient_image(
        &mut self,
        paint: PaintId,
        revision: u32,
        gradient: &Gradient,
        bounds: Rect,
    ) -> DotfxResult<vello_cpu::Image> {
        let key = GradientKey {
            paint,
            revision,
            bounds: [
                bounds.x0.to_bits(),
                bounds.y0.to_bits(),
                bounds.x1.to_bits(),
                bounds.y1.to_bits(),
            ],
        };
        if let Some(img) = self.gradient_cache.get(&key) {
            return Ok(img.clone());
        }
        let (w, h) = (u32::from(self.width), u32::from(self.height));
        let bytes = rasterize_gradient(gradient, bounds, w, h);
        let img = image_paint(&bytes, w, h)?;
        if self.gradient_cache.len() >= GRADIENT_CACHE_LIMIT {
            self.gradient_cache.clear();
        }
        self.gradient_cache.insert(key, img.clone());
        Ok(img)
    }

    /// Configure `ctx` for drawing with `style` under `transform`.
    fn prepare(
        &mut self,
        use_scratch: bool,
        style: &ResolvedStyle,
        category: Category,
        transform: Affine,
    ) -> DotfxResult<()> {
        let gradient = match &style.paint {
            ResolvedPaint::Gradient {
                id,
                revision,
                gradient,
                bounds,
            } => Some(self.gradient_image(*id, *revision, gradient, *bounds)?),
            ResolvedPaint::Color(_) => None,
        };
        let ctx = if use_scratch {
            self.scratch
                .as_mut()
                .ok_or_else(|| DotfxError::surface("scratch context missing"))?
        } else {
            &mut self.ctx
        };

        ctx.set_transform(affine_to_cpu(transform));
        // Filtered draws keep source-over offscreen; the composite op applies when compositing.
        ctx.set_blend_mode(if use_scratch || !style.filter.is_none() {
            vello_cpu::peniko::BlendMode::default()
        } else {
            blend_mode(style.composite)
        });
        match (&style.paint, gradient) {
            (ResolvedPaint::Color(c), _) => {
                let [r, g, b, a] = c.with_alpha(c.a * style.opacity).to_rgba8();
                ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            }
            (ResolvedPaint::Gradient { .. }, Some(img)) => {
                ctx.set_paint_transform(affine_to_cpu(transform.inverse()));
                ctx.set_paint(img);
            }
            (ResolvedPaint::Gradient { .. }, None) => {
                return Err(DotfxError::surface("gradient paint missing"));
            }
        }
        if category == Category::Stroke {
            ctx.set_stroke(stroke_for(&style.line));
        }
        Ok(())
    }

    /// Run `draw` either straight into the frame or, for filtered styles, offscreen and then
    /// composite the filtered result over the frame.
    fn draw_styled(
        &mut self,
        draw: impl FnOnce(&mut vello_cpu::RenderContext) -> DotfxResult<()>,
    ) -> DotfxResult<()> {
        let Some(active) = self.active.take() else {
            return Err(DotfxError::surface("draw without an applied style"));
        };
        let transform = self.current_transform();
        let result = if active.style.filter.is_none() {
            self.prepare(false, &active.style, active.category, transform)
                .and_then(|()| {
                    let needs_layer = matches!(active.style.paint, ResolvedPaint::Gradient { .. })
                        && active.style.opacity < 1.0;
                    if needs_layer {
                        self.ctx.push_opacity_layer(active.style.opacity as f32);
                    }
                    let r = draw(&mut self.ctx);
                    if needs_layer {
                        self.ctx.pop_layer();
                    }
                    r
                })
        } else {
            self.draw_filtered(&active, transform, draw)
        };
        self.active = Some(active);
        result
    }

    fn draw_filtered(
        &mut self,
        active: &ActiveStyle,
        transform: Affine,
        draw: impl FnOnce(&mut vello_cpu::RenderContext) -> DotfxResult<()>,
    ) -> DotfxResult<()> {
        let (w, h) = (self.width, self.height);
        let mut scratch = match self.scratch.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        scratch.reset();
        self.scratch = Some(scratch);

        self.prepare(true, &active.style, active.category, transform)?;
        let scratch = self
            .scratch
            .as_mut()
            .ok_or_else(|| DotfxError::surface("scratch context missing"))?;
        if matches!(active.style.paint, ResolvedPaint::Gradient { .. })
            && active.style.opacity < 1.0
        {
            scratch.push_opacity_layer(active.style.opacity as f32);
            draw(scratch)?;
            scratch.pop_layer();
        } else {
            draw(scratch)?;
        }
        scratch.flush();
        let mut offscreen = vello_cpu::Pixmap::new(w, h);
        scratch.render_to_pixmap(&mut offscreen);

        let mut bytes = offscreen.data_as_u8_slice().to_vec();
        apply_filters(
            &mut bytes,
            u32::from(w),
            u32::from(h),
            &active.style.filter.ops,
        )?;
        let img = image_paint(&bytes, u32::from(w), u32::from(h))?;

        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_blend_mode(blend_mode(active.style.composite));
        self.ctx.set_paint(img);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(w),
            f64::from(h),
        ));
        Ok(())
    }
}

fn stroke_for(line: &LineStyle) -> vello_cpu::kurbo::Stroke {
    let join = match line.join {
        LineJoin::Miter => vello_cpu::kurbo::Join::Miter,
        LineJoin::Round => vello_cpu::kurbo::Join::Round,
        LineJoin::Bevel => vello_cpu::kurbo::Join::Bevel,
    };
    let cap = match line.cap {
        LineCap::Butt => vello_cpu::kurbo::Cap::Butt,
        LineCap::Round => vello_cpu::kurbo::Cap::Round,
        LineCap::Square => vello_cpu::kurbo::Cap::Square,
    };
    let stroke = vello_cpu::kurbo::Stroke::new(line.width)
        .with_join(join)
        .with_caps(cap);
    if line.dash.is_empty() {
        stroke
    } else {
        stroke.with_dashes(line.dash_offset, line.dash.iter().copied())
    }
}

fn blend_mode(op: CompositeOp) -> vello_cpu::peniko::BlendMode {
    use vello_cpu::peniko::{BlendMode, Compose, Mix};

    let (mix, compose) = match op {
        CompositeOp::SourceOver => (Mix::Normal, Compose::SrcOver),
        CompositeOp::SourceIn => (Mix::Normal, Compose::SrcIn),
        CompositeOp::SourceOut => (Mix::Normal, Compose::SrcOut),
        CompositeOp::SourceAtop => (Mix::Normal, Compose::SrcAtop),
        CompositeOp::DestinationOver => (Mix::Normal, Compose::DestOver),
        CompositeOp::DestinationIn => (Mix::Normal, Compose::DestIn),
        CompositeOp::DestinationOut => (Mix::Normal, Compose::DestOut),
        CompositeOp::DestinationAtop => (Mix::Normal, Compose::DestAtop),
        CompositeOp::Lighter => (Mix::Normal, Compose::Plus),
        CompositeOp::Copy => (Mix::Normal, Compose::Copy),
        CompositeOp::Xor => (Mix::Normal, Compose::Xor),
        CompositeOp::Multiply => (Mix::Multiply, Compose::SrcOver),
        CompositeOp::Screen => (Mix::Screen, Compose::SrcOver),
        CompositeOp::Overlay => (Mix::Overlay, Compose::SrcOver),
        CompositeOp::Darken => (Mix::Darken, Compose::SrcOver),
        CompositeOp::Lighten => (Mix::Lighten, Compose::SrcOver),
        CompositeOp::ColorDodge => (Mix::ColorDodge, Compose::SrcOver),
        CompositeOp::ColorBurn => (Mix::ColorBurn, Compose::SrcOver),
        CompositeOp::HardLight => (Mix::HardLight, Compose::SrcOver),
        CompositeOp::SoftLight => (Mix::SoftLight, Compose::SrcOver),
        CompositeOp::Difference => (Mix::Difference, Compose::SrcOver),
        CompositeOp::Exclusion => (Mix::Exclusion, Compose::SrcOver),
        CompositeOp::Hue => (Mix::Hue, Compose::SrcOver),
        CompositeOp::Saturation => (Mix::Saturation, Compose::SrcOver),
        CompositeOp::Color => (Mix::Color, Compose::SrcOver),
        CompositeOp::Luminosity => (Mix::Luminosity, Compose::SrcOver),
    };
    BlendMode::new(mix, compose)
}

impl Surface for CpuSurface {
    fn size(&self) -> Viewport {
        Viewport::new(f64::from(self.width), f64::from(self.height))
    }

    fn clear(&mut self) -> DotfxResult<()> {
        self.ctx.reset();
        self.transforms.clear();
        self.active = None;
        if let Some([r, g, b, a]) = self.clear_rgba {
            self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(self.width),
                f64::from(self.height),
            ));
        }
        Ok(())
    }

    fn apply_style(&mut self, style: &ResolvedStyle, category: Category) -> DotfxResult<()> {
        self.active = Some(ActiveStyle {
            style: style.clone(),
            category,
        });
        Ok(())
    }

    fn stroke_path(&mut self, path: &BezPath) -> DotfxResult<()> {
        let cpu_path = bezpath_to_cpu(path);
        self.draw_styled(|ctx| {
            ctx.stroke_path(&cpu_path);
            Ok(())
        })
    }

    fn fill_path(&mut self, path: &BezPath) -> DotfxResult<()> {
        let cpu_path = bezpath_to_cpu(path);
        self.draw_styled(|ctx| {
            ctx.fill_path(&cpu_path);
            Ok(())
        })
    }

    fn push_transform(&mut self, transform: Affine) {
        let next = self.current_transform() * transform;
        self.transforms.push(next);
    }

    fn pop_transform(&mut self) {
        self.transforms.pop();
    }

    fn draw_media(&mut self, media: &MediaHandle, dest: Rect) -> DotfxResult<()> {
        if dest.width() <= 0.0 || dest.height() <= 0.0 {
            return Ok(());
        }
        let img = image_paint(media.rgba8_premul(), media.width(), media.height())?;
        let opacity = self
            .active
            .as_ref()
            .map_or(1.0, |a| a.style.opacity.clamp(0.0, 1.0));
        let fit = Affine::translate((dest.x0, dest.y0))
            * Affine::scale_non_uniform(
                dest.width() / f64::from(media.width()),
                dest.height() / f64::from(media.height()),
            );
        let cpu_dest = vello_cpu::kurbo::Rect::new(dest.x0, dest.y0, dest.x1, dest.y1);
        self.draw_styled(move |ctx| {
            ctx.set_paint_transform(affine_to_cpu(fit));
            ctx.set_paint(img);
            if opacity < 1.0 {
                ctx.push_opacity_layer(opacity as f32);
                ctx.fill_rect(&cpu_dest);
                ctx.pop_layer();
            } else {
                ctx.fill_rect(&cpu_dest);
            }
            Ok(())
        })
    }

    fn draw_text(&mut self, text: &str, origin: Point, font: &TextStyle) -> DotfxResult<()> {
        tracing::trace!(
            text,
            x = origin.x,
            y = origin.y,
            font = %font.declaration(),
            "no font collaborator on the cpu surface, text skipped"
        );
        Ok(())
    }

    #[tracing::instrument(level = "trace", skip(self))]
    fn end_frame(&mut self) -> DotfxResult<()> {
        self.pixmap.data_as_u8_slice_mut().fill(0);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        self.active = None;
        Ok(())
    }

    fn read_pixels(&self) -> Option<FrameRgba> {
        Some(self.snapshot())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
