use std::{cell::RefCell, rc::Rc};

use crate::assets::media::MediaHandle;
use crate::foundation::core::{Affine, BezPath, Point, Rect, Viewport};
use crate::foundation::error::{DotfxError, DotfxResult};
use crate::render::style::{Category, ResolvedStyle, Signature};
use crate::render::surface::{Surface, TextStyle};

/// One call observed by a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceCall {
    Clear,
    ApplyStyle {
        category: Category,
        signature: Signature,
        effective_alpha: f64,
    },
    StrokePath {
        subpaths: usize,
        bounds: Rect,
    },
    FillPath {
        subpaths: usize,
        bounds: Rect,
    },
    PushTransform(Affine),
    PopTransform,
    DrawMedia {
        width: u32,
        height: u32,
        dest: Rect,
    },
    DrawText {
        text: String,
        origin: Point,
    },
    EndFrame,
}

impl SurfaceCall {
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Self::StrokePath { .. }
                | Self::FillPath { .. }
                | Self::DrawMedia { .. }
                | Self::DrawText { .. }
        )
    }
}

/// Shared view of a recording surface's call log, usable after the surface was boxed.
#[derive(Clone, Debug, Default)]
pub struct SurfaceLog(Rc<RefCell<Vec<SurfaceCall>>>);

impl SurfaceLog {
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.0.borrow().clone()
    }

    /// Drain the log.
    pub fn take(&self) -> Vec<SurfaceCall> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn count(&self, pred: impl Fn(&SurfaceCall) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn draw_count(&self) -> usize {
        self.count(SurfaceCall::is_draw)
    }

    pub fn style_changes(&self) -> usize {
        self.count(|c| matches!(c, SurfaceCall::ApplyStyle { .. }))
    }

    fn push(&self, call: SurfaceCall) {
        self.0.borrow_mut().push(call);
    }
}

/// Surface that records every call instead of drawing. Used by tests and `simulate` runs.
#[derive(Debug)]
pub struct RecordingSurface {
    viewport: Viewport,
    log: SurfaceLog,
    fail_media: bool,
}

impl RecordingSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            log: SurfaceLog::default(),
            fail_media: false,
        }
    }

    pub fn log(&self) -> SurfaceLog {
        self.log.clone()
    }

    /// Make every media draw fail, to exercise error isolation.
    pub fn failing_media(mut self) -> Self {
        self.fail_media = true;
        self
    }
}

fn subpaths(path: &BezPath) -> usize {
    path.elements()
        .iter()
        .filter(|el| matches!(el, kurbo::PathEl::MoveTo(_)))
        .count()
}

impl Surface for RecordingSurface {
    fn size(&self) -> Viewport {
        self.viewport
    }

    fn clear(&mut self) -> DotfxResult<()> {
        self.log.push(SurfaceCall::Clear);
        Ok(())
    }

    fn apply_style(&mut self, style: &ResolvedStyle, category: Category) -> DotfxResult<()> {
        self.log.push(SurfaceCall::ApplyStyle {
            category,
            signature: style.signature(category),
            effective_alpha: style.effective_alpha(),
        });
        Ok(())
    }

    fn stroke_path(&mut self, path: &BezPath) -> DotfxResult<()> {
        self.log.push(SurfaceCall::StrokePath {
            subpaths: subpaths(path),
            bounds: kurbo::Shape::bounding_box(path),
        });
        Ok(())
    }

    fn fill_path(&mut self, path: &BezPath) -> DotfxResult<()> {
        self.log.push(SurfaceCall::FillPath {
            subpaths: subpaths(path),
            bounds: kurbo::Shape::bounding_box(path),
        });
        Ok(())
    }

    fn push_transform(&mut self, transform: Affine) {
        self.log.push(SurfaceCall::PushTransform(transform));
    }

    fn pop_transform(&mut self) {
        self.log.push(SurfaceCall::PopTransform);
    }

    fn draw_media(&mut self, media: &MediaHandle, dest: Rect) -> DotfxResult<()> {
        if self.fail_media {
            return Err(DotfxError::surface("media draws disabled"));
        }
        self.log.push(SurfaceCall::DrawMedia {
            width: media.width(),
            height: media.height(),
            dest,
        });
        Ok(())
    }

    fn draw_text(&mut self, text: &str, origin: Point, _font: &TextStyle) -> DotfxResult<()> {
        self.log.push(SurfaceCall::DrawText {
            text: text.to_owned(),
            origin,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> DotfxResult<()> {
        self.log.push(SurfaceCall::EndFrame);
        Ok(())
    }
}
