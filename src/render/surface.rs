use crate::assets::media::MediaHandle;
use crate::foundation::core::{Affine, BezPath, Point, Rect, Vec2, Viewport};
use crate::foundation::error::DotfxResult;
use crate::render::cpu::FrameRgba;
use crate::render::style::{Category, ResolvedStyle};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextAlign {
    Start,
    #[default]
    Center,
    End,
}

/// Font description for text draws.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextStyle {
    pub family: String,
    pub size_px: f64,
    #[serde(default = "default_weight")]
    pub weight: u16,
    #[serde(default)]
    pub align: TextAlign,
}

fn default_weight() -> u16 {
    400
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_owned(),
            size_px: 16.0,
            weight: default_weight(),
            align: TextAlign::default(),
        }
    }
}

impl TextStyle {
    pub fn new(family: impl Into<String>, size_px: f64) -> Self {
        Self {
            family: family.into(),
            size_px,
            ..Self::default()
        }
    }

    /// CSS font shorthand, e.g. `700 46px bitcount`.
    pub fn declaration(&self) -> String {
        format!("{} {}px {}", self.weight, self.size_px, self.family)
    }
}

/// Immediate-mode drawing target the batcher flushes into.
///
/// Styles are applied once per bucket; geometry arrives already transformed into surface space.
/// Media and text draws use the transform stack instead.
pub trait Surface {
    fn size(&self) -> Viewport;

    /// Wipe the surface at frame start.
    fn clear(&mut self) -> DotfxResult<()>;

    /// Make `style` current for subsequent draws of `category`.
    fn apply_style(&mut self, style: &ResolvedStyle, category: Category) -> DotfxResult<()>;

    fn stroke_path(&mut self, path: &BezPath) -> DotfxResult<()>;

    fn fill_path(&mut self, path: &BezPath) -> DotfxResult<()>;

    /// Multiply `transform` onto the current transform until the matching [`Self::pop_transform`].
    fn push_transform(&mut self, transform: Affine);

    fn pop_transform(&mut self);

    /// Draw `media` scaled into `dest` with the current transform and style effects.
    fn draw_media(&mut self, media: &MediaHandle, dest: Rect) -> DotfxResult<()>;

    /// Draw `text` anchored at `origin` (horizontal anchor per `font.align`, vertically centered).
    fn draw_text(&mut self, text: &str, origin: Point, font: &TextStyle) -> DotfxResult<()>;

    /// Rendered size of `text`. The default is a monospace-ish estimate for surfaces without
    /// font metrics.
    fn measure_text(&self, text: &str, font: &TextStyle) -> Vec2 {
        let chars = text.chars().count() as f64;
        Vec2::new(chars * font.size_px * 0.6, font.size_px)
    }

    /// Called once after the frame's last draw.
    fn end_frame(&mut self) -> DotfxResult<()> {
        Ok(())
    }

    /// Pixels of the last finished frame, for surfaces that can read them back.
    fn read_pixels(&self) -> Option<FrameRgba> {
        None
    }
}

/// Left edge of a text box of `width` anchored at `x` with `align`.
pub fn aligned_left(x: f64, width: f64, align: TextAlign) -> f64 {
    match align {
        TextAlign::Start => x,
        TextAlign::Center => x - width / 2.0,
        TextAlign::End => x - width,
    }
}
