use crate::foundation::core::{Point, Vec2};
use crate::render::surface::TextStyle;
use crate::scene::object::{Drawable, ObjKind};

#[derive(Clone, Debug, PartialEq)]
pub struct TextData {
    pub text: String,
    pub font: TextStyle,
    /// Last size reported by the surface's text measurement.
    pub(crate) measured: Option<Vec2>,
}

impl Drawable {
    /// Text centered on `pos` (horizontal anchor per the font's alignment). Drawn pass-through.
    pub fn text(pos: Point, text: impl Into<String>, font: TextStyle) -> Self {
        Self::with_kind(
            pos,
            ObjKind::Text(TextData {
                text: text.into(),
                font,
                measured: None,
            }),
        )
    }

    pub fn text_data(&self) -> Option<&TextData> {
        match &self.kind {
            ObjKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn text_data_mut(&mut self) -> Option<&mut TextData> {
        match &mut self.kind {
            ObjKind::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Rendered size as of the last drawn frame.
    pub fn text_size(&self) -> Option<Vec2> {
        self.text_data().and_then(|t| t.measured)
    }
}
