use crate::assets::media::{LoadedMedia, MediaSource};
use crate::foundation::core::{Point, Rect, Vec2};
use crate::scene::object::{Drawable, ObjKind};

pub struct ImageData {
    pub(crate) source: Option<MediaSource>,
    pub(crate) loaded: Option<LoadedMedia>,
    /// Display size; the media's natural size when unset.
    pub size: Option<Vec2>,
    pub(crate) natural: Option<Vec2>,
}

impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageData")
            .field("source", &self.source)
            .field("loaded", &self.loaded.is_some())
            .field("size", &self.size)
            .field("natural", &self.natural)
            .finish()
    }
}

impl ImageData {
    /// Size the media is drawn at, once known.
    pub fn display_size(&self) -> Option<Vec2> {
        self.size.or(self.natural)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub(crate) fn dest(&self, center: Point) -> Option<Rect> {
        let size = self.display_size()?;
        Some(Rect::from_center_size(center, size.to_size()))
    }
}

impl Drawable {
    /// Media centered on `pos`. The source is loaded when the object joins a scene; failures go
    /// to the object's error callback and leave it drawing nothing.
    pub fn image(pos: Point, source: MediaSource) -> Self {
        Self::with_kind(
            pos,
            ObjKind::Image(ImageData {
                source: Some(source),
                loaded: None,
                size: None,
                natural: None,
            }),
        )
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        match self.image_data_mut() {
            Some(img) => img.size = Some(size),
            None => tracing::warn!("with_size() only applies to images"),
        }
        self
    }

    pub fn image_data(&self) -> Option<&ImageData> {
        match &self.kind {
            ObjKind::Image(i) => Some(i),
            _ => None,
        }
    }

    pub fn image_data_mut(&mut self) -> Option<&mut ImageData> {
        match &mut self.kind {
            ObjKind::Image(i) => Some(i),
            _ => None,
        }
    }

    /// Resolve the pending source; called once on insertion.
    pub(crate) fn load_media(&mut self) {
        let Some(img) = self.image_data_mut() else {
            return;
        };
        let Some(source) = img.source.take() else {
            return;
        };
        match source.load() {
            Ok(loaded) => {
                if let LoadedMedia::Static(h) = &loaded {
                    img.natural = Some(h.size());
                }
                img.loaded = Some(loaded);
            }
            Err(err) => self.report_error(&err),
        }
    }
}
