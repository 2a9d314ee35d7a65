use std::{path::PathBuf, sync::Arc};

use crate::assets::decode::load_image_file;
use crate::foundation::core::Vec2;
use crate::foundation::error::{DotfxError, DotfxResult};

/// Decoded raster image, premultiplied RGBA8, cheap to clone.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaHandle {
    width: u32,
    height: u32,
    rgba8_premul: Arc<Vec<u8>>,
}

impl MediaHandle {
    pub fn new(width: u32, height: u32, rgba8_premul: Arc<Vec<u8>>) -> DotfxResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| DotfxError::media("media dimensions overflow"))?;
        if width == 0 || height == 0 {
            return Err(DotfxError::media("media must be non-empty"));
        }
        if rgba8_premul.len() != expected {
            return Err(DotfxError::media(format!(
                "media buffer has {} bytes, expected {expected}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul,
        })
    }

    /// Uniform color block, mostly for tests and placeholders.
    pub fn solid(width: u32, height: u32, premul: [u8; 4]) -> DotfxResult<Self> {
        let n = (width as usize) * (height as usize);
        Self::new(width, height, Arc::new(premul.repeat(n)))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(f64::from(self.width), f64::from(self.height))
    }

    pub fn rgba8_premul(&self) -> &Arc<Vec<u8>> {
        &self.rgba8_premul
    }
}

/// Produces the current frame of a live source (camera, video, offscreen canvas).
pub type DynamicMedia = Box<dyn FnMut(f64) -> Option<MediaHandle>>;

/// Where an image display gets its pixels from.
pub enum MediaSource {
    /// Already decoded.
    Handle(MediaHandle),
    /// Image file decoded once when the display is built.
    File(PathBuf),
    /// Queried every frame with the current time; `None` skips drawing for that frame.
    Dynamic(DynamicMedia),
}

impl std::fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Handle(h) => f
                .debug_tuple("Handle")
                .field(&(h.width, h.height))
                .finish(),
            Self::File(p) => f.debug_tuple("File").field(p).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// A source after its one-time load step.
pub(crate) enum LoadedMedia {
    Static(MediaHandle),
    Dynamic(DynamicMedia),
}

impl MediaSource {
    pub(crate) fn load(self) -> DotfxResult<LoadedMedia> {
        match self {
            Self::Handle(h) => Ok(LoadedMedia::Static(h)),
            Self::File(path) => load_image_file(&path).map(LoadedMedia::Static),
            Self::Dynamic(f) => Ok(LoadedMedia::Dynamic(f)),
        }
    }
}

impl LoadedMedia {
    /// Pixels to draw this frame.
    pub(crate) fn current(&mut self, now_ms: f64) -> Option<MediaHandle> {
        match self {
            Self::Static(h) => Some(h.clone()),
            Self::Dynamic(f) => f(now_ms),
        }
    }

    pub(crate) fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
