use std::{path::Path, sync::Arc};

use anyhow::Context;

use crate::assets::media::MediaHandle;
use crate::foundation::error::{DotfxError, DotfxResult};

/// Decode an encoded image (PNG, JPEG, ...) into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> DotfxResult<MediaHandle> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    MediaHandle::new(width, height, Arc::new(rgba8_premul))
}

#[tracing::instrument(level = "debug", fields(path = %path.display()))]
pub fn load_image_file(path: &Path) -> DotfxResult<MediaHandle> {
    let bytes = std::fs::read(path)
        .map_err(|e| DotfxError::media(format!("read '{}': {e}", path.display())))?;
    decode_image(&bytes)
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
