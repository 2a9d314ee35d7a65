//! External media: decoded raster images and per-frame dynamic sources.

pub(crate) mod decode;
pub(crate) mod media;
