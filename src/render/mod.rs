//! Style signatures, the per-frame batch accumulator and the drawing surfaces it flushes into.

pub(crate) mod batch;
pub(crate) mod cpu;
pub(crate) mod helpers;
pub(crate) mod raster;
pub(crate) mod recording;
pub(crate) mod style;
pub(crate) mod surface;
