//! Frame sequencing and host input.

pub(crate) mod frame;
pub(crate) mod input;
