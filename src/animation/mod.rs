//! Progress-based tweens and the per-object lanes that schedule them.

pub(crate) mod anim;
pub(crate) mod ease;
pub(crate) mod lanes;
