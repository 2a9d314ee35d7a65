//! Scene objects (dots, shapes, text, images), their transform model and the arena that runs
//! them once per frame.

pub(crate) mod arena;
pub(crate) mod dot;
pub(crate) mod frame;
pub(crate) mod image;
pub(crate) mod object;
pub(crate) mod shape;
pub(crate) mod text;
