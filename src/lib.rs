//! dotfx is a real-time 2D visual-effects engine for dots, shapes, text and images.
//!
//! The engine is frame-driven and single-threaded:
//!
//! - Build objects ([`Drawable::dot`], [`Drawable::shape`], [`Drawable::text`],
//!   [`Drawable::image`]) and add them to a [`Scene`]
//! - Drive the scene with a [`FrameDriver`], which clamps deltas, throttles to an fps limit and
//!   runs every frame phase in a fixed order
//! - Draws go through [`Render`], which merges geometry sharing a style signature into one
//!   surface call per style per frame, then flushes into a [`Surface`] ([`CpuSurface`] rasterizes
//!   with `vello_cpu`, [`RecordingSurface`] records calls)
#![forbid(unsafe_code)]

mod assets;
mod foundation;

pub(crate) mod animation;
/// Engine-wide configuration.
pub mod config;
pub(crate) mod driver;
pub(crate) mod render;
pub(crate) mod scene;

pub use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba, Vec2, Viewport};
pub use crate::foundation::error::{DotfxError, DotfxResult};
pub use crate::foundation::math::{Rng64, distance, fade, falloff, normalize_degrees, ratio};

pub use crate::animation::anim::{Anim, AnimFrame, AnimId, AnimState, TickOutcome};
pub use crate::animation::ease::Ease;
pub use crate::animation::lanes::{AnimLanes, Lane};

pub use crate::assets::decode::{decode_image, load_image_file};
pub use crate::assets::media::{DynamicMedia, MediaHandle, MediaSource};

pub use crate::config::EngineConfig;

pub use crate::render::batch::{DEFAULT_MIN_VISIBLE_ALPHA, DrawOp, FlushStats, Render};
pub use crate::render::cpu::{CpuSurface, FrameRgba};
pub use crate::render::helpers::{
    PATH_TOLERANCE, circle_path, draw_line, draw_outer_ring, line_path, polygon_path,
};
pub use crate::render::recording::{RecordingSurface, SurfaceCall, SurfaceLog};
pub use crate::render::style::{
    Category, ColorStop, CompositeOp, DEFAULT_LINE_WIDTH, Filter, FilterOp, Gradient,
    GradientKind, LineCap, LineJoin, LineStyle, Paint, PaintId, ProfileId, ResolvedPaint,
    ResolvedStyle, Signature, StyleBook, StyleInput, StyleProfile, VisualEffects,
};
pub use crate::render::surface::{Surface, TextAlign, TextStyle, aligned_left};

pub use crate::driver::frame::{FrameCallback, FrameDriver, FrameInfo, FrameReport, RunStats};
pub use crate::driver::input::Pointer;

pub use crate::scene::arena::{Scene, SceneStats};
pub use crate::scene::dot::{
    Connection, ConnectionTarget, DotData, Draggable, draw_dot_connections,
};
pub use crate::scene::frame::{FrameCtx, Positions};
pub use crate::scene::image::ImageData;
pub use crate::scene::object::{
    ActivationMargin, Anchor, AnchorFn, Appearance, Drawable, ErrorHook, ObjId, ObjKind,
    SetupHook, UpdateHook,
};
pub use crate::scene::shape::{DotCtx, DrawEffectFn, ShapeData, aggregate_bounds, generate_dots};
pub use crate::scene::text::TextData;
