use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};

use crate::animation::anim::{Anim, AnimFrame, AnimId};
use crate::animation::ease::Ease;
use crate::animation::lanes::{AnimLanes, Lane};
use crate::foundation::core::{Affine, Point, Rgba, Vec2, Viewport};
use crate::foundation::error::DotfxError;
use crate::foundation::math::normalize_degrees;
use crate::render::style::VisualEffects;
use crate::scene::dot::DotData;
use crate::scene::frame::{FrameCtx, Positions};
use crate::scene::image::ImageData;
use crate::scene::shape::ShapeData;
use crate::scene::text::TextData;

/// Generational handle of an object inside a [`crate::Scene`].
///
/// Removing an object bumps its slot generation, so stale handles never alias a newer object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl std::fmt::Display for ObjId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

pub type AnchorFn = Box<dyn FnMut(&Drawable, Option<Point>) -> Point>;
pub type SetupHook = Box<dyn FnOnce(&mut Drawable)>;
pub type UpdateHook = Box<dyn FnMut(&mut Drawable, &FrameCtx<'_>)>;
pub type ErrorHook = Box<dyn FnMut(&DotfxError)>;

/// Reference point an object's position is measured from.
#[derive(Default)]
pub enum Anchor {
    /// Position is absolute.
    #[default]
    None,
    Fixed(Point),
    /// Evaluated every frame with the object and its parent's position.
    Dynamic(AnchorFn),
    /// Follows another object's position.
    Object(ObjId),
}

impl std::fmt::Debug for Anchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Fixed(p) => f.debug_tuple("Fixed").field(p).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
            Self::Object(id) => f.debug_tuple("Object").field(id).finish(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum AnchorState {
    /// Not resolved yet; the current position is an offset from the anchor.
    Offset,
    /// Not resolved yet; the current position is absolute and must not jump.
    Rebase,
    Known(Point),
}

/// Culling threshold around the visible surface.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ActivationMargin {
    /// Never culled.
    Unbounded,
    /// Culled when further than this many pixels outside the surface.
    Margin(f64),
}

impl ActivationMargin {
    pub fn allows(self, pos: Point, viewport: Viewport) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Margin(m) => viewport.contains_with_padding(pos, m.max(0.0)),
        }
    }
}

/// Radius / color / alpha overrides. Unset fields fall back to the owning group, then to the
/// engine defaults, at read time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Appearance {
    pub radius: Option<f64>,
    pub color: Option<Rgba>,
    /// Replaces the alpha of whatever color ends up being used.
    pub alpha: Option<f64>,
}

impl Appearance {
    pub fn or(self, fallback: Appearance) -> Appearance {
        Appearance {
            radius: self.radius.or(fallback.radius),
            color: self.color.or(fallback.color),
            alpha: self.alpha.or(fallback.alpha),
        }
    }

    pub(crate) fn resolved_color(self, default: Rgba) -> Rgba {
        let c = self.color.unwrap_or(default);
        match self.alpha {
            Some(a) => c.with_alpha(a),
            None => c,
        }
    }
}

/// Kind-specific state.
#[derive(Debug)]
pub enum ObjKind {
    Dot(DotData),
    Shape(ShapeData),
    Text(TextData),
    Image(ImageData),
}

enum AnimCommand {
    Start(Anim<Drawable>, Lane),
    Cancel(AnimId),
    CancelAll,
}

const DEFAULT_REENTRANT_PASSES: u32 = 8;

/// A positioned, animatable scene object.
pub struct Drawable {
    pub(crate) id: Option<ObjId>,
    pub(crate) parent: Option<ObjId>,
    pub(crate) kind: ObjKind,
    pos: Point,
    anchor: Anchor,
    anchor_state: AnchorState,
    rotation: f64,
    scale: Vec2,
    pivot: Option<Point>,
    pub(crate) look: Appearance,
    effects: VisualEffects,
    margin: Option<ActivationMargin>,
    saved_margin: Option<ActivationMargin>,
    anims: AnimLanes<Drawable>,
    staged: Vec<AnimCommand>,
    pass_active: bool,
    pub(crate) reentrant_limit: u32,
    pub(crate) setup: Option<SetupHook>,
    update: Option<UpdateHook>,
    on_error: Option<ErrorHook>,
    removed: bool,
    pub(crate) faulted: bool,
}

impl std::fmt::Debug for Drawable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Drawable")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("kind", &self.kind)
            .field("pos", &self.pos)
            .field("anchor", &self.anchor)
            .field("rotation", &self.rotation)
            .field("scale", &self.scale)
            .field("effects", &self.effects)
            .field("anims", &self.anims)
            .field("removed", &self.removed)
            .field("faulted", &self.faulted)
            .finish_non_exhaustive()
    }
}

impl Drawable {
    pub(crate) fn with_kind(pos: Point, kind: ObjKind) -> Self {
        Self {
            id: None,
            parent: None,
            kind,
            pos,
            anchor: Anchor::None,
            anchor_state: AnchorState::Offset,
            rotation: 0.0,
            scale: Vec2::new(1.0, 1.0),
            pivot: None,
            look: Appearance::default(),
            effects: VisualEffects::default(),
            margin: None,
            saved_margin: None,
            anims: AnimLanes::default(),
            staged: Vec::new(),
            pass_active: false,
            reentrant_limit: DEFAULT_REENTRANT_PASSES,
            setup: None,
            update: None,
            on_error: None,
            removed: false,
            faulted: false,
        }
    }

    // ---- builders -------------------------------------------------------------------------

    /// Measure the position from `anchor`; the current position becomes the offset.
    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self.anchor_state = AnchorState::Offset;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.look.radius = Some(radius);
        self
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.look.color = Some(color);
        self
    }

    pub fn with_effects(mut self, effects: VisualEffects) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_margin(mut self, margin: ActivationMargin) -> Self {
        self.margin = Some(margin);
        self
    }

    /// Run once when the object joins a scene. Animations started here begin on the next tick.
    pub fn on_setup(mut self, hook: impl FnOnce(&mut Drawable) + 'static) -> Self {
        self.setup = Some(Box::new(hook));
        self
    }

    /// Run every active frame, after anchor resolution and before the animation lanes tick.
    pub fn on_update(mut self, hook: impl FnMut(&mut Drawable, &FrameCtx<'_>) + 'static) -> Self {
        self.update = Some(Box::new(hook));
        self
    }

    /// Receives resource failures (e.g. a media source that cannot be loaded).
    pub fn on_error(mut self, hook: impl FnMut(&DotfxError) + 'static) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    // ---- accessors ------------------------------------------------------------------------

    /// Scene handle; `None` until inserted.
    pub fn id(&self) -> Option<ObjId> {
        self.id
    }

    pub fn parent(&self) -> Option<ObjId> {
        self.parent
    }

    pub fn kind(&self) -> &ObjKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ObjKind {
        &mut self.kind
    }

    pub fn pos(&self) -> Point {
        self.pos
    }

    pub fn x(&self) -> f64 {
        self.pos.x
    }

    pub fn y(&self) -> f64 {
        self.pos.y
    }

    /// Absolute move; anchor-driven translations keep composing on top of it.
    pub fn set_pos(&mut self, pos: Point) {
        if pos.is_finite() {
            self.pos = pos;
        } else {
            tracing::warn!(?pos, "ignoring non-finite position");
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.set_pos(self.pos + delta);
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    /// Replace the anchor without moving the object; later anchor motion translates it.
    pub fn set_anchor(&mut self, anchor: Anchor) {
        self.anchor = anchor;
        self.anchor_state = AnchorState::Rebase;
    }

    /// Rotation in degrees, in `[0, 360)`.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn set_rotation(&mut self, deg: f64) {
        self.rotation = normalize_degrees(deg);
    }

    /// Rotate around `pivot` instead of the object's own center.
    pub fn rotate_at(&mut self, deg: f64, pivot: Point) {
        self.set_rotation(deg);
        self.pivot = Some(pivot);
    }

    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec2) {
        if scale.is_finite() {
            self.scale = scale;
        } else {
            tracing::warn!(?scale, "ignoring non-finite scale");
        }
    }

    pub fn scale_at(&mut self, scale: Vec2, pivot: Point) {
        self.set_scale(scale);
        self.pivot = Some(pivot);
    }

    /// Go back to transforming around the object's own center.
    pub fn clear_pivot(&mut self) {
        self.pivot = None;
    }

    pub fn appearance(&self) -> Appearance {
        self.look
    }

    pub fn set_radius(&mut self, radius: f64) {
        self.look.radius = radius.is_finite().then_some(radius.max(0.0));
    }

    pub fn set_color(&mut self, color: Rgba) {
        self.look.color = Some(color);
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.look.alpha = alpha.is_finite().then_some(alpha.clamp(0.0, 1.0));
    }

    pub fn effects(&self) -> &VisualEffects {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut VisualEffects {
        &mut self.effects
    }

    /// Own opacity, `1` when unset.
    pub fn opacity(&self) -> f64 {
        self.effects.opacity.unwrap_or(1.0)
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        if opacity.is_finite() {
            self.effects.opacity = Some(opacity.clamp(0.0, 1.0));
        }
    }

    pub fn margin(&self) -> Option<ActivationMargin> {
        self.margin
    }

    pub fn set_margin(&mut self, margin: ActivationMargin) {
        self.margin = Some(margin);
    }

    /// Cull as soon as the object leaves the visible surface; [`Self::enable`] restores the
    /// previous margin.
    pub fn disable(&mut self) {
        if self.saved_margin.is_none() {
            self.saved_margin = self.margin;
        }
        self.margin = Some(ActivationMargin::Margin(0.0));
    }

    pub fn enable(&mut self) {
        if let Some(m) = self.saved_margin.take() {
            self.margin = Some(m);
        }
    }

    /// Flag for removal; the scene sweeps it (and cancels its animations) at the end of the frame.
    pub fn remove(&mut self) {
        self.removed = true;
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// A hook of this object panicked; it is no longer processed.
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    pub fn anim_count(&self) -> usize {
        self.anims.len() + self.staged.len()
    }

    pub fn anims(&self) -> &AnimLanes<Drawable> {
        &self.anims
    }

    // ---- animation lanes ------------------------------------------------------------------

    /// Start an animation. Called from inside an animation or hook pass, the start is staged and
    /// committed once the pass finishes.
    pub fn play_anim(&mut self, anim: Anim<Drawable>, lane: Lane) -> AnimId {
        let id = anim.id();
        self.staged.push(AnimCommand::Start(anim, lane));
        if !self.pass_active {
            self.commit_staged();
        }
        id
    }

    pub fn cancel_anim(&mut self, id: AnimId) {
        self.staged.push(AnimCommand::Cancel(id));
        if !self.pass_active {
            self.commit_staged();
        }
    }

    pub fn cancel_all_anims(&mut self) {
        self.staged.push(AnimCommand::CancelAll);
        if !self.pass_active {
            self.commit_staged();
        }
    }

    /// Detach the lanes while `f` runs, so callbacks reaching back into this object stage their
    /// commands instead of touching a lane mid-iteration. The lanes are re-attached even if `f`
    /// panics.
    fn with_lanes<R>(&mut self, f: impl FnOnce(&mut AnimLanes<Drawable>, &mut Drawable) -> R) -> R {
        let mut lanes = std::mem::take(&mut self.anims);
        let was_active = std::mem::replace(&mut self.pass_active, true);
        let out = catch_unwind(AssertUnwindSafe(|| f(&mut lanes, &mut *self)));
        self.pass_active = was_active;
        lanes.append(&mut self.anims);
        self.anims = lanes;
        out.unwrap_or_else(|payload| resume_unwind(payload))
    }

    fn commit_staged(&mut self) {
        let mut passes = 0;
        while !self.staged.is_empty() {
            if passes >= self.reentrant_limit {
                tracing::warn!(
                    dropped = self.staged.len(),
                    limit = self.reentrant_limit,
                    "animation commands kept re-triggering, dropping the rest"
                );
                self.staged.clear();
                break;
            }
            passes += 1;
            let batch = std::mem::take(&mut self.staged);
            self.with_lanes(|lanes, obj| {
                for cmd in batch {
                    match cmd {
                        AnimCommand::Start(anim, lane) => {
                            lanes.start(anim, lane, obj);
                        }
                        AnimCommand::Cancel(id) => {
                            lanes.cancel(id, obj);
                        }
                        AnimCommand::CancelAll => {
                            lanes.cancel_all(obj);
                        }
                    }
                }
            });
        }
    }

    /// Tick both lanes. Returns how many animations ended.
    pub(crate) fn tick_anims(&mut self, now_ms: f64, delta_ms: f64) -> usize {
        self.commit_staged();
        let ended = self.with_lanes(|lanes, obj| lanes.tick(obj, now_ms, delta_ms));
        self.commit_staged();
        ended
    }

    pub(crate) fn run_update(&mut self, ctx: &FrameCtx<'_>) {
        let Some(mut hook) = self.update.take() else {
            return;
        };
        let was_active = std::mem::replace(&mut self.pass_active, true);
        let out = catch_unwind(AssertUnwindSafe(|| hook(&mut *self, ctx)));
        self.pass_active = was_active;
        if let Err(payload) = out {
            resume_unwind(payload);
        }
        if self.update.is_none() {
            self.update = Some(hook);
        }
    }

    pub(crate) fn run_setup(&mut self) {
        if let Some(hook) = self.setup.take() {
            hook(self);
        }
    }

    pub(crate) fn report_error(&mut self, err: &DotfxError) {
        match self.on_error.as_mut() {
            Some(hook) => hook(err),
            None => tracing::warn!(id = ?self.id, %err, "object error without an error callback"),
        }
    }

    // ---- per-frame transform model ----------------------------------------------------------

    /// Resolve the anchor and translate by its movement since the previous frame. A dead or
    /// non-finite anchor leaves the object where it is.
    pub(crate) fn resolve_anchor(&mut self, positions: &Positions) {
        let parent_pos = self.parent.and_then(|p| positions.get(p));
        let mut anchor = std::mem::take(&mut self.anchor);
        let point = match &mut anchor {
            Anchor::None => None,
            Anchor::Fixed(p) => Some(*p),
            Anchor::Dynamic(f) => Some(f(self, parent_pos)),
            Anchor::Object(id) => positions.get(*id),
        };
        self.anchor = anchor;

        let Some(point) = point.filter(|p| p.is_finite()) else {
            return;
        };
        match self.anchor_state {
            AnchorState::Offset => self.pos += point.to_vec2(),
            AnchorState::Rebase => {}
            AnchorState::Known(last) => self.pos += point - last,
        }
        self.anchor_state = AnchorState::Known(point);
    }

    pub(crate) fn is_active_in(&self, viewport: Viewport) -> bool {
        self.margin
            .unwrap_or(ActivationMargin::Unbounded)
            .allows(self.pos, viewport)
    }

    pub(crate) fn fill_defaults(&mut self, margin: ActivationMargin, reentrant_limit: u32) {
        if self.margin.is_none() {
            self.margin = Some(margin);
        }
        self.reentrant_limit = reentrant_limit.max(1);
    }

    /// Rotation/scale around `center` (or the explicit pivot); `None` for the identity.
    pub fn local_transform(&self, center: Point) -> Option<Affine> {
        if self.rotation == 0.0 && self.scale == Vec2::new(1.0, 1.0) {
            return None;
        }
        let pivot = self.pivot.unwrap_or(center).to_vec2();
        Some(
            Affine::translate(pivot)
                * Affine::rotate(self.rotation.to_radians())
                * Affine::scale_non_uniform(self.scale.x, self.scale.y)
                * Affine::translate(-pivot),
        )
    }

    // ---- tween helpers --------------------------------------------------------------------

    /// Tween the position to `target` through the backlog lane. Applied incrementally, so anchor
    /// motion during the tween still adds up.
    pub fn move_to(&mut self, target: Point, duration_ms: f64, ease: Ease, force: bool) -> AnimId {
        let mut from: Option<Point> = None;
        let mut applied = Vec2::ZERO;
        self.play_anim(
            Anim::new(
                move |obj: &mut Drawable, f: AnimFrame| {
                    let start = *from.get_or_insert(obj.pos - applied);
                    let d = (target - start) * f.progress;
                    obj.translate(d - applied);
                    applied = d;
                },
                duration_ms,
                ease,
            ),
            Lane::Backlog { force },
        )
    }

    /// Tween the position by `delta` through the backlog lane.
    pub fn move_by(&mut self, delta: Vec2, duration_ms: f64, ease: Ease, force: bool) -> AnimId {
        let mut applied = Vec2::ZERO;
        self.play_anim(
            Anim::new(
                move |obj: &mut Drawable, f: AnimFrame| {
                    let d = delta * f.progress;
                    obj.translate(d - applied);
                    applied = d;
                },
                duration_ms,
                ease,
            ),
            Lane::Backlog { force },
        )
    }

    pub fn rotate_to(&mut self, deg: f64, duration_ms: f64, ease: Ease) -> AnimId {
        let mut from: Option<f64> = None;
        self.play_anim(
            Anim::new(
                move |obj: &mut Drawable, f: AnimFrame| {
                    let start = *from.get_or_insert(obj.rotation);
                    obj.set_rotation(start + (deg - start) * f.progress);
                },
                duration_ms,
                ease,
            ),
            Lane::Concurrent,
        )
    }

    pub fn rotate_by(&mut self, deg: f64, duration_ms: f64, ease: Ease) -> AnimId {
        let mut applied = 0.0;
        self.play_anim(
            Anim::new(
                move |obj: &mut Drawable, f: AnimFrame| {
                    let d = deg * f.progress;
                    obj.set_rotation(obj.rotation + d - applied);
                    applied = d;
                },
                duration_ms,
                ease,
            ),
            Lane::Concurrent,
        )
    }

    pub fn scale_to(&mut self, target: Vec2, duration_ms: f64, ease: Ease) -> AnimId {
        let mut from: Option<Vec2> = None;
        self.play_anim(
            Anim::new(
                move |obj: &mut Drawable, f: AnimFrame| {
                    let start = *from.get_or_insert(obj.scale);
                    obj.set_scale(start + (target - start) * f.progress);
                },
                duration_ms,
                ease,
            ),
            Lane::Concurrent,
        )
    }

    pub fn fade_to(&mut self, opacity: f64, duration_ms: f64, ease: Ease) -> AnimId {
        let mut from: Option<f64> = None;
        self.play_anim(
            Anim::new(
                move |obj: &mut Drawable, f: AnimFrame| {
                    let start = *from.get_or_insert(obj.opacity());
                    obj.set_opacity(start + (opacity - start) * f.progress);
                },
                duration_ms,
                ease,
            ),
            Lane::Concurrent,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/object.rs"]
mod tests;
