use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::config::EngineConfig;
use crate::driver::input::Pointer;
use crate::foundation::core::{Affine, Point, Rect, Rgba, Viewport};
use crate::foundation::math::ratio;
use crate::render::batch::{DrawOp, Render};
use crate::render::helpers::{circle_path, polygon_path};
use crate::render::style::{Paint, StyleInput, VisualEffects};
use crate::render::surface::aligned_left;
use crate::scene::dot::{ConnectionTarget, update_drag};
use crate::scene::frame::{FrameCtx, Positions};
use crate::scene::object::{ActivationMargin, Anchor, Appearance, Drawable, ObjId, ObjKind};
use crate::scene::shape::{DotCtx, aggregate_bounds, member_anchor};

/// Fallbacks for anything an object leaves unset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SceneDefaults {
    pub radius: f64,
    pub color: Rgba,
    pub margin: ActivationMargin,
    pub limit: f64,
    pub reentrant_passes: u32,
}

impl From<&EngineConfig> for SceneDefaults {
    fn from(cfg: &EngineConfig) -> Self {
        Self {
            radius: cfg.default_radius,
            color: cfg.default_color,
            margin: ActivationMargin::Margin(cfg.default_activation_margin),
            limit: cfg.default_limit,
            reentrant_passes: cfg.max_reentrant_passes,
        }
    }
}

/// What one scene pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct SceneStats {
    /// Objects processed (updated, animated and drawn).
    pub active: usize,
    /// Objects skipped by their activation margin.
    pub culled: usize,
    /// Objects skipped because a hook panicked earlier.
    pub faulted: usize,
    pub anims_ended: usize,
    /// Objects swept at the end of the pass.
    pub removed: usize,
}

#[derive(Clone, Copy, Debug)]
struct Tick {
    now_ms: f64,
    delta_ms: f64,
    pointer: Pointer,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    obj: Option<Box<Drawable>>,
}

/// Owner of every object, addressed by generational [`ObjId`]s.
///
/// Top-level objects are processed in insertion order; shape members are processed by their
/// shape, right after it.
#[derive(Debug)]
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    order: Vec<ObjId>,
    viewport: Viewport,
    defaults: SceneDefaults,
    positions: Positions,
    drag_claim: Option<ObjId>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl Scene {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            viewport: config.viewport,
            defaults: SceneDefaults::from(config),
            positions: Positions::default(),
            drag_claim: None,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Insert `obj` (and, for shapes, its member dots). Setup hooks run before this returns,
    /// shape first.
    pub fn add(&mut self, mut obj: Drawable) -> ObjId {
        let members = obj.take_pending_members();
        obj.fill_defaults(self.defaults.margin, self.defaults.reentrant_passes);
        obj.load_media();
        let id = self.insert(obj);
        self.order.push(id);

        if !members.is_empty() {
            let member_ids: Vec<ObjId> = members
                .into_iter()
                .map(|mut m| {
                    m.parent = Some(id);
                    if matches!(m.anchor(), Anchor::None) {
                        m = m.with_anchor(member_anchor(id));
                    }
                    m.fill_defaults(ActivationMargin::Unbounded, self.defaults.reentrant_passes);
                    self.insert(m)
                })
                .collect();

            for &mid in &member_ids {
                let Some(data) = self.get_mut(mid).and_then(Drawable::dot_data_mut) else {
                    continue;
                };
                for conn in &mut data.connections {
                    if let ConnectionTarget::Sibling(i) = conn.target {
                        match member_ids.get(i) {
                            Some(&target) => conn.target = ConnectionTarget::Object(target),
                            None => tracing::warn!(
                                member = %mid,
                                index = i,
                                "sibling connection out of range"
                            ),
                        }
                    }
                }
            }
            if let Some(shape) = self.get_mut(id).and_then(Drawable::shape_data_mut) {
                shape.members = member_ids;
            }
        }

        for setup_id in self.family(id) {
            if let Some(mut o) = self.take(setup_id) {
                isolate(&mut o, "setup", Drawable::run_setup);
                self.put(setup_id, o);
            }
        }
        id
    }

    /// Remove `id` (and a shape's members) right away, cancelling their animations. Returns
    /// `false` for stale handles.
    pub fn remove(&mut self, id: ObjId) -> bool {
        let Some(mut obj) = self.release(id) else {
            return false;
        };
        obj.cancel_all_anims();
        if let Some(shape) = obj.shape_data() {
            for &m in &shape.members {
                if let Some(mut member) = self.release(m) {
                    member.cancel_all_anims();
                }
            }
        }
        if let Some(parent) = obj.parent
            && let Some(shape) = self.get_mut(parent).and_then(Drawable::shape_data_mut)
        {
            shape.members.retain(|&m| m != id);
        }
        self.order.retain(|&o| o != id);
        if self.drag_claim == Some(id) {
            self.drag_claim = None;
        }
        true
    }

    pub fn contains(&self, id: ObjId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: ObjId) -> Option<&Drawable> {
        match self.slots.get(id.index as usize) {
            Some(slot) if slot.generation == id.generation => slot.obj.as_deref(),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, id: ObjId) -> Option<&mut Drawable> {
        match self.slots.get_mut(id.index as usize) {
            Some(slot) if slot.generation == id.generation => slot.obj.as_deref_mut(),
            _ => None,
        }
    }

    /// Member dots of a shape, in insertion order.
    pub fn members(&self, shape: ObjId) -> &[ObjId] {
        self.get(shape)
            .and_then(Drawable::shape_data)
            .map(|s| s.members())
            .unwrap_or(&[])
    }

    /// Union of the member circles of a shape (radius falling back to the shape, then the
    /// engine default).
    pub fn bounds(&self, shape: ObjId) -> Option<Rect> {
        let group = self.get(shape)?.look;
        aggregate_bounds(self.members(shape).iter().filter_map(|&m| {
            let dot = self.get(m)?;
            Some((dot.pos(), self.radius_of(dot, group)))
        }))
    }

    /// Top-level objects in processing order.
    pub fn top_level(&self) -> &[ObjId] {
        &self.order
    }

    /// Live objects, members included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.obj.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Drawable> {
        self.slots.iter().filter_map(|s| s.obj.as_deref())
    }

    pub fn position_of(&self, id: ObjId) -> Option<Point> {
        self.get(id).map(Drawable::pos)
    }

    /// One pass over every object: anchor, cull, update hook, animations, draw. Objects flagged
    /// with [`Drawable::remove`] are swept at the end.
    #[tracing::instrument(level = "trace", skip(self, render, pointer))]
    pub fn frame(
        &mut self,
        render: &mut Render,
        now_ms: f64,
        delta_ms: f64,
        pointer: Pointer,
    ) -> SceneStats {
        let tick = Tick {
            now_ms,
            delta_ms,
            pointer,
        };
        let mut stats = SceneStats::default();

        for id in self.order.clone() {
            let Some(mut obj) = self.take(id) else {
                continue;
            };
            if obj.faulted {
                stats.faulted += 1;
            } else {
                let mut step = SceneStats::default();
                let ok = isolate(&mut obj, "frame", |o| {
                    self.process(o, render, tick, &mut step);
                });
                if ok {
                    merge(&mut stats, step);
                } else {
                    stats.faulted += 1;
                }
            }
            self.put(id, obj);
        }

        stats.removed = self.sweep();
        if !pointer.clicked {
            self.drag_claim = None;
        }
        stats
    }

    // ---- frame internals ------------------------------------------------------------------

    fn ctx(&self, tick: Tick) -> FrameCtx<'_> {
        FrameCtx {
            now_ms: tick.now_ms,
            delta_ms: tick.delta_ms,
            viewport: self.viewport,
            pointer: tick.pointer,
            positions: &self.positions,
        }
    }

    /// Anchor, cull check, update hook and animations. Returns whether the object is active.
    fn advance(&mut self, obj: &mut Drawable, tick: Tick, stats: &mut SceneStats) -> bool {
        obj.resolve_anchor(&self.positions);
        let active = obj.is_active_in(self.viewport);
        if active {
            let ctx = self.ctx(tick);
            obj.run_update(&ctx);
            stats.anims_ended += obj.tick_anims(tick.now_ms, tick.delta_ms);
            stats.active += 1;
        } else {
            stats.culled += 1;
        }
        if let Some(id) = obj.id {
            self.positions.set(id, obj.pos());
        }
        active
    }

    fn process(
        &mut self,
        obj: &mut Drawable,
        render: &mut Render,
        tick: Tick,
        stats: &mut SceneStats,
    ) {
        if !self.advance(obj, tick, stats) {
            return;
        }
        match obj.kind {
            ObjKind::Shape(_) => self.process_shape(obj, render, tick, stats),
            ObjKind::Dot(_) => {
                let radius = self.radius_of(obj, Appearance::default());
                let xf = obj.local_transform(obj.pos());
                let visual = xf.map_or(obj.pos(), |m| m * obj.pos());
                let to_local = xf.map_or(Affine::IDENTITY, |m| m.inverse());
                let mut claim = self.drag_claim;
                update_drag(obj, tick.pointer, visual, radius, to_local, &mut claim);
                self.drag_claim = claim;
                let xf = obj.local_transform(obj.pos());
                self.draw_dot(render, obj, Appearance::default(), &VisualEffects::default(), xf);
            }
            ObjKind::Text(_) => draw_text(render, obj, self.defaults.color),
            ObjKind::Image(_) => draw_image(render, obj, tick.now_ms),
        }
    }

    fn process_shape(
        &mut self,
        shape: &mut Drawable,
        render: &mut Render,
        tick: Tick,
        stats: &mut SceneStats,
    ) {
        let members: Vec<ObjId> = shape
            .shape_data()
            .map(|s| s.members.clone())
            .unwrap_or_default();

        let mut live = Vec::with_capacity(members.len());
        for &mid in &members {
            let Some(mut dot) = self.take(mid) else {
                continue;
            };
            if dot.faulted {
                stats.faulted += 1;
            } else {
                let mut active = false;
                let ok = isolate(&mut dot, "frame", |d| {
                    active = self.advance(d, tick, stats);
                });
                if !ok {
                    stats.faulted += 1;
                } else if active {
                    live.push(mid);
                }
            }
            self.put(mid, dot);
        }

        let group = shape.look;
        let group_effects = shape.effects().clone();
        let siblings: Vec<(ObjId, Point)> = members
            .iter()
            .filter_map(|&m| self.position_of(m).map(|p| (m, p)))
            .collect();
        let center = aggregate_bounds(
            members
                .iter()
                .filter_map(|&m| self.get(m).map(|d| (d.pos(), self.radius_of(d, group)))),
        )
        .map_or(shape.pos(), |r| r.center());
        let xf = shape.local_transform(center);

        let (limit, draw_dots, fill) = match shape.shape_data() {
            Some(s) => (s.limit.unwrap_or(self.defaults.limit), s.draw_dots, s.fill.clone()),
            None => return,
        };

        if let Some(paint) = fill {
            let xf = xf.unwrap_or(Affine::IDENTITY);
            let path = polygon_path(siblings.iter().map(|&(_, p)| xf * p));
            render.fill(
                &path,
                &StyleInput::Literal {
                    paint,
                    effects: group_effects.clone(),
                    line: None,
                },
            );
        }

        let mut effect = shape.shape_data_mut().and_then(|s| s.draw_effect.take());
        let shape_pos = shape.pos();
        let to_local = xf.map_or(Affine::IDENTITY, |m| m.inverse());

        for &mid in &live {
            let Some(mut dot) = self.take(mid) else {
                continue;
            };
            let ok = isolate(&mut dot, "draw", |d| {
                let visual = xf.map_or(d.pos(), |m| m * d.pos());
                let radius = self.radius_of(d, group);
                let mut claim = self.drag_claim;
                update_drag(d, tick.pointer, visual, radius, to_local, &mut claim);
                self.drag_claim = claim;

                if let Some(effect) = effect.as_mut() {
                    let visual = xf.map_or(d.pos(), |m| m * d.pos());
                    let dist = tick.pointer.distance_to(visual);
                    let ctx = self.ctx(tick);
                    let dot_ctx = DotCtx {
                        frame: &ctx,
                        ratio: ratio(dist, limit),
                        dist,
                        siblings: &siblings,
                        shape_pos,
                        transform: xf.unwrap_or(Affine::IDENTITY),
                    };
                    effect(render, d, &dot_ctx);
                }
                if draw_dots {
                    self.draw_dot(render, d, group, &group_effects, xf);
                }
            });
            if !ok {
                stats.faulted += 1;
            }
            self.put(mid, dot);
        }

        if let Some(s) = shape.shape_data_mut()
            && s.draw_effect.is_none()
        {
            s.draw_effect = effect;
        }
    }

    fn radius_of(&self, dot: &Drawable, group: Appearance) -> f64 {
        dot.look.or(group).radius.unwrap_or(self.defaults.radius)
    }

    fn draw_dot(
        &self,
        render: &mut Render,
        dot: &Drawable,
        group: Appearance,
        group_effects: &VisualEffects,
        xf: Option<Affine>,
    ) {
        let look = dot.look.or(group);
        let mut path = circle_path(dot.pos(), look.radius.unwrap_or(self.defaults.radius));
        if let Some(xf) = xf {
            path.apply_affine(xf);
        }
        render.fill(
            &path,
            &StyleInput::Literal {
                paint: Paint::Color(look.resolved_color(self.defaults.color)),
                effects: dot.effects().or(group_effects),
                line: None,
            },
        );
    }

    // ---- slot plumbing --------------------------------------------------------------------

    fn insert(&mut self, mut obj: Drawable) -> ObjId {
        let id = match self.free.pop() {
            Some(index) => ObjId {
                index,
                generation: self.slots[index as usize].generation,
            },
            None => {
                self.slots.push(Slot::default());
                ObjId {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };
        obj.id = Some(id);
        self.positions.set(id, obj.pos());
        self.slots[id.index as usize].obj = Some(Box::new(obj));
        id
    }

    /// Detach an object while it is processed; `get` does not see it until [`Self::put`].
    fn take(&mut self, id: ObjId) -> Option<Box<Drawable>> {
        match self.slots.get_mut(id.index as usize) {
            Some(slot) if slot.generation == id.generation => slot.obj.take(),
            _ => None,
        }
    }

    fn put(&mut self, id: ObjId, obj: Box<Drawable>) {
        if let Some(slot) = self.slots.get_mut(id.index as usize)
            && slot.generation == id.generation
        {
            slot.obj = Some(obj);
        }
    }

    /// Free the slot for good, invalidating every handle to it.
    fn release(&mut self, id: ObjId) -> Option<Box<Drawable>> {
        let obj = self.take(id)?;
        let slot = &mut self.slots[id.index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.positions.clear_slot(id);
        Some(obj)
    }

    fn family(&self, id: ObjId) -> Vec<ObjId> {
        let mut out = vec![id];
        out.extend_from_slice(self.members(id));
        out
    }

    fn sweep(&mut self) -> usize {
        let doomed: Vec<ObjId> = self
            .iter()
            .filter(|o| o.is_removed())
            .filter_map(Drawable::id)
            .collect();
        let mut n = 0;
        for id in doomed {
            if self.remove(id) {
                n += 1;
            }
        }
        n
    }
}

fn merge(into: &mut SceneStats, step: SceneStats) {
    into.active += step.active;
    into.culled += step.culled;
    into.faulted += step.faulted;
    into.anims_ended += step.anims_ended;
}

/// Run `f` on `obj`, containing a panic to this object. Returns `false` if it panicked; the
/// object is then flagged faulted and skipped from now on.
fn isolate(obj: &mut Drawable, stage: &'static str, f: impl FnOnce(&mut Drawable)) -> bool {
    let result = catch_unwind(AssertUnwindSafe(|| f(&mut *obj)));
    match result {
        Ok(()) => true,
        Err(_) => {
            obj.faulted = true;
            tracing::error!(id = ?obj.id, stage, "object panicked, disabling it");
            false
        }
    }
}

fn draw_text(render: &mut Render, obj: &mut Drawable, default_color: Rgba) {
    let pos = obj.pos();
    let Some((size, align)) = obj.text_data().map(|data| {
        let size = render.surface().measure_text(&data.text, &data.font);
        (size, data.font.align)
    }) else {
        return;
    };
    let center = Point::new(aligned_left(pos.x, size.x, align) + size.x / 2.0, pos.y);
    let transform = obj.local_transform(center).unwrap_or(Affine::IDENTITY);
    let color = obj.look.resolved_color(default_color);
    let effects = obj.effects().clone();
    let Some(data) = obj.text_data_mut() else {
        return;
    };
    data.measured = Some(size);
    let style = render.resolve(
        &StyleInput::Literal {
            paint: Paint::Color(color),
            effects,
            line: None,
        },
        Rect::from_center_size(center, size.to_size()),
    );
    render.pass_through(DrawOp::Text {
        text: data.text.clone(),
        origin: pos,
        font: data.font.clone(),
        transform,
        style,
    });
}

fn draw_image(render: &mut Render, obj: &mut Drawable, now_ms: f64) {
    let pos = obj.pos();
    let transform = obj.local_transform(pos).unwrap_or(Affine::IDENTITY);
    let tint = Rgba::WHITE.with_alpha(obj.look.alpha.unwrap_or(1.0));
    let effects = obj.effects().clone();
    let Some(img) = obj.image_data_mut() else {
        return;
    };
    let Some(loaded) = img.loaded.as_mut() else {
        return;
    };
    let dynamic = loaded.is_dynamic();
    let Some(media) = loaded.current(now_ms) else {
        return;
    };
    img.natural = Some(media.size());
    let Some(dest) = img.dest(pos) else {
        return;
    };
    let style = render.resolve(
        &StyleInput::Literal {
            paint: Paint::Color(tint),
            effects,
            line: None,
        },
        dest,
    );
    let op = DrawOp::Media {
        media,
        dest,
        transform,
        style,
    };
    if dynamic {
        render.queue_late(op);
    } else {
        render.pass_through(op);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/arena.rs"]
mod tests;
