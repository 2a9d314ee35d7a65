use crate::animation::ease::Ease;
use crate::driver::input::Pointer;
use crate::foundation::core::{Affine, Point, Vec2};
use crate::render::batch::Render;
use crate::render::helpers::draw_line;
use crate::render::style::StyleInput;
use crate::scene::frame::FrameCtx;
use crate::scene::object::{Drawable, ObjId, ObjKind};

/// Other end of a dot connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionTarget {
    Object(ObjId),
    /// Index into the owning shape's member list, resolved when the shape joins a scene.
    Sibling(usize),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Connection {
    pub target: ConnectionTarget,
    /// Where the target was last seen; used once it has been removed.
    pub last_known: Option<Point>,
}

/// Pointer dragging for a dot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Draggable {
    /// Tween back to where the drag started on release (backlog lane, forced).
    pub return_home: Option<(f64, Ease)>,
    /// Extra grab distance beyond the dot radius.
    pub grab_padding: f64,
    dragging: bool,
    grab_offset: Vec2,
    home: Option<Point>,
}

impl Default for Draggable {
    fn default() -> Self {
        Self {
            return_home: None,
            grab_padding: 0.0,
            dragging: false,
            grab_offset: Vec2::ZERO,
            home: None,
        }
    }
}

impl Draggable {
    pub fn returning_home(duration_ms: f64, ease: Ease) -> Self {
        Self {
            return_home: Some((duration_ms, ease)),
            ..Self::default()
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DotData {
    pub connections: Vec<Connection>,
    pub drag: Option<Draggable>,
}

impl Drawable {
    pub fn dot(pos: Point) -> Self {
        Self::with_kind(pos, ObjKind::Dot(DotData::default()))
    }

    pub fn dot_data(&self) -> Option<&DotData> {
        match &self.kind {
            ObjKind::Dot(d) => Some(d),
            _ => None,
        }
    }

    pub fn dot_data_mut(&mut self) -> Option<&mut DotData> {
        match &mut self.kind {
            ObjKind::Dot(d) => Some(d),
            _ => None,
        }
    }

    pub fn draggable(mut self, drag: Draggable) -> Self {
        match self.dot_data_mut() {
            Some(d) => d.drag = Some(drag),
            None => tracing::warn!("draggable() only applies to dots"),
        }
        self
    }

    pub fn connected_to(mut self, target: ConnectionTarget) -> Self {
        self.add_connection(target);
        self
    }

    pub fn add_connection(&mut self, target: ConnectionTarget) {
        match self.dot_data_mut() {
            Some(d) => d.connections.push(Connection {
                target,
                last_known: None,
            }),
            None => tracing::warn!("connections only apply to dots"),
        }
    }
}

/// Batched lines from `dot` to each of its connections. Removed targets are drawn at their last
/// known position.
pub fn draw_dot_connections(
    render: &mut Render,
    dot: &mut Drawable,
    ctx: &FrameCtx<'_>,
    style: &StyleInput,
) {
    let from = dot.pos();
    let Some(data) = dot.dot_data_mut() else {
        return;
    };
    for conn in &mut data.connections {
        let live = match conn.target {
            ConnectionTarget::Object(id) => ctx.position_of(id),
            ConnectionTarget::Sibling(_) => None,
        };
        if live.is_some() {
            conn.last_known = live;
        }
        if let Some(to) = conn.last_known {
            draw_line(render, from, to, style);
        }
    }
}

/// Pointer drag step. `visual_pos` is where the dot is drawn; `to_local` maps surface space back
/// into the dot's coordinate space. `claim` makes sure one pointer grabs at most one dot.
pub(crate) fn update_drag(
    dot: &mut Drawable,
    pointer: Pointer,
    visual_pos: Point,
    radius: f64,
    to_local: Affine,
    claim: &mut Option<ObjId>,
) {
    let id = dot.id();
    let pos = dot.pos();
    let Some(mut drag) = dot.dot_data().and_then(|d| d.drag) else {
        return;
    };

    let mut release_to = None;
    if pointer.clicked {
        if let Some(p) = pointer.pos {
            let local = to_local * p;
            if !drag.dragging
                && claim.is_none()
                && pointer.distance_to(visual_pos) <= radius + drag.grab_padding
            {
                drag.dragging = true;
                drag.home = Some(pos);
                drag.grab_offset = pos - local;
                *claim = id;
            }
            if drag.dragging {
                dot.set_pos(local + drag.grab_offset);
            }
        }
    } else if drag.dragging {
        drag.dragging = false;
        if claim.is_some() && *claim == id {
            *claim = None;
        }
        if let (Some(home), Some(back)) = (drag.home, drag.return_home) {
            release_to = Some((home, back));
        }
    }

    if let Some(d) = dot.dot_data_mut() {
        d.drag = Some(drag);
    }
    if let Some((home, (duration_ms, ease))) = release_to {
        dot.move_to(home, duration_ms, ease, true);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/dot.rs"]
mod tests;
