use crate::driver::input::Pointer;
use crate::foundation::core::{Point, Viewport};
use crate::scene::object::ObjId;

/// Positions of every live object, indexed by arena slot.
///
/// Taken at the start of a frame and refreshed entry by entry as objects finish their update, so
/// anchors resolve against settled positions without recursive lookups. Anchor cycles therefore
/// see a one-frame lag instead of diverging.
#[derive(Clone, Debug, Default)]
pub struct Positions {
    slots: Vec<Option<(u32, Point)>>,
}

impl Positions {
    pub fn get(&self, id: ObjId) -> Option<Point> {
        match self.slots.get(id.index as usize) {
            Some(Some((generation, p))) if *generation == id.generation => Some(*p),
            _ => None,
        }
    }

    pub(crate) fn set(&mut self, id: ObjId, pos: Point) {
        let i = id.index as usize;
        if self.slots.len() <= i {
            self.slots.resize(i + 1, None);
        }
        self.slots[i] = Some((id.generation, pos));
    }

    pub(crate) fn clear_slot(&mut self, id: ObjId) {
        if let Some(slot) = self.slots.get_mut(id.index as usize) {
            *slot = None;
        }
    }
}

/// Read-only frame context handed to object hooks.
#[derive(Clone, Copy, Debug)]
pub struct FrameCtx<'a> {
    /// Scene clock in milliseconds (scaled by the speed modifier, paused while stopped).
    pub now_ms: f64,
    pub delta_ms: f64,
    pub viewport: Viewport,
    pub pointer: Pointer,
    pub(crate) positions: &'a Positions,
}

impl FrameCtx<'_> {
    /// Current position of another object, if it is still alive.
    pub fn position_of(&self, id: ObjId) -> Option<Point> {
        self.positions.get(id)
    }

    /// `true` when `pos` is inside the viewport grown by `padding`.
    pub fn is_within(&self, pos: Point, padding: f64) -> bool {
        self.viewport.contains_with_padding(pos, padding)
    }
}
