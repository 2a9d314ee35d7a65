use std::collections::VecDeque;

use smallvec::SmallVec;

use crate::animation::anim::{Anim, AnimId, TickOutcome};

/// Which lane an animation is started in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Lane {
    /// Runs alongside every other concurrent animation.
    #[default]
    Concurrent,
    /// Queued behind the current backlog head; only the head receives ticks.
    ///
    /// With `force`, the current head is ended (update at progress 1 plus completion) and the new
    /// animation takes its place at the front.
    Backlog { force: bool },
}

/// The two animation lanes owned by one animated target.
///
/// Callbacks receive `&mut T`. When `T` itself owns the lanes, the owner must detach them for
/// the duration of a pass (see `Drawable`), so callbacks never observe a lane mid-iteration.
pub struct AnimLanes<T> {
    current: SmallVec<[Anim<T>; 2]>,
    backlog: VecDeque<Anim<T>>,
}

impl<T> Default for AnimLanes<T> {
    fn default() -> Self {
        Self {
            current: SmallVec::new(),
            backlog: VecDeque::new(),
        }
    }
}

impl<T> std::fmt::Debug for AnimLanes<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimLanes")
            .field("current", &self.current.len())
            .field("backlog", &self.backlog.len())
            .finish()
    }
}

impl<T> AnimLanes<T> {
    /// Start `anim` in `lane` and return its id.
    pub fn start(&mut self, anim: Anim<T>, lane: Lane, target: &mut T) -> AnimId {
        let id = anim.id();
        match lane {
            Lane::Concurrent => self.current.push(anim),
            Lane::Backlog { force: false } => self.backlog.push_back(anim),
            Lane::Backlog { force: true } => {
                if let Some(mut head) = self.backlog.pop_front() {
                    tracing::trace!(
                        ended = head.id().0,
                        replacement = id.0,
                        "forcing backlog head"
                    );
                    head.end(target);
                }
                self.backlog.push_front(anim);
            }
        }
        id
    }

    /// Tick every concurrent animation and the backlog head. Returns how many animations ended.
    pub fn tick(&mut self, target: &mut T, now_ms: f64, delta_ms: f64) -> usize {
        let mut ended = 0;

        let mut i = 0;
        while i < self.current.len() {
            if self.current[i].tick(target, now_ms, delta_ms) == TickOutcome::Ended {
                self.current.remove(i);
                ended += 1;
            } else {
                i += 1;
            }
        }

        if let Some(head) = self.backlog.front_mut()
            && head.tick(target, now_ms, delta_ms) == TickOutcome::Ended
        {
            self.backlog.pop_front();
            ended += 1;
        }

        ended
    }

    /// Cancel one animation. Its completion callback runs; the update callback does not.
    pub fn cancel(&mut self, id: AnimId, target: &mut T) -> bool {
        if let Some(pos) = self.current.iter().position(|a| a.id() == id) {
            let mut anim = self.current.remove(pos);
            anim.cancel(target);
            return true;
        }
        if let Some(pos) = self.backlog.iter().position(|a| a.id() == id)
            && let Some(mut anim) = self.backlog.remove(pos)
        {
            anim.cancel(target);
            return true;
        }
        false
    }

    /// Cancel every animation in both lanes.
    pub fn cancel_all(&mut self, target: &mut T) -> usize {
        let mut n = 0;
        for mut anim in self.current.drain(..) {
            anim.cancel(target);
            n += 1;
        }
        for mut anim in self.backlog.drain(..) {
            anim.cancel(target);
            n += 1;
        }
        n
    }

    /// Move every animation of `other` into `self`, keeping lane and order.
    pub fn append(&mut self, other: &mut Self) {
        self.current.extend(other.current.drain(..));
        self.backlog.extend(other.backlog.drain(..));
    }

    pub fn contains(&self, id: AnimId) -> bool {
        self.current.iter().any(|a| a.id() == id) || self.backlog.iter().any(|a| a.id() == id)
    }

    pub fn len(&self) -> usize {
        self.current.len() + self.backlog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.backlog.is_empty()
    }

    pub fn concurrent_len(&self) -> usize {
        self.current.len()
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Id of the only backlog animation currently receiving ticks.
    pub fn backlog_head(&self) -> Option<AnimId> {
        self.backlog.front().map(Anim::id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/lanes.rs"]
mod tests;
