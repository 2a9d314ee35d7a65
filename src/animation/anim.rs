use std::sync::atomic::{AtomicU64, Ordering};

use crate::animation::ease::Ease;

/// Stable identifier of an [`Anim`], unique for the process lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnimId(pub u64);

impl AnimId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Values handed to an animation's update callback on every visual update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimFrame {
    /// Eased progress (may leave `[0, 1]` for overshooting curves).
    pub progress: f64,
    /// Completed cycles so far; always 0 for finite animations.
    pub play_count: u32,
    /// Frame delta in milliseconds.
    pub delta_ms: f64,
    /// Un-eased progress clamped to `[0, 1]`.
    pub raw_progress: f64,
}

/// Lifecycle of an [`Anim`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimState {
    /// Waiting for the tick that records the start time (also after each loop boundary).
    Unstarted,
    Running,
    Ended,
}

/// Result of a single [`Anim::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The start time was recorded; no visual update happened.
    Armed,
    /// The update callback ran with intermediate progress.
    Progressed,
    /// An infinite animation finished a cycle and re-armed.
    Looped,
    /// The animation ended; its owner must detach it.
    Ended,
}

type UpdateFn<T> = Box<dyn FnMut(&mut T, AnimFrame)>;
type EndFn<T> = Box<dyn FnOnce(&mut T)>;

/// A progress-based tween over a target of type `T`.
///
/// A negative duration makes the animation loop forever with a period of `|duration|`.
pub struct Anim<T> {
    id: AnimId,
    duration_ms: f64,
    ease: Ease,
    on_update: UpdateFn<T>,
    on_end: Option<EndFn<T>>,
    start_ms: Option<f64>,
    progress: f64,
    play_count: u32,
    last_delta_ms: f64,
    ended: bool,
}

impl<T> std::fmt::Debug for Anim<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Anim")
            .field("id", &self.id)
            .field("duration_ms", &self.duration_ms)
            .field("ease", &self.ease)
            .field("start_ms", &self.start_ms)
            .field("progress", &self.progress)
            .field("play_count", &self.play_count)
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}

impl<T> Anim<T> {
    /// Build an animation. Non-finite durations fall back to `0` (ends on its first running tick).
    pub fn new(
        on_update: impl FnMut(&mut T, AnimFrame) + 'static,
        duration_ms: f64,
        ease: Ease,
    ) -> Self {
        let duration_ms = if duration_ms.is_finite() {
            duration_ms
        } else {
            tracing::warn!(duration_ms, "non-finite animation duration, using 0");
            0.0
        };
        Self {
            id: AnimId::next(),
            duration_ms,
            ease,
            on_update: Box::new(on_update),
            on_end: None,
            start_ms: None,
            progress: 0.0,
            play_count: 0,
            last_delta_ms: 0.0,
            ended: false,
        }
    }

    /// Build an infinitely looping animation with the given cycle period.
    pub fn looping(
        on_update: impl FnMut(&mut T, AnimFrame) + 'static,
        period_ms: f64,
        ease: Ease,
    ) -> Self {
        Self::new(on_update, -period_ms.abs(), ease)
    }

    /// Attach a completion callback, run once when the animation ends or is cancelled.
    pub fn on_end(mut self, on_end: impl FnOnce(&mut T) + 'static) -> Self {
        self.on_end = Some(Box::new(on_end));
        self
    }

    pub fn id(&self) -> AnimId {
        self.id
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn is_infinite(&self) -> bool {
        self.duration_ms < 0.0
    }

    pub fn ease(&self) -> Ease {
        self.ease
    }

    /// Last eased progress delivered to the update callback.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn play_count(&self) -> u32 {
        self.play_count
    }

    pub fn start_ms(&self) -> Option<f64> {
        self.start_ms
    }

    pub fn state(&self) -> AnimState {
        if self.ended {
            AnimState::Ended
        } else if self.start_ms.is_none() {
            AnimState::Unstarted
        } else {
            AnimState::Running
        }
    }

    /// Advance the animation to `now_ms`.
    ///
    /// The first tick only records the start time. Ended animations ignore further ticks.
    pub fn tick(&mut self, target: &mut T, now_ms: f64, delta_ms: f64) -> TickOutcome {
        if self.ended {
            return TickOutcome::Ended;
        }
        self.last_delta_ms = delta_ms;

        let Some(start) = self.start_ms else {
            self.start_ms = Some(now_ms);
            return TickOutcome::Armed;
        };

        let period = self.duration_ms.abs();
        let elapsed = now_ms - start;
        if elapsed < period {
            let raw = (elapsed / period).clamp(0.0, 1.0);
            self.progress = self.ease.apply(raw);
            (self.on_update)(
                target,
                AnimFrame {
                    progress: self.progress,
                    play_count: self.play_count,
                    delta_ms,
                    raw_progress: raw,
                },
            );
            return TickOutcome::Progressed;
        }

        if self.is_infinite() {
            self.progress = 1.0;
            (self.on_update)(
                target,
                AnimFrame {
                    progress: 1.0,
                    play_count: self.play_count,
                    delta_ms,
                    raw_progress: 1.0,
                },
            );
            self.play_count = self.play_count.saturating_add(1);
            self.start_ms = None;
            return TickOutcome::Looped;
        }

        self.end(target);
        TickOutcome::Ended
    }

    /// Finish now: deliver progress `1`, then run the completion callback.
    ///
    /// Calling `end` on an already ended animation does nothing.
    pub fn end(&mut self, target: &mut T) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.progress = 1.0;
        (self.on_update)(
            target,
            AnimFrame {
                progress: 1.0,
                play_count: self.play_count,
                delta_ms: self.last_delta_ms,
                raw_progress: 1.0,
            },
        );
        if let Some(on_end) = self.on_end.take() {
            on_end(target);
        }
    }

    /// Stop without a final visual update; the completion callback still runs exactly once.
    pub fn cancel(&mut self, target: &mut T) {
        if self.ended {
            return;
        }
        self.ended = true;
        if let Some(on_end) = self.on_end.take() {
            on_end(target);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/anim.rs"]
mod tests;
