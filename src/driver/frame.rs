use crate::animation::anim::{Anim, AnimId};
use crate::animation::lanes::{AnimLanes, Lane};
use crate::config::EngineConfig;
use crate::driver::input::Pointer;
use crate::foundation::core::Viewport;
use crate::render::batch::{FlushStats, Render};
use crate::render::surface::Surface;
use crate::scene::arena::{Scene, SceneStats};

/// Timing of the frame being drawn, handed to the per-frame callback.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct FrameInfo {
    /// Frames drawn before this one.
    pub frame: u64,
    /// Scene clock in milliseconds.
    pub now_ms: f64,
    /// Scene time since the previous drawn frame.
    pub delta_ms: f64,
    pub pointer: Pointer,
}

/// Everything one drawn frame did.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct FrameReport {
    pub info: FrameInfo,
    pub scene: SceneStats,
    pub batch: FlushStats,
    /// Scene-level animations that ended this frame.
    pub scene_anims_ended: usize,
}

/// Totals over a run of frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct RunStats {
    pub frames: u64,
    pub style_changes: usize,
    pub draw_calls: usize,
    pub batched_shapes: usize,
    pub pass_through: usize,
    pub late_ops: usize,
    pub dropped: usize,
    pub surface_errors: usize,
    pub culled: usize,
    pub faulted: usize,
}

impl RunStats {
    pub fn record(&mut self, report: &FrameReport) {
        self.frames += 1;
        self.style_changes += report.batch.style_changes;
        self.draw_calls += report.batch.draw_calls;
        self.batched_shapes += report.batch.batched_shapes;
        self.pass_through += report.batch.pass_through;
        self.late_ops += report.batch.late_ops;
        self.dropped += report.batch.dropped;
        self.surface_errors += report.batch.errors;
        self.culled += report.scene.culled;
        self.faulted += report.scene.faulted;
    }
}

pub type FrameCallback = Box<dyn FnMut(&mut Scene, &mut Render, &FrameInfo)>;

/// Sole sequencer of the engine: turns host timestamps into frames.
///
/// Every drawn frame runs, in order: surface clear, the scene pass (anchors, hooks, object
/// animations, draws), the batch flush, the per-frame callback, the scene-level animations and
/// finally the surface's end of frame.
pub struct FrameDriver {
    scene: Scene,
    render: Render,
    anims: AnimLanes<Scene>,
    on_frame: Option<FrameCallback>,
    pointer: Pointer,
    config: EngineConfig,
    running: bool,
    last_ms: Option<f64>,
    scene_ms: f64,
    drawn_ms: Option<f64>,
    throttle_acc: f64,
    frames: u64,
}

impl std::fmt::Debug for FrameDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDriver")
            .field("scene", &self.scene)
            .field("anims", &self.anims)
            .field("running", &self.running)
            .field("scene_ms", &self.scene_ms)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl FrameDriver {
    /// Build a stopped driver drawing into `surface`. The scene viewport follows the surface.
    pub fn new(config: EngineConfig, surface: Box<dyn Surface>) -> Self {
        let config = config.sanitized();
        let mut scene = Scene::new(&config);
        scene.resize(surface.size());
        let render = Render::new(surface).with_min_visible_alpha(config.min_visible_alpha);
        Self {
            scene,
            render,
            anims: AnimLanes::default(),
            on_frame: None,
            pointer: Pointer::default(),
            config,
            running: false,
            last_ms: None,
            scene_ms: 0.0,
            drawn_ms: None,
            throttle_acc: 0.0,
            frames: 0,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn render(&self) -> &Render {
        &self.render
    }

    pub fn render_mut(&mut self) -> &mut Render {
        &mut self.render
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Called once per drawn frame, after the batch flush.
    pub fn on_frame(
        &mut self,
        callback: impl FnMut(&mut Scene, &mut Render, &FrameInfo) + 'static,
    ) {
        self.on_frame = Some(Box::new(callback));
    }

    /// Start a scene-level animation; it ticks after the per-frame callback.
    pub fn play_anim(&mut self, anim: Anim<Scene>, lane: Lane) -> AnimId {
        self.anims.start(anim, lane, &mut self.scene)
    }

    pub fn cancel_anim(&mut self, id: AnimId) -> bool {
        self.anims.cancel(id, &mut self.scene)
    }

    pub fn scene_anims(&self) -> &AnimLanes<Scene> {
        &self.anims
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Resume ticking. Time spent stopped is not counted.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_ms = None;
        tracing::debug!(scene_ms = self.scene_ms, "driver started");
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.last_ms = None;
        tracing::debug!(scene_ms = self.scene_ms, frames = self.frames, "driver stopped");
    }

    pub fn set_pointer(&mut self, pointer: Pointer) {
        self.pointer = pointer;
    }

    pub fn pointer(&self) -> Pointer {
        self.pointer
    }

    /// Cull against a new viewport from the next frame on.
    pub fn resize(&mut self, viewport: Viewport) {
        self.scene.resize(viewport);
    }

    /// Scene clock in milliseconds.
    pub fn scene_time_ms(&self) -> f64 {
        self.scene_ms
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Feed one host timestamp. Returns a report when a frame was drawn; `None` while stopped or
    /// when the fps limit skips this tick.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn tick(&mut self, now_ms: f64) -> Option<FrameReport> {
        if !self.running {
            return None;
        }
        if !now_ms.is_finite() {
            tracing::warn!(now_ms, "ignoring non-finite timestamp");
            return None;
        }
        let elapsed = self.last_ms.map_or(0.0, |last| (now_ms - last).max(0.0));
        self.last_ms = Some(now_ms);
        let delta = elapsed.min(self.config.max_delta_ms);
        self.scene_ms += delta * self.config.speed_modifier;

        if let Some(fps) = self.config.fps_limit {
            let interval = 1000.0 / fps;
            self.throttle_acc += delta;
            if self.drawn_ms.is_some() && self.throttle_acc < interval {
                return None;
            }
            self.throttle_acc %= interval;
        }

        Some(self.draw_frame())
    }

    fn draw_frame(&mut self) -> FrameReport {
        let now_ms = self.scene_ms;
        let delta_ms = self.drawn_ms.map_or(0.0, |d| now_ms - d);
        self.drawn_ms = Some(now_ms);
        let info = FrameInfo {
            frame: self.frames,
            now_ms,
            delta_ms,
            pointer: self.pointer,
        };

        if let Err(err) = self.render.surface_mut().clear() {
            tracing::warn!(%err, "surface clear failed");
        }
        let scene = self
            .scene
            .frame(&mut self.render, now_ms, delta_ms, self.pointer);
        let batch = self.render.flush();
        if let Some(cb) = self.on_frame.as_mut() {
            cb(&mut self.scene, &mut self.render, &info);
        }
        let scene_anims_ended = self.anims.tick(&mut self.scene, now_ms, delta_ms);
        if let Err(err) = self.render.surface_mut().end_frame() {
            tracing::warn!(%err, "surface end of frame failed");
        }

        self.frames += 1;
        let report = FrameReport {
            info,
            scene,
            batch,
            scene_anims_ended,
        };
        tracing::debug!(
            frame = info.frame,
            now_ms,
            draw_calls = batch.draw_calls,
            style_changes = batch.style_changes,
            culled = scene.culled,
            "frame drawn"
        );
        report
    }

    /// Drive `frames` ticks spaced `1000 / fps` ms apart, continuing from the last timestamp.
    /// Starts the driver if needed; returns the totals of the frames actually drawn.
    pub fn run_fixed(&mut self, frames: u64, fps: f64) -> RunStats {
        let step = if fps.is_finite() && fps > 0.0 {
            1000.0 / fps
        } else {
            tracing::warn!(fps, "invalid simulation fps, using 60");
            1000.0 / 60.0
        };
        self.start();
        let (base, skip) = match self.last_ms {
            Some(last) => (last, 1),
            None => (0.0, 0),
        };
        let mut stats = RunStats::default();
        for i in skip..frames + skip {
            if let Some(report) = self.tick(base + i as f64 * step) {
                stats.record(&report);
            }
        }
        stats
    }
}

#[cfg(test)]
#[path = "../../tests/unit/driver/frame.rs"]
mod tests;
