use std::path::Path;

use anyhow::Context;

use crate::foundation::core::{Rgba, Viewport};
use crate::foundation::error::{DotfxError, DotfxResult};

/// Engine-wide tunables. Every field has a default, so partial JSON documents are accepted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Upper bound on a single frame delta, so a stalled tab does not teleport animations.
    pub max_delta_ms: f64,
    /// Frame rate cap; `None` runs at the host's refresh rate.
    pub fps_limit: Option<f64>,
    /// Scene time multiplier applied to every delta.
    pub speed_modifier: f64,
    /// Styles below this effective alpha are not drawn.
    pub min_visible_alpha: f64,
    /// Off-viewport margin (px) inside which objects stay active.
    pub default_activation_margin: f64,
    pub default_radius: f64,
    pub default_color: Rgba,
    /// Pointer interaction distance used by shapes without their own limit.
    pub default_limit: f64,
    pub viewport: Viewport,
    /// How many times staged animation commands may re-trigger within one object pass.
    pub max_reentrant_passes: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_delta_ms: 130.0,
            fps_limit: None,
            speed_modifier: 1.0,
            min_visible_alpha: 0.004,
            default_activation_margin: 20.0,
            default_radius: 5.0,
            default_color: Rgba::WHITE,
            default_limit: 100.0,
            viewport: Viewport::default(),
            max_reentrant_passes: 8,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> DotfxResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| DotfxError::validation(format!("engine config: {e}")))?;
        Ok(cfg.sanitized())
    }

    pub fn from_path(path: &Path) -> DotfxResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read engine config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Replace every invalid field with its default, warning once per field.
    pub fn sanitized(self) -> Self {
        let d = Self::default();

        fn check(name: &str, v: f64, ok: bool, fallback: f64) -> f64 {
            if v.is_finite() && ok {
                v
            } else {
                tracing::warn!(field = name, value = v, fallback, "invalid engine config value");
                fallback
            }
        }

        let fps_limit = match self.fps_limit {
            Some(fps) if fps.is_finite() && fps > 0.0 => Some(fps),
            Some(fps) => {
                tracing::warn!(fps, "invalid fps limit, running unthrottled");
                None
            }
            None => None,
        };
        let viewport = if self.viewport.width.is_finite()
            && self.viewport.height.is_finite()
            && self.viewport.width > 0.0
            && self.viewport.height > 0.0
        {
            self.viewport
        } else {
            tracing::warn!(viewport = ?self.viewport, "invalid viewport, using default");
            d.viewport
        };
        let max_reentrant_passes = if self.max_reentrant_passes == 0 {
            tracing::warn!("max_reentrant_passes must be at least 1");
            d.max_reentrant_passes
        } else {
            self.max_reentrant_passes
        };

        Self {
            max_delta_ms: check(
                "max_delta_ms",
                self.max_delta_ms,
                self.max_delta_ms > 0.0,
                d.max_delta_ms,
            ),
            fps_limit,
            speed_modifier: check(
                "speed_modifier",
                self.speed_modifier,
                self.speed_modifier >= 0.0,
                d.speed_modifier,
            ),
            min_visible_alpha: check(
                "min_visible_alpha",
                self.min_visible_alpha,
                (0.0..=1.0).contains(&self.min_visible_alpha),
                d.min_visible_alpha,
            ),
            default_activation_margin: check(
                "default_activation_margin",
                self.default_activation_margin,
                self.default_activation_margin >= 0.0,
                d.default_activation_margin,
            ),
            default_radius: check(
                "default_radius",
                self.default_radius,
                self.default_radius >= 0.0,
                d.default_radius,
            ),
            default_color: self.default_color,
            default_limit: check(
                "default_limit",
                self.default_limit,
                self.default_limit >= 0.0,
                d.default_limit,
            ),
            viewport,
            max_reentrant_passes,
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
