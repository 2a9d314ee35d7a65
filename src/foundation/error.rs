/// Convenience result type used across dotfx.
pub type DotfxResult<T> = Result<T, DotfxError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Nothing in the frame loop is fatal: these errors surface from setup-time APIs (config loading,
/// media decoding) or are logged and isolated per object/draw while a frame is running.
#[derive(thiserror::Error, Debug)]
pub enum DotfxError {
    /// Invalid user-provided configuration or scene data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while building or driving animations.
    #[error("animation error: {0}")]
    Animation(String),

    /// Errors while loading or decoding an external media source.
    #[error("media error: {0}")]
    Media(String),

    /// Errors reported by a drawing surface adapter.
    #[error("surface error: {0}")]
    Surface(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DotfxError {
    /// Build a [`DotfxError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`DotfxError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`DotfxError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build a [`DotfxError::Surface`] value.
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
