//! The host renderer as seen by the quality controller.

use vantage_monitor::RenderCounters;

use crate::caps::RenderSettings;

/// Failure reported by the host renderer while applying settings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RendererError {
    #[error("settings rejected: {0}")]
    Rejected(String),

    #[error("render device lost")]
    DeviceLost,
}

/// A renderer that accepts whole [`RenderSettings`] values.
///
/// `apply` must either take every field or leave the renderer unchanged.
pub trait Renderer: RenderCounters {
    fn apply(&mut self, settings: &RenderSettings) -> Result<(), RendererError>;

    /// Release GPU handles held for quality-dependent resources.
    fn release_resources(&mut self) {}
}
