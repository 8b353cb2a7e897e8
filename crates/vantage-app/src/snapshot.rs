//! Read-only views for overlays and logs.

use serde::Serialize;
use vantage_lod::LodStats;
use vantage_quality::TransitionReason;

/// Diagnostics for an overlay: active tier plus the latest measurements.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QualitySnapshot {
    pub level_name: String,
    pub adaptive: bool,
    pub fps: f64,
    pub frame_time_ms: f64,
    pub memory_bytes: u64,
    pub draw_calls: u64,
    pub triangles: u64,
}

/// What one [`update`](crate::PerformanceManager::update) or
/// [`frame`](crate::PerformanceManager::frame) did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub lod: LodStats,
    /// Objects left visible after LOD and frustum culling.
    pub visible: usize,
    /// Tier change made by this frame's evaluation. Always `None` from `update`.
    pub transition: Option<TransitionReason>,
}
