//! Host-facing facade of the Vantage performance manager.
//!
//! [`PerformanceManager`] owns the monitor, culler, LOD manager, quality
//! controller, asset optimizers and the scene arena, and exposes the small
//! per-frame surface a host needs: [`tick`](PerformanceManager::tick) once
//! per rendered frame and [`update`](PerformanceManager::update) once the
//! camera is final. [`sim`] drives the same facade against a synthetic
//! renderer for the `vantage-sim` binary and integration tests.

mod manager;
pub mod sim;
mod snapshot;

pub use manager::PerformanceManager;
pub use snapshot::{FrameStats, QualitySnapshot};

pub use vantage_assets as assets;
pub use vantage_config as config;
pub use vantage_lod as lod;
pub use vantage_monitor as monitor;
pub use vantage_pool as pool;
pub use vantage_quality as quality;
pub use vantage_scene as scene;
