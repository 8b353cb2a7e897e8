//! The per-frame performance manager owned by the host.

use std::sync::Arc;

use tracing::{debug, warn};
use vantage_assets::{
    AssetError, AssetKey, GeometryOptimizer, OptimizedGeometry, OptimizedTexture, RawGeometry,
    RawTexture, TextureOptimizer,
};
use vantage_config::{Config, PoolConfig};
use vantage_cull::FrustumCuller;
use vantage_lod::{LodError, LodLevel, LodManager};
use vantage_monitor::{PerformanceMonitor, WindowConfig};
use vantage_pool::ObjectPool;
use vantage_quality::{
    Capabilities, ControllerConfig, DeviceProfile, QualityController, QualityError, QualityLadder,
    QualityLevel, QualityObserver, Renderer, TransitionReason,
};
use vantage_scene::{AssetRegistry, Camera, ObjectId, SceneGraph};

use crate::snapshot::{FrameStats, QualitySnapshot};

/// Keeps a scene inside its frame budget by culling, swapping LODs and
/// stepping renderer quality.
///
/// Per frame the host calls [`tick`](Self::tick) with the frame timestamp and
/// [`update`](Self::update) once the camera is final, or [`frame`](Self::frame)
/// to do both in the canonical order.
pub struct PerformanceManager<R: Renderer> {
    renderer: R,
    monitor: PerformanceMonitor,
    culler: FrustumCuller,
    lod: LodManager,
    quality: QualityController,
    scene: SceneGraph,
    assets: AssetRegistry,
    textures: TextureOptimizer,
    geometry: GeometryOptimizer,
    pool_config: PoolConfig,
    /// Reused id list for frustum culling.
    cull_scratch: Vec<ObjectId>,
    disposed: bool,
}

impl<R: Renderer> PerformanceManager<R> {
    /// Build every component from `config` and apply the starting tier.
    ///
    /// Fails only for an invalid configured ladder. A renderer that rejects
    /// the starting tier is logged and left as is.
    pub fn new(
        config: &Config,
        mut renderer: R,
        profile: &DeviceProfile,
        capabilities: Capabilities,
    ) -> Result<Self, QualityError> {
        let ladder = QualityLadder::from_config(&config.quality)?;
        let mut quality = QualityController::new(
            ladder,
            capabilities,
            profile,
            ControllerConfig::from(&config.quality),
        );
        if let Err(err) = quality.start(&mut renderer) {
            warn!(%err, "initial quality settings rejected");
        }
        let monitor = PerformanceMonitor::with_window(WindowConfig {
            frames: config.quality.window_frames,
            duration_ms: config.quality.window_ms,
        });

        let mut manager = Self {
            renderer,
            monitor,
            culler: FrustumCuller::new(),
            lod: LodManager::new(),
            quality,
            scene: SceneGraph::new(),
            assets: AssetRegistry::new(),
            textures: TextureOptimizer::from_config(&config.assets),
            geometry: GeometryOptimizer::new(),
            pool_config: config.pool.clone(),
            cull_scratch: Vec::new(),
            disposed: false,
        };
        manager.sync_active_level();
        Ok(manager)
    }

    /// Record a rendered frame and run the quality evaluation.
    ///
    /// Evaluation happens here, so an [`update`](Self::update) issued after
    /// `tick` in the same frame runs after it. Use [`frame`](Self::frame) for
    /// the measure, cull and LOD, evaluate order.
    ///
    /// Returns the reason when the tier changed.
    pub fn tick(&mut self, timestamp_ms: f64) -> Option<TransitionReason> {
        self.measure(timestamp_ms);
        self.evaluate()
    }

    /// Frustum and LOD pass. Call once per frame after the camera is final.
    pub fn update(&mut self, camera: &Camera) -> FrameStats {
        self.culler.update(camera);
        let lod = self.lod.update(camera, &mut self.scene, &self.assets);

        // LOD owns visibility of tracked objects it hid; everything else gets
        // the frustum test.
        self.cull_scratch.clear();
        let lod_manager = &self.lod;
        self.cull_scratch.extend(
            self.scene
                .iter()
                .filter(|(id, object)| !lod_manager.is_tracked(*id) || object.visible)
                .map(|(id, _)| id),
        );
        let visible = self
            .culler
            .cull_objects(&mut self.scene, self.cull_scratch.drain(..));
        FrameStats {
            lod,
            visible,
            transition: None,
        }
    }

    /// One full frame in order: measure, cull and LOD, then quality evaluation.
    pub fn frame(&mut self, timestamp_ms: f64, camera: &Camera) -> FrameStats {
        self.measure(timestamp_ms);
        let mut stats = self.update(camera);
        stats.transition = self.evaluate();
        stats
    }

    fn measure(&mut self, timestamp_ms: f64) {
        self.monitor.tick(timestamp_ms);
        self.monitor.sample_counters(&self.renderer);
    }

    fn evaluate(&mut self) -> Option<TransitionReason> {
        let transition = self.quality.update(&mut self.monitor, &mut self.renderer);
        if transition.is_some() {
            self.sync_active_level();
        }
        transition
    }

    /// Push level-dependent parameters to the components that read them.
    fn sync_active_level(&mut self) {
        let scale = self.quality.active_level().lod_distance_scale;
        self.lod.set_distance_scale(scale);
    }

    pub fn quality_snapshot(&self) -> QualitySnapshot {
        let report = self.monitor.report();
        QualitySnapshot {
            level_name: self.quality.active_level().name.clone(),
            adaptive: self.quality.is_adaptive(),
            fps: report.fps,
            frame_time_ms: report.frame_time_ms,
            memory_bytes: report.renderer_memory_bytes,
            draw_calls: report.draw_calls,
            triangles: report.triangles,
        }
    }

    /// Pin a tier by name. Automatic evaluation stays off until re-enabled.
    pub fn set_quality_level(&mut self, name: &str) -> Result<(), QualityError> {
        let result = self
            .quality
            .set_quality_level(name, &mut self.monitor, &mut self.renderer);
        self.sync_active_level();
        result
    }

    pub fn set_adaptive_quality(&mut self, enabled: bool) {
        if enabled && !self.quality.is_adaptive() {
            self.monitor.reset_window();
        }
        self.quality.set_adaptive(enabled);
    }

    /// Re-pick the tier for a new viewport or device.
    pub fn reset_for_profile(&mut self, profile: &DeviceProfile) -> Result<(), QualityError> {
        let result = self
            .quality
            .reset_for_profile(profile, &mut self.monitor, &mut self.renderer);
        self.sync_active_level();
        result
    }

    pub fn register_lod(&mut self, object: ObjectId, levels: Vec<LodLevel>) -> Result<(), LodError> {
        self.lod.register(object, levels)
    }

    pub fn unregister_lod(&mut self, object: ObjectId) -> bool {
        self.lod.unregister(object)
    }

    pub fn subscribe(&mut self, observer: impl QualityObserver + 'static) {
        self.quality.subscribe(observer);
    }

    /// Texture bounded by the active tier and device limits.
    pub fn optimize_texture(
        &mut self,
        key: &AssetKey,
        raw: RawTexture,
    ) -> Result<Arc<OptimizedTexture>, AssetError> {
        let level = self.quality.active_level();
        self.textures
            .optimize(key, raw, level, self.quality.capabilities())
    }

    /// Mesh decimated for the active tier.
    pub fn optimize_geometry(
        &mut self,
        key: &AssetKey,
        raw: RawGeometry,
    ) -> Result<Arc<OptimizedGeometry>, AssetError> {
        self.geometry.optimize(key, raw, self.quality.active_level())
    }

    /// Pool sized from the `pool` config section.
    pub fn new_pool<T>(
        &self,
        create: impl FnMut() -> T + 'static,
        reset: impl FnMut(&mut T) + 'static,
    ) -> ObjectPool<T> {
        ObjectPool::new(create, reset, self.pool_config.initial_size)
            .with_soft_ceiling(self.pool_config.soft_ceiling)
    }

    /// Release renderer resources and drop cached assets. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.quality.dispose(&mut self.renderer);
        self.textures.clear();
        self.geometry.clear();
        self.disposed = true;
        debug!("performance manager disposed");
    }

    pub fn active_level(&self) -> &QualityLevel {
        self.quality.active_level()
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetRegistry {
        &mut self.assets
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    pub fn quality(&self) -> &QualityController {
        &self.quality
    }

    pub fn lod(&self) -> &LodManager {
        &self.lod
    }

    pub fn culler(&self) -> &FrustumCuller {
        &self.culler
    }
}

impl<R: Renderer> Drop for PerformanceManager<R> {
    fn drop(&mut self) {
        self.dispose();
    }
}
