//! Headless simulation: a synthetic renderer whose frame cost follows the
//! applied settings, driven through [`PerformanceManager`] frame by frame.

use glam::Vec3;
use serde::Serialize;
use tracing::{debug, info};
use vantage_config::Config;
use vantage_lod::LodLevel;
use vantage_monitor::RenderCounters;
use vantage_quality::{
    Capabilities, DeviceProfile, QualityError, RenderSettings, Renderer, RendererError,
    TransitionReason,
};
use vantage_scene::{AssetKind, BoundingSphere, Camera, SceneObject};

use crate::manager::PerformanceManager;
use crate::snapshot::QualitySnapshot;

/// Reference render target the memory estimate is based on.
const TARGET_PIXELS: f64 = 1920.0 * 1080.0;

/// Objects in the synthetic scene, laid out along -Z.
const SCENE_OBJECTS: u32 = 24;

/// LOD switch distances for every synthetic object.
const LOD_THRESHOLDS: [f32; 3] = [20.0, 60.0, 120.0];

/// Triangles per LOD level of a synthetic object.
const LOD_TRIANGLES: [u64; 3] = [20_000, 5_000, 800];

/// A renderer that does no work but reports a frame cost derived from its settings.
#[derive(Debug, Clone)]
pub struct SimRenderer {
    scene_cost_ms: f64,
    settings: Option<RenderSettings>,
    /// Level name this renderer refuses, for failure drills.
    failing_level: Option<String>,
    draw_calls: u64,
    triangles: u64,
    released: bool,
    /// `release_resources` calls over the renderer's lifetime.
    release_count: u32,
}

impl SimRenderer {
    pub fn new(scene_cost_ms: f64) -> Self {
        Self {
            scene_cost_ms,
            settings: None,
            failing_level: None,
            draw_calls: 0,
            triangles: 0,
            released: false,
            release_count: 0,
        }
    }

    /// Make `apply` fail whenever `level` is requested.
    pub fn with_failing_level(mut self, level: impl Into<String>) -> Self {
        self.failing_level = Some(level.into());
        self
    }

    pub fn settings(&self) -> Option<&RenderSettings> {
        self.settings.as_ref()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn release_count(&self) -> u32 {
        self.release_count
    }

    /// Relative cost of `settings` against a 1x, shadowless, aliased baseline.
    pub fn cost_multiplier(settings: &RenderSettings) -> f64 {
        let pixels = f64::from(settings.pixel_ratio).powi(2);
        let shadows = 1.0 + f64::from(settings.shadow_map_resolution) / 4096.0 * 0.5;
        let aa = if settings.antialiasing { 1.15 } else { 1.0 };
        let lights = 1.0 + f64::from(settings.max_lights) * 0.02;
        pixels * shadows * aa * lights
    }

    /// Frame time for the current settings with `visible` of `total` objects drawn.
    pub fn frame_time_ms(&self, visible: usize, total: usize) -> f64 {
        let multiplier = self.settings.as_ref().map_or(1.0, Self::cost_multiplier);
        let load = if total == 0 {
            1.0
        } else {
            0.5 + 0.5 * visible as f64 / total as f64
        };
        self.scene_cost_ms * multiplier * load
    }

    /// Record what was submitted this frame.
    pub fn submit(&mut self, draw_calls: u64, triangles: u64) {
        self.draw_calls = draw_calls;
        self.triangles = triangles;
    }
}

impl RenderCounters for SimRenderer {
    fn draw_calls(&self) -> Option<u64> {
        Some(self.draw_calls)
    }

    fn triangles(&self) -> Option<u64> {
        Some(self.triangles)
    }

    fn memory_bytes(&self) -> Option<u64> {
        let settings = self.settings.as_ref()?;
        let target = TARGET_PIXELS * f64::from(settings.pixel_ratio).powi(2) * 4.0;
        let shadow = f64::from(settings.shadow_map_resolution).powi(2) * 4.0;
        Some((target + shadow) as u64)
    }
}

impl Renderer for SimRenderer {
    fn apply(&mut self, settings: &RenderSettings) -> Result<(), RendererError> {
        if self.failing_level.as_deref() == Some(settings.level.as_str()) {
            return Err(RendererError::Rejected(format!(
                "level '{}' disabled for this run",
                settings.level
            )));
        }
        self.settings = Some(settings.clone());
        self.released = false;
        Ok(())
    }

    fn release_resources(&mut self) {
        self.settings = None;
        self.released = true;
        self.release_count += 1;
    }
}

/// One accepted tier change during a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransitionRecord {
    pub frame: u32,
    pub timestamp_ms: f64,
    pub reason: TransitionReason,
    pub level: String,
}

/// Outcome of [`run`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationReport {
    pub frames: u32,
    pub final_level: String,
    pub transitions: Vec<TransitionRecord>,
    /// Snapshot every `sim.report_every` frames.
    pub snapshots: Vec<QualitySnapshot>,
}

/// Populate the manager's scene with LOD-tracked objects along -Z.
pub fn populate_scene<R: Renderer>(manager: &mut PerformanceManager<R>) {
    for i in 0..SCENE_OBJECTS {
        let position = Vec3::new((i % 4) as f32 * 6.0 - 9.0, 0.0, -(i as f32) * 8.0);
        let levels: Vec<LodLevel> = LOD_THRESHOLDS
            .iter()
            .enumerate()
            .map(|(lod, &threshold)| {
                let assets = manager.assets_mut();
                let geometry = assets.create(AssetKind::Geometry, format!("prop{i}_lod{lod}"));
                let material = assets.create(AssetKind::Material, format!("prop{i}_mat{lod}"));
                LodLevel::new(threshold, geometry, material)
            })
            .collect();
        let id = manager
            .scene_mut()
            .insert(SceneObject::at(position).with_bounds(BoundingSphere::new(Vec3::ZERO, 2.0)));
        if let Err(err) = manager.register_lod(id, levels) {
            debug!(%err, "skipping synthetic object");
        }
    }
}

/// Camera dollying slowly down the scene and back.
fn camera_at(frame: u32) -> Camera {
    let t = frame as f32 * 0.01;
    let eye = Vec3::new(0.0, 4.0, 10.0 - 90.0 * (0.5 - 0.5 * t.cos()));
    Camera::perspective_look_at(
        eye,
        eye + Vec3::new(0.0, -0.1, -1.0),
        std::f32::consts::FRAC_PI_3,
        16.0 / 9.0,
        0.1,
        500.0,
    )
}

/// Run `config.sim.frames` frames on `renderer` and collect transitions and snapshots.
///
/// `pinned` fixes a tier by name and disables adaptation for the whole run.
pub fn run(
    config: &Config,
    renderer: SimRenderer,
    profile: &DeviceProfile,
    pinned: Option<&str>,
) -> Result<SimulationReport, QualityError> {
    let mut manager = PerformanceManager::new(config, renderer, profile, Capabilities::default())?;
    if let Some(level) = pinned {
        manager.set_quality_level(level)?;
    }
    populate_scene(&mut manager);

    let total = manager.scene().len();
    let mut timestamp_ms = 0.0;
    let mut transitions = Vec::new();
    let mut snapshots = Vec::new();

    // Each frame is stamped with the time the previous one finished; the
    // first stamp only sets the monitor's baseline.
    for frame in 1..=config.sim.frames {
        let stats = manager.frame(timestamp_ms, &camera_at(frame));
        if let Some(reason) = stats.transition {
            let level = manager.active_level().name.clone();
            info!(frame, %level, ?reason, "transition");
            transitions.push(TransitionRecord {
                frame,
                timestamp_ms,
                reason,
                level,
            });
        }

        let triangles: u64 = manager
            .scene()
            .iter()
            .filter(|(_, object)| object.visible)
            .filter_map(|(id, _)| match manager.lod().tracked(id)?.current()? {
                vantage_lod::LodSelection::Level(level) => LOD_TRIANGLES.get(level).copied(),
                vantage_lod::LodSelection::Culled => None,
            })
            .sum();
        let frame_time = manager.renderer().frame_time_ms(stats.visible, total);
        manager.renderer_mut().submit(stats.visible as u64, triangles);
        timestamp_ms += frame_time;

        if config.sim.report_every > 0 && frame % config.sim.report_every == 0 {
            snapshots.push(manager.quality_snapshot());
        }
    }

    let report = SimulationReport {
        frames: config.sim.frames,
        final_level: manager.active_level().name.clone(),
        transitions,
        snapshots,
    };
    manager.dispose();
    Ok(report)
}
