//! The adaptive quality state machine.

use tracing::{debug, info, trace, warn};
use vantage_config::QualityConfig;
use vantage_monitor::PerformanceMonitor;

use crate::caps::{Capabilities, RenderSettings};
use crate::device::DeviceProfile;
use crate::level::{QualityError, QualityLadder, QualityLevel};
use crate::observer::{QualityEvent, QualityObserver, TransitionReason};
use crate::renderer::{Renderer, RendererError};

/// Thresholds and timing for automatic transitions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerConfig {
    pub target_fps: f32,
    /// Step down when fps < `target_fps * downgrade_ratio`.
    pub downgrade_ratio: f32,
    /// Step up when fps > `target_fps * upgrade_ratio`.
    pub upgrade_ratio: f32,
    /// Frame-timestamp time after a transition during which windows are ignored.
    pub cooldown_ms: f64,
    pub adaptive: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::from(&QualityConfig::default())
    }
}

impl From<&QualityConfig> for ControllerConfig {
    fn from(config: &QualityConfig) -> Self {
        Self {
            target_fps: config.target_fps,
            downgrade_ratio: config.downgrade_ratio,
            upgrade_ratio: config.upgrade_ratio,
            cooldown_ms: config.cooldown_ms,
            adaptive: config.adaptive,
        }
    }
}

/// Walks the quality ladder one step at a time based on windowed frame rate.
///
/// The active index always stays within the ladder. It only changes after
/// the renderer accepted the new settings.
pub struct QualityController {
    ladder: QualityLadder,
    capabilities: Capabilities,
    config: ControllerConfig,
    active: usize,
    adaptive: bool,
    /// Frame timestamp at which the current cooldown ends.
    cooldown_until_ms: Option<f64>,
    /// Last settings the renderer accepted.
    known_good: Option<RenderSettings>,
    observers: Vec<Box<dyn QualityObserver>>,
}

impl QualityController {
    /// Pick the starting tier from `profile`. Nothing is applied until [`start`](Self::start).
    pub fn new(
        ladder: QualityLadder,
        capabilities: Capabilities,
        profile: &DeviceProfile,
        config: ControllerConfig,
    ) -> Self {
        let active = profile.initial_index(&ladder);
        debug!(level = %ladder[active].name, ?profile, "initial quality tier");
        Self {
            ladder,
            capabilities,
            adaptive: config.adaptive,
            config,
            active,
            cooldown_until_ms: None,
            known_good: None,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: impl QualityObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Apply the starting tier.
    pub fn start(&mut self, renderer: &mut dyn Renderer) -> Result<(), QualityError> {
        self.transition(self.active, TransitionReason::Initial, None, renderer)?;
        Ok(())
    }

    /// Consume the monitor's latest closed window and step the ladder if needed.
    ///
    /// Returns the reason of an accepted transition.
    pub fn update(
        &mut self,
        monitor: &mut PerformanceMonitor,
        renderer: &mut dyn Renderer,
    ) -> Option<TransitionReason> {
        let window = monitor.take_window()?;
        if !self.adaptive {
            return None;
        }
        let now = window.closed_at_ms;
        if self.in_cooldown(now) {
            trace!(fps = window.fps, "window discarded during cooldown");
            return None;
        }

        let reason = self.evaluate(window.fps)?;
        let target = match reason {
            TransitionReason::Upgrade => self.active + 1,
            TransitionReason::Downgrade => self.active - 1,
            TransitionReason::Initial | TransitionReason::Manual => return None,
        };

        // A refused transition also starts a cooldown so the renderer is not
        // retried every window.
        let accepted = self
            .transition(target, reason, Some(window.fps), renderer)
            .is_ok();
        monitor.reset_window();
        self.cooldown_until_ms = Some(now + self.config.cooldown_ms);
        accepted.then_some(reason)
    }

    /// Pure decision for a window mean `fps`.
    pub fn evaluate(&self, fps: f64) -> Option<TransitionReason> {
        let low = f64::from(self.config.target_fps * self.config.downgrade_ratio);
        let high = f64::from(self.config.target_fps * self.config.upgrade_ratio);
        if fps < low && self.active > 0 {
            Some(TransitionReason::Downgrade)
        } else if fps > high && self.active < self.ladder.highest_index() {
            Some(TransitionReason::Upgrade)
        } else {
            None
        }
    }

    /// Force a tier by name and suspend automatic evaluation.
    ///
    /// On error nothing changes: the tier and the adaptive flag stay as they were.
    pub fn set_quality_level(
        &mut self,
        name: &str,
        monitor: &mut PerformanceMonitor,
        renderer: &mut dyn Renderer,
    ) -> Result<(), QualityError> {
        let index = self
            .ladder
            .index_of(name)
            .ok_or_else(|| QualityError::UnknownLevel(name.to_string()))?;
        if index != self.active || self.known_good.is_none() {
            self.transition(index, TransitionReason::Manual, None, renderer)?;
        }
        self.adaptive = false;
        monitor.reset_window();
        Ok(())
    }

    /// Re-enable or suspend automatic evaluation.
    pub fn set_adaptive(&mut self, enabled: bool) {
        if enabled && !self.adaptive {
            self.cooldown_until_ms = None;
        }
        self.adaptive = enabled;
    }

    /// Re-pick the tier after a viewport or device change. A manual override stays in force.
    pub fn reset_for_profile(
        &mut self,
        profile: &DeviceProfile,
        monitor: &mut PerformanceMonitor,
        renderer: &mut dyn Renderer,
    ) -> Result<(), QualityError> {
        if !self.adaptive {
            debug!("manual quality override active, ignoring profile change");
            return Ok(());
        }
        let index = profile.initial_index(&self.ladder);
        monitor.reset_window();
        self.cooldown_until_ms = None;
        if index != self.active {
            self.transition(index, TransitionReason::Initial, None, renderer)?;
        }
        Ok(())
    }

    /// Whether a window closing at `now_ms` would be discarded.
    pub fn in_cooldown(&self, now_ms: f64) -> bool {
        self.cooldown_until_ms.is_some_and(|until| now_ms < until)
    }

    /// Release the renderer's quality resources and drop all observers.
    pub fn dispose(&mut self, renderer: &mut dyn Renderer) {
        renderer.release_resources();
        self.observers.clear();
        self.known_good = None;
        debug!("quality controller disposed");
    }

    pub fn active_level(&self) -> &QualityLevel {
        &self.ladder[self.active]
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn ladder(&self) -> &QualityLadder {
        &self.ladder
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn is_adaptive(&self) -> bool {
        self.adaptive
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Settings most recently accepted by the renderer.
    pub fn applied_settings(&self) -> Option<&RenderSettings> {
        self.known_good.as_ref()
    }

    fn transition(
        &mut self,
        target: usize,
        reason: TransitionReason,
        fps: Option<f64>,
        renderer: &mut dyn Renderer,
    ) -> Result<(), RendererError> {
        let settings = self.capabilities.resolve(&self.ladder[target]);
        if let Err(err) = renderer.apply(&settings) {
            warn!(level = %settings.level, %err, "renderer rejected quality settings, reverting");
            if let Some(good) = &self.known_good
                && let Err(revert) = renderer.apply(good)
            {
                warn!(level = %good.level, err = %revert, "reverting to last known-good settings failed");
            }
            self.emit(&QualityEvent::ApplyFailed {
                level: settings.level,
                error: err.to_string(),
            });
            return Err(err);
        }

        let from = self
            .known_good
            .as_ref()
            .map(|_| self.ladder[self.active].name.clone());
        self.active = target;
        info!(
            from = from.as_deref().unwrap_or("-"),
            to = %settings.level,
            ?reason,
            fps,
            "quality level changed"
        );
        let event = QualityEvent::Changed {
            from,
            to: settings.level.clone(),
            reason,
            fps,
        };
        self.known_good = Some(settings);
        self.emit(&event);
        Ok(())
    }

    fn emit(&mut self, event: &QualityEvent) {
        for observer in &mut self.observers {
            observer.on_quality_event(event);
        }
    }
}
