//! The per-frame performance monitor.

use serde::Serialize;
use tracing::{debug, trace};

use crate::counters::{CounterSnapshot, RenderCounters};
use crate::sample::{PerformanceSample, SAMPLE_CAPACITY, SampleRing};

/// Frames per measurement window.
pub const DEFAULT_WINDOW_FRAMES: u32 = 60;

/// Wall-clock length of a measurement window in milliseconds.
pub const DEFAULT_WINDOW_MS: f64 = 1000.0;

/// Limits that close a measurement window; the first one reached wins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowConfig {
    pub frames: u32,
    pub duration_ms: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            frames: DEFAULT_WINDOW_FRAMES,
            duration_ms: DEFAULT_WINDOW_MS,
        }
    }
}

/// Aggregate of one closed measurement window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FrameWindow {
    /// `1000 / frame_time_ms`.
    pub fps: f64,
    /// Mean frame time across the window.
    pub frame_time_ms: f64,
    /// Number of frames that contributed.
    pub frames: u32,
    /// Timestamp of the tick that closed the window.
    pub closed_at_ms: f64,
}

/// Diagnostics view of the monitor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub fps: f64,
    pub frame_time_ms: f64,
    pub renderer_memory_bytes: u64,
    pub draw_calls: u64,
    pub triangles: u64,
}

/// Measures frame times and produces windowed FPS estimates.
///
/// All state is preallocated; `tick` performs no allocation.
pub struct PerformanceMonitor {
    window: WindowConfig,
    samples: SampleRing,
    last_timestamp_ms: Option<f64>,
    /// Sum of frame times in the open window.
    window_sum_ms: f64,
    /// Frames in the open window.
    window_frames: u32,
    /// Last closed window, kept for diagnostics.
    latest: Option<FrameWindow>,
    /// Last closed window not yet consumed by [`take_window`](Self::take_window).
    pending: Option<FrameWindow>,
    counters: CounterSnapshot,
    frame_count: u64,
}

impl PerformanceMonitor {
    /// Create a monitor with the default 60-frame / 1 s window.
    pub fn new() -> Self {
        Self::with_window(WindowConfig::default())
    }

    /// Create a monitor with custom window limits.
    pub fn with_window(window: WindowConfig) -> Self {
        let window = WindowConfig {
            frames: window.frames.max(1),
            duration_ms: if window.duration_ms > 0.0 {
                window.duration_ms
            } else {
                DEFAULT_WINDOW_MS
            },
        };
        Self {
            window,
            samples: SampleRing::with_capacity(SAMPLE_CAPACITY),
            last_timestamp_ms: None,
            window_sum_ms: 0.0,
            window_frames: 0,
            latest: None,
            pending: None,
            counters: CounterSnapshot::default(),
            frame_count: 0,
        }
    }

    /// Record a rendered frame at `timestamp_ms`.
    ///
    /// The first call only establishes the baseline. Returns the window
    /// closed by this tick, if any.
    pub fn tick(&mut self, timestamp_ms: f64) -> Option<FrameWindow> {
        let Some(previous) = self.last_timestamp_ms.replace(timestamp_ms) else {
            return None;
        };
        let frame_time_ms = timestamp_ms - previous;
        if !(frame_time_ms > 0.0 && frame_time_ms.is_finite()) {
            debug!(
                previous,
                timestamp_ms, "ignoring non-increasing frame timestamp"
            );
            return None;
        }

        self.frame_count += 1;
        self.samples
            .push(PerformanceSample::new(frame_time_ms, timestamp_ms));
        self.window_sum_ms += frame_time_ms;
        self.window_frames += 1;

        if self.window_frames >= self.window.frames || self.window_sum_ms >= self.window.duration_ms
        {
            let mean = self.window_sum_ms / f64::from(self.window_frames);
            let closed = FrameWindow {
                fps: 1000.0 / mean,
                frame_time_ms: mean,
                frames: self.window_frames,
                closed_at_ms: timestamp_ms,
            };
            trace!(fps = closed.fps, frames = closed.frames, "window closed");
            self.latest = Some(closed);
            self.pending = Some(closed);
            self.window_sum_ms = 0.0;
            self.window_frames = 0;
            return Some(closed);
        }
        None
    }

    /// Copy the renderer's counters; unsupported ones become zero.
    pub fn sample_counters(&mut self, source: &dyn RenderCounters) {
        self.counters = CounterSnapshot::capture(source);
    }

    /// Consume the most recent closed window, if one arrived since the last call.
    pub fn take_window(&mut self) -> Option<FrameWindow> {
        self.pending.take()
    }

    /// Discard the open window, pending window and retained samples so the
    /// next measurement reflects only frames rendered from now on.
    pub fn reset_window(&mut self) {
        self.samples.clear();
        self.window_sum_ms = 0.0;
        self.window_frames = 0;
        self.pending = None;
    }

    /// Diagnostics snapshot based on the last closed window.
    pub fn report(&self) -> PerformanceReport {
        let (fps, frame_time_ms) = self
            .latest
            .map(|w| (w.fps, w.frame_time_ms))
            .unwrap_or((0.0, 0.0));
        PerformanceReport {
            fps,
            frame_time_ms,
            renderer_memory_bytes: self.counters.memory_bytes,
            draw_calls: self.counters.draw_calls,
            triangles: self.counters.triangles,
        }
    }

    /// FPS of the most recent frame alone. Diagnostics only.
    pub fn instant_fps(&self) -> f64 {
        self.samples.latest().map_or(0.0, |s| s.fps_instant)
    }

    /// FPS from the mean of the retained samples.
    pub fn trailing_fps(&self) -> f64 {
        self.samples
            .mean_frame_time_ms()
            .map_or(0.0, |mean| 1000.0 / mean)
    }

    pub fn latest_window(&self) -> Option<FrameWindow> {
        self.latest
    }

    pub fn samples(&self) -> &SampleRing {
        &self.samples
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.counters
    }

    /// Timestamp passed to the most recent tick.
    pub fn last_timestamp_ms(&self) -> Option<f64> {
        self.last_timestamp_ms
    }

    /// Frames measured so far (excludes the baseline tick).
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn window_config(&self) -> WindowConfig {
        self.window
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tick `count` frames spaced by `frame_ms`, starting at `start_ms`.
    /// Returns every closed window.
    fn run(
        monitor: &mut PerformanceMonitor,
        start_ms: f64,
        frame_ms: f64,
        count: usize,
    ) -> Vec<FrameWindow> {
        (0..count)
            .filter_map(|i| monitor.tick(start_ms + i as f64 * frame_ms))
            .collect()
    }

    #[test]
    fn test_first_tick_only_sets_baseline() {
        let mut monitor = PerformanceMonitor::new();
        assert!(monitor.tick(100.0).is_none());
        assert_eq!(monitor.frame_count(), 0);
        assert!(monitor.samples().is_empty());
    }

    /// At 10 ms per frame the 60-frame limit closes the window first.
    #[test]
    fn test_window_closes_on_frame_count() {
        let mut monitor = PerformanceMonitor::new();
        let windows = run(&mut monitor, 0.0, 10.0, 61);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].frames, 60);
        assert!((windows[0].fps - 100.0).abs() < 1e-6);
    }

    /// At 50 ms per frame the 1 s limit closes the window after 20 frames.
    #[test]
    fn test_window_closes_on_duration() {
        let mut monitor = PerformanceMonitor::new();
        let windows = run(&mut monitor, 0.0, 50.0, 21);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].frames, 20);
        assert!((windows[0].fps - 20.0).abs() < 1e-6);
    }

    /// Window fps equals 1000 / mean frame time for irregular traces.
    #[test]
    fn test_window_fps_matches_mean_frame_time() {
        let mut monitor = PerformanceMonitor::new();
        let deltas = [8.0, 16.0, 33.0, 12.5, 20.0, 9.0];
        let mut ts = 0.0;
        monitor.tick(ts);
        let mut window = None;
        let mut sum = 0.0;
        let mut n = 0;
        for i in 0..120 {
            let d = deltas[i % deltas.len()];
            ts += d;
            sum += d;
            n += 1;
            if let Some(w) = monitor.tick(ts) {
                window = Some((w, sum / n as f64));
                break;
            }
        }
        let (w, mean) = window.expect("a window should close");
        assert_eq!(w.frames, n);
        assert!((w.fps - 1000.0 / mean).abs() < 1e-9);
        assert!((w.frame_time_ms - mean).abs() < 1e-9);
    }

    #[test]
    fn test_take_window_consumes_once() {
        let mut monitor = PerformanceMonitor::new();
        run(&mut monitor, 0.0, 10.0, 61);
        assert!(monitor.take_window().is_some());
        assert!(monitor.take_window().is_none());
        assert!(monitor.latest_window().is_some());
    }

    #[test]
    fn test_reset_window_discards_partial_progress() {
        let mut monitor = PerformanceMonitor::new();
        run(&mut monitor, 0.0, 10.0, 40);
        monitor.reset_window();
        assert!(monitor.samples().is_empty());
        // 40 more frames after the reset: not enough for a 60-frame window.
        let windows = run(&mut monitor, 400.0, 10.0, 40);
        assert!(windows.is_empty());
    }

    #[test]
    fn test_non_increasing_timestamp_ignored() {
        let mut monitor = PerformanceMonitor::new();
        monitor.tick(10.0);
        monitor.tick(20.0);
        monitor.tick(20.0);
        monitor.tick(15.0);
        assert_eq!(monitor.frame_count(), 1);
    }

    #[test]
    fn test_report_without_counters_is_zero() {
        let mut monitor = PerformanceMonitor::new();
        run(&mut monitor, 0.0, 16.0, 70);
        let report = monitor.report();
        assert!(report.fps > 0.0);
        assert_eq!(report.draw_calls, 0);
        assert_eq!(report.triangles, 0);
        assert_eq!(report.renderer_memory_bytes, 0);
    }

    #[test]
    fn test_ring_bounded_over_long_run() {
        let mut monitor = PerformanceMonitor::new();
        run(&mut monitor, 0.0, 5.0, 1000);
        assert_eq!(monitor.samples().len(), SAMPLE_CAPACITY);
    }

    #[test]
    fn test_trailing_and_instant_fps() {
        let mut monitor = PerformanceMonitor::new();
        run(&mut monitor, 0.0, 25.0, 5);
        assert!((monitor.trailing_fps() - 40.0).abs() < 1e-9);
        assert!((monitor.instant_fps() - 40.0).abs() < 1e-9);
    }
}
