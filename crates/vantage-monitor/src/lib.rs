//! Frame-time measurement: per-frame ticks, windowed FPS, and renderer counters.
//!
//! [`PerformanceMonitor`] is ticked once per rendered frame with the host's
//! frame timestamp. It keeps a bounded ring of recent [`PerformanceSample`]s
//! and closes a [`FrameWindow`] every N frames or T milliseconds, whichever
//! comes first. Window means are what the quality controller acts on.

mod counters;
mod monitor;
mod sample;

pub use counters::{CounterSnapshot, NoCounters, RenderCounters};
pub use monitor::{
    DEFAULT_WINDOW_FRAMES, DEFAULT_WINDOW_MS, FrameWindow, PerformanceMonitor, PerformanceReport,
    WindowConfig,
};
pub use sample::{PerformanceSample, SAMPLE_CAPACITY, SampleRing};
