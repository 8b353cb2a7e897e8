//! GPU-side counters reported by the host renderer.

use serde::Serialize;

/// Counters a renderer may expose. Every method defaults to `None`,
/// which the monitor reports as zero.
pub trait RenderCounters {
    /// Draw calls issued for the last frame.
    fn draw_calls(&self) -> Option<u64> {
        None
    }

    /// Triangles submitted for the last frame.
    fn triangles(&self) -> Option<u64> {
        None
    }

    /// Bytes of GPU memory held by the renderer.
    fn memory_bytes(&self) -> Option<u64> {
        None
    }
}

/// A renderer that cannot report any telemetry.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCounters;

impl RenderCounters for NoCounters {}

/// Latest copy of the renderer counters, with unsupported values as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub draw_calls: u64,
    pub triangles: u64,
    pub memory_bytes: u64,
}

impl CounterSnapshot {
    /// Read every counter from `source`, substituting zero where unsupported.
    pub fn capture(source: &dyn RenderCounters) -> Self {
        Self {
            draw_calls: source.draw_calls().unwrap_or(0),
            triangles: source.triangles().unwrap_or(0),
            memory_bytes: source.memory_bytes().unwrap_or(0),
        }
    }
}
