//! Per-frame samples and the fixed-capacity ring that holds them.

use std::collections::VecDeque;

use serde::Serialize;

/// Number of samples retained by the monitor.
pub const SAMPLE_CAPACITY: usize = 60;

/// Timing of a single rendered frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PerformanceSample {
    /// `1000 / frame_time_ms` for this frame alone.
    pub fps_instant: f64,
    /// Milliseconds since the previous tick.
    pub frame_time_ms: f64,
    /// Host timestamp of the tick that produced this sample.
    pub timestamp_ms: f64,
}

impl PerformanceSample {
    /// Build a sample from a positive frame delta.
    pub fn new(frame_time_ms: f64, timestamp_ms: f64) -> Self {
        Self {
            fps_instant: 1000.0 / frame_time_ms,
            frame_time_ms,
            timestamp_ms,
        }
    }
}

/// Bounded FIFO of samples. Storage is allocated once; pushing into a full
/// ring evicts the oldest sample.
#[derive(Clone, Debug)]
pub struct SampleRing {
    samples: VecDeque<PerformanceSample>,
    capacity: usize,
}

impl SampleRing {
    /// Create an empty ring holding at most `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when full.
    pub fn push(&mut self, sample: PerformanceSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Mean frame time over the retained samples, `None` when empty.
    pub fn mean_frame_time_ms(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: f64 = self.samples.iter().map(|s| s.frame_time_ms).sum();
        Some(sum / self.samples.len() as f64)
    }

    /// The most recent sample.
    pub fn latest(&self) -> Option<&PerformanceSample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PerformanceSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every sample while keeping the allocation.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for SampleRing {
    fn default() -> Self {
        Self::with_capacity(SAMPLE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_never_exceeds_capacity() {
        let mut ring = SampleRing::with_capacity(4);
        for i in 0..10 {
            ring.push(PerformanceSample::new(10.0, i as f64 * 10.0));
            assert!(ring.len() <= 4);
        }
        assert_eq!(ring.len(), 4);
    }

    /// Eviction is FIFO: the oldest timestamps leave first.
    #[test]
    fn test_ring_evicts_oldest() {
        let mut ring = SampleRing::with_capacity(3);
        for i in 0..5 {
            ring.push(PerformanceSample::new(10.0, i as f64));
        }
        let stamps: Vec<f64> = ring.iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(stamps, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_mean_frame_time() {
        let mut ring = SampleRing::default();
        assert!(ring.mean_frame_time_ms().is_none());
        ring.push(PerformanceSample::new(10.0, 0.0));
        ring.push(PerformanceSample::new(30.0, 1.0));
        assert!((ring.mean_frame_time_ms().unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_instant_fps() {
        let sample = PerformanceSample::new(20.0, 0.0);
        assert!((sample.fps_instant - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut ring = SampleRing::default();
        ring.push(PerformanceSample::new(16.0, 0.0));
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.capacity(), SAMPLE_CAPACITY);
    }
}
