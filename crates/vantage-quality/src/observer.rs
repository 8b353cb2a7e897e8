//! Quality transition notifications.

use crossbeam_channel::Sender;
use serde::Serialize;

/// Why the active tier changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TransitionReason {
    /// First application at startup or after a device profile change.
    Initial,
    Upgrade,
    Downgrade,
    /// Set through a manual override.
    Manual,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum QualityEvent {
    Changed {
        /// `None` on the very first application.
        from: Option<String>,
        to: String,
        reason: TransitionReason,
        /// Window mean that triggered an automatic transition.
        fps: Option<f64>,
    },
    /// The renderer refused `level`; the previous settings were restored.
    ApplyFailed { level: String, error: String },
}

/// Receives quality events. Implemented for closures and channel senders.
pub trait QualityObserver {
    fn on_quality_event(&mut self, event: &QualityEvent);
}

impl<F> QualityObserver for F
where
    F: FnMut(&QualityEvent),
{
    fn on_quality_event(&mut self, event: &QualityEvent) {
        self(event)
    }
}

/// Forwards events to another thread. A disconnected receiver is ignored.
impl QualityObserver for Sender<QualityEvent> {
    fn on_quality_event(&mut self, event: &QualityEvent) {
        let _ = self.send(event.clone());
    }
}
