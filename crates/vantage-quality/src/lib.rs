//! Adaptive quality: a ladder of renderer presets and the controller that
//! walks it based on measured frame rate.
//!
//! The [`QualityController`] is the only writer of the active
//! [`QualityLevel`]. It reads closed [`FrameWindow`](vantage_monitor::FrameWindow)s
//! from the monitor, steps one tier up or down with a cooldown between
//! transitions, and hands the resolved [`RenderSettings`] to the host
//! [`Renderer`] in a single call.

mod caps;
mod controller;
mod device;
mod level;
mod observer;
mod renderer;

pub use caps::{Capabilities, CompressedFormat, RenderSettings, ShadowFilter};
pub use controller::{ControllerConfig, QualityController};
pub use device::{ConnectionClass, DeviceProfile, ScreenSize};
pub use level::{QualityError, QualityLadder, QualityLevel};
pub use observer::{QualityEvent, QualityObserver, TransitionReason};
pub use renderer::{Renderer, RendererError};
