//! Level-of-detail management: distance-based level selection and asset swapping.

mod manager;
mod selector;

pub use manager::{LodManager, LodStats, TrackedObject};
pub use selector::{LodError, LodLevel, LodSelection, select_level, validate_levels};
