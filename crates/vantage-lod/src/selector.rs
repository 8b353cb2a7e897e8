//! Distance-based LOD selection over a per-object list of thresholds.

use vantage_scene::AssetRef;

/// One level of detail for a tracked object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodLevel {
    /// Maximum distance (exclusive) at which this level is used.
    pub threshold: f32,
    pub geometry: AssetRef,
    pub material: AssetRef,
}

impl LodLevel {
    pub fn new(threshold: f32, geometry: AssetRef, material: AssetRef) -> Self {
        Self {
            threshold,
            geometry,
            material,
        }
    }
}

/// Outcome of LOD selection for one object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LodSelection {
    /// Index into the object's levels; 0 is the most detailed.
    Level(usize),
    /// Farther than the last threshold: hide the object without swapping assets.
    Culled,
}

/// Errors returned when registering LOD levels.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LodError {
    #[error("an LOD registration needs at least one level")]
    NoLevels,

    #[error("threshold {value} at level {index} must be finite and non-negative")]
    InvalidThreshold { index: usize, value: f32 },

    #[error("threshold at level {index} must be greater than the previous one")]
    NotIncreasing { index: usize },
}

/// Check that thresholds are finite, non-negative and strictly increasing.
pub fn validate_levels(levels: &[LodLevel]) -> Result<(), LodError> {
    if levels.is_empty() {
        return Err(LodError::NoLevels);
    }
    for (index, level) in levels.iter().enumerate() {
        if !(level.threshold.is_finite() && level.threshold >= 0.0) {
            return Err(LodError::InvalidThreshold {
                index,
                value: level.threshold,
            });
        }
        if index > 0 && level.threshold <= levels[index - 1].threshold {
            return Err(LodError::NotIncreasing { index });
        }
    }
    Ok(())
}

/// Select the level for an object at `distance`.
///
/// Level `i` covers `[threshold[i-1], threshold[i])`. A distance exactly on a
/// threshold lands on the farther, cheaper side, so boundary jitter biases
/// toward performance. Selection is monotonic: a larger distance never picks a
/// more detailed level.
pub fn select_level(levels: &[LodLevel], distance: f32) -> LodSelection {
    debug_assert!(distance >= 0.0, "distance must be non-negative");
    levels
        .iter()
        .position(|level| distance < level.threshold)
        .map_or(LodSelection::Culled, LodSelection::Level)
}
