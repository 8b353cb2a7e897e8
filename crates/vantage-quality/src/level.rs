//! Quality tiers and the ordered ladder they form.

use serde::{Deserialize, Serialize};
use vantage_config::{LadderEntry, QualityConfig};

use crate::renderer::RendererError;

/// Errors from the quality subsystem.
#[derive(Debug, thiserror::Error)]
pub enum QualityError {
    /// A manual override named a tier that is not on the ladder.
    #[error("unknown quality level '{0}'")]
    UnknownLevel(String),

    #[error("quality ladder must contain at least one level")]
    EmptyLadder,

    #[error("quality level '{0}' appears more than once")]
    DuplicateLevel(String),

    #[error("quality level '{name}': {reason}")]
    InvalidLevel { name: String, reason: String },

    /// The renderer rejected the requested settings; the previous ones are back in place.
    #[error("renderer rejected settings: {0}")]
    Renderer(#[from] RendererError),
}

/// A named renderer preset. Index 0 on the ladder is the cheapest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QualityLevel {
    pub name: String,
    /// Device-pixel to logical-pixel scale of the render target.
    pub pixel_ratio: f32,
    /// Shadow map edge length; a power of two, or 0 to disable shadows.
    pub shadow_map_resolution: u32,
    pub antialiasing: bool,
    pub max_lights: u32,
    /// Multiplier on every LOD threshold.
    pub lod_distance_scale: f32,
    pub particle_budget: u32,
    /// Largest texture edge produced by the texture optimizer.
    pub max_texture_size: u32,
    /// Fraction of triangles kept by the geometry optimizer, in `(0, 1]`.
    pub geometry_detail: f32,
}

impl QualityLevel {
    pub fn low() -> Self {
        Self {
            name: "low".into(),
            pixel_ratio: 0.75,
            shadow_map_resolution: 0,
            antialiasing: false,
            max_lights: 2,
            lod_distance_scale: 0.6,
            particle_budget: 500,
            max_texture_size: 512,
            geometry_detail: 0.35,
        }
    }

    pub fn medium() -> Self {
        Self {
            name: "medium".into(),
            pixel_ratio: 1.0,
            shadow_map_resolution: 1024,
            antialiasing: false,
            max_lights: 4,
            lod_distance_scale: 1.0,
            particle_budget: 2000,
            max_texture_size: 1024,
            geometry_detail: 0.65,
        }
    }

    pub fn high() -> Self {
        Self {
            name: "high".into(),
            pixel_ratio: 1.5,
            shadow_map_resolution: 2048,
            antialiasing: true,
            max_lights: 8,
            lod_distance_scale: 1.5,
            particle_budget: 8000,
            max_texture_size: 2048,
            geometry_detail: 1.0,
        }
    }

    fn validate(&self) -> Result<(), QualityError> {
        let invalid = |reason: &str| QualityError::InvalidLevel {
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if !(self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0) {
            return Err(invalid("pixel_ratio must be positive"));
        }
        if self.shadow_map_resolution != 0 && !self.shadow_map_resolution.is_power_of_two() {
            return Err(invalid("shadow_map_resolution must be 0 or a power of two"));
        }
        if !(self.lod_distance_scale.is_finite() && self.lod_distance_scale > 0.0) {
            return Err(invalid("lod_distance_scale must be positive"));
        }
        if !self.max_texture_size.is_power_of_two() {
            return Err(invalid("max_texture_size must be a power of two"));
        }
        if !(self.geometry_detail > 0.0 && self.geometry_detail <= 1.0) {
            return Err(invalid("geometry_detail must be in (0, 1]"));
        }
        Ok(())
    }
}

impl From<&LadderEntry> for QualityLevel {
    fn from(entry: &LadderEntry) -> Self {
        Self {
            name: entry.name.clone(),
            pixel_ratio: entry.pixel_ratio,
            shadow_map_resolution: entry.shadow_map_resolution,
            antialiasing: entry.antialiasing,
            max_lights: entry.max_lights,
            lod_distance_scale: entry.lod_distance_scale,
            particle_budget: entry.particle_budget,
            max_texture_size: entry.max_texture_size,
            geometry_detail: entry.geometry_detail,
        }
    }
}

/// Non-empty ordered list of uniquely named levels, cheapest first.
#[derive(Clone, Debug, PartialEq)]
pub struct QualityLadder {
    levels: Vec<QualityLevel>,
}

impl QualityLadder {
    pub fn new(levels: Vec<QualityLevel>) -> Result<Self, QualityError> {
        if levels.is_empty() {
            return Err(QualityError::EmptyLadder);
        }
        for (i, level) in levels.iter().enumerate() {
            level.validate()?;
            if levels[..i].iter().any(|other| other.name == level.name) {
                return Err(QualityError::DuplicateLevel(level.name.clone()));
            }
        }
        Ok(Self { levels })
    }

    /// The configured ladder, or the built-in low/medium/high one when the
    /// config leaves it empty.
    pub fn from_config(config: &QualityConfig) -> Result<Self, QualityError> {
        if config.ladder.is_empty() {
            return Ok(Self::default());
        }
        Self::new(config.ladder.iter().map(QualityLevel::from).collect())
    }

    pub fn get(&self, index: usize) -> Option<&QualityLevel> {
        self.levels.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.levels.iter().position(|level| level.name == name)
    }

    pub fn levels(&self) -> &[QualityLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn highest_index(&self) -> usize {
        self.levels.len() - 1
    }

    /// `(L - 1) / 2`, the starting tier for unremarkable devices.
    pub fn middle_index(&self) -> usize {
        self.highest_index() / 2
    }
}

impl Default for QualityLadder {
    fn default() -> Self {
        Self {
            levels: vec![
                QualityLevel::low(),
                QualityLevel::medium(),
                QualityLevel::high(),
            ],
        }
    }
}

impl std::ops::Index<usize> for QualityLadder {
    type Output = QualityLevel;

    fn index(&self, index: usize) -> &QualityLevel {
        &self.levels[index]
    }
}
