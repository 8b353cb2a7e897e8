//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name used inside the config directory.
pub const CONFIG_FILE_NAME: &str = "vantage.ron";

/// Top-level configuration for the performance manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Adaptive quality loop settings.
    pub quality: QualityConfig,
    /// Transient object pool settings.
    pub pool: PoolConfig,
    /// Texture/geometry optimizer settings.
    pub assets: AssetConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
    /// Headless simulation parameters used by `vantage-sim`.
    pub sim: SimConfig,
}

/// Adaptive quality controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QualityConfig {
    /// Frame rate the controller steers towards.
    pub target_fps: f32,
    /// Downgrade when the window mean drops below `target_fps * downgrade_ratio`.
    pub downgrade_ratio: f32,
    /// Upgrade when the window mean rises above `target_fps * upgrade_ratio`.
    pub upgrade_ratio: f32,
    /// Dwell time after any transition during which no evaluation happens.
    pub cooldown_ms: f64,
    /// Frames per measurement window.
    pub window_frames: u32,
    /// Wall-clock length of a measurement window; whichever limit is hit first closes it.
    pub window_ms: f64,
    /// Start with adaptive evaluation enabled.
    pub adaptive: bool,
    /// Replacement quality ladder, lowest tier first. Empty keeps the built-in ladder.
    pub ladder: Vec<LadderEntry>,
}

/// One tier of a custom quality ladder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LadderEntry {
    /// Unique tier name, e.g. `"medium"`.
    pub name: String,
    /// Device-pixel-to-logical-pixel scale of the render target.
    pub pixel_ratio: f32,
    /// Shadow map edge length in texels (power of two, 0 disables shadows).
    pub shadow_map_resolution: u32,
    /// Enable antialiasing.
    pub antialiasing: bool,
    /// Maximum number of dynamic lights.
    pub max_lights: u32,
    /// Multiplier applied to LOD switch distances.
    pub lod_distance_scale: f32,
    /// Maximum number of live particles.
    pub particle_budget: u32,
    /// Largest texture edge after optimization (power of two).
    pub max_texture_size: u32,
    /// Fraction of triangles kept by geometry decimation, in `(0, 1]`.
    pub geometry_detail: f32,
}

/// Object pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoolConfig {
    /// Instances created up front.
    pub initial_size: usize,
    /// Growth beyond this many instances logs a warning.
    pub soft_ceiling: usize,
}

/// Asset optimizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    /// Compressed texture formats in order of preference (e.g. `"astc"`, `"bc7"`, `"etc2"`).
    pub compressed_format_preference: Vec<String>,
    /// Generate mipmaps for optimized textures.
    pub generate_mipmaps: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Show the quality snapshot overlay.
    pub show_overlay: bool,
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

/// Parameters for the headless simulation binary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Number of frames to simulate.
    pub frames: u32,
    /// Frame cost in milliseconds at a render cost multiplier of 1.0.
    pub scene_cost_ms: f64,
    /// Device preset: `"desktop"`, `"hidpi"`, `"tablet"` or `"mobile"`.
    pub device: String,
    /// Print a snapshot every this many frames (0 disables periodic output).
    pub report_every: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            target_fps: 60.0,
            downgrade_ratio: 0.8,
            upgrade_ratio: 1.2,
            cooldown_ms: 3000.0,
            window_frames: 60,
            window_ms: 1000.0,
            adaptive: true,
            ladder: Vec::new(),
        }
    }
}

impl Default for LadderEntry {
    fn default() -> Self {
        Self {
            name: "custom".to_string(),
            pixel_ratio: 1.0,
            shadow_map_resolution: 1024,
            antialiasing: false,
            max_lights: 4,
            lod_distance_scale: 1.0,
            particle_budget: 1000,
            max_texture_size: 1024,
            geometry_detail: 1.0,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_size: 32,
            soft_ceiling: 1024,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            compressed_format_preference: vec![
                "astc".to_string(),
                "bc7".to_string(),
                "etc2".to_string(),
            ],
            generate_mipmaps: true,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            show_overlay: false,
            log_level: "info".to_string(),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            scene_cost_ms: 12.0,
            device: "desktop".to_string(),
            report_every: 60,
        }
    }
}

// --- Validation ---

impl Config {
    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let q = &self.quality;
        if !(q.target_fps.is_finite() && q.target_fps > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "quality.target_fps",
                reason: format!("must be a positive number, got {}", q.target_fps),
            });
        }
        if !(q.downgrade_ratio > 0.0 && q.downgrade_ratio < q.upgrade_ratio) {
            return Err(ConfigError::InvalidValue {
                field: "quality.downgrade_ratio",
                reason: format!(
                    "must be positive and below upgrade_ratio ({} >= {})",
                    q.downgrade_ratio, q.upgrade_ratio
                ),
            });
        }
        if q.cooldown_ms < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "quality.cooldown_ms",
                reason: "must not be negative".to_string(),
            });
        }
        if q.window_frames == 0 || q.window_ms <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "quality.window_frames",
                reason: "window limits must be positive".to_string(),
            });
        }
        for entry in &q.ladder {
            if !entry.shadow_map_resolution.is_power_of_two() && entry.shadow_map_resolution != 0 {
                return Err(ConfigError::InvalidValue {
                    field: "quality.ladder.shadow_map_resolution",
                    reason: format!(
                        "tier `{}`: {} is not a power of two",
                        entry.name, entry.shadow_map_resolution
                    ),
                });
            }
            if !(entry.geometry_detail > 0.0 && entry.geometry_detail <= 1.0) {
                return Err(ConfigError::InvalidValue {
                    field: "quality.ladder.geometry_detail",
                    reason: format!("tier `{}`: must be in (0, 1]", entry.name),
                });
            }
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::Read)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::Parse)?;
            config.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `vantage.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::Write)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::Write)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::Read)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::Parse)?;
        new_config.validate()?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(4))
                .unwrap();
        assert!(ron_str.contains("target_fps:"));
        assert!(ron_str.contains("soft_ceiling: 1024"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    /// A config missing whole sections falls back to defaults for them.
    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(quality: (target_fps: 30.0))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.quality.target_fps, 30.0);
        assert_eq!(config.quality.cooldown_ms, 3000.0);
        assert_eq!(config.pool, PoolConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_custom_ladder_parses() {
        let ron_str = r#"(quality: (ladder: [
            (name: "potato", pixel_ratio: 0.5, shadow_map_resolution: 0),
            (name: "fancy", pixel_ratio: 2.0, antialiasing: true),
        ]))"#;
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.quality.ladder.len(), 2);
        assert_eq!(config.quality.ladder[0].name, "potato");
        assert_eq!(config.quality.ladder[0].shadow_map_resolution, 0);
        assert!(config.quality.ladder[1].antialiasing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_positive_target_rejected() {
        let mut config = Config::default();
        config.quality.target_fps = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "quality.target_fps",
                ..
            })
        ));
    }

    #[test]
    fn test_inverted_ratios_rejected() {
        let mut config = Config::default();
        config.quality.downgrade_ratio = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_power_of_two_shadow_rejected() {
        let mut config = Config::default();
        config.quality.ladder.push(LadderEntry {
            shadow_map_resolution: 1000,
            ..Default::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.quality.target_fps = 30.0;
        config.pool.soft_ceiling = 64;
        config.sim.device = "mobile".to_string();

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.quality.target_fps = 144.0;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().quality.target_fps, 144.0);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }
}
