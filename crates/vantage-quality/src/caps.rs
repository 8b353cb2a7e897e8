//! Renderer capability descriptor and resolution of a tier into concrete settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::level::QualityLevel;

/// Shadow filtering modes, cheapest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShadowFilter {
    Basic,
    Pcf,
    PcfSoft,
    Vsm,
}

/// GPU block-compressed texture formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompressedFormat {
    Astc,
    Bc7,
    Etc2,
}

impl FromStr for CompressedFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "astc" => Ok(Self::Astc),
            "bc7" => Ok(Self::Bc7),
            "etc2" => Ok(Self::Etc2),
            other => Err(format!("unknown compressed format '{other}'")),
        }
    }
}

impl fmt::Display for CompressedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Astc => "astc",
            Self::Bc7 => "bc7",
            Self::Etc2 => "etc2",
        };
        f.write_str(name)
    }
}

/// What the host renderer supports. Computed once and passed down.
#[derive(Clone, Debug, PartialEq)]
pub struct Capabilities {
    pub max_shadow_map_size: u32,
    pub shadow_filters: Vec<ShadowFilter>,
    pub antialiasing: bool,
    pub max_texture_size: u32,
    pub compressed_formats: Vec<CompressedFormat>,
    /// Native device pixel ratio; rendering above it is wasted work.
    pub max_pixel_ratio: f32,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            max_shadow_map_size: 4096,
            shadow_filters: vec![
                ShadowFilter::Basic,
                ShadowFilter::Pcf,
                ShadowFilter::PcfSoft,
                ShadowFilter::Vsm,
            ],
            antialiasing: true,
            max_texture_size: 8192,
            compressed_formats: vec![CompressedFormat::Bc7],
            max_pixel_ratio: 4.0,
        }
    }
}

/// Concrete renderer configuration for one tier on one device.
///
/// Applied to the renderer as a single value so no frame ever sees half of a
/// transition.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderSettings {
    pub level: String,
    pub pixel_ratio: f32,
    /// 0 when shadows are off.
    pub shadow_map_resolution: u32,
    pub shadow_filter: Option<ShadowFilter>,
    pub antialiasing: bool,
    pub max_lights: u32,
    pub particle_budget: u32,
    pub lod_distance_scale: f32,
}

impl Capabilities {
    pub fn supports_format(&self, format: CompressedFormat) -> bool {
        self.compressed_formats.contains(&format)
    }

    /// Clamp `level` to what this device supports.
    ///
    /// Unsupported features fall back to the nearest supported setting and
    /// never fail.
    pub fn resolve(&self, level: &QualityLevel) -> RenderSettings {
        let mut shadow_map_resolution = level.shadow_map_resolution;
        if shadow_map_resolution > self.max_shadow_map_size {
            let clamped = floor_power_of_two(self.max_shadow_map_size);
            debug!(
                level = %level.name,
                requested = shadow_map_resolution,
                clamped,
                "shadow map size unavailable"
            );
            shadow_map_resolution = clamped;
        }

        let shadow_filter = if shadow_map_resolution == 0 {
            None
        } else {
            let requested = requested_filter(shadow_map_resolution);
            let filter = self.nearest_filter(requested);
            if filter != Some(requested) {
                debug!(level = %level.name, ?requested, ?filter, "shadow filter unavailable");
            }
            filter
        };
        if shadow_filter.is_none() {
            shadow_map_resolution = 0;
        }

        let antialiasing = level.antialiasing && self.antialiasing;
        if level.antialiasing && !antialiasing {
            debug!(level = %level.name, "antialiasing unavailable");
        }

        RenderSettings {
            level: level.name.clone(),
            pixel_ratio: level.pixel_ratio.min(self.max_pixel_ratio),
            shadow_map_resolution,
            shadow_filter,
            antialiasing,
            max_lights: level.max_lights,
            particle_budget: level.particle_budget,
            lod_distance_scale: level.lod_distance_scale,
        }
    }

    /// Supported filter closest to `requested`; ties go to the cheaper one.
    fn nearest_filter(&self, requested: ShadowFilter) -> Option<ShadowFilter> {
        let rank = |f: ShadowFilter| f as i32;
        self.shadow_filters
            .iter()
            .copied()
            .min_by_key(|&f| ((rank(f) - rank(requested)).abs(), rank(f)))
    }
}

/// Soft filtering only pays off at higher shadow resolutions.
fn requested_filter(resolution: u32) -> ShadowFilter {
    if resolution >= 2048 {
        ShadowFilter::PcfSoft
    } else {
        ShadowFilter::Pcf
    }
}

/// Largest power of two `<= value`, or 0.
fn floor_power_of_two(value: u32) -> u32 {
    if value == 0 {
        0
    } else {
        1 << (31 - value.leading_zeros())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrestricted_device_keeps_level() {
        let settings = Capabilities::default().resolve(&QualityLevel::high());
        assert_eq!(settings.shadow_map_resolution, 2048);
        assert_eq!(settings.shadow_filter, Some(ShadowFilter::PcfSoft));
        assert!(settings.antialiasing);
        assert_eq!(settings.pixel_ratio, 1.5);
        assert_eq!(settings.level, "high");
    }

    #[test]
    fn test_shadow_size_clamped_to_power_of_two() {
        let caps = Capabilities {
            max_shadow_map_size: 1500,
            ..Capabilities::default()
        };
        let settings = caps.resolve(&QualityLevel::high());
        assert_eq!(settings.shadow_map_resolution, 1024);
    }

    /// Missing soft PCF falls back to the nearest supported filter.
    #[test]
    fn test_shadow_filter_falls_back() {
        let caps = Capabilities {
            shadow_filters: vec![ShadowFilter::Basic, ShadowFilter::Pcf],
            ..Capabilities::default()
        };
        let settings = caps.resolve(&QualityLevel::high());
        assert_eq!(settings.shadow_filter, Some(ShadowFilter::Pcf));
    }

    #[test]
    fn test_equal_distance_prefers_cheaper_filter() {
        let caps = Capabilities {
            shadow_filters: vec![ShadowFilter::Basic, ShadowFilter::PcfSoft],
            ..Capabilities::default()
        };
        let settings = caps.resolve(&QualityLevel::medium());
        assert_eq!(settings.shadow_filter, Some(ShadowFilter::Basic));
    }

    #[test]
    fn test_no_shadow_support_disables_shadows() {
        let caps = Capabilities {
            shadow_filters: Vec::new(),
            ..Capabilities::default()
        };
        let settings = caps.resolve(&QualityLevel::high());
        assert_eq!(settings.shadow_map_resolution, 0);
        assert_eq!(settings.shadow_filter, None);
    }

    #[test]
    fn test_antialiasing_and_pixel_ratio_clamped() {
        let caps = Capabilities {
            antialiasing: false,
            max_pixel_ratio: 1.0,
            ..Capabilities::default()
        };
        let settings = caps.resolve(&QualityLevel::high());
        assert!(!settings.antialiasing);
        assert_eq!(settings.pixel_ratio, 1.0);
    }

    #[test]
    fn test_shadows_off_level_has_no_filter() {
        let settings = Capabilities::default().resolve(&QualityLevel::low());
        assert_eq!(settings.shadow_map_resolution, 0);
        assert_eq!(settings.shadow_filter, None);
    }

    #[test]
    fn test_compressed_format_parse() {
        assert_eq!("ASTC".parse::<CompressedFormat>(), Ok(CompressedFormat::Astc));
        assert!("dxt1".parse::<CompressedFormat>().is_err());
        assert_eq!(CompressedFormat::Etc2.to_string(), "etc2");
    }

    #[test]
    fn test_floor_power_of_two() {
        assert_eq!(floor_power_of_two(0), 0);
        assert_eq!(floor_power_of_two(1), 1);
        assert_eq!(floor_power_of_two(4096), 4096);
        assert_eq!(floor_power_of_two(4095), 2048);
    }
}
