//! Texture downsizing, format selection and sampler setup per quality tier.

use std::sync::Arc;

use image::RgbaImage;
use image::imageops::FilterType;
use tracing::{debug, warn};
use vantage_config::AssetConfig;
use vantage_quality::{Capabilities, CompressedFormat, QualityLevel};

use crate::cache::{AssetKey, OptimizedCache};
use crate::error::AssetError;

/// Bounds below this size skip mipmaps; the texture is small on screen anyway.
const MIPMAP_MIN_DIMENSION: u32 = 512;

/// Edge length of a compressed block. Compressed uploads need block-aligned sizes.
const BLOCK_SIZE: u32 = 4;

/// Calculates the number of mip levels for the given dimensions.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Decoded RGBA8 pixels as handed over by the loader.
#[derive(Clone, Debug, PartialEq)]
pub struct RawTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RawTexture {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// Format the renderer should encode the texture to on upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8,
    Astc4x4,
    Bc7,
    Etc2Rgba8,
}

impl From<CompressedFormat> for TextureFormat {
    fn from(format: CompressedFormat) -> Self {
        match format {
            CompressedFormat::Astc => Self::Astc4x4,
            CompressedFormat::Bc7 => Self::Bc7,
            CompressedFormat::Etc2 => Self::Etc2Rgba8,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    ClampToEdge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Texture limits derived from a quality tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureBounds {
    pub max_dimension: u32,
    pub mipmaps: bool,
    pub anisotropy: u8,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    /// `None` when the texture has no mip chain.
    pub mipmap_filter: Option<FilterMode>,
}

impl TextureBounds {
    pub fn for_level(level: &QualityLevel, capabilities: &Capabilities) -> Self {
        let max_dimension = level.max_texture_size.min(capabilities.max_texture_size).max(1);
        let mipmaps = max_dimension >= MIPMAP_MIN_DIMENSION;
        let anisotropy = match max_dimension {
            2048.. => 8,
            1024.. => 4,
            _ => 1,
        };
        Self {
            max_dimension,
            mipmaps,
            anisotropy,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            mipmap_filter: mipmaps.then_some(FilterMode::Linear),
        }
    }
}

/// A GPU-ready texture. Pixels are RGBA8 at mip level 0.
#[derive(Clone, Debug, PartialEq)]
pub struct OptimizedTexture {
    pub width: u32,
    pub height: u32,
    pub mip_level_count: u32,
    pub format: TextureFormat,
    pub wrap: WrapMode,
    pub bounds: TextureBounds,
    pub pixels: Vec<u8>,
}

impl OptimizedTexture {
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }
}

/// Downsizes textures to the active tier and caches the result.
pub struct TextureOptimizer {
    format_preference: Vec<CompressedFormat>,
    generate_mipmaps: bool,
    cache: OptimizedCache<OptimizedTexture>,
}

impl TextureOptimizer {
    pub fn new(format_preference: Vec<CompressedFormat>) -> Self {
        Self {
            format_preference,
            generate_mipmaps: true,
            cache: OptimizedCache::new(),
        }
    }

    /// Build from config; unknown format names are skipped with a warning.
    pub fn from_config(config: &AssetConfig) -> Self {
        let format_preference = config
            .compressed_format_preference
            .iter()
            .filter_map(|name| match name.parse() {
                Ok(format) => Some(format),
                Err(err) => {
                    warn!(%err, "ignoring compressed format preference");
                    None
                }
            })
            .collect();
        Self {
            generate_mipmaps: config.generate_mipmaps,
            ..Self::new(format_preference)
        }
    }

    /// Produce the texture for `level`, reusing a cached result when present.
    pub fn optimize(
        &mut self,
        key: &AssetKey,
        raw: RawTexture,
        level: &QualityLevel,
        capabilities: &Capabilities,
    ) -> Result<Arc<OptimizedTexture>, AssetError> {
        if let Some(hit) = self.cache.get(key, &level.name) {
            return Ok(hit);
        }
        let bounds = TextureBounds::for_level(level, capabilities);
        let optimized = Arc::new(self.transform(raw, bounds, capabilities)?);
        debug!(
            key = %key,
            level = %level.name,
            width = optimized.width,
            height = optimized.height,
            format = ?optimized.format,
            "texture optimized"
        );
        self.cache.insert(key.clone(), &level.name, Arc::clone(&optimized));
        Ok(optimized)
    }

    fn transform(
        &self,
        raw: RawTexture,
        bounds: TextureBounds,
        capabilities: &Capabilities,
    ) -> Result<OptimizedTexture, AssetError> {
        let RawTexture {
            width,
            height,
            pixels,
        } = raw;
        if width == 0 || height == 0 {
            return Err(AssetError::ZeroDimensions { width, height });
        }
        let expected = width as usize * height as usize * 4;
        let actual = pixels.len();
        let mismatch = AssetError::DataSizeMismatch {
            actual,
            expected,
            width,
            height,
        };
        if actual != expected {
            return Err(mismatch);
        }
        let image = RgbaImage::from_raw(width, height, pixels).ok_or(mismatch)?;

        let (target_w, target_h) = fit_within(width, height, bounds.max_dimension);
        let image = if (target_w, target_h) == (width, height) {
            image
        } else {
            image::imageops::resize(&image, target_w, target_h, FilterType::Lanczos3)
        };

        let mip_level_count = if bounds.mipmaps && self.generate_mipmaps {
            mip_level_count(target_w, target_h)
        } else {
            1
        };
        let wrap = if target_w.is_power_of_two() && target_h.is_power_of_two() {
            WrapMode::Repeat
        } else {
            WrapMode::ClampToEdge
        };

        Ok(OptimizedTexture {
            width: target_w,
            height: target_h,
            mip_level_count,
            format: self.pick_format(target_w, target_h, capabilities),
            wrap,
            bounds,
            pixels: image.into_raw(),
        })
    }

    /// First preferred compressed format the device supports, else RGBA8.
    fn pick_format(&self, width: u32, height: u32, capabilities: &Capabilities) -> TextureFormat {
        if width % BLOCK_SIZE != 0 || height % BLOCK_SIZE != 0 {
            return TextureFormat::Rgba8;
        }
        self.format_preference
            .iter()
            .copied()
            .find(|&format| capabilities.supports_format(format))
            .map_or(TextureFormat::Rgba8, TextureFormat::from)
    }

    pub fn cached(&self, key: &AssetKey, level: &str) -> Option<Arc<OptimizedTexture>> {
        self.cache.get(key, level)
    }

    pub fn invalidate(&mut self, key: &AssetKey) -> usize {
        self.cache.invalidate(key)
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for TextureOptimizer {
    fn default() -> Self {
        Self::from_config(&AssetConfig::default())
    }
}

/// Scale `(width, height)` so the longer side is at most `max`, keeping aspect.
fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max {
        return (width, height);
    }
    let scale = f64::from(max) / f64::from(longest);
    let scaled = |v: u32| ((f64::from(v) * scale).round() as u32).clamp(1, max);
    (scaled(width), scaled(height))
}
