//! Quality-bounded asset transforms with per-tier caching.
//!
//! [`TextureOptimizer`] and [`GeometryOptimizer`] turn raw assets into
//! GPU-ready ones no larger than the active [`QualityLevel`](vantage_quality::QualityLevel)
//! allows. Raw inputs are taken by value and dropped once transformed; the
//! results are shared through `Arc` and cached by asset key and tier name.

mod cache;
mod error;
mod geometry;
mod texture;

pub use cache::{AssetKey, OptimizedCache};
pub use error::AssetError;
pub use geometry::{GeometryBounds, GeometryOptimizer, OptimizedGeometry, RawGeometry};
pub use texture::{
    FilterMode, OptimizedTexture, RawTexture, TextureBounds, TextureFormat, TextureOptimizer,
    WrapMode, mip_level_count,
};
