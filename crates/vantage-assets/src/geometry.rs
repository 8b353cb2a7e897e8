//! Mesh decimation by vertex clustering.
//!
//! Vertices are snapped to a uniform grid over the mesh bounds; every cell
//! collapses to the average of its vertices and triangles that lose an edge
//! are dropped. The grid resolution is searched so the result lands at or
//! just under the tier's triangle budget.

use std::sync::Arc;

use glam::Vec3;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;
use vantage_quality::QualityLevel;
use vantage_scene::BoundingSphere;

use crate::cache::{AssetKey, OptimizedCache};
use crate::error::AssetError;

/// Finest clustering grid tried, in cells per axis.
const MAX_GRID_RESOLUTION: u32 = 1024;

/// Indexed triangle mesh as produced by the loader.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawGeometry {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl RawGeometry {
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        Self { positions, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn validate(&self) -> Result<(), AssetError> {
        if self.positions.is_empty() {
            return Err(AssetError::EmptyGeometry);
        }
        if self.indices.len() % 3 != 0 {
            return Err(AssetError::IndexCount(self.indices.len()));
        }
        let vertex_count = self.positions.len();
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(AssetError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
        Ok(())
    }
}

/// Geometry limits derived from a quality tier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryBounds {
    /// Fraction of triangles to keep, in `(0, 1]`.
    pub keep_ratio: f32,
}

impl GeometryBounds {
    pub fn for_level(level: &QualityLevel) -> Self {
        Self {
            keep_ratio: level.geometry_detail,
        }
    }
}

/// Decimated mesh ready for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct OptimizedGeometry {
    pub positions: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    /// Bounds recomputed from the decimated positions.
    pub bounds: BoundingSphere,
    pub source_triangles: usize,
}

impl OptimizedGeometry {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex buffer contents.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Index buffer contents.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Decimates meshes to the active tier and caches the result.
#[derive(Default)]
pub struct GeometryOptimizer {
    cache: OptimizedCache<OptimizedGeometry>,
}

impl GeometryOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the mesh for `level`, reusing a cached result when present.
    pub fn optimize(
        &mut self,
        key: &AssetKey,
        raw: RawGeometry,
        level: &QualityLevel,
    ) -> Result<Arc<OptimizedGeometry>, AssetError> {
        if let Some(hit) = self.cache.get(key, &level.name) {
            return Ok(hit);
        }
        raw.validate()?;
        let bounds = GeometryBounds::for_level(level);
        let source_triangles = raw.triangle_count();
        let (positions, indices) = decimate(raw, bounds.keep_ratio);
        let optimized = Arc::new(OptimizedGeometry {
            bounds: bounding_sphere(&positions),
            positions,
            indices,
            source_triangles,
        });
        debug!(
            key = %key,
            level = %level.name,
            from = source_triangles,
            to = optimized.triangle_count(),
            "geometry optimized"
        );
        self.cache.insert(key.clone(), &level.name, Arc::clone(&optimized));
        Ok(optimized)
    }

    pub fn cached(&self, key: &AssetKey, level: &str) -> Option<Arc<OptimizedGeometry>> {
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

fn bounding_sphere(positions: &[[f32; 3]]) -> BoundingSphere {
    let points: Vec<Vec3> = positions.iter().copied().map(Vec3::from).collect();
    BoundingSphere::from_points(&points).unwrap_or(BoundingSphere::new(Vec3::ZERO, 0.0))
}

/// Reduce `raw` to roughly `keep_ratio` of its triangles.
fn decimate(raw: RawGeometry, keep_ratio: f32) -> (Vec<[f32; 3]>, Vec<u32>) {
    let source = raw.triangle_count();
    if keep_ratio >= 1.0 || source == 0 {
        return (raw.positions, raw.indices);
    }
    let budget = ((source as f32 * keep_ratio).ceil() as usize).max(1);

    // Binary search for the finest grid that stays within budget.
    let mut best = None;
    let (mut lo, mut hi) = (1, MAX_GRID_RESOLUTION);
    while lo <= hi {
        let resolution = lo + (hi - lo) / 2;
        let candidate = cluster(&raw, resolution);
        let triangles = candidate.1.len() / 3;
        if triangles <= budget {
            if triangles > 0 {
                best = Some(candidate);
            }
            lo = resolution + 1;
        } else {
            hi = resolution - 1;
        }
    }

    match best {
        Some(result) => result,
        None => {
            debug!(source, budget, "mesh too small to decimate, keeping original");
            (raw.positions, raw.indices)
        }
    }
}

/// Collapse vertices on a `resolution`³ grid. Degenerate and duplicate
/// triangles are dropped and unreferenced cells are not emitted.
fn cluster(raw: &RawGeometry, resolution: u32) -> (Vec<[f32; 3]>, Vec<u32>) {
    let first = Vec3::from(raw.positions[0]);
    let (min, max) = raw
        .positions
        .iter()
        .map(|&p| Vec3::from(p))
        .fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
    let extent = (max - min).max_element();
    let cell_size = if extent > 0.0 {
        extent / resolution as f32
    } else {
        1.0
    };
    let last = resolution - 1;

    // Cell id per source vertex, with running position sums per cell.
    let mut cell_ids: FxHashMap<(u32, u32, u32), u32> = FxHashMap::default();
    let mut sums: Vec<(Vec3, u32)> = Vec::new();
    let vertex_cells: Vec<u32> = raw
        .positions
        .iter()
        .map(|&p| {
            let p = Vec3::from(p);
            let cell = ((p - min) / cell_size).floor();
            let key = (
                (cell.x as u32).min(last),
                (cell.y as u32).min(last),
                (cell.z as u32).min(last),
            );
            let id = *cell_ids.entry(key).or_insert_with(|| {
                sums.push((Vec3::ZERO, 0));
                (sums.len() - 1) as u32
            });
            let entry = &mut sums[id as usize];
            entry.0 += p;
            entry.1 += 1;
            id
        })
        .collect();

    let mut seen: FxHashSet<[u32; 3]> = FxHashSet::default();
    let mut remap: FxHashMap<u32, u32> = FxHashMap::default();
    let mut positions = Vec::new();
    let mut indices = Vec::new();
    for tri in raw.indices.chunks_exact(3) {
        let cells = [
            vertex_cells[tri[0] as usize],
            vertex_cells[tri[1] as usize],
            vertex_cells[tri[2] as usize],
        ];
        if cells[0] == cells[1] || cells[1] == cells[2] || cells[0] == cells[2] {
            continue;
        }
        let mut sorted = cells;
        sorted.sort_unstable();
        if !seen.insert(sorted) {
            continue;
        }
        for cell in cells {
            let index = *remap.entry(cell).or_insert_with(|| {
                let (sum, count) = sums[cell as usize];
                positions.push((sum / count as f32).to_array());
                (positions.len() - 1) as u32
            });
            indices.push(index);
        }
    }
    (positions, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat `n`×`n` quad grid in the XZ plane, two triangles per quad.
    fn grid(n: u32) -> RawGeometry {
        let mut positions = Vec::new();
        for z in 0..=n {
            for x in 0..=n {
                positions.push([x as f32, 0.0, z as f32]);
            }
        }
        let stride = n + 1;
        let mut indices = Vec::new();
        for z in 0..n {
            for x in 0..n {
                let i = z * stride + x;
                indices.extend_from_slice(&[i, i + stride, i + 1]);
                indices.extend_from_slice(&[i + 1, i + stride, i + stride + 1]);
            }
        }
        RawGeometry::new(positions, indices)
    }

    fn level(detail: f32) -> QualityLevel {
        QualityLevel {
            name: format!("detail{detail}"),
            geometry_detail: detail,
            ..QualityLevel::medium()
        }
    }

    #[test]
    fn test_full_detail_unchanged() {
        let mut optimizer = GeometryOptimizer::new();
        let raw = grid(8);
        let out = optimizer
            .optimize(&AssetKey::from("g"), raw.clone(), &level(1.0))
            .unwrap();
        assert_eq!(out.positions, raw.positions);
        assert_eq!(out.indices, raw.indices);
        assert_eq!(out.source_triangles, 128);
    }

    #[test]
    fn test_decimation_respects_budget() {
        let mut optimizer = GeometryOptimizer::new();
        let out = optimizer
            .optimize(&AssetKey::from("g"), grid(32), &level(0.25))
            .unwrap();
        let budget = (2048.0f32 * 0.25).ceil() as usize;
        assert!(out.triangle_count() > 0);
        assert!(out.triangle_count() <= budget, "{} > {budget}", out.triangle_count());
        assert!(out.positions.len() < grid(32).positions.len());
    }

    /// Decimated meshes never reference missing vertices or contain degenerate triangles.
    #[test]
    fn test_decimated_indices_valid() {
        let mut optimizer = GeometryOptimizer::new();
        let out = optimizer
            .optimize(&AssetKey::from("g"), grid(20), &level(0.3))
            .unwrap();
        for tri in out.indices.chunks_exact(3) {
            assert!(tri.iter().all(|&i| (i as usize) < out.positions.len()));
            assert!(tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2]);
        }
    }

    #[test]
    fn test_bounds_recomputed() {
        let mut optimizer = GeometryOptimizer::new();
        let out = optimizer
            .optimize(&AssetKey::from("g"), grid(10), &level(0.5))
            .unwrap();
        for p in &out.positions {
            let d = Vec3::from(*p).distance(out.bounds.center);
            assert!(d <= out.bounds.radius + 1e-4);
        }
    }

    #[test]
    fn test_single_triangle_kept() {
        let mut optimizer = GeometryOptimizer::new();
        let raw = RawGeometry::new(vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], vec![0, 1, 2]);
        let out = optimizer
            .optimize(&AssetKey::from("tri"), raw, &level(0.1))
            .unwrap();
        assert_eq!(out.triangle_count(), 1);
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let mut optimizer = GeometryOptimizer::new();
        let key = AssetKey::from("bad");
        assert_eq!(
            optimizer.optimize(&key, RawGeometry::default(), &level(0.5)),
            Err(AssetError::EmptyGeometry)
        );
        let raw = RawGeometry::new(vec![[0.0; 3]; 3], vec![0, 1]);
        assert_eq!(
            optimizer.optimize(&key, raw, &level(0.5)),
            Err(AssetError::IndexCount(2))
        );
        let raw = RawGeometry::new(vec![[0.0; 3]; 3], vec![0, 1, 7]);
        assert_eq!(
            optimizer.optimize(&key, raw, &level(0.5)),
            Err(AssetError::IndexOutOfRange {
                index: 7,
                vertex_count: 3
            })
        );
        assert!(optimizer.is_empty());
    }

    #[test]
    fn test_geometry_cache_per_tier() {
        let mut optimizer = GeometryOptimizer::new();
        let key = AssetKey::from("terrain");
        let a = optimizer.optimize(&key, grid(8), &level(0.5)).unwrap();
        let b = optimizer.optimize(&key, grid(8), &level(0.5)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        optimizer.optimize(&key, grid(8), &level(1.0)).unwrap();
        assert_eq!(optimizer.len(), 2);
        optimizer.clear();
        assert!(optimizer.cached(&key, "detail0.5").is_none());
    }

    #[test]
    fn test_upload_bytes() {
        let mut optimizer = GeometryOptimizer::new();
        let out = optimizer
            .optimize(&AssetKey::from("g"), grid(2), &level(1.0))
            .unwrap();
        assert_eq!(out.vertex_bytes().len(), out.positions.len() * 12);
        assert_eq!(out.index_bytes().len(), out.indices.len() * 4);
    }
}
