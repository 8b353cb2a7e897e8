//! Arena of scene objects addressed by opaque id.

use glam::{Mat4, Vec3};
use rustc_hash::FxHashMap;

use crate::assets::AssetRef;

/// Opaque handle to an object in a [`SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Bounding sphere in the object's local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Sphere enclosing `points`, centered on their AABB midpoint.
    /// Returns `None` for an empty slice.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points
            .iter()
            .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p)));
        let center = (min + max) * 0.5;
        let radius = points
            .iter()
            .map(|p| p.distance(center))
            .fold(0.0f32, f32::max);
        Some(Self { center, radius })
    }

    /// Transform into world space. The radius grows with the largest axis
    /// scale so non-uniform scaling stays conservative.
    pub fn transformed(&self, world: &Mat4) -> Self {
        let scale = world
            .x_axis
            .truncate()
            .length()
            .max(world.y_axis.truncate().length())
            .max(world.z_axis.truncate().length());
        Self {
            center: world.transform_point3(self.center),
            radius: self.radius * scale,
        }
    }
}

/// A renderable object as seen by culling and LOD.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneObject {
    /// Local-to-world transform.
    pub transform: Mat4,
    /// Local-space bounds. `None` means "always treat as visible".
    pub bounds: Option<BoundingSphere>,
    /// Whether the object should be drawn this frame.
    pub visible: bool,
    /// Set by the host once GPU uploads for the object have completed.
    pub drawable: bool,
    pub geometry: Option<AssetRef>,
    pub material: Option<AssetRef>,
}

impl SceneObject {
    pub fn new(transform: Mat4) -> Self {
        Self {
            transform,
            bounds: None,
            visible: true,
            drawable: true,
            geometry: None,
            material: None,
        }
    }

    pub fn at(position: Vec3) -> Self {
        Self::new(Mat4::from_translation(position))
    }

    pub fn with_bounds(mut self, bounds: BoundingSphere) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_assets(mut self, geometry: AssetRef, material: AssetRef) -> Self {
        self.geometry = Some(geometry);
        self.material = Some(material);
        self
    }

    /// World-space translation of the object.
    pub fn position(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }

    /// Bounds in world space, if any.
    pub fn world_bounds(&self) -> Option<BoundingSphere> {
        self.bounds.map(|b| b.transformed(&self.transform))
    }
}

/// Owns every scene object; ids are never reused.
#[derive(Debug, Default)]
pub struct SceneGraph {
    objects: FxHashMap<ObjectId, SceneObject>,
    next_id: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: SceneObject) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.insert(id, object);
        id
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        self.objects.remove(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.objects.iter().map(|(id, obj)| (*id, obj))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ObjectId, &mut SceneObject)> {
        self.objects.iter_mut().map(|(id, obj)| (*id, obj))
    }

    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Number of objects whose `visible` flag is set.
    pub fn visible_count(&self) -> usize {
        self.objects.values().filter(|o| o.visible).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut scene = SceneGraph::new();
        let id = scene.insert(SceneObject::at(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(scene.get(id).unwrap().position(), Vec3::new(1.0, 2.0, 3.0));
        assert!(scene.remove(id).is_some());
        assert!(!scene.contains(id));
        assert!(scene.remove(id).is_none());
    }

    #[test]
    fn test_ids_unique_after_removal() {
        let mut scene = SceneGraph::new();
        let a = scene.insert(SceneObject::at(Vec3::ZERO));
        scene.remove(a);
        let b = scene.insert(SceneObject::at(Vec3::ZERO));
        assert_ne!(a, b);
    }

    #[test]
    fn test_sphere_transform_translates_and_scales() {
        let sphere = BoundingSphere::new(Vec3::X, 1.0);
        let world = Mat4::from_scale_rotation_translation(
            Vec3::new(1.0, 3.0, 2.0),
            glam::Quat::IDENTITY,
            Vec3::new(0.0, 10.0, 0.0),
        );
        let t = sphere.transformed(&world);
        assert!((t.center - Vec3::new(1.0, 10.0, 0.0)).length() < 1e-5);
        assert!((t.radius - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_sphere_from_points() {
        let points = [Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)];
        let sphere = BoundingSphere::from_points(&points).unwrap();
        assert_eq!(sphere.center, Vec3::ZERO);
        assert!((sphere.radius - 1.0).abs() < 1e-6);
        assert!(BoundingSphere::from_points(&[]).is_none());
    }

    #[test]
    fn test_visible_count() {
        let mut scene = SceneGraph::new();
        scene.insert(SceneObject::at(Vec3::ZERO));
        let hidden = scene.insert(SceneObject::at(Vec3::ZERO));
        scene.get_mut(hidden).unwrap().visible = false;
        assert_eq!(scene.visible_count(), 1);
    }
}
