//! View-frustum culling of scene objects by bounding sphere.
//!
//! [`FrustumCuller::update`] extracts six planes from the camera's
//! view-projection matrix once per frame. Visibility queries are pure; only
//! [`FrustumCuller::cull_objects`] writes, and it touches nothing but each
//! object's `visible` flag.

use glam::{Mat4, Vec4};
use tracing::trace;
use vantage_scene::{BoundingSphere, Camera, ObjectId, SceneGraph, SceneObject};

/// Plane indices into the frustum planes array.
const LEFT: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;
const NEAR: usize = 4;
const FAR: usize = 5;

/// A view frustum defined by six inward-pointing planes.
#[derive(Clone, Debug, PartialEq)]
pub struct Frustum {
    /// Each `Vec4(a, b, c, d)`: `(a, b, c)` is the unit inward normal and
    /// `d` the signed distance term.
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extract planes from a view-projection matrix with clip depth in `[0, w]`
    /// (Gribb-Hartmann). The depth pair `z >= 0`, `z <= w` holds for both
    /// standard and reverse-Z projections.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        let mut planes = [Vec4::ZERO; 6];
        planes[LEFT] = rows[3] + rows[0];
        planes[RIGHT] = rows[3] - rows[0];
        planes[BOTTOM] = rows[3] + rows[1];
        planes[TOP] = rows[3] - rows[1];
        planes[NEAR] = rows[2];
        planes[FAR] = rows[3] - rows[2];

        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }

        Self { planes }
    }

    /// Whether a world-space sphere intersects or lies inside the frustum.
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(sphere.center) + plane.w >= -sphere.radius)
    }

    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }
}

/// Per-frame frustum culler.
///
/// Until the first [`update`](Self::update) every query answers `true`.
#[derive(Clone, Debug, Default)]
pub struct FrustumCuller {
    frustum: Option<Frustum>,
}

impl FrustumCuller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the frustum from the camera. The only mutating operation.
    pub fn update(&mut self, camera: &Camera) {
        self.frustum = Some(Frustum::from_view_projection(&camera.view_projection()));
    }

    /// Whether `object` should be drawn.
    ///
    /// Objects without bounds are conservatively visible. Objects whose GPU
    /// upload is still pending get the same answer; whether they can actually
    /// be drawn is the renderer's concern.
    pub fn is_visible(&self, object: &SceneObject) -> bool {
        match object.world_bounds() {
            Some(sphere) => self.is_sphere_visible(&sphere),
            None => true,
        }
    }

    /// Test a world-space sphere.
    pub fn is_sphere_visible(&self, sphere: &BoundingSphere) -> bool {
        self.frustum
            .as_ref()
            .is_none_or(|frustum| frustum.intersects_sphere(sphere))
    }

    /// Set the `visible` flag of each listed object from [`is_visible`](Self::is_visible).
    ///
    /// Ids missing from the scene are skipped. Returns how many objects are visible.
    pub fn cull_objects(
        &self,
        scene: &mut SceneGraph,
        ids: impl IntoIterator<Item = ObjectId>,
    ) -> usize {
        let mut visible = 0;
        for id in ids {
            if let Some(object) = scene.get_mut(id) {
                object.visible = self.is_visible(object);
                visible += usize::from(object.visible);
            }
        }
        visible
    }

    /// Cull every object in the scene.
    pub fn cull_all(&self, scene: &mut SceneGraph) -> usize {
        let mut visible = 0;
        for (_, object) in scene.iter_mut() {
            object.visible = self.is_visible(object);
            visible += usize::from(object.visible);
        }
        trace!(visible, total = scene.len(), "frustum cull");
        visible
    }

    pub fn frustum(&self) -> Option<&Frustum> {
        self.frustum.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn default_camera() -> Camera {
        Camera::perspective_look_at(
            Vec3::ZERO,
            Vec3::NEG_Z,
            std::f32::consts::FRAC_PI_4,
            16.0 / 9.0,
            0.1,
            1000.0,
        )
    }

    fn culler() -> FrustumCuller {
        let mut culler = FrustumCuller::new();
        culler.update(&default_camera());
        culler
    }

    #[test]
    fn test_sphere_in_front_visible() {
        let culler = culler();
        assert!(culler.is_sphere_visible(&BoundingSphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0)));
    }

    #[test]
    fn test_sphere_behind_camera_not_visible() {
        let culler = culler();
        assert!(!culler.is_sphere_visible(&BoundingSphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0)));
    }

    /// A sphere whose center is outside but whose radius reaches in is visible.
    #[test]
    fn test_sphere_straddling_plane_visible() {
        let culler = culler();
        assert!(!culler.is_sphere_visible(&BoundingSphere::new(Vec3::new(-100.0, 0.0, -10.0), 1.0)));
        assert!(culler.is_sphere_visible(&BoundingSphere::new(Vec3::new(-100.0, 0.0, -10.0), 95.0)));
    }

    #[test]
    fn test_all_six_planes_tested() {
        let culler = culler();
        let outside = [
            Vec3::new(0.0, 0.0, 20.0),      // behind
            Vec3::new(-1000.0, 0.0, -5.0),  // left
            Vec3::new(1000.0, 0.0, -5.0),   // right
            Vec3::new(0.0, 1000.0, -5.0),   // above
            Vec3::new(0.0, -1000.0, -5.0),  // below
            Vec3::new(0.0, 0.0, -2000.0),   // beyond far
        ];
        for center in outside {
            assert!(
                !culler.is_sphere_visible(&BoundingSphere::new(center, 1.0)),
                "sphere at {center} should be culled"
            );
        }
    }

    #[test]
    fn test_planes_normalized() {
        let frustum = Frustum::from_view_projection(&default_camera().view_projection());
        for plane in frustum.planes() {
            let normal_len = plane.truncate().length();
            assert!((normal_len - 1.0).abs() < 1e-4, "plane normal not normalized: {normal_len}");
        }
    }

    /// Objects without a bounding volume are never culled.
    #[test]
    fn test_unbounded_object_visible() {
        let culler = culler();
        let behind = SceneObject::at(Vec3::new(0.0, 0.0, 50.0));
        assert!(culler.is_visible(&behind));
    }

    #[test]
    fn test_object_bounds_use_world_transform() {
        let culler = culler();
        let sphere = BoundingSphere::new(Vec3::ZERO, 1.0);
        let front = SceneObject::at(Vec3::new(0.0, 0.0, -20.0)).with_bounds(sphere);
        let back = SceneObject::at(Vec3::new(0.0, 0.0, 20.0)).with_bounds(sphere);
        assert!(culler.is_visible(&front));
        assert!(!culler.is_visible(&back));
    }

    /// Objects still uploading are answered like any other object.
    #[test]
    fn test_not_yet_drawable_object_still_visible() {
        let culler = culler();
        let mut object = SceneObject::at(Vec3::new(0.0, 0.0, -20.0))
            .with_bounds(BoundingSphere::new(Vec3::ZERO, 1.0));
        object.drawable = false;
        assert!(culler.is_visible(&object));
    }

    #[test]
    fn test_before_update_everything_visible() {
        let culler = FrustumCuller::new();
        assert!(culler.is_sphere_visible(&BoundingSphere::new(Vec3::new(0.0, 0.0, 1e6), 1.0)));
    }

    /// Culling writes only the visibility flag.
    #[test]
    fn test_cull_objects_only_touches_visibility() {
        let culler = culler();
        let mut scene = SceneGraph::new();
        let sphere = BoundingSphere::new(Vec3::ZERO, 1.0);
        let front = scene.insert(SceneObject::at(Vec3::new(0.0, 0.0, -20.0)).with_bounds(sphere));
        let back = scene.insert(SceneObject::at(Vec3::new(0.0, 0.0, 20.0)).with_bounds(sphere));
        let before = scene.get(back).unwrap().clone();

        let visible = culler.cull_objects(&mut scene, [front, back]);

        assert_eq!(visible, 1);
        assert!(scene.get(front).unwrap().visible);
        let after = scene.get(back).unwrap();
        assert!(!after.visible);
        assert_eq!(after.transform, before.transform);
        assert_eq!(after.geometry, before.geometry);
        assert_eq!(after.drawable, before.drawable);
    }

    #[test]
    fn test_cull_all() {
        let culler = culler();
        let mut scene = SceneGraph::new();
        let sphere = BoundingSphere::new(Vec3::ZERO, 1.0);
        for z in [-10.0, -20.0, 30.0] {
            scene.insert(SceneObject::at(Vec3::new(0.0, 0.0, z)).with_bounds(sphere));
        }
        assert_eq!(culler.cull_all(&mut scene), 2);
        assert_eq!(scene.visible_count(), 2);
    }
}
