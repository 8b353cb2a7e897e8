//! Camera transform consumed once per frame.

use glam::{Mat4, Vec3};

/// Camera state as supplied by the host after its transform is final.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// World-space eye position.
    pub position: Vec3,
    /// World-to-view matrix.
    pub view: Mat4,
    /// View-to-clip matrix (depth in `[0, 1]`, standard or reverse-Z).
    pub projection: Mat4,
}

impl Camera {
    pub fn new(position: Vec3, view: Mat4, projection: Mat4) -> Self {
        Self {
            position,
            view,
            projection,
        }
    }

    /// Right-handed perspective camera looking from `eye` towards `target`.
    pub fn perspective_look_at(
        eye: Vec3,
        target: Vec3,
        fov_y_radians: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position: eye,
            view: Mat4::look_at_rh(eye, target, Vec3::Y),
            projection: Mat4::perspective_rh(fov_y_radians, aspect, near, far),
        }
    }

    /// Combined `projection * view` matrix.
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Euclidean distance from the eye to `point`.
    pub fn distance_to(&self, point: Vec3) -> f32 {
        self.position.distance(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to() {
        let camera = Camera::perspective_look_at(
            Vec3::ZERO,
            Vec3::NEG_Z,
            std::f32::consts::FRAC_PI_4,
            1.0,
            0.1,
            100.0,
        );
        assert!((camera.distance_to(Vec3::new(3.0, 4.0, 0.0)) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_view_projection_order() {
        let camera = Camera::perspective_look_at(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            std::f32::consts::FRAC_PI_2,
            1.0,
            0.1,
            100.0,
        );
        assert_eq!(
            camera.view_projection(),
            camera.projection * camera.view
        );
    }
}
