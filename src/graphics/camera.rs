use cgmath::{perspective, Deg, Matrix4, Point3, Rad, Vector3};

use crate::carousel::Viewport;

pub trait Camera {
    fn calculate_matrices(&self) -> (Matrix4<f32>, Matrix4<f32>);
}

/// Fixed camera looking down the z axis at the plane ring.
pub struct CarouselCamera {
    fov: Deg<f32>,
    aspect_ratio: f32,
    near: f32,
    far: f32,
    eye: Point3<f32>,
    center: Point3<f32>,
    up: Vector3<f32>,
}

impl CarouselCamera {
    pub fn new_with_aspect(aspect: f32) -> Self {
        CarouselCamera {
            fov: Deg(45.0),
            aspect_ratio: aspect,
            near: 0.1,
            far: 100.0,
            eye: Point3::new(0.0, 0.0, 20.0),
            center: Point3::new(0.0, 0.0, 0.0),
            up: Vector3::new(0.0, 1.0, 0.0),
        }
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect_ratio = aspect;
    }

    /// World-unit extents visible at the ring's depth: the frustum slice
    /// through z = 0 as seen from the eye.
    pub fn viewport(&self) -> Viewport {
        let fov: Rad<f32> = self.fov.into();
        let height = 2.0 * (fov.0 / 2.0).tan() * self.eye.z;
        Viewport {
            width: height * self.aspect_ratio,
            height,
        }
    }
}

impl Camera for CarouselCamera {
    fn calculate_matrices(&self) -> (Matrix4<f32>, Matrix4<f32>) {
        (
            perspective(self.fov, self.aspect_ratio, self.near, self.far),
            Matrix4::look_at_rh(self.eye, self.center, self.up),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_follows_frustum_slice() {
        let camera = CarouselCamera::new_with_aspect(16.0 / 9.0);
        let viewport = camera.viewport();

        let expected_height = 2.0 * (45.0f32.to_radians() / 2.0).tan() * 20.0;
        assert!((viewport.height - expected_height).abs() < 1e-4);
        assert!((viewport.width - expected_height * 16.0 / 9.0).abs() < 1e-4);
    }

    #[test]
    fn aspect_only_changes_width() {
        let mut camera = CarouselCamera::new_with_aspect(1.0);
        let square = camera.viewport();
        assert!((square.width - square.height).abs() < 1e-5);

        camera.set_aspect(2.0);
        let wide = camera.viewport();
        assert!((wide.height - square.height).abs() < 1e-5);
        assert!((wide.width - square.width * 2.0).abs() < 1e-4);
    }
}
