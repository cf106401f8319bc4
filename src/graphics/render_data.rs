use std::fmt;

use cgmath::{Matrix4, SquareMatrix};

use crate::carousel::{PlaneInstance, Viewport};

/// Everything the recording pass needs for one frame: camera matrices, the
/// world-space viewport extents and the per-plane uniform values.
pub struct RenderData {
    planes: Vec<PlaneInstance>,
    cam_matrices: (Matrix4<f32>, Matrix4<f32>),
    viewport: Viewport,
}

impl RenderData {
    pub fn set_planes(&mut self, planes: &[PlaneInstance]) {
        self.planes.clear();
        self.planes.extend_from_slice(planes);
    }

    pub fn planes(&self) -> &[PlaneInstance] {
        &self.planes
    }

    pub fn update_cam_matrices(&mut self, matrices: (Matrix4<f32>, Matrix4<f32>)) {
        self.cam_matrices = matrices;
    }

    pub fn cam_matrices(&self) -> (Matrix4<f32>, Matrix4<f32>) {
        self.cam_matrices
    }

    pub fn update_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

impl fmt::Debug for RenderData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RenderData plane_count: {}", self.planes.len())
    }
}

impl Default for RenderData {
    fn default() -> Self {
        RenderData {
            planes: vec![],
            cam_matrices: (Matrix4::identity(), Matrix4::identity()),
            viewport: Viewport {
                width: 0.0,
                height: 0.0,
            },
        }
    }
}
