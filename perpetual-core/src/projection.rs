/// Perspective camera and screen projection
use nalgebra::{Matrix4, Point3, Vector3};

/// A world point mapped to screen pixels. `depth` is normalised device depth,
/// smaller is nearer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
}

/// Perspective camera looking at `target`. `fov` is the vertical field of
/// view in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(aspect: f32) -> Self {
        Self {
            position: Point3::new(10.0, 0.0, 0.0),
            target: Point3::origin(),
            up: Vector3::y(),
            fov: 30.0,
            aspect,
            near: 0.1,
            far: 1000.0,
        }
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov.to_radians(), self.near, self.far)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a world-space point onto a `width` x `height` raster.
    ///
    /// Points behind the near plane yield `None`. Points outside the raster
    /// are still returned so callers can clip edges themselves.
    pub fn project(
        view_projection: &Matrix4<f32>,
        point: &Point3<f32>,
        width: usize,
        height: usize,
    ) -> Option<ScreenPoint> {
        let clip = view_projection * point.to_homogeneous();

        // Prevent division by near-zero depth values
        if clip.w < 1e-6 {
            return None;
        }

        let ndc = clip.xyz() / clip.w;
        if ndc.z < -1.0 {
            return None;
        }

        Some(ScreenPoint {
            x: (ndc.x + 1.0) * 0.5 * width as f32,
            y: (1.0 - ndc.y) * 0.5 * height as f32,
            depth: ndc.z,
        })
    }

    /// Project a single point with this camera.
    pub fn project_to_screen(&self, point: &Point3<f32>, width: usize, height: usize) -> Option<ScreenPoint> {
        Self::project(&self.view_projection(), point, width, height)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}
