/// Node transforms and the matrices built from them
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

use crate::frames::FrenetFrame;

/// Position and orientation of a point travelling along a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Point3<f32>,
    pub frame: FrenetFrame,
}

/// Placement of a scene node: translation, rotation basis and uniform scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Point3<f32>,
    pub rotation: Matrix3<f32>,
    pub scale: f32,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: Matrix3::identity(),
            scale: 1.0,
        }
    }

    /// Move the node to `pose`, pointing local x along the tangent.
    pub fn set_pose(&mut self, pose: &Pose) {
        self.position = pose.position;
        self.rotation = pose.frame.basis();
    }

    /// Model matrix: scale, then rotate, then translate.
    pub fn matrix(&self) -> Matrix4<f32> {
        Self::translation_matrix(self.position.x, self.position.y, self.position.z)
            * self.rotation.to_homogeneous()
            * Self::scale_matrix(self.scale, self.scale, self.scale)
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a scale matrix
    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
