/// Tangent frames along a curve, propagated by parallel transport
use nalgebra::{Matrix3, Rotation3, Unit, Vector3};

/// Orthonormal frame attached to a point on a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrenetFrame {
    pub tangent: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub binormal: Vector3<f32>,
}

impl FrenetFrame {
    /// Build a frame for a lone tangent, choosing the normal from the world
    /// axis the tangent is least aligned with.
    pub fn from_tangent(tangent: Vector3<f32>) -> Self {
        let abs = tangent.abs();
        let mut axis = Vector3::x();
        let mut min = abs.x;
        if abs.y <= min {
            min = abs.y;
            axis = Vector3::y();
        }
        if abs.z <= min {
            axis = Vector3::z();
        }

        let side = tangent.cross(&axis).try_normalize(1e-9).unwrap_or_else(Vector3::y);
        let normal = tangent.cross(&side);
        Self {
            tangent,
            normal,
            binormal: tangent.cross(&normal),
        }
    }

    /// Columns are tangent, normal, binormal: local x follows the curve.
    pub fn basis(&self) -> Matrix3<f32> {
        Matrix3::from_columns(&[self.tangent, self.normal, self.binormal])
    }

    /// Linear blend of two frames, re-orthonormalised.
    pub fn lerp(&self, other: &FrenetFrame, t: f32) -> FrenetFrame {
        let tangent = self
            .tangent
            .lerp(&other.tangent, t)
            .try_normalize(1e-9)
            .unwrap_or(self.tangent);
        let normal = self.normal.lerp(&other.normal, t);
        // Gram-Schmidt against the blended tangent.
        let normal = (normal - tangent * tangent.dot(&normal))
            .try_normalize(1e-9)
            .unwrap_or(self.normal);
        FrenetFrame {
            tangent,
            normal,
            binormal: tangent.cross(&normal),
        }
    }
}

/// Propagate a normal along `tangents` with minimal twist. For closed curves
/// the residual twist between the first and last frame is spread evenly.
pub fn parallel_transport(tangents: &[Vector3<f32>], closed: bool) -> Vec<FrenetFrame> {
    let Some(first) = tangents.first() else {
        return Vec::new();
    };

    let mut frames = Vec::with_capacity(tangents.len());
    frames.push(FrenetFrame::from_tangent(*first));

    for pair in tangents.windows(2) {
        let (prev_tangent, tangent) = (pair[0], pair[1]);
        let mut normal = frames[frames.len() - 1].normal;

        if let Some(axis) = Unit::try_new(prev_tangent.cross(&tangent), f32::EPSILON) {
            let theta = prev_tangent.dot(&tangent).clamp(-1.0, 1.0).acos();
            normal = Rotation3::from_axis_angle(&axis, theta) * normal;
        }

        frames.push(FrenetFrame {
            tangent,
            normal,
            binormal: tangent.cross(&normal),
        });
    }

    let segments = frames.len() - 1;
    if closed && segments > 0 {
        let start = frames[0].normal;
        let end = frames[segments].normal;
        let mut theta = start.dot(&end).clamp(-1.0, 1.0).acos() / segments as f32;
        if frames[0].tangent.dot(&start.cross(&end)) > 0.0 {
            theta = -theta;
        }

        for (i, frame) in frames.iter_mut().enumerate().skip(1) {
            let axis = Unit::new_normalize(frame.tangent);
            frame.normal = Rotation3::from_axis_angle(&axis, theta * i as f32) * frame.normal;
            frame.binormal = frame.tangent.cross(&frame.normal);
        }
    }

    frames
}
