/// Moves a cursor along a closed curve and bends meshes to follow it
use nalgebra::Point3;
use tracing::debug;

use crate::curve::ClosedCurve;
use crate::frames::FrenetFrame;
use crate::geometry::Mesh;
use crate::transform::{Pose, Transform};

/// Number of frame stations precomputed along the curve.
pub const SPINE_SAMPLES: usize = 1024;

/// Whether the animator currently has a curve to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Following,
}

#[derive(Debug, Clone)]
struct Binding {
    curve: ClosedCurve,
    frames: Vec<FrenetFrame>,
    cursor: f32,
}

impl Binding {
    fn frame_at(&self, u: f32) -> FrenetFrame {
        let stations = self.frames.len() - 1;
        let scaled = u.rem_euclid(1.0) * stations as f32;
        let i = (scaled.floor() as usize).min(stations - 1);
        self.frames[i].lerp(&self.frames[i + 1], scaled - i as f32)
    }

    fn pose_at(&self, u: f32) -> Pose {
        Pose {
            position: self.curve.point_at(u),
            frame: self.frame_at(u),
        }
    }
}

/// Cursor along a closed curve, measured as the travelled fraction of its arc
/// length. One full loop is a cursor distance of `1.0`.
#[derive(Debug, Clone, Default)]
pub struct Animator {
    binding: Option<Binding>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.binding.is_some() {
            Phase::Following
        } else {
            Phase::Idle
        }
    }

    /// Follow `curve` from its start. Replaces any previous curve.
    pub fn bind(&mut self, curve: ClosedCurve) {
        let frames = curve.frenet_frames(SPINE_SAMPLES);
        debug!(length = curve.length(), "animator bound to curve");
        self.binding = Some(Binding {
            curve,
            frames,
            cursor: 0.0,
        });
    }

    pub fn unbind(&mut self) {
        self.binding = None;
    }

    pub fn curve(&self) -> Option<&ClosedCurve> {
        self.binding.as_ref().map(|b| &b.curve)
    }

    pub fn cursor(&self) -> Option<f32> {
        self.binding.as_ref().map(|b| b.cursor)
    }

    /// Advance by `delta * speed` and move `target` to the new pose.
    /// Does nothing while idle.
    pub fn advance(&mut self, delta: f32, speed: f32, target: &mut Transform) -> Option<Pose> {
        let binding = self.binding.as_mut()?;
        binding.cursor = (binding.cursor + delta * speed).rem_euclid(1.0);
        // rem_euclid can round up to exactly 1.0 for tiny negatives.
        if binding.cursor >= 1.0 {
            binding.cursor = 0.0;
        }

        let pose = binding.pose_at(binding.cursor);
        target.set_pose(&pose);
        Some(pose)
    }

    /// Pose at the cursor.
    pub fn pose(&self) -> Option<Pose> {
        self.binding.as_ref().map(|b| b.pose_at(b.cursor))
    }

    /// Pose at an arbitrary arc-length fraction.
    pub fn pose_at(&self, u: f32) -> Option<Pose> {
        self.binding.as_ref().map(|b| b.pose_at(u))
    }

    /// Bend `mesh` along the curve, its local x axis mapped onto the arc
    /// starting at the cursor. Local y and z offset along the normal and
    /// binormal.
    pub fn deform(&self, mesh: &Mesh) -> Option<Mesh> {
        let binding = self.binding.as_ref()?;
        let length = binding.curve.length();
        if length <= 0.0 {
            return None;
        }

        Some(mesh.map_positions(|p| {
            let pose = binding.pose_at(binding.cursor + p.x / length);
            let offset = pose.frame.normal * p.y + pose.frame.binormal * p.z;
            Point3::from(pose.position.coords + offset)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::TorusKnot;
    use approx::assert_relative_eq;

    fn following() -> Animator {
        let mut animator = Animator::new();
        animator.bind(TorusKnot::default().curve().unwrap());
        animator
    }

    #[test]
    fn idle_advance_is_noop() {
        let mut animator = Animator::new();
        let mut transform = Transform::identity();
        assert_eq!(animator.phase(), Phase::Idle);
        assert!(animator.advance(1.0, 1.0, &mut transform).is_none());
        assert_eq!(transform, Transform::identity());
    }

    #[test]
    fn binding_starts_at_curve_start() {
        let animator = following();
        assert_eq!(animator.phase(), Phase::Following);
        assert_eq!(animator.cursor(), Some(0.0));
        let pose = animator.pose().unwrap();
        assert_relative_eq!(pose.position, Point3::new(1.5, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn rebinding_resets_cursor() {
        let mut animator = following();
        let mut transform = Transform::identity();
        animator.advance(1.0, 0.3, &mut transform);
        animator.bind(TorusKnot::new(2.0, 32, 3, 4).curve().unwrap());
        assert_eq!(animator.cursor(), Some(0.0));
    }

    #[test]
    fn full_loop_returns_to_start() {
        let mut animator = following();
        let mut transform = Transform::identity();
        animator.advance(0.37, 1.0, &mut transform);
        let start = animator.pose().unwrap().position;
        animator.advance(1.0, 1.0, &mut transform);
        assert_relative_eq!(animator.pose().unwrap().position, start, epsilon = 1e-3);
    }

    #[test]
    fn zero_speed_stays_put_but_is_oriented() {
        let mut animator = following();
        let mut transform = Transform::identity();
        animator.advance(0.25, 1.0, &mut transform);
        let before = animator.pose().unwrap();
        let after = animator.advance(10.0, 0.0, &mut transform).unwrap();
        assert_relative_eq!(after.position, before.position, epsilon = 1e-6);

        let tangent = animator.curve().unwrap().tangent_at(0.25);
        assert!(after.frame.tangent.dot(&tangent) > 0.99);
    }

    #[test]
    fn advance_writes_the_target_transform() {
        let mut animator = following();
        let mut transform = Transform::identity();
        let pose = animator.advance(0.5, 0.2, &mut transform).unwrap();
        assert_eq!(transform.position, pose.position);
        assert_relative_eq!(transform.rotation, pose.frame.basis(), epsilon = 1e-6);
    }

    #[test]
    fn wraps_past_the_end_and_runs_backwards() {
        let mut animator = following();
        let mut transform = Transform::identity();
        animator.advance(1.0, 0.9, &mut transform);
        animator.advance(1.0, 0.3, &mut transform);
        assert_relative_eq!(animator.cursor().unwrap(), 0.2, epsilon = 1e-5);

        animator.advance(1.0, -0.5, &mut transform);
        assert_relative_eq!(animator.cursor().unwrap(), 0.7, epsilon = 1e-5);
    }

    #[test]
    fn pose_is_continuous_across_the_wrap() {
        let animator = following();
        let before = animator.pose_at(0.9999).unwrap();
        let after = animator.pose_at(0.0).unwrap();
        assert!((before.position - after.position).norm() < 1e-2);
        assert!(before.frame.tangent.dot(&after.frame.tangent) > 0.99);
    }

    #[test]
    fn deformed_spine_lies_on_the_curve() {
        let animator = following();
        let mesh = Mesh::pencil();
        let bent = animator.deform(&mesh).unwrap();
        let curve = animator.curve().unwrap();
        let length = curve.length();

        for (original, deformed) in mesh.triangles.iter().zip(&bent.triangles) {
            for (v, d) in original.vertices.iter().zip(&deformed.vertices) {
                let on_curve = curve.point_at(v.position.x / length);
                let radial = (v.position.y.powi(2) + v.position.z.powi(2)).sqrt();
                assert!(((d.position - on_curve).norm() - radial).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn idle_animator_does_not_deform() {
        assert!(Animator::new().deform(&Mesh::pencil()).is_none());
    }
}
