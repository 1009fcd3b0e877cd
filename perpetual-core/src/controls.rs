/// Orbit-style camera controls with auto-rotation
use std::f32::consts::{FRAC_PI_2, TAU};

use nalgebra::{Point3, Vector3};

use crate::projection::Camera;

/// Auto-rotate speed of the demo: `-60 * 0.15 / 2`.
pub const DEFAULT_AUTO_ROTATE_SPEED: f32 = -4.5;

const MIN_DISTANCE: f32 = 0.5;
const POLAR_MARGIN: f32 = 1e-3;

/// Spherical offset of the camera from its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    /// Angle from the +y axis.
    pub polar: f32,
    /// Angle around +y, measured from +z towards +x.
    pub azimuth: f32,
}

impl Spherical {
    pub fn from_offset(offset: &Vector3<f32>) -> Self {
        let radius = offset.norm();
        if radius == 0.0 {
            return Self {
                radius: 0.0,
                polar: FRAC_PI_2,
                azimuth: 0.0,
            };
        }
        Self {
            radius,
            polar: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            azimuth: offset.x.atan2(offset.z),
        }
    }

    pub fn to_offset(&self) -> Vector3<f32> {
        let sin_polar = self.polar.sin();
        Vector3::new(
            self.radius * sin_polar * self.azimuth.sin(),
            self.radius * self.polar.cos(),
            self.radius * sin_polar * self.azimuth.cos(),
        )
    }
}

/// Orbits a camera around its target. Auto-rotation turns
/// `2π / 60 * speed` radians per second about the up axis.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
    target: Point3<f32>,
    pending_azimuth: f32,
    pending_polar: f32,
    pending_zoom: f32,
}

impl OrbitControls {
    pub fn new(auto_rotate: bool, auto_rotate_speed: f32) -> Self {
        Self {
            auto_rotate,
            auto_rotate_speed,
            target: Point3::origin(),
            pending_azimuth: 0.0,
            pending_polar: 0.0,
            pending_zoom: 1.0,
        }
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    /// Queue a manual rotation, applied on the next update.
    pub fn rotate(&mut self, azimuth: f32, polar: f32) {
        self.pending_azimuth += azimuth;
        self.pending_polar += polar;
    }

    /// Queue a dolly; factors below 1 move closer.
    pub fn zoom(&mut self, factor: f32) {
        if factor > 0.0 {
            self.pending_zoom *= factor;
        }
    }

    pub fn auto_rotation_angle(&self, delta: f32) -> f32 {
        TAU / 60.0 * self.auto_rotate_speed * delta
    }

    /// Apply auto-rotation and queued input to `camera`.
    pub fn update(&mut self, camera: &mut Camera, delta: f32) {
        let mut spherical = Spherical::from_offset(&(camera.position - self.target));

        if self.auto_rotate {
            spherical.azimuth += self.auto_rotation_angle(delta);
        }
        spherical.azimuth = (spherical.azimuth + self.pending_azimuth).rem_euclid(TAU);
        spherical.polar = (spherical.polar + self.pending_polar)
            .clamp(POLAR_MARGIN, std::f32::consts::PI - POLAR_MARGIN);
        spherical.radius = (spherical.radius * self.pending_zoom).max(MIN_DISTANCE);

        self.pending_azimuth = 0.0;
        self.pending_polar = 0.0;
        self.pending_zoom = 1.0;

        camera.target = self.target;
        camera.position = self.target + spherical.to_offset();
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(true, DEFAULT_AUTO_ROTATE_SPEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn spherical_round_trips_offset() {
        let offset = Vector3::new(3.0, -2.0, 5.0);
        assert_relative_eq!(Spherical::from_offset(&offset).to_offset(), offset, epsilon = 1e-5);
    }

    #[test]
    fn auto_rotation_keeps_distance_and_height() {
        let mut camera = Camera::new(1.0);
        let mut controls = OrbitControls::default();
        for _ in 0..100 {
            controls.update(&mut camera, 1.0 / 30.0);
        }
        assert_relative_eq!((camera.position - Point3::origin()).norm(), 10.0, epsilon = 1e-3);
        assert_relative_eq!(camera.position.y, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn full_turn_period_matches_speed() {
        let mut camera = Camera::new(1.0);
        let start = camera.position;
        let mut controls = OrbitControls::default();
        // |2π/60 * -4.5| rad/s gives one turn every 60 / 4.5 seconds.
        let period = 60.0 / 4.5;
        let steps = 400;
        for _ in 0..steps {
            controls.update(&mut camera, period / steps as f32);
        }
        assert_relative_eq!(camera.position, start, epsilon = 1e-2);
    }

    #[test]
    fn zoom_respects_minimum_distance() {
        let mut camera = Camera::new(1.0);
        let mut controls = OrbitControls::new(false, 0.0);
        controls.zoom(0.001);
        controls.update(&mut camera, 0.0);
        assert_relative_eq!(camera.position.coords.norm(), MIN_DISTANCE, epsilon = 1e-5);
    }

    #[test]
    fn disabled_auto_rotate_is_still() {
        let mut camera = Camera::new(1.0);
        let start = camera.position;
        let mut controls = OrbitControls::new(false, DEFAULT_AUTO_ROTATE_SPEED);
        controls.update(&mut camera, 5.0);
        assert_relative_eq!(camera.position, start, epsilon = 1e-5);
    }
}
