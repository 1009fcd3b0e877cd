/// Scene composition: camera, lighting, backdrop, the pencil and its overlay
use nalgebra::Point3;
use tracing::{debug, warn};

use crate::animator::{Animator, Phase};
use crate::asset::{AssetLoader, AssetState};
use crate::color::Rgba;
use crate::controls::OrbitControls;
use crate::curve::{ClosedCurve, TorusKnot};
use crate::error::CurveError;
use crate::geometry::Mesh;
use crate::lighting::{Environment, LightingPreset};
use crate::params::{paths, ParamChange, ParamValue, PencilParams, SceneParams};
use crate::projection::Camera;
use crate::transform::{Pose, Transform};

/// Two-colour radial gradient behind everything else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Background {
    pub inner: Rgba,
    pub outer: Rgba,
}

impl Background {
    /// Colour at normalised screen position (`0..1` on both axes). The
    /// gradient reaches `outer` at the corners.
    pub fn color_at(&self, x: f32, y: f32) -> Rgba {
        let dx = (x - 0.5) * 2.0;
        let dy = (y - 0.5) * 2.0;
        let t = (dx * dx + dy * dy).sqrt() / std::f32::consts::SQRT_2;
        self.inner.lerp(&self.outer, t).over(&Rgba::BLACK)
    }
}

/// A closed polyline drawn on top of the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct LineLoop {
    pub points: Vec<Point3<f32>>,
    pub color: Rgba,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone)]
pub struct DrawList {
    pub camera: Camera,
    pub environment: Environment,
    pub background: Background,
    /// World-space meshes.
    pub meshes: Vec<Mesh>,
    pub line_loops: Vec<LineLoop>,
}

/// The pencil node: its model and the transform the animator drives.
#[derive(Debug)]
pub struct PencilNode {
    pub asset: AssetLoader,
    /// Rigid placement at the cursor. [`Scene::draw_list`] bends the model
    /// along the curve instead and does not read it; it is for hosts that
    /// place the model with a single matrix, like the wasm binding.
    pub transform: Transform,
}

/// Live scene graph of the demo.
#[derive(Debug)]
pub struct Scene {
    camera: Camera,
    controls: OrbitControls,
    lighting: LightingPreset,
    background: Background,
    pencil: PencilNode,
    animator: Animator,
    /// Camera position as last set from the panel, before orbiting.
    camera_position: Point3<f32>,
    knot: TorusKnot,
    samples: Vec<Point3<f32>>,
    speed: f32,
    debug: bool,
    curve_error: Option<CurveError>,
}

impl Scene {
    pub fn new(
        scene: SceneParams,
        pencil: PencilParams,
        lighting: LightingPreset,
        controls: OrbitControls,
        asset: AssetLoader,
    ) -> Self {
        let mut camera = Camera::default();
        camera.position = scene.camera_position;
        camera.fov = scene.fov;

        let mut this = Self {
            camera,
            controls,
            lighting,
            background: Background {
                inner: scene.background[0],
                outer: scene.background[1],
            },
            pencil: PencilNode {
                asset,
                transform: Transform::identity(),
            },
            animator: Animator::new(),
            camera_position: scene.camera_position,
            knot: pencil.knot(),
            samples: Vec::new(),
            speed: pencil.speed as f32,
            debug: pencil.debug,
            curve_error: None,
        };
        this.rebuild_curve();
        this
    }

    /// React to a parameter change from the panel.
    pub fn apply(&mut self, change: &ParamChange) {
        match (change.path.as_str(), change.value) {
            (paths::RADIUS, ParamValue::Number(n)) => self.reshape(|k| k.radius = n as f32),
            (paths::TUBULAR_SEGMENTS, ParamValue::Number(n)) => {
                self.reshape(|k| k.tubular_segments = n.round().max(0.0) as usize)
            }
            (paths::P, ParamValue::Number(n)) => self.reshape(|k| k.p = n.round() as i32),
            (paths::Q, ParamValue::Number(n)) => self.reshape(|k| k.q = n.round() as i32),
            (paths::SPEED, ParamValue::Number(n)) => self.speed = n as f32,
            (paths::DEBUG, ParamValue::Bool(b)) => self.debug = b,
            (paths::CAMERA_X, ParamValue::Number(n)) => self.move_camera(|p| p.x = n as f32),
            (paths::CAMERA_Y, ParamValue::Number(n)) => self.move_camera(|p| p.y = n as f32),
            (paths::CAMERA_Z, ParamValue::Number(n)) => self.move_camera(|p| p.z = n as f32),
            (paths::CAMERA_FOV, ParamValue::Number(n)) => self.camera.fov = n as f32,
            (paths::BACKGROUND_COLOR1, ParamValue::Color(c)) => self.background.inner = c,
            (paths::BACKGROUND_COLOR2, ParamValue::Color(c)) => self.background.outer = c,
            (path, value) => debug!(path, %value, "scene ignores parameter"),
        }
    }

    /// Match the camera to a raster of `width` x `height` cells, each
    /// `cell_aspect` times as tall as it is wide.
    pub fn set_viewport(&mut self, width: usize, height: usize, cell_aspect: f32) {
        if width > 0 && height > 0 {
            self.camera.aspect = width as f32 / (height as f32 * cell_aspect);
        }
    }

    pub fn set_lighting(&mut self, lighting: LightingPreset) {
        self.lighting = lighting;
    }

    pub fn lighting(&self) -> LightingPreset {
        self.lighting
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn pencil(&self) -> &PencilNode {
        &self.pencil
    }

    /// Raw torus-knot samples, empty while the shape is invalid.
    pub fn samples(&self) -> &[Point3<f32>] {
        &self.samples
    }

    pub fn curve_error(&self) -> Option<&CurveError> {
        self.curve_error.as_ref()
    }

    /// Per-frame work: finish the model load, orbit the camera and move the
    /// pencil. Returns the pencil pose when it moved.
    pub fn update(&mut self, delta: f32) -> Option<Pose> {
        self.pencil.asset.poll();
        self.controls.update(&mut self.camera, delta);
        self.animator.advance(delta, self.speed, &mut self.pencil.transform)
    }

    /// One-line status for anything that keeps the pencil from showing.
    pub fn status(&self) -> Option<String> {
        if let Some(err) = &self.curve_error {
            return Some(format!("curve: {err}"));
        }
        match self.pencil.asset.state() {
            AssetState::Pending => Some("loading model...".to_string()),
            AssetState::Failed(message) => Some(format!("model: {message}")),
            AssetState::Ready(_) => None,
        }
    }

    /// What to draw this frame. The pencil is left out until both its model
    /// and its curve are available.
    pub fn draw_list(&self) -> DrawList {
        let meshes = match (self.pencil.asset.state(), self.animator.phase()) {
            (AssetState::Ready(mesh), Phase::Following) => self.animator.deform(mesh).into_iter().collect(),
            _ => Vec::new(),
        };

        let line_loops = if self.debug && !self.samples.is_empty() {
            vec![LineLoop {
                points: self.samples.clone(),
                color: Rgba::RED,
            }]
        } else {
            Vec::new()
        };

        DrawList {
            camera: self.camera.clone(),
            environment: self.lighting.environment(),
            background: self.background,
            meshes,
            line_loops,
        }
    }

    /// Edit one coordinate and re-apply the whole panel position, dropping
    /// whatever the orbit controls did to the other two.
    fn move_camera<F: FnOnce(&mut Point3<f32>)>(&mut self, edit: F) {
        edit(&mut self.camera_position);
        self.camera.position = self.camera_position;
    }

    fn reshape<F: FnOnce(&mut TorusKnot)>(&mut self, edit: F) {
        let mut knot = self.knot;
        edit(&mut knot);
        if knot != self.knot || self.curve_error.is_some() {
            self.knot = knot;
            self.rebuild_curve();
        }
    }

    fn rebuild_curve(&mut self) {
        match self.knot.points() {
            Ok(points) => {
                self.animator.bind(ClosedCurve::new(points.clone()));
                self.samples = points;
                self.curve_error = None;
                debug!(knot = ?self.knot, "curve rebuilt");
            }
            Err(err) => {
                warn!(knot = ?self.knot, error = %err, "rejecting curve parameters");
                self.animator.unbind();
                self.samples.clear();
                self.curve_error = Some(err);
            }
        }
    }
}
