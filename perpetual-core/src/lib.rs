/// Perpetual Pencil core library - curve, animation and scene logic
///
/// A pencil loops forever along a torus knot. This crate holds everything
/// that does not touch a display: knot sampling and the closed spline through
/// it, the animator that carries the pencil along the spline, the parameter
/// store behind the tweak panel and the scene that ties them together into a
/// per-frame draw list.

pub mod animator;
pub mod asset;
pub mod color;
pub mod config;
pub mod controls;
pub mod curve;
pub mod error;
pub mod frames;
pub mod geometry;
pub mod lighting;
pub mod params;
pub mod projection;
pub mod scene;
pub mod stl;
pub mod transform;

// Re-export commonly used types
pub use animator::{Animator, Phase};
pub use asset::{AssetLoader, AssetState, ModelSource};
pub use color::Rgba;
pub use config::{AppConfig, ModelConfig};
pub use controls::OrbitControls;
pub use curve::{position_on_curve, ClosedCurve, TorusKnot};
pub use error::{AssetError, CurveError, ParamError, PerpetualError, Result};
pub use frames::FrenetFrame;
pub use geometry::{Material, Mesh, Triangle, Vertex};
pub use lighting::{Environment, LightingPreset};
pub use params::{Control, ControlKind, ParamChange, ParamValue, ParameterStore, PencilParams, SceneParams};
pub use projection::{Camera, ScreenPoint};
pub use scene::{Background, DrawList, LineLoop, Scene};
pub use transform::{Pose, Transform};
