/// Typed, observable store behind the tweak panel
use std::collections::HashSet;
use std::fmt;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::color::Rgba;
use crate::curve::TorusKnot;
use crate::error::ParamError;

/// Full control paths, `Folder.key[.sub]`.
pub mod paths {
    pub const BACKGROUND_COLOR1: &str = "Scene.background.color1";
    pub const BACKGROUND_COLOR2: &str = "Scene.background.color2";
    pub const CAMERA_X: &str = "Scene.camera.position.x";
    pub const CAMERA_Y: &str = "Scene.camera.position.y";
    pub const CAMERA_Z: &str = "Scene.camera.position.z";
    pub const CAMERA_FOV: &str = "Scene.camera.fov";
    pub const RADIUS: &str = "Pencil.radius";
    pub const TUBULAR_SEGMENTS: &str = "Pencil.tubularSegments";
    pub const P: &str = "Pencil.p";
    pub const Q: &str = "Pencil.q";
    pub const DEBUG: &str = "Pencil.debug";
    pub const SPEED: &str = "Pencil.speed";
}

/// A control's current value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Color(Rgba),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Number(n) => write!(f, "{}", (n * 1000.0).round() / 1000.0),
            ParamValue::Color(c) => f.write_str(&c.to_css_string()),
        }
    }
}

/// What kind of value a control holds, with its editing hints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlKind {
    /// `range` clamps assigned values; `nudge` is the step per drag unit.
    Number { range: Option<(f64, f64)>, nudge: f64 },
    Bool,
    Color,
}

impl ControlKind {
    fn name(&self) -> &'static str {
        match self {
            ControlKind::Number { .. } => "number",
            ControlKind::Bool => "boolean",
            ControlKind::Color => "colour",
        }
    }
}

/// A named, typed panel entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub path: String,
    pub kind: ControlKind,
    pub default: ParamValue,
    pub value: ParamValue,
}

impl Control {
    pub fn number(path: &str, default: f64, range: Option<(f64, f64)>, nudge: f64) -> Self {
        Self::new(path, ControlKind::Number { range, nudge }, ParamValue::Number(default))
    }

    pub fn boolean(path: &str, default: bool) -> Self {
        Self::new(path, ControlKind::Bool, ParamValue::Bool(default))
    }

    pub fn color(path: &str, default: Rgba) -> Self {
        Self::new(path, ControlKind::Color, ParamValue::Color(default))
    }

    fn new(path: &str, kind: ControlKind, default: ParamValue) -> Self {
        Self {
            path: path.to_string(),
            kind,
            default,
            value: default,
        }
    }

    /// Folder name, the first path segment.
    pub fn folder(&self) -> &str {
        self.path.split('.').next().unwrap_or_default()
    }

    /// Path without the folder.
    pub fn key(&self) -> &str {
        self.path.split_once('.').map_or(self.path.as_str(), |(_, key)| key)
    }

    /// Check the kind and clamp numbers into range.
    fn coerce(&self, value: ParamValue) -> Result<ParamValue, ParamError> {
        match (self.kind, value) {
            (ControlKind::Number { range, .. }, ParamValue::Number(n)) => {
                let n = match range {
                    Some((min, max)) => n.clamp(min, max),
                    None => n,
                };
                Ok(ParamValue::Number(n))
            }
            (ControlKind::Bool, ParamValue::Bool(_)) | (ControlKind::Color, ParamValue::Color(_)) => Ok(value),
            (kind, _) => Err(ParamError::KindMismatch {
                path: self.path.clone(),
                expected: kind.name(),
            }),
        }
    }

    fn decode(&self, json: &Value) -> Result<ParamValue, ParamError> {
        let decoded = match self.kind {
            ControlKind::Number { .. } => json.as_f64().map(ParamValue::Number),
            ControlKind::Bool => json.as_bool().map(ParamValue::Bool),
            ControlKind::Color => serde_json::from_value::<Rgba>(json.clone()).ok().map(ParamValue::Color),
        };
        decoded.ok_or_else(|| ParamError::KindMismatch {
            path: self.path.clone(),
            expected: self.kind.name(),
        })
    }
}

/// Notification sent to subscribers after a control changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamChange {
    pub path: String,
    pub value: ParamValue,
}

/// Handle returned by [`ParameterStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ParamChange)>;

struct Subscription {
    id: SubscriptionId,
    prefix: String,
    listener: Listener,
}

/// Owns every control and pushes changes to subscribers synchronously.
pub struct ParameterStore {
    controls: Vec<Control>,
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterStore")
            .field("controls", &self.controls)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl ParameterStore {
    pub fn new(controls: Vec<Control>) -> Self {
        Self {
            controls,
            subscriptions: Vec::new(),
            next_id: 0,
        }
    }

    /// The controls of the pencil demo, at their defaults.
    pub fn demo() -> Self {
        Self::new(vec![
            Control::color(paths::BACKGROUND_COLOR1, Rgba::WHITE),
            Control::color(paths::BACKGROUND_COLOR2, Rgba::BLACK),
            Control::number(paths::CAMERA_X, 10.0, None, 0.5),
            Control::number(paths::CAMERA_Y, 0.0, None, 0.5),
            Control::number(paths::CAMERA_Z, 0.0, None, 0.5),
            Control::number(paths::CAMERA_FOV, 30.0, None, 1.0),
            Control::number(paths::RADIUS, 1.0, None, 0.1),
            Control::number(paths::TUBULAR_SEGMENTS, 64.0, Some((1.0, f64::INFINITY)), 1.0),
            Control::number(paths::P, 2.0, None, 1.0),
            Control::number(paths::Q, 3.0, None, 1.0),
            Control::boolean(paths::DEBUG, false),
            Control::number(paths::SPEED, 0.2, None, 0.01),
        ])
    }

    /// Demo controls seeded from a JSON snapshot.
    pub fn demo_from_snapshot(json: &str) -> Result<Self, ParamError> {
        let mut store = Self::demo();
        let snapshot: Value = serde_json::from_str(json)?;
        store.load_snapshot(&snapshot)?;
        Ok(store)
    }

    /// Overwrite values from a nested snapshot such as
    /// `{"Pencil": {"radius": 2}, "Scene": {"camera": {"fov": 45}}}`.
    ///
    /// Missing entries keep their current value; entries that match no
    /// control are skipped with a warning.
    pub fn load_snapshot(&mut self, snapshot: &Value) -> Result<(), ParamError> {
        let mut updates = Vec::new();
        for control in &self.controls {
            if let Some(json) = lookup(snapshot, &control.path) {
                let value = control.decode(json)?;
                updates.push((control.path.clone(), value));
            }
        }

        let known: HashSet<&str> = self.controls.iter().map(|c| c.path.as_str()).collect();
        let mut unknown = Vec::new();
        collect_unknown(snapshot, String::new(), &known, &mut unknown);
        for path in unknown {
            warn!(%path, "snapshot entry matches no control");
        }

        for (path, value) in updates {
            self.set(&path, value)?;
        }
        Ok(())
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn control(&self, path: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.path == path)
    }

    pub fn get(&self, path: &str) -> Option<ParamValue> {
        self.control(path).map(|c| c.value)
    }

    pub fn number(&self, path: &str) -> Result<f64, ParamError> {
        match self.require(path)?.value {
            ParamValue::Number(n) => Ok(n),
            _ => Err(self.mismatch(path, "number")),
        }
    }

    pub fn boolean(&self, path: &str) -> Result<bool, ParamError> {
        match self.require(path)?.value {
            ParamValue::Bool(b) => Ok(b),
            _ => Err(self.mismatch(path, "boolean")),
        }
    }

    pub fn color(&self, path: &str) -> Result<Rgba, ParamError> {
        match self.require(path)?.value {
            ParamValue::Color(c) => Ok(c),
            _ => Err(self.mismatch(path, "colour")),
        }
    }

    /// Assign a value, clamped into the control's range, and notify
    /// subscribers if it changed. Returns the stored value.
    pub fn set(&mut self, path: &str, value: ParamValue) -> Result<ParamValue, ParamError> {
        let index = self
            .controls
            .iter()
            .position(|c| c.path == path)
            .ok_or_else(|| ParamError::Unknown(path.to_string()))?;

        let control = &mut self.controls[index];
        let value = control.coerce(value)?;
        if control.value == value {
            return Ok(value);
        }
        control.value = value;
        debug!(path, %value, "parameter changed");

        let change = ParamChange {
            path: path.to_string(),
            value,
        };
        self.notify(&change);
        Ok(value)
    }

    /// Step a number by `steps` nudge units, or brighten/darken a colour by
    /// ten percent per step.
    pub fn nudge(&mut self, path: &str, steps: f64) -> Result<ParamValue, ParamError> {
        let control = self.require(path)?;
        let next = match (control.kind, control.value) {
            (ControlKind::Number { nudge, .. }, ParamValue::Number(n)) => ParamValue::Number(n + steps * nudge),
            (ControlKind::Color, ParamValue::Color(c)) => {
                ParamValue::Color(c.scaled((1.0 + 0.1 * steps).max(0.0) as f32))
            }
            _ => return Err(self.mismatch(path, "number or colour")),
        };
        self.set(path, next)
    }

    /// Flip a boolean control.
    pub fn toggle(&mut self, path: &str) -> Result<ParamValue, ParamError> {
        let current = self.boolean(path)?;
        self.set(path, ParamValue::Bool(!current))
    }

    /// Restore a control to its default.
    pub fn reset(&mut self, path: &str) -> Result<ParamValue, ParamError> {
        let default = self.require(path)?.default;
        self.set(path, default)
    }

    /// Call `listener` for every change to a path starting with `prefix`.
    /// An empty prefix observes everything.
    pub fn subscribe<F>(&mut self, prefix: &str, listener: F) -> SubscriptionId
    where
        F: FnMut(&ParamChange) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            prefix: prefix.to_string(),
            listener: Box::new(listener),
        });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Current values of the Scene folder.
    pub fn scene_params(&self) -> Result<SceneParams, ParamError> {
        Ok(SceneParams {
            camera_position: Point3::new(
                self.number(paths::CAMERA_X)? as f32,
                self.number(paths::CAMERA_Y)? as f32,
                self.number(paths::CAMERA_Z)? as f32,
            ),
            fov: self.number(paths::CAMERA_FOV)? as f32,
            background: [
                self.color(paths::BACKGROUND_COLOR1)?,
                self.color(paths::BACKGROUND_COLOR2)?,
            ],
        })
    }

    /// Current values of the Pencil folder.
    pub fn pencil_params(&self) -> Result<PencilParams, ParamError> {
        Ok(PencilParams {
            radius: self.number(paths::RADIUS)?,
            tubular_segments: self.number(paths::TUBULAR_SEGMENTS)?,
            p: self.number(paths::P)?,
            q: self.number(paths::Q)?,
            speed: self.number(paths::SPEED)?,
            debug: self.boolean(paths::DEBUG)?,
        })
    }

    fn notify(&mut self, change: &ParamChange) {
        for subscription in &mut self.subscriptions {
            if change.path.starts_with(&subscription.prefix) {
                (subscription.listener)(change);
            }
        }
    }

    fn require(&self, path: &str) -> Result<&Control, ParamError> {
        self.control(path).ok_or_else(|| ParamError::Unknown(path.to_string()))
    }

    fn mismatch(&self, path: &str, expected: &'static str) -> ParamError {
        ParamError::KindMismatch {
            path: path.to_string(),
            expected,
        }
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::demo()
    }
}

fn lookup<'a>(snapshot: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(snapshot, |node, segment| node.get(segment))
}

fn collect_unknown(node: &Value, prefix: String, known: &HashSet<&str>, out: &mut Vec<String>) {
    if known.contains(prefix.as_str()) {
        return;
    }
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                collect_unknown(child, path, known, out);
            }
        }
        _ => out.push(prefix),
    }
}

/// Scene-level values: camera pose and backdrop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneParams {
    pub camera_position: Point3<f32>,
    pub fov: f32,
    /// Centre and edge colours of the radial gradient.
    pub background: [Rgba; 2],
}

/// Pencil values as the panel holds them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PencilParams {
    pub radius: f64,
    pub tubular_segments: f64,
    pub p: f64,
    pub q: f64,
    pub speed: f64,
    pub debug: bool,
}

impl PencilParams {
    /// Knot shape, rounding counts and winding numbers to integers.
    /// Validation is left to [`TorusKnot::validate`].
    pub fn knot(&self) -> TorusKnot {
        TorusKnot::new(
            self.radius as f32,
            self.tubular_segments.round().max(0.0) as usize,
            self.p.round() as i32,
            self.q.round() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(store: &mut ParameterStore, prefix: &str) -> Rc<RefCell<Vec<ParamChange>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(prefix, move |change| sink.borrow_mut().push(change.clone()));
        seen
    }

    #[test]
    fn defaults_match_the_demo() {
        let store = ParameterStore::demo();
        let pencil = store.pencil_params().unwrap();
        assert_eq!(pencil.knot(), TorusKnot::new(1.0, 64, 2, 3));
        assert_eq!(pencil.speed, 0.2);
        assert!(!pencil.debug);

        let scene = store.scene_params().unwrap();
        assert_eq!(scene.camera_position, Point3::new(10.0, 0.0, 0.0));
        assert_eq!(scene.fov, 30.0);
    }

    #[test]
    fn set_notifies_matching_subscribers() {
        let mut store = ParameterStore::demo();
        let pencil = recorder(&mut store, "Pencil.");
        let scene = recorder(&mut store, "Scene.");

        store.set(paths::RADIUS, ParamValue::Number(2.0)).unwrap();

        assert_eq!(pencil.borrow().len(), 1);
        assert_eq!(pencil.borrow()[0].path, paths::RADIUS);
        assert!(scene.borrow().is_empty());
    }

    #[test]
    fn unchanged_value_is_silent() {
        let mut store = ParameterStore::demo();
        let seen = recorder(&mut store, "");
        store.set(paths::P, ParamValue::Number(2.0)).unwrap();
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn range_clamps_segments() {
        let mut store = ParameterStore::demo();
        let stored = store.set(paths::TUBULAR_SEGMENTS, ParamValue::Number(-5.0)).unwrap();
        assert_eq!(stored, ParamValue::Number(1.0));
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let mut store = ParameterStore::demo();
        let err = store.set(paths::DEBUG, ParamValue::Number(1.0)).unwrap_err();
        assert!(matches!(err, ParamError::KindMismatch { expected: "boolean", .. }));
        assert!(matches!(
            store.set("Pencil.colour", ParamValue::Bool(true)),
            Err(ParamError::Unknown(_))
        ));
    }

    #[test]
    fn nudge_uses_drag_sensitivity() {
        let mut store = ParameterStore::demo();
        store.nudge(paths::SPEED, 3.0).unwrap();
        assert!((store.number(paths::SPEED).unwrap() - 0.23).abs() < 1e-9);
        store.nudge(paths::Q, -1.0).unwrap();
        assert_eq!(store.number(paths::Q).unwrap(), 2.0);
        assert!(store.nudge(paths::DEBUG, 1.0).is_err());
    }

    #[test]
    fn toggle_and_reset() {
        let mut store = ParameterStore::demo();
        store.toggle(paths::DEBUG).unwrap();
        assert!(store.boolean(paths::DEBUG).unwrap());
        store.reset(paths::DEBUG).unwrap();
        assert!(!store.boolean(paths::DEBUG).unwrap());
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut store = ParameterStore::demo();
        let seen = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&seen);
        let id = store.subscribe("", move |_| *sink.borrow_mut() += 1);
        store.toggle(paths::DEBUG).unwrap();
        assert!(store.unsubscribe(id));
        store.toggle(paths::DEBUG).unwrap();
        assert_eq!(*seen.borrow(), 1);
        assert!(!store.unsubscribe(id));
    }

    #[test]
    fn snapshot_seeds_nested_values() {
        let json = r#"{
            "Scene": {
                "background": { "color1": { "r": 10, "g": 20, "b": 30, "a": 0.5 } },
                "camera": { "position": { "x": 4, "y": 5, "z": 6 }, "fov": 45 }
            },
            "Pencil": { "p": 3, "q": 7, "debug": true, "mystery": 1 }
        }"#;
        let store = ParameterStore::demo_from_snapshot(json).unwrap();
        let scene = store.scene_params().unwrap();
        assert_eq!(scene.camera_position, Point3::new(4.0, 5.0, 6.0));
        assert_eq!(scene.fov, 45.0);
        assert_eq!(scene.background[0], Rgba::new(10, 20, 30, 0.5));
        assert_eq!(scene.background[1], Rgba::BLACK);

        let pencil = store.pencil_params().unwrap();
        assert_eq!((pencil.p, pencil.q), (3.0, 7.0));
        assert!(pencil.debug);
        assert_eq!(pencil.radius, 1.0);
    }

    #[test]
    fn snapshot_with_wrong_kind_fails() {
        let err = ParameterStore::demo_from_snapshot(r#"{"Pencil": {"debug": "yes"}}"#).unwrap_err();
        assert!(matches!(err, ParamError::KindMismatch { .. }));
        assert!(matches!(
            ParameterStore::demo_from_snapshot("not json"),
            Err(ParamError::Snapshot(_))
        ));
    }

    #[test]
    fn unknown_snapshot_paths_are_collected() {
        let store = ParameterStore::demo();
        let known: HashSet<&str> = store.controls().iter().map(|c| c.path.as_str()).collect();
        let snapshot: Value = serde_json::from_str(r#"{"Pencil": {"radius": 1, "extra": {"deep": 2}}}"#).unwrap();
        let mut unknown = Vec::new();
        collect_unknown(&snapshot, String::new(), &known, &mut unknown);
        assert_eq!(unknown, vec!["Pencil.extra.deep".to_string()]);
    }

    #[test]
    fn control_splits_folder_and_key() {
        let store = ParameterStore::demo();
        let control = store.control(paths::CAMERA_X).unwrap();
        assert_eq!(control.folder(), "Scene");
        assert_eq!(control.key(), "camera.position.x");
    }

    #[test]
    fn pencil_params_round_to_integers() {
        let params = PencilParams {
            radius: 1.5,
            tubular_segments: 63.6,
            p: 2.4,
            q: -3.0,
            speed: 0.0,
            debug: false,
        };
        assert_eq!(params.knot(), TorusKnot::new(1.5, 64, 2, -3));
    }
}
