/// Background loading of the pencil model
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AssetError;
use crate::geometry::Mesh;
use crate::stl;

/// Uniform scale applied to the model before it is first shown.
pub const DEFAULT_MODEL_SCALE: f32 = 7.0;

/// Where the pencil model comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSource {
    /// The procedural pencil from [`Mesh::pencil`].
    Builtin,
    /// An STL file on disk.
    File(PathBuf),
}

impl ModelSource {
    pub fn describe(&self) -> String {
        match self {
            ModelSource::Builtin => "built-in pencil".to_string(),
            ModelSource::File(path) => path.display().to_string(),
        }
    }
}

/// Read, decode and scale a model.
pub fn load_model(source: &ModelSource, scale: f32) -> Result<Mesh, AssetError> {
    let mut mesh = match source {
        ModelSource::Builtin => Mesh::pencil(),
        ModelSource::File(path) => {
            let data = fs::read(path).map_err(|source| AssetError::Read {
                path: path.display().to_string(),
                source,
            })?;
            stl::parse_stl(&data)?
        }
    };
    mesh.scale(scale);
    Ok(mesh)
}

/// Load progress of the model.
#[derive(Debug)]
pub enum AssetState {
    Pending,
    Ready(Mesh),
    Failed(String),
}

impl AssetState {
    pub fn mesh(&self) -> Option<&Mesh> {
        match self {
            AssetState::Ready(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, AssetState::Pending)
    }
}

/// One-shot model load running on a worker thread, polled once per frame.
#[derive(Debug)]
pub struct AssetLoader {
    receiver: Option<Receiver<Result<Mesh, AssetError>>>,
    state: AssetState,
}

impl AssetLoader {
    pub fn spawn(source: ModelSource, scale: f32) -> Self {
        info!(source = %source.describe(), scale, "loading model");
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let result = load_model(&source, scale);
            // The scene may have been dropped already; nothing to report to.
            let _ = sender.send(result);
        });

        Self {
            receiver: Some(receiver),
            state: AssetState::Pending,
        }
    }

    /// A loader that already holds its mesh.
    pub fn ready(mesh: Mesh) -> Self {
        Self {
            receiver: None,
            state: AssetState::Ready(mesh),
        }
    }

    /// Check the worker without blocking and return the current state.
    pub fn poll(&mut self) -> &AssetState {
        if let Some(receiver) = &self.receiver {
            let outcome = match receiver.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(Err(AssetError::Disconnected)),
            };

            if let Some(result) = outcome {
                self.receiver = None;
                self.state = match result {
                    Ok(mesh) => {
                        info!(triangles = mesh.triangles.len(), "model loaded");
                        AssetState::Ready(mesh)
                    }
                    Err(err) => {
                        warn!(error = %err, "model failed to load");
                        AssetState::Failed(err.to_string())
                    }
                };
            }
        }
        &self.state
    }

    pub fn state(&self) -> &AssetState {
        &self.state
    }

    /// Block until the worker reports. Used by tests and headless hosts.
    pub fn wait(&mut self) -> &AssetState {
        if let Some(receiver) = self.receiver.take() {
            let result = receiver.recv().unwrap_or(Err(AssetError::Disconnected));
            self.state = match result {
                Ok(mesh) => AssetState::Ready(mesh),
                Err(err) => AssetState::Failed(err.to_string()),
            };
        }
        &self.state
    }
}
