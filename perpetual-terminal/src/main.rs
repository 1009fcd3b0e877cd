/// Perpetual Pencil - a pencil looping forever along a torus knot
///
/// Controls:
///   - WASD / Arrow Keys: Orbit the camera
///   - +/-: Zoom
///   - L: Cycle lighting presets
///   - Tab / Shift+Tab: Select a panel control
///   - [ / ]: Nudge the selected value, Space: toggle, R: reset, H: hide panel
///   - Q/ESC: Quit
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use perpetual_core::{AppConfig, LightingPreset, ParameterStore, PerpetualError};
use perpetual_terminal::TerminalApp;
use tracing_subscriber::EnvFilter;

fn main() -> perpetual_core::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_ref())?;

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    cli.apply(&mut config);
    tracing::info!(?config, "starting perpetual pencil");

    let store = match &config.snapshot {
        Some(path) => {
            tracing::info!(?path, "seeding panel from snapshot");
            ParameterStore::demo_from_snapshot(&fs::read_to_string(path)?)?
        }
        None => ParameterStore::demo(),
    };

    let mut app = TerminalApp::new(&config, store)?;
    app.run()
}

/// The terminal is busy with the scene, so logs only go to a file.
fn init_tracing(log_file: Option<&PathBuf>) -> perpetual_core::Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|err| PerpetualError::Logging(err.to_string()))
}

#[derive(Parser, Debug)]
#[command(author, version, about = "A pencil drawing a torus knot forever", long_about = None)]
struct Cli {
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// STL model to use instead of the built-in pencil.
    #[arg(short, long)]
    model: Option<PathBuf>,
    /// JSON panel snapshot to seed parameter values from.
    #[arg(short, long)]
    snapshot: Option<PathBuf>,
    /// Lighting preset: warehouse, studio, sunset or night.
    #[arg(short, long)]
    lighting: Option<LightingPreset>,
    /// Target frames per second.
    #[arg(long)]
    fps: Option<u32>,
    /// Write logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(model) = &self.model {
            config.model.path = Some(model.clone());
        }
        if let Some(snapshot) = &self.snapshot {
            config.snapshot = Some(snapshot.clone());
        }
        if let Some(lighting) = self.lighting {
            config.lighting = lighting;
        }
        if let Some(fps) = self.fps {
            config.target_fps = fps;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "perpetual-pencil",
            "--model",
            "pencil.stl",
            "--lighting",
            "sunset",
            "--fps",
            "60",
        ]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.model.path, Some(PathBuf::from("pencil.stl")));
        assert_eq!(config.lighting, LightingPreset::Sunset);
        assert_eq!(config.target_fps, 60);
        assert_eq!(config.snapshot, None);
    }

    #[test]
    fn no_log_file_installs_nothing() {
        assert!(init_tracing(None).is_ok());
    }

    #[test]
    fn second_subscriber_is_reported() {
        let dir = std::env::temp_dir();
        let first = dir.join("perpetual-pencil-first.log");
        let second = dir.join("perpetual-pencil-second.log");
        let _ = init_tracing(Some(&first));
        let err = init_tracing(Some(&second)).unwrap_err();
        assert!(matches!(err, PerpetualError::Logging(_)));
        let _ = std::fs::remove_file(first);
        let _ = std::fs::remove_file(second);
    }

    #[test]
    fn unknown_lighting_is_rejected() {
        assert!(Cli::try_parse_from(["perpetual-pencil", "--lighting", "disco"]).is_err());
    }
}
