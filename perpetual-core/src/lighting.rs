/// Environment lighting presets used to shade the pencil
use std::fmt;
use std::str::FromStr;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::error::PerpetualError;

/// Named lighting setups, modelled on common HDRI environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightingPreset {
    #[default]
    Warehouse,
    Studio,
    Sunset,
    Night,
}

impl LightingPreset {
    pub const ALL: [LightingPreset; 4] = [
        LightingPreset::Warehouse,
        LightingPreset::Studio,
        LightingPreset::Sunset,
        LightingPreset::Night,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LightingPreset::Warehouse => "warehouse",
            LightingPreset::Studio => "studio",
            LightingPreset::Sunset => "sunset",
            LightingPreset::Night => "night",
        }
    }

    pub fn environment(&self) -> Environment {
        match self {
            LightingPreset::Warehouse => Environment::new(Vector3::new(0.3, 1.0, 0.4), 0.35, 0.8, Rgba::rgb(255, 244, 229)),
            LightingPreset::Studio => Environment::new(Vector3::new(1.0, 0.8, 0.6), 0.45, 0.7, Rgba::WHITE),
            LightingPreset::Sunset => Environment::new(Vector3::new(1.0, 0.2, 0.1), 0.25, 0.9, Rgba::rgb(255, 190, 140)),
            LightingPreset::Night => Environment::new(Vector3::new(-0.2, 1.0, -0.3), 0.15, 0.5, Rgba::rgb(150, 170, 255)),
        }
    }
}

impl fmt::Display for LightingPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LightingPreset {
    type Err = PerpetualError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PerpetualError::UnknownPreset(s.to_string()))
    }
}

/// A single key light plus ambient fill, tinted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    /// Unit vector pointing towards the key light.
    pub key_direction: Vector3<f32>,
    pub ambient: f32,
    pub key_intensity: f32,
    pub tint: Rgba,
}

impl Environment {
    pub fn new(key_direction: Vector3<f32>, ambient: f32, key_intensity: f32, tint: Rgba) -> Self {
        Self {
            key_direction: key_direction.try_normalize(1e-9).unwrap_or_else(Vector3::y),
            ambient,
            key_intensity,
            tint,
        }
    }

    /// Light reaching a surface with world-space `normal`, in `[0, 1]`.
    pub fn brightness(&self, normal: &Vector3<f32>) -> f32 {
        let diffuse = normal.dot(&self.key_direction).max(0.0);
        (self.ambient + self.key_intensity * diffuse).clamp(0.0, 1.0)
    }

    /// Shade `base` for a surface facing `normal`.
    pub fn shade(&self, base: Rgba, normal: &Vector3<f32>) -> Rgba {
        let lit = base.scaled(self.brightness(normal));
        let tint = |c: u8, t: u8| ((c as u16 * t as u16) / 255) as u8;
        Rgba {
            r: tint(lit.r, self.tint.r),
            g: tint(lit.g, self.tint.g),
            b: tint(lit.b, self.tint.b),
            a: base.a,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        LightingPreset::default().environment()
    }
}
