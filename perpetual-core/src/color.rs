/// RGBA colour values used by the background gradient, materials and overlays
use serde::{Deserialize, Serialize};

/// An 8-bit RGB colour with a floating-point alpha in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: f32,
}

fn opaque() -> f32 {
    1.0
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const RED: Rgba = Rgba::rgb(255, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self {
            r,
            g,
            b,
            a: a.clamp(0.0, 1.0),
        }
    }

    /// CSS notation, e.g. `rgba(255, 128, 0, 1)`.
    pub fn to_css_string(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }

    /// Linear blend towards `other`; `t` is clamped to `[0, 1]`.
    pub fn lerp(&self, other: &Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Multiply the RGB channels by `factor`, saturating at 255.
    pub fn scaled(&self, factor: f32) -> Rgba {
        let scale = |c: u8| (c as f32 * factor.max(0.0)).round().min(255.0) as u8;
        Rgba {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
            a: self.a,
        }
    }

    /// Composite over an opaque backdrop using this colour's alpha.
    pub fn over(&self, backdrop: &Rgba) -> Rgba {
        let mut out = backdrop.lerp(&Rgba { a: 1.0, ..*self }, self.a);
        out.a = 1.0;
        out
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_string() {
        assert_eq!(Rgba::new(12, 34, 56, 0.5).to_css_string(), "rgba(12, 34, 56, 0.5)");
    }

    #[test]
    fn lerp_endpoints_and_midpoint() {
        let black = Rgba::BLACK;
        let white = Rgba::WHITE;
        assert_eq!(black.lerp(&white, 0.0), black);
        assert_eq!(black.lerp(&white, 1.0), white);
        assert_eq!(black.lerp(&white, 0.5).r, 128);
        assert_eq!(black.lerp(&white, 7.0), white);
    }

    #[test]
    fn scaled_saturates() {
        let c = Rgba::rgb(200, 100, 0).scaled(2.0);
        assert_eq!((c.r, c.g, c.b), (255, 200, 0));
    }

    #[test]
    fn alpha_defaults_to_opaque_when_missing() {
        let c: Rgba = serde_json::from_str(r#"{"r":1,"g":2,"b":3}"#).unwrap();
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn transparent_colour_leaves_backdrop() {
        let c = Rgba::new(255, 0, 0, 0.0);
        assert_eq!(c.over(&Rgba::BLACK), Rgba::BLACK);
    }
}
