/// Perpetual Pencil for the browser
///
/// Exposes the curve and animator to JavaScript. Drawing is left to the page;
/// it reads positions and frames back as flat `f32` arrays.
use perpetual_core::{Animator, CurveError, TorusKnot, Transform};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WebPencil {
    knot: TorusKnot,
    animator: Animator,
    transform: Transform,
}

#[wasm_bindgen]
impl WebPencil {
    #[wasm_bindgen(constructor)]
    pub fn new(radius: f32, tubular_segments: usize, p: i32, q: i32) -> Result<WebPencil, JsValue> {
        Self::build(TorusKnot::new(radius, tubular_segments, p, q)).map_err(to_js)
    }

    /// Rebuild the curve; the pencil restarts from the beginning.
    pub fn reshape(&mut self, radius: f32, tubular_segments: usize, p: i32, q: i32) -> Result<(), JsValue> {
        *self = Self::build(TorusKnot::new(radius, tubular_segments, p, q)).map_err(to_js)?;
        Ok(())
    }

    /// Move the pencil by `delta * speed` loops.
    pub fn advance(&mut self, delta: f32, speed: f32) {
        self.animator.advance(delta, speed, &mut self.transform);
    }

    pub fn cursor(&self) -> f32 {
        self.animator.cursor().unwrap_or(0.0)
    }

    /// Current position as `[x, y, z]`.
    pub fn position(&self) -> Vec<f32> {
        let p = self.transform.position;
        vec![p.x, p.y, p.z]
    }

    /// Tangent, normal and binormal, nine floats in that order.
    pub fn frame(&self) -> Vec<f32> {
        match self.animator.pose() {
            Some(pose) => [pose.frame.tangent, pose.frame.normal, pose.frame.binormal]
                .iter()
                .flat_map(|v| [v.x, v.y, v.z])
                .collect(),
            None => Vec::new(),
        }
    }

    /// Column-major model matrix, ready for a WebGL uniform.
    pub fn model_matrix(&self) -> Vec<f32> {
        self.transform.matrix().as_slice().to_vec()
    }

    /// The knot samples flattened to `[x0, y0, z0, x1, ...]`.
    pub fn sample_points(&self) -> Vec<f32> {
        self.animator
            .curve()
            .map(|curve| {
                curve
                    .control_points()
                    .iter()
                    .flat_map(|p| [p.x, p.y, p.z])
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn length(&self) -> f32 {
        self.animator.curve().map_or(0.0, |c| c.length())
    }

    pub fn tubular_segments(&self) -> usize {
        self.knot.tubular_segments
    }
}

impl WebPencil {
    fn build(knot: TorusKnot) -> Result<Self, CurveError> {
        let mut animator = Animator::new();
        animator.bind(knot.curve()?);
        let mut transform = Transform::identity();
        animator.advance(0.0, 0.0, &mut transform);
        Ok(Self {
            knot,
            animator,
            transform,
        })
    }
}

fn to_js(err: CurveError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pencil() -> WebPencil {
        WebPencil::build(TorusKnot::default()).unwrap()
    }

    #[test]
    fn starts_at_first_sample() {
        let pencil = pencil();
        let samples = pencil.sample_points();
        assert_eq!(samples.len(), 64 * 3);
        let position = pencil.position();
        for i in 0..3 {
            assert_relative_eq!(position[i], samples[i], epsilon = 1e-4);
        }
    }

    #[test]
    fn advance_moves_the_cursor() {
        let mut pencil = pencil();
        pencil.advance(0.5, 0.2);
        assert_relative_eq!(pencil.cursor(), 0.1, epsilon = 1e-6);
        assert_ne!(pencil.position(), pencil.sample_points()[..3].to_vec());
    }

    #[test]
    fn frame_is_orthonormal() {
        let frame = pencil().frame();
        assert_eq!(frame.len(), 9);
        let t = &frame[0..3];
        let n = &frame[3..6];
        let dot: f32 = t.iter().zip(n).map(|(a, b)| a * b).sum();
        assert_relative_eq!(dot, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn invalid_shape_is_rejected() {
        assert!(WebPencil::build(TorusKnot::new(1.0, 64, 0, 3)).is_err());
        assert!(WebPencil::build(TorusKnot::new(1.0, 2, 2, 3)).is_err());
        assert!(WebPencil::build(TorusKnot::new(1.0, usize::MAX, 2, 3)).is_err());
    }

    #[test]
    fn model_matrix_carries_translation() {
        let pencil = pencil();
        let m = pencil.model_matrix();
        let p = pencil.position();
        assert_relative_eq!(m[12], p[0], epsilon = 1e-6);
        assert_relative_eq!(m[13], p[1], epsilon = 1e-6);
        assert_relative_eq!(m[14], p[2], epsilon = 1e-6);
    }
}
