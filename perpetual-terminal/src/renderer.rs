/// ASCII rasterizer for terminal rendering
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::Matrix4;
use perpetual_core::{
    Background, Camera, DrawList, Environment, LineLoop, Mesh, Rgba, ScreenPoint, Triangle,
};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Glyph used for overlay line loops.
const LINE_GLYPH: char = 'o';

/// Terminal cells are roughly twice as tall as they are wide.
pub const CELL_ASPECT: f32 = 2.0;

/// Overlays sit slightly in front of surfaces at the same depth.
const LINE_DEPTH_BIAS: f32 = 1e-4;

/// One character cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: Rgba,
    pub bg: Rgba,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Rgba::WHITE,
            bg: Rgba::BLACK,
        }
    }
}

/// ASCII renderer that converts a draw list to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![Cell::default(); size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        (x < self.width && y < self.height).then(|| &self.cells[y * self.width + x])
    }

    /// Reset depth and paint the background gradient.
    pub fn clear(&mut self, background: &Background) {
        let (w, h) = (self.width.max(1) as f32, self.height.max(1) as f32);
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                self.depth_buffer[idx] = f32::INFINITY;
                self.cells[idx] = Cell {
                    ch: ' ',
                    fg: Rgba::WHITE,
                    bg: background.color_at((x as f32 + 0.5) / w, (y as f32 + 0.5) / h),
                };
            }
        }
    }

    /// Clear, then draw every mesh and overlay in `list`.
    pub fn render(&mut self, list: &DrawList) {
        self.clear(&list.background);
        let view_projection = list.camera.view_projection();
        for mesh in &list.meshes {
            self.render_mesh(mesh, &view_projection, &list.environment);
        }
        for line_loop in &list.line_loops {
            self.render_line_loop(line_loop, &view_projection);
        }
    }

    pub fn render_mesh(&mut self, mesh: &Mesh, view_projection: &Matrix4<f32>, environment: &Environment) {
        for triangle in &mesh.triangles {
            let base = triangle.color.unwrap_or(mesh.material.color);
            self.render_triangle(triangle, base, view_projection, environment);
        }
    }

    fn render_triangle(
        &mut self,
        triangle: &Triangle,
        base: Rgba,
        view_projection: &Matrix4<f32>,
        environment: &Environment,
    ) {
        let Some(normal) = triangle.calculate_normal() else {
            return; // Degenerate
        };

        // Project vertices to screen space
        let mut screen_coords = [ScreenPoint { x: 0.0, y: 0.0, depth: 0.0 }; 3];
        for (slot, vertex) in screen_coords.iter_mut().zip(&triangle.vertices) {
            match Camera::project(view_projection, &vertex.position, self.width, self.height) {
                Some(point) => *slot = point,
                None => return, // Triangle is clipped
            }
        }

        let brightness = environment.brightness(&normal);

        // Map brightness to character
        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        let char_index = char_index.min(LUMINOSITY_RAMP.len() - 1);
        let character = LUMINOSITY_RAMP[char_index];

        self.rasterize_triangle(&screen_coords, character, environment.shade(base, &normal));
    }

    fn rasterize_triangle(&mut self, coords: &[ScreenPoint; 3], character: char, color: Rgba) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.x.min(v1.x).min(v2.x).floor() as i32;
        let max_x = v0.x.max(v1.x).max(v2.x).ceil() as i32;
        let min_y = v0.y.min(v1.y).min(v2.y).floor() as i32;
        let max_y = v0.y.max(v1.y).max(v2.y).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                // Barycentric coordinates
                if let Some((w0, w1, w2)) = barycentric((v0.x, v0.y), (v1.x, v1.y), (v2.x, v2.y), (px, py)) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        // Interpolate depth
                        let depth = w0 * v0.depth + w1 * v1.depth + w2 * v2.depth;
                        self.plot(x as usize, y as usize, depth, character, color);
                    }
                }
            }
        }
    }

    /// Draw a closed polyline through the projected points.
    pub fn render_line_loop(&mut self, line_loop: &LineLoop, view_projection: &Matrix4<f32>) {
        let count = line_loop.points.len();
        for i in 0..count {
            let a = Camera::project(view_projection, &line_loop.points[i], self.width, self.height);
            let b = Camera::project(view_projection, &line_loop.points[(i + 1) % count], self.width, self.height);
            if let (Some(a), Some(b)) = (a, b) {
                self.rasterize_line(a, b, line_loop.color);
            }
        }
    }

    fn rasterize_line(&mut self, a: ScreenPoint, b: ScreenPoint, color: Rgba) {
        let steps = (b.x - a.x).abs().max((b.y - a.y).abs()).ceil().max(1.0);
        // Skip segments that project absurdly far off screen.
        if steps > 8.0 * (self.width + self.height) as f32 {
            return;
        }

        let steps = steps as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = a.x + (b.x - a.x) * t;
            let y = a.y + (b.y - a.y) * t;
            if x < 0.0 || y < 0.0 {
                continue;
            }
            let depth = a.depth + (b.depth - a.depth) * t - LINE_DEPTH_BIAS;
            self.plot(x as usize, y as usize, depth, LINE_GLYPH, color);
        }
    }

    fn plot(&mut self, x: usize, y: usize, depth: f32, character: char, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y * self.width + x;
        if depth < self.depth_buffer[idx] {
            self.depth_buffer[idx] = depth;
            let cell = &mut self.cells[idx];
            cell.ch = character;
            cell.fg = color.over(&cell.bg);
        }
    }

    /// Write `text` at row `y` starting at column `x`, clipped to the raster.
    pub fn print_text(&mut self, x: usize, y: usize, text: &str, fg: Rgba, bg: Option<Rgba>) {
        if y >= self.height {
            return;
        }
        for (offset, ch) in text.chars().enumerate() {
            let column = x + offset;
            if column >= self.width {
                break;
            }
            let cell = &mut self.cells[y * self.width + column];
            cell.ch = ch;
            cell.fg = fg;
            if let Some(bg) = bg {
                cell.bg = bg;
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current: Option<(Rgba, Rgba)> = None;
        for y in 0..self.height {
            writer.queue(cursor::MoveTo(0, y as u16))?;
            for x in 0..self.width {
                let cell = self.cells[y * self.width + x];
                if current != Some((cell.fg, cell.bg)) {
                    writer.queue(SetForegroundColor(to_color(cell.fg)))?;
                    writer.queue(SetBackgroundColor(to_color(cell.bg)))?;
                    current = Some((cell.fg, cell.bg));
                }
                writer.queue(Print(cell.ch))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

fn to_color(c: Rgba) -> Color {
    Color::Rgb { r: c.r, g: c.g, b: c.b }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
