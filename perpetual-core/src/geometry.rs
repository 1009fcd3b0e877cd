/// Geometry primitives for the pencil model
use std::f32::consts::TAU;

use nalgebra::{Point3, Vector3};

use crate::color::Rgba;

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }
}

/// A triangle face defined by three vertices, optionally overriding the
/// mesh material colour
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
    pub color: Option<Rgba>,
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
            color: None,
        }
    }

    /// Build a flat-shaded facet from counter-clockwise positions.
    pub fn facet(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>, color: Rgba) -> Self {
        let n = (b - a).cross(&(c - a)).try_normalize(1e-12).unwrap_or_else(Vector3::z);
        let vertex = |p: Point3<f32>| Vertex::new(p.x, p.y, p.z, n.x, n.y, n.z);
        Self {
            vertices: [vertex(a), vertex(b), vertex(c)],
            color: Some(color),
        }
    }

    /// Face normal from the vertex winding; `None` for degenerate faces.
    pub fn calculate_normal(&self) -> Option<Vector3<f32>> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).try_normalize(1e-12)
    }
}

/// Surface appearance of a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Rgba,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Rgba::rgb(230, 190, 60),
        }
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
    pub material: Material,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
            material: Material::default(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
            material: Material::default(),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Uniformly scale every vertex about the origin.
    pub fn scale(&mut self, factor: f32) {
        for triangle in &mut self.triangles {
            for vertex in &mut triangle.vertices {
                vertex.position.coords *= factor;
            }
        }
    }

    /// Copy of the mesh with every vertex position passed through `f`.
    /// Normals are recomputed from the new winding.
    pub fn map_positions<F>(&self, mut f: F) -> Mesh
    where
        F: FnMut(&Point3<f32>) -> Point3<f32>,
    {
        let triangles = self
            .triangles
            .iter()
            .map(|triangle| {
                let mut mapped = triangle.clone();
                for vertex in &mut mapped.vertices {
                    vertex.position = f(&vertex.position);
                }
                if let Some(normal) = mapped.calculate_normal() {
                    for vertex in &mut mapped.vertices {
                        vertex.normal = normal;
                    }
                }
                mapped
            })
            .collect();

        Mesh {
            triangles,
            material: self.material,
        }
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        let mut positions = self
            .triangles
            .iter()
            .flat_map(|t| t.vertices.iter().map(|v| v.position));
        let first = positions.next()?;
        Some(positions.fold((first, first), |(min, max), p| {
            (min.inf(&p), max.sup(&p))
        }))
    }

    /// Procedural hexagonal pencil lying along +x, eraser at -x.
    ///
    /// Sized so that the usual 7x asset scale gives a pencil about two units
    /// long.
    pub fn pencil() -> Self {
        const SIDES: usize = 6;
        const RADIUS: f32 = 0.02;

        let eraser = Rgba::rgb(230, 120, 140);
        let ferrule = Rgba::rgb(190, 190, 200);
        let body = Rgba::rgb(240, 190, 40);
        let wood = Rgba::rgb(220, 180, 130);
        let graphite = Rgba::rgb(60, 60, 70);

        // (x, radius, colour of the band ending at this station)
        let stations = [
            (-0.150, RADIUS, eraser),
            (-0.125, RADIUS, eraser),
            (-0.110, RADIUS, ferrule),
            (0.090, RADIUS, body),
            (0.135, RADIUS / 3.0, wood),
            (0.150, 0.0, graphite),
        ];

        let ring = |x: f32, r: f32, k: usize| {
            let theta = k as f32 * TAU / SIDES as f32;
            Point3::new(x, r * theta.cos(), r * theta.sin())
        };

        let mut mesh = Self::with_capacity(SIDES * (2 * stations.len() + 1));

        // Eraser end cap, facing -x.
        let (x0, r0, _) = stations[0];
        let center = Point3::new(x0, 0.0, 0.0);
        for k in 0..SIDES {
            mesh.add_triangle(Triangle::facet(center, ring(x0, r0, k + 1), ring(x0, r0, k), eraser));
        }

        for pair in stations.windows(2) {
            let (x0, r0, _) = pair[0];
            let (x1, r1, color) = pair[1];
            for k in 0..SIDES {
                let a = ring(x0, r0, k);
                let b = ring(x1, r1, k);
                let c = ring(x1, r1, k + 1);
                let d = ring(x0, r0, k + 1);
                mesh.add_triangle(Triangle::facet(a, d, c, color));
                if r1 > 0.0 {
                    mesh.add_triangle(Triangle::facet(a, c, b, color));
                }
            }
        }

        mesh.material.color = body;
        mesh
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
