//! CPU-side geometry: STL parsing, built-in primitives and the clean-up
//! steps applied before upload.
//!
//! Everything here runs without a GPU so the asset loader can build
//! geometry on its worker thread. [`RawGeometry::upload`] is the only step
//! that touches the device.

use std::io::{Read, Seek};
use std::path::Path;

use glam::Vec3;
use thiserror::Error;

use crate::gpu::GpuContext;
use crate::mesh::{Mesh, Vertex3d};

/// Errors that can occur when loading geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown geometry format: '{0}'")]
    UnknownFormat(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("geometry has no triangles")]
    Empty,
}

/// Built-in meshes that need no file.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    /// Unit cube centered at the origin.
    Cube,
    /// UV sphere of diameter 1.
    Sphere { segments: u32, rings: u32 },
    /// Torus knot, the stand-in model for the rotating object.
    TorusKnot {
        tubular_segments: u32,
        radial_segments: u32,
        p: u32,
        q: u32,
    },
}

impl Primitive {
    pub const DEFAULT_KNOT: Primitive = Primitive::TorusKnot {
        tubular_segments: 128,
        radial_segments: 16,
        p: 2,
        q: 3,
    };

    pub fn build(self) -> RawGeometry {
        match self {
            Primitive::Cube => cube(),
            Primitive::Sphere { segments, rings } => sphere(segments.max(3), rings.max(2)),
            Primitive::TorusKnot {
                tubular_segments,
                radial_segments,
                p,
                q,
            } => torus_knot(tubular_segments.max(3), radial_segments.max(3), p, q),
        }
    }
}

/// Raw geometry data before GPU upload.
#[derive(Clone, Debug, Default)]
pub struct RawGeometry {
    pub vertices: Vec<Vertex3d>,
    pub indices: Vec<u32>,
}

impl RawGeometry {
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Number of complete triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Computes the axis-aligned bounding box as (min, max).
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for v in &self.vertices {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }
        (min, max)
    }

    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        let (min, max) = self.bounds();
        max - min
    }

    pub fn translate(&mut self, offset: Vec3) {
        for v in &mut self.vertices {
            v.position = (Vec3::from(v.position) + offset).into();
        }
    }

    pub fn scale(&mut self, factor: f32) {
        for v in &mut self.vertices {
            v.position = (Vec3::from(v.position) * factor).into();
        }
    }

    /// Centers the geometry at the origin.
    pub fn recenter(&mut self) {
        let center = self.center();
        self.translate(-center);
    }

    /// Scales the geometry so its largest dimension is `extent`.
    pub fn fit(&mut self, extent: f32) {
        let size = self.size();
        let max_dim = size.x.max(size.y).max(size.z);
        if max_dim > 0.0 {
            self.scale(extent / max_dim);
        }
    }

    /// Recomputes smooth vertex normals by averaging the area-weighted face
    /// normals of every triangle sharing a vertex.
    pub fn recalculate_normals(&mut self) {
        for v in &mut self.vertices {
            v.normal = [0.0; 3];
        }

        for tri in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let p0 = Vec3::from(self.vertices[i0].position);
            let p1 = Vec3::from(self.vertices[i1].position);
            let p2 = Vec3::from(self.vertices[i2].position);
            let face_normal = (p1 - p0).cross(p2 - p0);

            for i in [i0, i1, i2] {
                let n = Vec3::from(self.vertices[i].normal) + face_normal;
                self.vertices[i].normal = n.into();
            }
        }

        for v in &mut self.vertices {
            v.normal = Vec3::from(v.normal).normalize_or_zero().into();
        }
    }

    /// Uploads this geometry to the GPU as a [`Mesh`].
    pub fn upload(&self, gpu: &GpuContext) -> Mesh {
        Mesh::new(gpu, &self.vertices, &self.indices)
    }

    /// Loads a model file, picking the parser from the extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GeometryError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "stl" => {
                let file = std::fs::File::open(path)?;
                Self::from_stl(&mut std::io::BufReader::new(file))
            }
            _ => Err(GeometryError::UnknownFormat(ext)),
        }
    }

    /// Parses binary or ASCII STL from bytes.
    pub fn from_stl_bytes(bytes: &[u8]) -> Result<Self, GeometryError> {
        Self::from_stl(&mut std::io::Cursor::new(bytes))
    }

    fn from_stl<R: Read + Seek>(reader: &mut R) -> Result<Self, GeometryError> {
        let stl = stl_io::read_stl(reader)
            .map_err(|e| GeometryError::Parse(format!("STL: {e}")))?;

        if stl.faces.is_empty() {
            return Err(GeometryError::Empty);
        }

        let mut vertices = Vec::with_capacity(stl.faces.len() * 3);
        let mut indices = Vec::with_capacity(stl.faces.len() * 3);

        for face in &stl.faces {
            let normal: [f32; 3] = face.normal.into();
            for &vertex_idx in &face.vertices {
                let vertex = stl.vertices.get(vertex_idx).ok_or_else(|| {
                    GeometryError::Parse(format!("STL: vertex index {vertex_idx} out of range"))
                })?;
                indices.push(vertices.len() as u32);
                vertices.push(Vertex3d::new((*vertex).into(), normal, [0.0, 0.0]));
            }
        }

        Ok(Self::new(vertices, indices))
    }
}

fn cube() -> RawGeometry {
    // Each face has its own vertices for correct normals
    #[rustfmt::skip]
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        // (normal, u axis, v axis)
        ([ 0.0,  0.0,  1.0], [ 1.0, 0.0,  0.0], [0.0, 1.0,  0.0]),
        ([ 0.0,  0.0, -1.0], [-1.0, 0.0,  0.0], [0.0, 1.0,  0.0]),
        ([ 0.0,  1.0,  0.0], [ 1.0, 0.0,  0.0], [0.0, 0.0, -1.0]),
        ([ 0.0, -1.0,  0.0], [ 1.0, 0.0,  0.0], [0.0, 0.0,  1.0]),
        ([ 1.0,  0.0,  0.0], [ 0.0, 0.0, -1.0], [0.0, 1.0,  0.0]),
        ([-1.0,  0.0,  0.0], [ 0.0, 0.0,  1.0], [0.0, 1.0,  0.0]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, u, v) in faces {
        let (n, u, v) = (Vec3::from(normal), Vec3::from(u), Vec3::from(v));
        let base = vertices.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let p = (n + u * su + v * sv) * 0.5;
            let uv = [(su + 1.0) * 0.5, (sv + 1.0) * 0.5];
            vertices.push(Vertex3d::new(p.into(), normal, uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    RawGeometry::new(vertices, indices)
}

fn sphere(segments: u32, rings: u32) -> RawGeometry {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for ring in 0..=rings {
        let phi = std::f32::consts::PI * ring as f32 / rings as f32;
        let y = phi.cos();
        let ring_radius = phi.sin();

        for seg in 0..=segments {
            let theta = std::f32::consts::TAU * seg as f32 / segments as f32;
            let x = ring_radius * theta.cos();
            let z = ring_radius * theta.sin();

            vertices.push(Vertex3d::new(
                [x * 0.5, y * 0.5, z * 0.5],
                [x, y, z],
                [seg as f32 / segments as f32, ring as f32 / rings as f32],
            ));
        }
    }

    for ring in 0..rings {
        for seg in 0..segments {
            let current = ring * (segments + 1) + seg;
            let next = current + segments + 1;
            indices.extend_from_slice(&[current, current + 1, next]);
            indices.extend_from_slice(&[current + 1, next + 1, next]);
        }
    }

    RawGeometry::new(vertices, indices)
}

fn torus_knot(tubular: u32, radial: u32, p: u32, q: u32) -> RawGeometry {
    const RADIUS: f32 = 1.0;
    const TUBE: f32 = 0.3;

    let curve = |u: f32| {
        let (p, q) = (p as f32, q as f32);
        let qu_over_p = q / p * u;
        let cs = qu_over_p.cos();
        Vec3::new(
            RADIUS * (2.0 + cs) * 0.5 * u.cos(),
            RADIUS * (2.0 + cs) * u.sin() * 0.5,
            RADIUS * qu_over_p.sin() * 0.5,
        )
    };

    let mut vertices = Vec::with_capacity(((tubular + 1) * (radial + 1)) as usize);
    let mut indices = Vec::with_capacity((tubular * radial * 6) as usize);

    for i in 0..=tubular {
        let u = i as f32 / tubular as f32 * p as f32 * std::f32::consts::TAU;
        let p1 = curve(u);
        let p2 = curve(u + 0.01);

        // Frenet-like frame along the curve
        let t = p2 - p1;
        let n = p2 + p1;
        let b = t.cross(n).normalize_or_zero();
        let n = b.cross(t).normalize_or_zero();

        for j in 0..=radial {
            let v = j as f32 / radial as f32 * std::f32::consts::TAU;
            let cx = -TUBE * v.cos();
            let cy = TUBE * v.sin();
            let position = p1 + n * cx + b * cy;
            let normal = (position - p1).normalize_or_zero();
            vertices.push(Vertex3d::new(
                position.into(),
                normal.into(),
                [i as f32 / tubular as f32, j as f32 / radial as f32],
            ));
        }
    }

    for j in 1..=tubular {
        for i in 1..=radial {
            let a = (radial + 1) * (j - 1) + (i - 1);
            let b = (radial + 1) * j + (i - 1);
            let c = (radial + 1) * j + i;
            let d = (radial + 1) * (j - 1) + i;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    RawGeometry::new(vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII_TRIANGLE: &str = "solid tri
facet normal 0 0 1
  outer loop
    vertex 0 0 0
    vertex 1 0 0
    vertex 0 1 0
  endloop
endfacet
endsolid tri
";

    #[test]
    fn raw_geometry_bounds() {
        let vertices = vec![
            Vertex3d::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([-1.0, -1.0, -1.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        ];
        let geom = RawGeometry::new(vertices, vec![0, 1, 2]);

        let (min, max) = geom.bounds();
        assert_eq!(min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn recenter_and_fit() {
        let vertices = vec![
            Vertex3d::new([2.0, 2.0, 2.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex3d::new([6.0, 4.0, 4.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        ];
        let mut geom = RawGeometry::new(vertices, vec![0, 1, 0]);

        geom.recenter();
        assert!(geom.center().length() < 1e-5);

        geom.fit(2.0);
        assert!((geom.size().x - 2.0).abs() < 1e-5);
        assert!((geom.size().y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn ascii_stl_parses() {
        let geom = RawGeometry::from_stl_bytes(ASCII_TRIANGLE.as_bytes()).unwrap();
        assert_eq!(geom.triangle_count(), 1);
        assert_eq!(geom.vertices.len(), 3);
        assert_eq!(geom.vertices[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn garbage_stl_is_an_error() {
        assert!(RawGeometry::from_stl_bytes(b"not an stl").is_err());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = RawGeometry::from_file("model.obj").unwrap_err();
        assert!(matches!(err, GeometryError::UnknownFormat(ext) if ext == "obj"));
    }

    #[test]
    fn primitives_have_valid_indices() {
        for primitive in [
            Primitive::Cube,
            Primitive::Sphere {
                segments: 8,
                rings: 4,
            },
            Primitive::DEFAULT_KNOT,
        ] {
            let geom = primitive.build();
            assert!(geom.triangle_count() > 0, "{primitive:?}");
            assert_eq!(geom.indices.len() % 3, 0);
            let n = geom.vertices.len() as u32;
            assert!(geom.indices.iter().all(|&i| i < n), "{primitive:?}");
        }
    }

    #[test]
    fn cube_face_winding_matches_normals() {
        let geom = Primitive::Cube.build();
        for tri in geom.indices.chunks_exact(3) {
            let p: Vec<Vec3> = tri
                .iter()
                .map(|&i| Vec3::from(geom.vertices[i as usize].position))
                .collect();
            let face = (p[1] - p[0]).cross(p[2] - p[0]);
            let normal = Vec3::from(geom.vertices[tri[0] as usize].normal);
            assert!(face.dot(normal) > 0.0);
        }
    }
}
