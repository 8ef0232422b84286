/// Scene model: meshes of triangular faces, objects placing a shared
/// mesh in the world, and the scene aggregate the renderer consumes.
pub mod manifest;
pub mod obj;

use crate::rendering::texture::Texture;
use glam::{Vec2, Vec3, Vec4};
use std::sync::Arc;

/// A triangular face: three vertex indices, three texture coordinates,
/// optional per-vertex normal indices, and the texture it is drawn
/// with (`None` falls back to the flat face color).
#[derive(Clone, Debug)]
pub struct Face {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub uvs: [Vec2; 3],
    pub normals: Option<[usize; 3]>,
    pub texture: Option<Arc<Texture>>,
}

impl Face {
    pub fn new(a: usize, b: usize, c: usize) -> Self {
        Self {
            a,
            b,
            c,
            uvs: [Vec2::ZERO; 3],
            normals: None,
            texture: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vec3>,
    /// Per-vertex normals; empty when the source had none.
    pub normals: Vec<Vec3>,
    pub faces: Vec<Face>,
    /// Unit geometric normal per face, matching the face winding.
    pub face_normals: Vec<Vec3>,
    /// The eight corners of the axis-aligned bounding box, as points.
    pub bounding_box: [Vec4; 8],
}

impl Mesh {
    pub fn new(name: String, vertices: Vec<Vec3>, normals: Vec<Vec3>, faces: Vec<Face>) -> Self {
        let face_normals = faces
            .iter()
            .map(|f| {
                let a = vertices[f.a];
                (vertices[f.b] - a).cross(vertices[f.c] - a).normalize_or_zero()
            })
            .collect();

        let bounding_box = bounding_box(&vertices);

        Self {
            name,
            vertices,
            normals,
            faces,
            face_normals,
            bounding_box,
        }
    }

    /// Unit cube centered on the origin, untextured.
    pub fn cube() -> Self {
        let vertices = vec![
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(-1.0, -1.0, 1.0),
        ];

        let faces = [
            (4, 2, 0),
            (2, 7, 3),
            (6, 5, 7),
            (1, 7, 5),
            (0, 3, 1),
            (4, 1, 5),
            (4, 6, 2),
            (2, 6, 7),
            (6, 4, 5),
            (1, 3, 7),
            (0, 2, 3),
            (4, 0, 1),
        ]
        .iter()
        .map(|&(a, b, c)| Face::new(a, b, c))
        .collect();

        Mesh::new("cube".to_string(), vertices, Vec::new(), faces)
    }
}

fn bounding_box(vertices: &[Vec3]) -> [Vec4; 8] {
    let mut min = Vec3::ZERO;
    let mut max = Vec3::ZERO;
    if let Some((&first, rest)) = vertices.split_first() {
        min = first;
        max = first;
        for &v in rest {
            min = min.min(v);
            max = max.max(v);
        }
    }

    [
        Vec4::new(min.x, min.y, min.z, 1.0),
        Vec4::new(max.x, min.y, min.z, 1.0),
        Vec4::new(min.x, max.y, min.z, 1.0),
        Vec4::new(max.x, max.y, min.z, 1.0),
        Vec4::new(min.x, min.y, max.z, 1.0),
        Vec4::new(max.x, min.y, max.z, 1.0),
        Vec4::new(min.x, max.y, max.z, 1.0),
        Vec4::new(max.x, max.y, max.z, 1.0),
    ]
}

/// A placed instance of a mesh. Many objects may share one mesh; the
/// scratch arrays belong to the object so one worker can project it
/// without touching shared state.
#[derive(Clone, Debug)]
pub struct Object {
    pub mesh: Arc<Mesh>,
    pub scale: Vec3,
    /// Euler angles in radians, applied X, then Y, then Z.
    pub rotation: Vec3,
    pub translation: Vec3,

    pub(crate) clip_positions: Vec<Vec4>,
    pub(crate) world_normals: Vec<Vec3>,
}

impl Object {
    pub fn new(mesh: Arc<Mesh>) -> Self {
        let clip_positions = vec![Vec4::ZERO; mesh.vertices.len()];
        let world_normals = vec![Vec3::ZERO; mesh.normals.len()];
        Self {
            mesh,
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
            translation: Vec3::ZERO,
            clip_positions,
            world_normals,
        }
    }
}

#[derive(Default, Debug)]
pub struct Scene {
    pub objects: Vec<Object>,
}

impl Scene {
    pub fn new(objects: Vec<Object>) -> Self {
        Self { objects }
    }

    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    pub fn num_vertices(&self) -> usize {
        self.objects.iter().map(|o| o.mesh.vertices.len()).sum()
    }

    pub fn num_triangles(&self) -> usize {
        self.objects.iter().map(|o| o.mesh.faces.len()).sum()
    }
}
