//! CPU-side mesh data and model file loading

pub mod obj_loader;

pub use obj_loader::{ObjError, ObjLoader};

/// Vertex layout uploaded to the GPU
///
/// `#[repr(C)]` keeps the attribute offsets stable for the vertex array setup.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in model space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

unsafe impl bytemuck::Pod for Vertex {}
unsafe impl bytemuck::Zeroable for Vertex {}

impl Vertex {
    /// Create a new vertex
    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Smallest corner
    pub min: [f32; 3],
    /// Largest corner
    pub max: [f32; 3],
}

impl Bounds {
    /// Midpoint of the box
    pub fn center(&self) -> [f32; 3] {
        [0, 1, 2].map(|axis| (self.min[axis] + self.max[axis]) * 0.5)
    }

    /// Length of the longest side
    pub fn largest_extent(&self) -> f32 {
        (0..3).map(|axis| self.max[axis] - self.min[axis]).fold(0.0, f32::max)
    }
}

/// Indexed triangle list ready for upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex data
    pub vertices: Vec<Vertex>,
    /// Triangle indices into `vertices`
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Create mesh data from vertices and indices
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Number of complete triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// True when there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.triangle_count() == 0
    }

    /// Axis-aligned bounds; `None` without vertices
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.vertices.first()?.position;
        let mut bounds = Bounds { min: first, max: first };
        for vertex in &self.vertices[1..] {
            for axis in 0..3 {
                bounds.min[axis] = bounds.min[axis].min(vertex.position[axis]);
                bounds.max[axis] = bounds.max[axis].max(vertex.position[axis]);
            }
        }
        Some(bounds)
    }

    /// Raw vertex bytes for buffer upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw index bytes for buffer upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// A unit cube centred on the origin with per-face normals
    pub fn cube() -> Self {
        const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];
        const CORNERS: [(f32, f32); 4] = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, right, up) in FACES {
            let base = u32::try_from(vertices.len()).unwrap_or(u32::MAX);
            for (u, v) in CORNERS {
                let position = [
                    normal[0] * 0.5 + right[0] * u + up[0] * v,
                    normal[1] * 0.5 + right[1] * u + up[1] * v,
                    normal[2] * 0.5 + right[2] * u + up[2] * v,
                ];
                vertices.push(Vertex::new(position, normal, [u + 0.5, v + 0.5]));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(vertices, indices)
    }
}
