//! OBJ file loader for 3D models

use super::{MeshData, Vertex};
use std::io::BufRead;
use std::path::Path;
use thiserror::Error;

/// Errors produced while reading an OBJ file
#[derive(Error, Debug)]
pub enum ObjError {
    /// The file could not be opened or parsed
    #[error("OBJ parse error: {0}")]
    Load(#[from] tobj::LoadError),
    /// The file parsed but contains no triangles
    #[error("No triangles found in OBJ data")]
    NoGeometry,
    /// The parsed data is inconsistent
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Loads Wavefront OBJ data into [`MeshData`]
///
/// Faces are triangulated and every shape in the file is merged into a single
/// indexed mesh. Material libraries are not read.
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file and return its merged mesh
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<MeshData, ObjError> {
        let path = path.as_ref();
        let (models, materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)?;
        if let Err(e) = materials {
            log::debug!("Ignoring materials for {}: {e}", path.display());
        }
        Self::merge(models)
    }

    /// Parse OBJ data from a reader
    pub fn parse_obj<R: BufRead>(reader: &mut R) -> Result<MeshData, ObjError> {
        let (models, _) = tobj::load_obj_buf(reader, &tobj::GPU_LOAD_OPTIONS, |_| {
            Err(tobj::LoadError::OpenFileFailed)
        })?;
        Self::merge(models)
    }

    fn merge(models: Vec<tobj::Model>) -> Result<MeshData, ObjError> {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for model in models {
            let mesh = model.mesh;
            let vertex_count = mesh.positions.len() / 3;
            let base = u32::try_from(vertices.len())
                .map_err(|_| ObjError::InvalidFormat("Too many vertices".to_string()))?;

            let has_normals = mesh.normals.len() == mesh.positions.len();
            let has_tex_coords = mesh.texcoords.len() / 2 == vertex_count;

            for i in 0..vertex_count {
                let position = [
                    mesh.positions[i * 3],
                    mesh.positions[i * 3 + 1],
                    mesh.positions[i * 3 + 2],
                ];
                let normal = if has_normals {
                    [mesh.normals[i * 3], mesh.normals[i * 3 + 1], mesh.normals[i * 3 + 2]]
                } else {
                    [0.0; 3]
                };
                let tex_coord = if has_tex_coords {
                    [mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1]]
                } else {
                    [0.0, 0.0]
                };
                vertices.push(Vertex::new(position, normal, tex_coord));
            }

            let first_index = indices.len();
            for &index in &mesh.indices {
                if index as usize >= vertex_count {
                    return Err(ObjError::InvalidFormat(format!(
                        "Index {index} out of bounds for shape '{}' with {vertex_count} vertices",
                        model.name
                    )));
                }
                indices.push(base + index);
            }

            if !has_normals {
                compute_normals(&mut vertices, &indices[first_index..]);
            }
        }

        // Drop a dangling partial triangle rather than reading past the end
        indices.truncate(indices.len() - indices.len() % 3);

        let mesh = MeshData::new(vertices, indices);
        if mesh.is_empty() {
            return Err(ObjError::NoGeometry);
        }
        Ok(mesh)
    }
}

/// Area-weighted vertex normals for the triangles in `indices`
fn compute_normals(vertices: &mut [Vertex], indices: &[u32]) {
    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let (pa, pb, pc) = (vertices[a].position, vertices[b].position, vertices[c].position);
        let ab = sub(pb, pa);
        let ac = sub(pc, pa);
        let face = cross(ab, ac);
        for index in [a, b, c] {
            let n = &mut vertices[index].normal;
            n[0] += face[0];
            n[1] += face[1];
            n[2] += face[2];
        }
    }

    for index in indices.iter().map(|&i| i as usize) {
        let n = vertices[index].normal;
        let length = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        vertices[index].normal = if length > f32::EPSILON {
            [n[0] / length, n[1] / length, n[2] / length]
        } else {
            [0.0, 1.0, 0.0]
        };
    }
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Write};

    const QUAD: &str = "\
# unit quad in the xy plane
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";

    fn parse(source: &str) -> Result<MeshData, ObjError> {
        ObjLoader::parse_obj(&mut BufReader::new(source.as_bytes()))
    }

    #[test]
    fn test_quad_is_triangulated() {
        let mesh = parse(QUAD).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_missing_normals_are_synthesised() {
        let mesh = parse(QUAD).unwrap();
        for vertex in &mesh.vertices {
            assert!((vertex.normal[2] - 1.0).abs() < 1e-5, "normal {:?}", vertex.normal);
        }
    }

    #[test]
    fn test_shapes_are_merged_with_offsets() {
        let source = "\
o first
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o second
v 0 0 1
v 1 0 1
v 0 1 1
f 4 5 6
";
        let mesh = parse(source).unwrap();
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
        assert!(mesh.indices[3..].iter().all(|&i| i >= 3));
    }

    #[test]
    fn test_no_faces_is_rejected() {
        let result = parse("v 0 0 0\nv 1 0 0\n");
        assert!(matches!(result, Err(ObjError::NoGeometry)));
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ObjLoader::load_obj(dir.path().join("missing.obj"));
        assert!(matches!(result, Err(ObjError::Load(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        file.write_all(QUAD.as_bytes()).unwrap();
        let mesh = ObjLoader::load_obj(file.path()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }
}
