//! Models and model lists
//!
//! A [`Model`] is a handle to mesh buffers in a [`Gpu`] arena. Copies made
//! with `clone` refer to the same buffers, which are deleted when the last
//! copy is dropped or when the owning window goes away, whichever is first.
//!
//! A [`ModelList`] holds models in load order plus a cursor. Moving the
//! cursor past either end wraps around. Copies share the models and the
//! cursor.

use crate::assets::{Bounds, MeshData, ObjError, ObjLoader};
use crate::gpu::{Gpu, GpuError, MeshKey};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

/// Model loading and list usage errors
#[derive(Error, Debug)]
pub enum ModelError {
    /// The model file is missing, unreadable or malformed
    #[error("Failed to load model {}: {source}", path.display())]
    Load {
        /// File that failed
        path: PathBuf,
        /// Parser error
        #[source]
        source: ObjError,
    },

    /// Mesh data without any triangles
    #[error("Mesh '{0}' has no triangles")]
    EmptyMesh(String),

    /// Mesh data whose indices do not describe whole triangles over its vertices
    #[error("Mesh '{label}' is invalid: {reason}")]
    InvalidMesh {
        /// Mesh name
        label: String,
        /// What is wrong with it
        reason: String,
    },

    /// Buffer allocation failed
    #[error(transparent)]
    Gpu(#[from] GpuError),

    /// A model list needs at least one model
    #[error("Model list is empty")]
    EmptyList,

    /// Selection outside the list
    #[error("Model index {index} out of range for {len} models")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of models
        len: usize,
    },
}

/// Something that can issue draw calls on the current context
pub trait Drawable {
    /// Draw using the currently bound context, program and uniforms
    fn draw(&self);
}

/// Shared handle to uploaded mesh buffers
pub struct Model {
    gpu: Gpu,
    key: MeshKey,
    label: Rc<str>,
    bounds: Bounds,
}

impl Model {
    /// Load a model file and upload it
    pub fn load<P: AsRef<Path>>(gpu: &Gpu, path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let mesh = ObjLoader::load_obj(path).map_err(|source| ModelError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_mesh(gpu, &path.display().to_string(), &mesh)?;
        log::info!(
            "Loaded model {} ({} vertices, {} triangles)",
            path.display(),
            mesh.vertices.len(),
            mesh.triangle_count()
        );
        Ok(model)
    }

    /// Upload mesh data built in code
    pub fn from_mesh(gpu: &Gpu, label: &str, mesh: &MeshData) -> Result<Self, ModelError> {
        let bounds = match mesh.bounds() {
            Some(bounds) if !mesh.is_empty() => bounds,
            _ => return Err(ModelError::EmptyMesh(label.to_string())),
        };
        check_indices(label, mesh)?;
        let key = gpu.insert_mesh(label, mesh)?;
        Ok(Self {
            gpu: gpu.clone(),
            key,
            label: Rc::from(label),
            bounds,
        })
    }

    /// Source path or name
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Model-space bounding box
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Number of indices drawn
    pub fn index_count(&self) -> u32 {
        self.gpu.index_count(self.key)
    }

    /// Number of uploaded vertices
    pub fn vertex_count(&self) -> usize {
        self.gpu.vertex_count(self.key)
    }

    /// Number of live handles to these buffers
    pub fn ref_count(&self) -> usize {
        self.gpu.ref_count(self.key)
    }

    /// Whether both handles refer to the same buffers
    pub fn shares_buffers_with(&self, other: &Self) -> bool {
        self.key == other.key && self.gpu.same_arena(&other.gpu)
    }
}

fn check_indices(label: &str, mesh: &MeshData) -> Result<(), ModelError> {
    let invalid = |reason: String| ModelError::InvalidMesh {
        label: label.to_string(),
        reason,
    };
    if mesh.indices.len() % 3 != 0 {
        return Err(invalid(format!("{} indices is not a whole number of triangles", mesh.indices.len())));
    }
    if let Some(&index) = mesh.indices.iter().find(|&&i| i as usize >= mesh.vertices.len()) {
        return Err(invalid(format!("index {index} out of range for {} vertices", mesh.vertices.len())));
    }
    Ok(())
}

impl Clone for Model {
    fn clone(&self) -> Self {
        self.gpu.retain(self.key);
        Self {
            gpu: self.gpu.clone(),
            key: self.key,
            label: self.label.clone(),
            bounds: self.bounds,
        }
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        self.gpu.release(self.key);
    }
}

impl Drawable for Model {
    fn draw(&self) {
        self.gpu.draw(self.key);
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("label", &self.label)
            .field("refs", &self.ref_count())
            .finish()
    }
}

struct ModelListInner {
    models: Vec<Model>,
    cursor: Cell<usize>,
}

/// Models in load order with a wrapping cursor
#[derive(Clone)]
pub struct ModelList {
    inner: Rc<ModelListInner>,
}

impl ModelList {
    /// Load one model per path, in order
    ///
    /// Fails with the first load error; models loaded before it are released.
    pub fn load<P: AsRef<Path>>(gpu: &Gpu, paths: &[P]) -> Result<Self, ModelError> {
        if paths.is_empty() {
            return Err(ModelError::EmptyList);
        }
        let models = paths
            .iter()
            .map(|path| Model::load(gpu, path))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_models(models)
    }

    /// Build a list from models that are already loaded
    pub fn from_models(models: Vec<Model>) -> Result<Self, ModelError> {
        if models.is_empty() {
            return Err(ModelError::EmptyList);
        }
        Ok(Self {
            inner: Rc::new(ModelListInner {
                models,
                cursor: Cell::new(0),
            }),
        })
    }

    /// The model under the cursor
    pub fn current(&self) -> &Model {
        &self.inner.models[self.index()]
    }

    /// Move to the next model, wrapping to the first after the last
    pub fn next_model(&self) {
        let next = (self.index() + 1) % self.len();
        self.set_cursor(next);
    }

    /// Move to the previous model, wrapping to the last before the first
    pub fn prev_model(&self) {
        let prev = self.index().checked_sub(1).unwrap_or(self.len() - 1);
        self.set_cursor(prev);
    }

    /// Jump to `index`
    pub fn select(&self, index: usize) -> Result<(), ModelError> {
        if index >= self.len() {
            return Err(ModelError::IndexOutOfRange { index, len: self.len() });
        }
        self.set_cursor(index);
        Ok(())
    }

    /// Cursor position
    pub fn index(&self) -> usize {
        self.inner.cursor.get()
    }

    /// Number of models; never zero
    pub fn len(&self) -> usize {
        self.inner.models.len()
    }

    /// Always false; construction rejects empty lists
    pub fn is_empty(&self) -> bool {
        self.inner.models.is_empty()
    }

    /// Models in load order
    pub fn iter(&self) -> std::slice::Iter<'_, Model> {
        self.inner.models.iter()
    }

    fn set_cursor(&self, index: usize) {
        self.inner.cursor.set(index);
        log::debug!("Showing model {}/{}: {}", index + 1, self.len(), self.current().label());
    }
}

impl Drawable for ModelList {
    fn draw(&self) {
        self.current().draw();
    }
}

impl std::fmt::Debug for ModelList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelList")
            .field("len", &self.len())
            .field("index", &self.index())
            .finish()
    }
}
