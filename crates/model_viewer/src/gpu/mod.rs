//! GPU resource ownership
//!
//! Mesh buffers live in a slot-map arena owned by [`Gpu`]. Callers hold
//! [`MeshKey`]s and the arena counts live holders per slot; the buffers are
//! handed back to the [`GraphicsDevice`] when the count reaches zero.
//!
//! The device trait is the seam between the viewer and OpenGL. The glow
//! implementation lives in [`glow_device`]; tests swap in a recording device.
//!
//! An arena created by a window rebinds that window's context before every
//! device call, and is shut down when the window is dropped: remaining
//! buffers are deleted while the context still exists, and later draws and
//! releases through surviving handles do nothing.

pub mod glow_device;
pub mod shader;

#[cfg(test)]
pub(crate) mod recording;

pub use glow_device::GlowDevice;
pub use shader::ShaderProgram;

use crate::assets::MeshData;
use slotmap::{new_key_type, SlotMap};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use thiserror::Error;

/// GPU resource errors
#[derive(Error, Debug)]
pub enum GpuError {
    /// A buffer or vertex array could not be created
    #[error("GPU allocation failed: {0}")]
    Allocation(String),

    /// A shader failed to compile or link
    #[error("Shader error: {0}")]
    Shader(String),

    /// The window owning the context has been destroyed
    #[error("Graphics context has been destroyed")]
    ContextLost,
}

/// Result alias for GPU operations
pub type GpuResult<T> = Result<T, GpuError>;

/// Native object names for one uploaded mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuMesh {
    /// Vertex array object
    pub vertex_array: u32,
    /// Vertex buffer object
    pub vertex_buffer: u32,
    /// Element buffer object
    pub index_buffer: u32,
    /// Number of indices to draw
    pub index_count: u32,
}

/// Backend that owns the actual graphics API calls
///
/// All methods assume the device's context is current on the calling thread.
pub trait GraphicsDevice {
    /// Upload mesh data into new buffers
    fn upload_mesh(&self, mesh: &MeshData) -> GpuResult<GpuMesh>;

    /// Issue the draw calls for an uploaded mesh
    fn draw_mesh(&self, mesh: &GpuMesh);

    /// Delete the buffers of an uploaded mesh
    fn release_mesh(&self, mesh: GpuMesh);

    /// Access to the concrete type for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Makes the context an arena belongs to current on the calling thread
pub(crate) trait ContextBinding {
    fn bind(&self);
}

new_key_type! {
    /// Opaque handle to a mesh slot in a [`Gpu`] arena
    pub struct MeshKey;
}

#[derive(Debug)]
struct MeshSlot {
    mesh: GpuMesh,
    vertex_count: usize,
    refs: usize,
    label: String,
}

struct GpuInner {
    device: Box<dyn GraphicsDevice>,
    binding: Option<Box<dyn ContextBinding>>,
    lost: Cell<bool>,
    meshes: RefCell<SlotMap<MeshKey, MeshSlot>>,
}

impl GpuInner {
    fn bind(&self) {
        if let Some(binding) = &self.binding {
            binding.bind();
        }
    }
}

impl Drop for GpuInner {
    fn drop(&mut self) {
        if self.lost.get() {
            return;
        }
        let leftover: Vec<_> = self.meshes.get_mut().drain().collect();
        if !leftover.is_empty() {
            self.bind();
        }
        for (_, slot) in leftover {
            log::warn!("Releasing mesh '{}' still referenced at shutdown", slot.label);
            self.device.release_mesh(slot.mesh);
        }
    }
}

/// Shared handle to a graphics device and its mesh arena
///
/// Cloning is cheap; all clones see the same arena. Not thread-safe.
#[derive(Clone)]
pub struct Gpu {
    inner: Rc<GpuInner>,
}

impl Gpu {
    /// Wrap a device whose context the caller keeps current
    pub fn new<D: GraphicsDevice + 'static>(device: D) -> Self {
        Self::build(Box::new(device), None)
    }

    /// Wrap a device and rebind its context before each device call
    pub(crate) fn with_binding<D: GraphicsDevice + 'static>(device: D, binding: Box<dyn ContextBinding>) -> Self {
        Self::build(Box::new(device), Some(binding))
    }

    fn build(device: Box<dyn GraphicsDevice>, binding: Option<Box<dyn ContextBinding>>) -> Self {
        Self {
            inner: Rc::new(GpuInner {
                device,
                binding,
                lost: Cell::new(false),
                meshes: RefCell::new(SlotMap::with_key()),
            }),
        }
    }

    /// Borrow the device as its concrete type
    pub fn device<D: GraphicsDevice + 'static>(&self) -> Option<&D> {
        self.inner.device.as_any().downcast_ref::<D>()
    }

    /// Number of meshes currently resident
    pub fn live_meshes(&self) -> usize {
        self.inner.meshes.borrow().len()
    }

    /// Whether the owning context has been destroyed
    pub fn is_lost(&self) -> bool {
        self.inner.lost.get()
    }

    /// Delete every resident mesh and stop issuing device calls
    ///
    /// Handles that outlive this keep working as values but draw nothing.
    pub(crate) fn shutdown(&self) {
        if self.inner.lost.replace(true) {
            return;
        }
        let leftover: Vec<_> = self.inner.meshes.borrow_mut().drain().collect();
        if leftover.is_empty() {
            return;
        }
        self.inner.bind();
        for (_, slot) in leftover {
            log::debug!("Releasing mesh '{}' ({} handles) with its context", slot.label, slot.refs);
            self.inner.device.release_mesh(slot.mesh);
        }
    }

    /// Upload `data` and create a slot holding one reference
    pub(crate) fn insert_mesh(&self, label: &str, data: &MeshData) -> GpuResult<MeshKey> {
        if self.is_lost() {
            return Err(GpuError::ContextLost);
        }
        self.inner.bind();
        let mesh = self.inner.device.upload_mesh(data)?;
        log::debug!(
            "Uploaded mesh '{label}': {} vertices, {} indices",
            data.vertices.len(),
            mesh.index_count
        );
        Ok(self.inner.meshes.borrow_mut().insert(MeshSlot {
            mesh,
            vertex_count: data.vertices.len(),
            refs: 1,
            label: label.to_string(),
        }))
    }

    /// Add a reference to a slot
    pub(crate) fn retain(&self, key: MeshKey) {
        if let Some(slot) = self.inner.meshes.borrow_mut().get_mut(key) {
            slot.refs += 1;
        }
    }

    /// Drop a reference, deleting the buffers when it was the last one
    pub(crate) fn release(&self, key: MeshKey) {
        let freed = {
            let mut meshes = self.inner.meshes.borrow_mut();
            match meshes.get_mut(key) {
                Some(slot) if slot.refs > 1 => {
                    slot.refs -= 1;
                    None
                }
                Some(_) => meshes.remove(key),
                None => None,
            }
        };

        if let Some(slot) = freed {
            log::debug!("Releasing mesh '{}'", slot.label);
            self.inner.bind();
            self.inner.device.release_mesh(slot.mesh);
        }
    }

    /// Draw the mesh in a slot; stale keys draw nothing
    pub(crate) fn draw(&self, key: MeshKey) {
        let mesh = self.inner.meshes.borrow().get(key).map(|slot| slot.mesh);
        if let Some(mesh) = mesh {
            self.inner.bind();
            self.inner.device.draw_mesh(&mesh);
        }
    }

    pub(crate) fn ref_count(&self, key: MeshKey) -> usize {
        self.inner.meshes.borrow().get(key).map_or(0, |slot| slot.refs)
    }

    pub(crate) fn index_count(&self, key: MeshKey) -> u32 {
        self.inner.meshes.borrow().get(key).map_or(0, |slot| slot.mesh.index_count)
    }

    pub(crate) fn vertex_count(&self, key: MeshKey) -> usize {
        self.inner.meshes.borrow().get(key).map_or(0, |slot| slot.vertex_count)
    }

    /// Whether two handles share one arena
    pub fn same_arena(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Gpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gpu").field("live_meshes", &self.live_meshes()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::recording::{DeviceCall, RecordingDevice};
    use super::*;

    #[test]
    fn test_last_release_frees_buffers() {
        let (device, log) = RecordingDevice::new();
        let gpu = Gpu::new(device);
        let key = gpu.insert_mesh("cube", &MeshData::cube()).unwrap();

        gpu.retain(key);
        assert_eq!(gpu.ref_count(key), 2);

        gpu.release(key);
        assert_eq!(gpu.live_meshes(), 1);
        assert!(log.released().is_empty());

        gpu.release(key);
        assert_eq!(gpu.live_meshes(), 0);
        assert_eq!(log.released().len(), 1);
    }

    #[test]
    fn test_stale_key_is_ignored() {
        let (device, log) = RecordingDevice::new();
        let gpu = Gpu::new(device);
        let key = gpu.insert_mesh("cube", &MeshData::cube()).unwrap();
        gpu.release(key);

        gpu.draw(key);
        gpu.release(key);
        assert_eq!(log.draws(), 0);
        assert_eq!(log.released().len(), 1);
    }

    #[test]
    fn test_failed_upload_creates_no_slot() {
        let (device, log) = RecordingDevice::failing();
        let gpu = Gpu::new(device);
        assert!(matches!(gpu.insert_mesh("cube", &MeshData::cube()), Err(GpuError::Allocation(_))));
        assert_eq!(gpu.live_meshes(), 0);
        assert!(log.calls().is_empty());
    }

    #[test]
    fn test_dropping_gpu_releases_leftovers() {
        let (device, log) = RecordingDevice::new();
        let gpu = Gpu::new(device);
        gpu.insert_mesh("leaked", &MeshData::cube()).unwrap();
        drop(gpu);
        assert!(matches!(log.calls().last(), Some(DeviceCall::Release(_))));
    }

    struct CountingBinding(Rc<Cell<usize>>);

    impl ContextBinding for CountingBinding {
        fn bind(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_context_is_bound_before_device_calls() {
        let (device, log) = RecordingDevice::new();
        let binds = Rc::new(Cell::new(0));
        let gpu = Gpu::with_binding(device, Box::new(CountingBinding(binds.clone())));

        let key = gpu.insert_mesh("cube", &MeshData::cube()).unwrap();
        assert_eq!(binds.get(), 1);
        gpu.draw(key);
        assert_eq!(binds.get(), 2);
        gpu.release(key);
        assert_eq!(binds.get(), 3);
        assert_eq!(log.calls().len(), 3);
    }

    #[test]
    fn test_shutdown_releases_and_disables_arena() {
        let (device, log) = RecordingDevice::new();
        let gpu = Gpu::new(device);
        let key = gpu.insert_mesh("cube", &MeshData::cube()).unwrap();
        gpu.retain(key);

        gpu.shutdown();
        assert!(gpu.is_lost());
        assert_eq!(gpu.live_meshes(), 0);
        assert_eq!(log.released().len(), 1);

        gpu.draw(key);
        gpu.release(key);
        gpu.release(key);
        assert_eq!(log.draws(), 0);
        assert_eq!(log.released().len(), 1);
        assert!(matches!(gpu.insert_mesh("late", &MeshData::cube()), Err(GpuError::ContextLost)));

        drop(gpu);
        assert_eq!(log.released().len(), 1);
    }

    #[test]
    fn test_device_downcast() {
        let (device, _log) = RecordingDevice::new();
        let gpu = Gpu::new(device);
        assert!(gpu.device::<RecordingDevice>().is_some());
        assert!(gpu.device::<GlowDevice>().is_none());
    }
}
