//! Recording graphics device for tests

use super::{GpuError, GpuMesh, GpuResult, GraphicsDevice};
use crate::assets::MeshData;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeviceCall {
    Upload(GpuMesh),
    Draw(GpuMesh),
    Release(GpuMesh),
}

/// Shared view of the calls a [`RecordingDevice`] received
#[derive(Clone, Default)]
pub(crate) struct CallLog {
    calls: Rc<RefCell<Vec<DeviceCall>>>,
}

impl CallLog {
    pub(crate) fn calls(&self) -> Vec<DeviceCall> {
        self.calls.borrow().clone()
    }

    pub(crate) fn draws(&self) -> usize {
        self.calls.borrow().iter().filter(|c| matches!(c, DeviceCall::Draw(_))).count()
    }

    pub(crate) fn uploaded(&self) -> Vec<GpuMesh> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                DeviceCall::Upload(mesh) => Some(*mesh),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn drawn(&self) -> Vec<GpuMesh> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                DeviceCall::Draw(mesh) => Some(*mesh),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn released(&self) -> Vec<GpuMesh> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                DeviceCall::Release(mesh) => Some(*mesh),
                _ => None,
            })
            .collect()
    }
}

/// Hands out sequential object names and records every call
pub(crate) struct RecordingDevice {
    log: CallLog,
    next_name: Cell<u32>,
    fail_after: Option<usize>,
}

impl RecordingDevice {
    pub(crate) fn new() -> (Self, CallLog) {
        Self::with_budget(None)
    }

    /// A device whose uploads always fail
    pub(crate) fn failing() -> (Self, CallLog) {
        Self::with_budget(Some(0))
    }

    /// A device that accepts `uploads` uploads, then fails
    pub(crate) fn with_budget(uploads: Option<usize>) -> (Self, CallLog) {
        let log = CallLog::default();
        let device = Self {
            log: log.clone(),
            next_name: Cell::new(1),
            fail_after: uploads,
        };
        (device, log)
    }

    fn name(&self) -> u32 {
        let name = self.next_name.get();
        self.next_name.set(name + 1);
        name
    }
}

impl GraphicsDevice for RecordingDevice {
    fn upload_mesh(&self, mesh: &MeshData) -> GpuResult<GpuMesh> {
        let uploads = self.log.calls.borrow().iter().filter(|c| matches!(c, DeviceCall::Upload(_))).count();
        if self.fail_after.is_some_and(|limit| uploads >= limit) {
            return Err(GpuError::Allocation("out of memory".to_string()));
        }
        let uploaded = GpuMesh {
            vertex_array: self.name(),
            vertex_buffer: self.name(),
            index_buffer: self.name(),
            index_count: u32::try_from(mesh.indices.len()).unwrap_or(u32::MAX),
        };
        self.log.calls.borrow_mut().push(DeviceCall::Upload(uploaded));
        Ok(uploaded)
    }

    fn draw_mesh(&self, mesh: &GpuMesh) {
        self.log.calls.borrow_mut().push(DeviceCall::Draw(*mesh));
    }

    fn release_mesh(&self, mesh: GpuMesh) {
        self.log.calls.borrow_mut().push(DeviceCall::Release(mesh));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
