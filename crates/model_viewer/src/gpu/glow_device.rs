//! OpenGL device built on glow
//!
//! Buffer management following RAII patterns: every object created here is
//! deleted again through [`GraphicsDevice::release_mesh`], which the mesh
//! arena calls when the last model handle goes away.

use super::{GpuError, GpuMesh, GpuResult, GraphicsDevice};
use crate::assets::{MeshData, Vertex};
use glow::HasContext;
use std::any::Any;
use std::mem;
use std::num::NonZeroU32;
use std::rc::Rc;

/// Attribute locations used by the vertex layout
pub mod attrib {
    /// `layout(location = 0) in vec3 position`
    pub const POSITION: u32 = 0;
    /// `layout(location = 1) in vec3 normal`
    pub const NORMAL: u32 = 1;
    /// `layout(location = 2) in vec2 tex_coord`
    pub const TEX_COORD: u32 = 2;
}

/// Graphics device for a loaded OpenGL context
pub struct GlowDevice {
    gl: Rc<glow::Context>,
}

impl GlowDevice {
    /// Wrap a loaded context
    pub fn new(gl: Rc<glow::Context>) -> Self {
        Self { gl }
    }

    /// The underlying glow context
    pub fn context(&self) -> &Rc<glow::Context> {
        &self.gl
    }

    /// Set the viewport to cover a `width` x `height` framebuffer
    pub fn set_viewport(&self, width: i32, height: i32) {
        unsafe { self.gl.viewport(0, 0, width.max(0), height.max(0)) };
    }

    /// Enable depth testing and back-face culling
    pub fn enable_depth(&self) {
        unsafe {
            self.gl.enable(glow::DEPTH_TEST);
            self.gl.enable(glow::CULL_FACE);
        }
    }

    /// Clear color and depth
    pub fn clear(&self, color: [f32; 4]) {
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn create_buffer(&self, target: u32, bytes: &[u8]) -> GpuResult<glow::NativeBuffer> {
        unsafe {
            let buffer = self.gl.create_buffer().map_err(GpuError::Allocation)?;
            self.gl.bind_buffer(target, Some(buffer));
            self.gl.buffer_data_u8_slice(target, bytes, glow::STATIC_DRAW);
            Ok(buffer)
        }
    }

    fn configure_attributes(&self) {
        let stride = i32::try_from(mem::size_of::<Vertex>()).unwrap_or(i32::MAX);
        let layout = [
            (attrib::POSITION, 3, mem::offset_of!(Vertex, position)),
            (attrib::NORMAL, 3, mem::offset_of!(Vertex, normal)),
            (attrib::TEX_COORD, 2, mem::offset_of!(Vertex, tex_coord)),
        ];
        for (location, components, offset) in layout {
            let offset = i32::try_from(offset).unwrap_or(i32::MAX);
            unsafe {
                self.gl.enable_vertex_attrib_array(location);
                self.gl.vertex_attrib_pointer_f32(location, components, glow::FLOAT, false, stride, offset);
            }
        }
    }
}

impl GraphicsDevice for GlowDevice {
    fn upload_mesh(&self, mesh: &MeshData) -> GpuResult<GpuMesh> {
        let index_count = u32::try_from(mesh.indices.len())
            .map_err(|_| GpuError::Allocation(format!("{} indices exceed the draw limit", mesh.indices.len())))?;

        let vertex_array = unsafe { self.gl.create_vertex_array().map_err(GpuError::Allocation)? };
        unsafe { self.gl.bind_vertex_array(Some(vertex_array)) };

        let vertex_buffer = match self.create_buffer(glow::ARRAY_BUFFER, mesh.vertex_bytes()) {
            Ok(buffer) => buffer,
            Err(e) => {
                unsafe {
                    self.gl.bind_vertex_array(None);
                    self.gl.delete_vertex_array(vertex_array);
                }
                return Err(e);
            }
        };
        self.configure_attributes();

        let index_buffer = match self.create_buffer(glow::ELEMENT_ARRAY_BUFFER, mesh.index_bytes()) {
            Ok(buffer) => buffer,
            Err(e) => {
                unsafe {
                    self.gl.bind_vertex_array(None);
                    self.gl.delete_buffer(vertex_buffer);
                    self.gl.delete_vertex_array(vertex_array);
                }
                return Err(e);
            }
        };

        // Unbind the vertex array first so it keeps its element buffer binding
        unsafe {
            self.gl.bind_vertex_array(None);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, None);
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);
        }

        Ok(GpuMesh {
            vertex_array: vertex_array.0.get(),
            vertex_buffer: vertex_buffer.0.get(),
            index_buffer: index_buffer.0.get(),
            index_count,
        })
    }

    fn draw_mesh(&self, mesh: &GpuMesh) {
        let Some(vertex_array) = NonZeroU32::new(mesh.vertex_array).map(glow::NativeVertexArray) else {
            return;
        };
        let count = i32::try_from(mesh.index_count).unwrap_or(i32::MAX);
        unsafe {
            self.gl.bind_vertex_array(Some(vertex_array));
            self.gl.draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_INT, 0);
            self.gl.bind_vertex_array(None);
        }
    }

    fn release_mesh(&self, mesh: GpuMesh) {
        unsafe {
            for name in [mesh.vertex_buffer, mesh.index_buffer] {
                if let Some(buffer) = NonZeroU32::new(name).map(glow::NativeBuffer) {
                    self.gl.delete_buffer(buffer);
                }
            }
            if let Some(vertex_array) = NonZeroU32::new(mesh.vertex_array).map(glow::NativeVertexArray) {
                self.gl.delete_vertex_array(vertex_array);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
