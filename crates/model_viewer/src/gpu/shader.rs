//! Shader program loading

use super::{GpuError, GpuResult};
use glow::HasContext;
use std::rc::Rc;

/// A linked vertex + fragment program, deleted on drop
pub struct ShaderProgram {
    gl: Rc<glow::Context>,
    program: glow::NativeProgram,
}

impl ShaderProgram {
    /// Compile and link a program from GLSL sources
    pub fn new(gl: Rc<glow::Context>, vertex_source: &str, fragment_source: &str) -> GpuResult<Self> {
        unsafe {
            let program = gl.create_program().map_err(GpuError::Allocation)?;

            let mut shaders = Vec::with_capacity(2);
            for (kind, source) in [(glow::VERTEX_SHADER, vertex_source), (glow::FRAGMENT_SHADER, fragment_source)] {
                match compile(&gl, kind, source) {
                    Ok(shader) => {
                        gl.attach_shader(program, shader);
                        shaders.push(shader);
                    }
                    Err(e) => {
                        for shader in shaders {
                            gl.delete_shader(shader);
                        }
                        gl.delete_program(program);
                        return Err(e);
                    }
                }
            }

            gl.link_program(program);
            let linked = gl.get_program_link_status(program);
            for shader in shaders {
                gl.detach_shader(program, shader);
                gl.delete_shader(shader);
            }
            if !linked {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(GpuError::Shader(format!("link failed: {log}")));
            }

            log::debug!("Linked shader program");
            Ok(Self { gl, program })
        }
    }

    /// Make this the active program
    pub fn bind(&self) {
        unsafe { self.gl.use_program(Some(self.program)) };
    }

    /// Upload a column-major 4x4 matrix to `name`; unknown names are ignored
    pub fn set_mat4(&self, name: &str, matrix: &[f32; 16]) {
        unsafe {
            let location = self.gl.get_uniform_location(self.program, name);
            self.gl.uniform_matrix_4_f32_slice(location.as_ref(), false, matrix);
        }
    }

    /// Upload a vec3 to `name`; unknown names are ignored
    pub fn set_vec3(&self, name: &str, value: [f32; 3]) {
        unsafe {
            let location = self.gl.get_uniform_location(self.program, name);
            self.gl.uniform_3_f32(location.as_ref(), value[0], value[1], value[2]);
        }
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        unsafe { self.gl.delete_program(self.program) };
    }
}

unsafe fn compile(gl: &glow::Context, kind: u32, source: &str) -> GpuResult<glow::NativeShader> {
    let shader = gl.create_shader(kind).map_err(GpuError::Allocation)?;
    gl.shader_source(shader, source);
    gl.compile_shader(shader);
    if gl.get_shader_compile_status(shader) {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        let stage = if kind == glow::VERTEX_SHADER { "vertex" } else { "fragment" };
        Err(GpuError::Shader(format!("{stage} shader failed to compile: {log}")))
    }
}
