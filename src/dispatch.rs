//! Draw dispatch: streams assembled vertices to the GPU, uploads the
//! fixed-function state as uniforms and issues the draw call.

use glow::HasContext;
use log::warn;

use crate::Profile;
use crate::program::{
    ATTRIB_COLOR, ATTRIB_NORMAL, ATTRIB_POSITION, ATTRIB_TEXCOORD0, ATTRIB_TEXCOORD1, Program,
};
use crate::state::RenderState;
use crate::vertex::{Primitive, Vertex};

const STRIDE: i32 = std::mem::size_of::<Vertex>() as i32;

/// Element buffer at the width the profile can draw.
pub(crate) enum IndexBuffer {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

/// Fits a widened index list to what the profile can draw: narrowed to u16
/// whenever every index fits, kept at u32 where the driver accepts it, and
/// otherwise the draw is dropped. `warned` is the owning context's one-shot
/// flag, so each context reports the limitation once.
pub(crate) fn make_index_buffer(
    profile: Profile,
    indices: Vec<u32>,
    warned: &mut bool,
) -> Option<IndexBuffer> {
    let max = indices.iter().copied().max().unwrap_or(0);
    if max <= u16::MAX as u32 {
        return Some(IndexBuffer::U16(
            indices.into_iter().map(|i| i as u16).collect(),
        ));
    }
    if profile.supports_u32_indices() {
        return Some(IndexBuffer::U32(indices));
    }
    if !std::mem::replace(warned, true) {
        warn!("draw needs 32-bit indices, unsupported on this profile; dropping");
    }
    None
}

fn uniform_vec4(gl: &glow::Context, loc: Option<&glow::UniformLocation>, v: [f32; 4]) {
    unsafe { gl.uniform_4_f32(loc, v[0], v[1], v[2], v[3]) };
}

fn uniform_bool(gl: &glow::Context, loc: Option<&glow::UniformLocation>, v: bool) {
    unsafe { gl.uniform_1_i32(loc, i32::from(v)) };
}

fn mul4(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    [a[0] * b[0], a[1] * b[1], a[2] * b[2], a[3] * b[3]]
}

/// Uploads the complete fixed-function state into the program's uniforms.
/// `unit_enabled` is the resolved per-unit texturing decision (cap on,
/// texture bound, coordinates available); `use_color_array` selects between
/// the color attribute and the current-color uniform.
pub(crate) fn upload_uniforms(
    gl: &glow::Context,
    program: &Program,
    profile: Profile,
    state: &RenderState,
    unit_enabled: [bool; 2],
    use_color_array: bool,
) {
    let u = &program.uniforms;
    let fixed = &state.fixed;

    let mv = state.matrices.modelview();
    unsafe {
        gl.uniform_matrix_4_f32_slice(u.mv.as_ref(), false, &mv.to_cols_array());
        gl.uniform_matrix_4_f32_slice(
            u.proj.as_ref(),
            false,
            &state.matrices.projection().to_cols_array(),
        );
        // Direct 3x3 of the modelview; legacy content relies on uniform
        // scaling or GL_NORMALIZE, and the shader renormalizes anyway.
        gl.uniform_matrix_3_f32_slice(
            u.normal_mat.as_ref(),
            false,
            &glam::Mat3::from_mat4(*mv).to_cols_array(),
        );
        gl.uniform_matrix_4_f32_slice(
            u.tex_matrix.as_ref(),
            false,
            &state.matrices.texture().to_cols_array(),
        );
    }

    uniform_bool(gl, u.use_color_array.as_ref(), use_color_array);
    uniform_vec4(gl, u.current_color.as_ref(), fixed.current_color);

    uniform_bool(gl, u.lighting.as_ref(), fixed.lighting);
    if fixed.lighting {
        uniform_vec4(gl, u.ambient.as_ref(), fixed.effective_ambient());
        // Enabled lights packed into the low slots; the shader breaks at
        // u_num_lights.
        let mut n = 0usize;
        for light in fixed.lights.iter().take(profile.max_lights()) {
            if !light.enabled {
                continue;
            }
            uniform_vec4(gl, u.light_pos[n].as_ref(), light.position);
            uniform_vec4(
                gl,
                u.light_diff[n].as_ref(),
                mul4(light.diffuse, fixed.material.diffuse),
            );
            uniform_vec4(
                gl,
                u.light_amb[n].as_ref(),
                mul4(light.ambient, fixed.material.ambient),
            );
            n += 1;
        }
        unsafe { gl.uniform_1_i32(u.num_lights.as_ref(), n as i32) };
    }

    let fog = &fixed.fog;
    uniform_bool(gl, u.fog.as_ref(), fog.enabled);
    if fog.enabled {
        unsafe {
            gl.uniform_1_i32(u.fog_mode.as_ref(), fog.mode.shader_index());
            gl.uniform_1_f32(u.fog_start.as_ref(), fog.start);
            gl.uniform_1_f32(u.fog_end.as_ref(), fog.end);
            gl.uniform_1_f32(u.fog_density.as_ref(), fog.density);
        }
        uniform_vec4(gl, u.fog_color.as_ref(), fog.color);
    }

    let at = &fixed.alpha_test;
    uniform_bool(gl, u.alpha_test.as_ref(), at.enabled);
    if at.enabled {
        unsafe {
            gl.uniform_1_i32(u.alpha_func.as_ref(), at.func.shader_index());
            gl.uniform_1_f32(u.alpha_ref.as_ref(), at.reference);
        }
    }

    uniform_bool(gl, u.texture0.as_ref(), unit_enabled[0]);
    uniform_bool(gl, u.texture1.as_ref(), unit_enabled[1]);
    unsafe {
        gl.uniform_1_i32(u.texenv0.as_ref(), fixed.texenv[0].shader_index());
        gl.uniform_1_i32(u.texenv1.as_ref(), fixed.texenv[1].shader_index());
    }
    uniform_bool(gl, u.texgen.as_ref(), fixed.texgen_active());
}

fn bind_attributes(gl: &glow::Context) {
    unsafe {
        gl.enable_vertex_attrib_array(ATTRIB_POSITION);
        gl.vertex_attrib_pointer_f32(ATTRIB_POSITION, 3, glow::FLOAT, false, STRIDE, 0);
        gl.enable_vertex_attrib_array(ATTRIB_NORMAL);
        gl.vertex_attrib_pointer_f32(ATTRIB_NORMAL, 3, glow::FLOAT, false, STRIDE, 12);
        gl.enable_vertex_attrib_array(ATTRIB_COLOR);
        gl.vertex_attrib_pointer_f32(ATTRIB_COLOR, 4, glow::FLOAT, false, STRIDE, 24);
        gl.enable_vertex_attrib_array(ATTRIB_TEXCOORD0);
        gl.vertex_attrib_pointer_f32(ATTRIB_TEXCOORD0, 2, glow::FLOAT, false, STRIDE, 40);
        gl.enable_vertex_attrib_array(ATTRIB_TEXCOORD1);
        gl.vertex_attrib_pointer_f32(ATTRIB_TEXCOORD1, 2, glow::FLOAT, false, STRIDE, 48);
    }
}

fn release_attributes(gl: &glow::Context) {
    unsafe {
        for slot in [
            ATTRIB_POSITION,
            ATTRIB_NORMAL,
            ATTRIB_COLOR,
            ATTRIB_TEXCOORD0,
            ATTRIB_TEXCOORD1,
        ] {
            gl.disable_vertex_attrib_array(slot);
        }
    }
}

/// Streams `vertices` (and optional pre-lowered indices) and draws them
/// with the full pipeline state applied.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw(
    gl: &glow::Context,
    profile: Profile,
    program: &Program,
    vbo: glow::Buffer,
    ibo: glow::Buffer,
    vao: Option<glow::VertexArray>,
    state: &RenderState,
    prim: Primitive,
    vertices: &[Vertex],
    indices: Option<&IndexBuffer>,
    unit_enabled: [bool; 2],
    use_color_array: bool,
) {
    if vertices.is_empty() {
        return;
    }

    unsafe {
        gl.use_program(Some(program.handle));
        if let Some(vao) = vao {
            gl.bind_vertex_array(Some(vao));
        }

        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(vertices),
            glow::STREAM_DRAW,
        );
        bind_attributes(gl);

        upload_uniforms(gl, program, profile, state, unit_enabled, use_color_array);

        match indices {
            None => gl.draw_arrays(prim.gl_mode(), 0, vertices.len() as i32),
            Some(buf) => {
                gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
                match buf {
                    IndexBuffer::U16(v) => {
                        gl.buffer_data_u8_slice(
                            glow::ELEMENT_ARRAY_BUFFER,
                            bytemuck::cast_slice(v),
                            glow::STREAM_DRAW,
                        );
                        gl.draw_elements(
                            prim.gl_mode(),
                            v.len() as i32,
                            glow::UNSIGNED_SHORT,
                            0,
                        );
                    }
                    IndexBuffer::U32(v) => {
                        gl.buffer_data_u8_slice(
                            glow::ELEMENT_ARRAY_BUFFER,
                            bytemuck::cast_slice(v),
                            glow::STREAM_DRAW,
                        );
                        gl.draw_elements(prim.gl_mode(), v.len() as i32, glow::UNSIGNED_INT, 0);
                    }
                }
                gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);
            }
        }

        release_attributes(gl);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);
        if vao.is_some() {
            gl.bind_vertex_array(None);
        }
        gl.use_program(None);
    }
}

#[cfg(test)]
mod tests {
    use super::{IndexBuffer, make_index_buffer};
    use crate::Profile;

    #[test]
    fn small_indices_narrow_to_u16_on_both_profiles() {
        for profile in [Profile::Gles2, Profile::Gles3] {
            let mut warned = false;
            match make_index_buffer(profile, vec![0, 1, 65535], &mut warned) {
                Some(IndexBuffer::U16(v)) => assert_eq!(v, vec![0, 1, 65535]),
                _ => panic!("expected a u16 buffer"),
            }
            assert!(!warned);
        }
    }

    #[test]
    fn wide_indices_survive_only_where_supported() {
        let mut warned = false;
        match make_index_buffer(Profile::Gles3, vec![0, 70000], &mut warned) {
            Some(IndexBuffer::U32(v)) => assert_eq!(v, vec![0, 70000]),
            _ => panic!("expected a u32 buffer"),
        }
        assert!(!warned);
        assert!(make_index_buffer(Profile::Gles2, vec![0, 70000], &mut warned).is_none());
        assert!(warned);
    }

    #[test]
    fn wide_index_flag_is_per_caller_state() {
        // Two flags stand in for two contexts: tripping one leaves the
        // other ready to warn on its own first wide draw.
        let (mut a, mut b) = (false, false);
        assert!(make_index_buffer(Profile::Gles2, vec![0, 70000], &mut a).is_none());
        assert!(a);
        assert!(!b);
        assert!(make_index_buffer(Profile::Gles2, vec![0, 70000], &mut b).is_none());
        assert!(b);
    }
}
