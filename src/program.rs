//! The single shader program encoding the whole fixed-function pipeline.
//!
//! Every piece of legacy state becomes a uniform; the draw dispatcher
//! uploads the lot before each draw. One GLSL body serves both profiles,
//! with a per-profile prelude supplying the dialect differences.

use glow::{HasContext, UniformLocation};
use log::debug;

use crate::Profile;
use crate::state::MAX_LIGHTS;

// Attribute slots, bound before link so both profiles agree with the
// dispatcher's vertex layout.
pub const ATTRIB_POSITION: u32 = 0;
pub const ATTRIB_NORMAL: u32 = 1;
pub const ATTRIB_COLOR: u32 = 2;
pub const ATTRIB_TEXCOORD0: u32 = 3;
pub const ATTRIB_TEXCOORD1: u32 = 4;

const VERT_BODY: &str = include_str!("shaders/fixed.vert");
const FRAG_BODY: &str = include_str!("shaders/fixed.frag");

/// Uniform locations, resolved once at link time. Every field is optional:
/// the compiler is free to eliminate uniforms a given driver proves
/// unreachable, and a missing location just makes its upload a no-op.
pub struct Uniforms {
    pub mv: Option<UniformLocation>,
    pub proj: Option<UniformLocation>,
    pub normal_mat: Option<UniformLocation>,
    pub tex_matrix: Option<UniformLocation>,
    pub use_color_array: Option<UniformLocation>,
    pub current_color: Option<UniformLocation>,
    pub lighting: Option<UniformLocation>,
    pub ambient: Option<UniformLocation>,
    pub num_lights: Option<UniformLocation>,
    pub light_pos: [Option<UniformLocation>; MAX_LIGHTS],
    pub light_diff: [Option<UniformLocation>; MAX_LIGHTS],
    pub light_amb: [Option<UniformLocation>; MAX_LIGHTS],
    pub fog: Option<UniformLocation>,
    pub fog_mode: Option<UniformLocation>,
    pub fog_start: Option<UniformLocation>,
    pub fog_end: Option<UniformLocation>,
    pub fog_density: Option<UniformLocation>,
    pub fog_color: Option<UniformLocation>,
    pub alpha_test: Option<UniformLocation>,
    pub alpha_func: Option<UniformLocation>,
    pub alpha_ref: Option<UniformLocation>,
    pub texture0: Option<UniformLocation>,
    pub texture1: Option<UniformLocation>,
    pub texenv0: Option<UniformLocation>,
    pub texenv1: Option<UniformLocation>,
    pub texgen: Option<UniformLocation>,
}

pub struct Program {
    pub handle: glow::Program,
    pub uniforms: Uniforms,
}

fn vert_prelude(profile: Profile) -> String {
    match profile {
        Profile::Gles2 => format!("#define MAX_LIGHTS {}\n", profile.max_lights()),
        Profile::Gles3 => format!(
            "#version 300 es\n\
             #define attribute in\n\
             #define varying out\n\
             #define MAX_LIGHTS {}\n",
            profile.max_lights()
        ),
    }
}

fn frag_prelude(profile: Profile) -> String {
    match profile {
        Profile::Gles2 => format!("#define MAX_LIGHTS {}\n", profile.max_lights()),
        Profile::Gles3 => format!(
            "#version 300 es\n\
             #define varying in\n\
             #define texture2D texture\n\
             out mediump vec4 o_frag_color;\n\
             #define gl_FragColor o_frag_color\n\
             #define MAX_LIGHTS {}\n",
            profile.max_lights()
        ),
    }
}

impl Program {
    pub fn new(gl: &glow::Context, profile: Profile) -> Result<Self, String> {
        unsafe {
            let program = gl.create_program()?;
            let compile = |ty, src: &str| -> Result<glow::Shader, String> {
                let sh = gl.create_shader(ty)?;
                gl.shader_source(sh, src);
                gl.compile_shader(sh);
                if !gl.get_shader_compile_status(sh) {
                    let log = gl.get_shader_info_log(sh);
                    gl.delete_shader(sh);
                    return Err(log);
                }
                Ok(sh)
            };

            let vert = compile(
                glow::VERTEX_SHADER,
                &format!("{}{}", vert_prelude(profile), VERT_BODY),
            )?;
            let frag = compile(
                glow::FRAGMENT_SHADER,
                &format!("{}{}", frag_prelude(profile), FRAG_BODY),
            )?;

            gl.attach_shader(program, vert);
            gl.attach_shader(program, frag);

            gl.bind_attrib_location(program, ATTRIB_POSITION, "a_position");
            gl.bind_attrib_location(program, ATTRIB_NORMAL, "a_normal");
            gl.bind_attrib_location(program, ATTRIB_COLOR, "a_color");
            gl.bind_attrib_location(program, ATTRIB_TEXCOORD0, "a_texcoord0");
            gl.bind_attrib_location(program, ATTRIB_TEXCOORD1, "a_texcoord1");

            gl.link_program(program);
            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.detach_shader(program, vert);
                gl.detach_shader(program, frag);
                gl.delete_shader(vert);
                gl.delete_shader(frag);
                gl.delete_program(program);
                return Err(log);
            }
            gl.detach_shader(program, vert);
            gl.detach_shader(program, frag);
            gl.delete_shader(vert);
            gl.delete_shader(frag);

            let get = |name: &str| {
                let loc = gl.get_uniform_location(program, name);
                if loc.is_none() {
                    debug!("uniform {name} inactive");
                }
                loc
            };
            let get_indexed = |name: &str| {
                let mut out = [const { None }; MAX_LIGHTS];
                for (i, slot) in out.iter_mut().enumerate().take(profile.max_lights()) {
                    *slot = get(&format!("{name}[{i}]"));
                }
                out
            };

            let uniforms = Uniforms {
                mv: get("u_mv"),
                proj: get("u_proj"),
                normal_mat: get("u_normal_mat"),
                tex_matrix: get("u_tex_matrix"),
                use_color_array: get("u_use_color_array"),
                current_color: get("u_current_color"),
                lighting: get("u_lighting"),
                ambient: get("u_ambient"),
                num_lights: get("u_num_lights"),
                light_pos: get_indexed("u_light_pos"),
                light_diff: get_indexed("u_light_diff"),
                light_amb: get_indexed("u_light_amb"),
                fog: get("u_fog"),
                fog_mode: get("u_fog_mode"),
                fog_start: get("u_fog_start"),
                fog_end: get("u_fog_end"),
                fog_density: get("u_fog_density"),
                fog_color: get("u_fog_color"),
                alpha_test: get("u_alpha_test"),
                alpha_func: get("u_alpha_func"),
                alpha_ref: get("u_alpha_ref"),
                texture0: get("u_texture0"),
                texture1: get("u_texture1"),
                texenv0: get("u_texenv0"),
                texenv1: get("u_texenv1"),
                texgen: get("u_texgen"),
            };

            // Sampler bindings are fixed for the program's lifetime.
            gl.use_program(Some(program));
            gl.uniform_1_i32(gl.get_uniform_location(program, "u_sampler0").as_ref(), 0);
            gl.uniform_1_i32(gl.get_uniform_location(program, "u_sampler1").as_ref(), 1);
            gl.use_program(None);

            Ok(Self {
                handle: program,
                uniforms,
            })
        }
    }

    pub fn destroy(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_program(self.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FRAG_BODY, VERT_BODY, frag_prelude, vert_prelude};
    use crate::Profile;

    #[test]
    fn gles3_prelude_rewrites_the_legacy_dialect() {
        let v = vert_prelude(Profile::Gles3);
        assert!(v.starts_with("#version 300 es"));
        assert!(v.contains("#define attribute in"));
        assert!(v.contains("#define MAX_LIGHTS 8"));

        let f = frag_prelude(Profile::Gles3);
        assert!(f.contains("#define gl_FragColor o_frag_color"));
        assert!(f.contains("#define texture2D texture"));
    }

    #[test]
    fn gles2_prelude_keeps_the_es100_dialect() {
        let v = vert_prelude(Profile::Gles2);
        assert!(!v.contains("#version"));
        assert!(v.contains("#define MAX_LIGHTS 4"));
    }

    #[test]
    fn shader_bodies_reference_every_pipeline_stage() {
        for needle in ["u_mv", "u_normal_mat", "u_num_lights", "u_texgen"] {
            assert!(VERT_BODY.contains(needle), "vertex body missing {needle}");
        }
        for needle in ["u_alpha_func", "u_fog_mode", "u_texenv1", "texture2D"] {
            assert!(FRAG_BODY.contains(needle), "fragment body missing {needle}");
        }
    }

    #[test]
    fn add_and_combine_add_take_separate_fragment_branches() {
        // Add multiplies the alphas; combine-add keeps the fragment alpha.
        // Folding them into one branch would change alpha-test and blending
        // results for combine-add surfaces.
        assert!(FRAG_BODY.contains("env == 1"));
        assert!(FRAG_BODY.contains("env == 3"));
        assert!(!FRAG_BODY.contains("env == 1 || env == 3"));
        assert!(FRAG_BODY.contains("c.a);"));
    }
}
