//! The emulated context: one facade speaking the legacy GL 1.x vocabulary.
//!
//! The host creates the window and the real `glow::Context`; from there the
//! renderer talks only to [`Context`]. State-setting calls mutate
//! [`RenderState`] on the CPU, draw calls assemble vertices and hand them to
//! the dispatcher, and anything the engine does not interpret is passed
//! through to the driver untouched.

use glow::HasContext;
use log::{debug, info, warn};

use crate::arrays::{self, IndexType};
use crate::dispatch;
use crate::glenum;
use crate::matrix::MatrixTarget;
use crate::program::Program;
use crate::state::{AlphaFunc, FogMode, RenderState, TexEnvMode};
use crate::vertex::{self, Primitive};
use crate::Profile;

/// One emulated fixed-function context over a real shader-only one.
///
/// Holds raw client-array pointers between the pointer calls and the draw,
/// so it is neither `Send` nor `Sync`, matching the thread affinity of the
/// GL context it wraps.
pub struct Context {
    pub gl: glow::Context,
    profile: Profile,
    program: Program,
    vbo: glow::Buffer,
    ibo: glow::Buffer,
    vao: Option<glow::VertexArray>,
    pub state: RenderState,
    /// Texture bound per unit, recorded at bind time so unit-enable
    /// resolution never queries the driver.
    bound: [Option<glow::Texture>; 2],
    /// Server-side active texture unit (0 or 1).
    active_unit: usize,
    /// One-shot flag for the 32-bit-index limitation warning.
    wide_index_warned: bool,
}

fn unit_index(unit: u32) -> Option<usize> {
    match unit {
        glenum::GL_TEXTURE0 => Some(0),
        glenum::GL_TEXTURE1 => Some(1),
        _ => None,
    }
}

impl Context {
    /// Wraps a ready `glow::Context`. Compiles the pipeline program and
    /// allocates the stream buffers; the shader info log is the error on
    /// failure.
    pub fn new(gl: glow::Context, profile: Profile) -> Result<Self, String> {
        info!("initializing fixed-function pipeline ({profile:?})");
        let program = Program::new(&gl, profile)?;
        let (vbo, ibo, vao) = unsafe {
            let vbo = gl.create_buffer()?;
            let ibo = gl.create_buffer()?;
            let vao = if profile.uses_vao() {
                Some(gl.create_vertex_array()?)
            } else {
                None
            };
            (vbo, ibo, vao)
        };
        info!(
            "pipeline ready: {} lights, {}-bit indices",
            profile.max_lights(),
            if profile.supports_u32_indices() { 32 } else { 16 }
        );
        Ok(Self {
            gl,
            profile,
            program,
            vbo,
            ibo,
            vao,
            state: RenderState::new(),
            bound: [None; 2],
            active_unit: 0,
            wide_index_warned: false,
        })
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Releases the GPU objects. The `glow::Context` itself is returned to
    /// the host, which owns its lifetime.
    pub fn destroy(self) -> glow::Context {
        self.program.destroy(&self.gl);
        unsafe {
            self.gl.delete_buffer(self.vbo);
            self.gl.delete_buffer(self.ibo);
            if let Some(vao) = self.vao {
                self.gl.delete_vertex_array(vao);
            }
        }
        self.gl
    }

    // --- Matrix stack -----------------------------------------------------

    pub fn matrix_mode(&mut self, mode: u32) {
        if let Some(target) = MatrixTarget::from_gl(mode) {
            self.state.matrices.set_target(target);
        }
    }

    pub fn load_identity(&mut self) {
        self.state.matrices.load_identity();
    }

    pub fn load_matrixf(&mut self, m: &[f32; 16]) {
        self.state.matrices.load(m);
    }

    pub fn mult_matrixf(&mut self, m: &[f32; 16]) {
        self.state.matrices.mult(m);
    }

    pub fn push_matrix(&mut self) {
        self.state.matrices.push();
    }

    pub fn pop_matrix(&mut self) {
        self.state.matrices.pop();
    }

    pub fn translatef(&mut self, x: f32, y: f32, z: f32) {
        self.state.matrices.translate(x, y, z);
    }

    pub fn scalef(&mut self, x: f32, y: f32, z: f32) {
        self.state.matrices.scale(x, y, z);
    }

    pub fn rotatef(&mut self, angle_deg: f32, x: f32, y: f32, z: f32) {
        self.state.matrices.rotate(angle_deg, x, y, z);
    }

    pub fn ortho(&mut self, l: f64, r: f64, b: f64, t: f64, n: f64, f: f64) {
        self.state.matrices.ortho(l, r, b, t, n, f);
    }

    pub fn frustum(&mut self, l: f64, r: f64, b: f64, t: f64, n: f64, f: f64) {
        self.state.matrices.frustum(l, r, b, t, n, f);
    }

    pub fn modelview_matrix(&self) -> [f32; 16] {
        self.state.matrices.modelview().to_cols_array()
    }

    pub fn projection_matrix(&self) -> [f32; 16] {
        self.state.matrices.projection().to_cols_array()
    }

    pub fn texture_matrix(&self) -> [f32; 16] {
        self.state.matrices.texture().to_cols_array()
    }

    // --- Enables ----------------------------------------------------------

    /// `glEnable`. Pipeline capabilities update emulated state; desktop-only
    /// capabilities with no modern meaning are swallowed; everything else
    /// goes straight to the driver.
    pub fn enable(&mut self, cap: u32) {
        self.set_cap(cap, true);
    }

    pub fn disable(&mut self, cap: u32) {
        self.set_cap(cap, false);
    }

    fn set_cap(&mut self, cap: u32, on: bool) {
        let fixed = &mut self.state.fixed;
        match cap {
            glenum::GL_LIGHTING => fixed.lighting = on,
            glenum::GL_LIGHT0..=glenum::GL_LIGHT7 => {
                fixed.lights[(cap - glenum::GL_LIGHT0) as usize].enabled = on;
            }
            glenum::GL_FOG => fixed.fog.enabled = on,
            glenum::GL_ALPHA_TEST => fixed.alpha_test.enabled = on,
            glenum::GL_TEXTURE_2D => fixed.texture_2d[self.active_unit] = on,
            glenum::GL_TEXTURE_GEN_S => fixed.texgen_s = on,
            glenum::GL_TEXTURE_GEN_T => fixed.texgen_t = on,
            glenum::GL_COLOR_MATERIAL
            | glenum::GL_NORMALIZE
            | glenum::GL_RESCALE_NORMAL
            | glenum::GL_COLOR_LOGIC_OP
            | glenum::GL_LINE_SMOOTH
            | glenum::GL_LINE_STIPPLE
            | glenum::GL_TEXTURE_1D => {
                // No modern counterpart; swallowed so the driver never sees
                // an invalid enum.
            }
            _ => unsafe {
                if on {
                    self.gl.enable(cap);
                } else {
                    self.gl.disable(cap);
                }
            },
        }
    }

    pub fn is_enabled(&self, cap: u32) -> bool {
        let fixed = &self.state.fixed;
        match cap {
            glenum::GL_LIGHTING => fixed.lighting,
            glenum::GL_LIGHT0..=glenum::GL_LIGHT7 => {
                fixed.lights[(cap - glenum::GL_LIGHT0) as usize].enabled
            }
            glenum::GL_FOG => fixed.fog.enabled,
            glenum::GL_ALPHA_TEST => fixed.alpha_test.enabled,
            glenum::GL_TEXTURE_2D => fixed.texture_2d[self.active_unit],
            glenum::GL_TEXTURE_GEN_S => fixed.texgen_s,
            glenum::GL_TEXTURE_GEN_T => fixed.texgen_t,
            glenum::GL_COLOR_MATERIAL
            | glenum::GL_NORMALIZE
            | glenum::GL_RESCALE_NORMAL
            | glenum::GL_COLOR_LOGIC_OP
            | glenum::GL_LINE_SMOOTH
            | glenum::GL_LINE_STIPPLE
            | glenum::GL_TEXTURE_1D => false,
            _ => unsafe { self.gl.is_enabled(cap) },
        }
    }

    // --- Lighting and material ---------------------------------------------

    pub fn lightfv(&mut self, light: u32, pname: u32, params: &[f32]) {
        if !(glenum::GL_LIGHT0..=glenum::GL_LIGHT7).contains(&light) {
            return;
        }
        let index = (light - glenum::GL_LIGHT0) as usize;
        if pname == glenum::GL_POSITION {
            if params.len() < 4 {
                return;
            }
            let pos = [params[0], params[1], params[2], params[3]];
            let mv = *self.state.matrices.modelview();
            self.state.fixed.set_light_position(index, pos, &mv);
        } else {
            self.state.fixed.set_light_param(index, pname, params);
        }
    }

    pub fn light_modelfv(&mut self, pname: u32, params: &[f32]) {
        if pname == glenum::GL_LIGHT_MODEL_AMBIENT && params.len() >= 4 {
            self.state.fixed.scene_ambient = [params[0], params[1], params[2], params[3]];
        }
    }

    pub fn light_modeli(&mut self, pname: u32, _param: i32) {
        // Two-sided lighting and friends have no counterpart here.
        if pname != glenum::GL_LIGHT_MODEL_AMBIENT {
            debug!("light model {pname:#x} ignored");
        }
    }

    /// `glColorMaterial`. Accepted so callers that pair it with the
    /// (swallowed) `GL_COLOR_MATERIAL` capability keep working.
    pub fn color_material(&mut self, _face: u32, _mode: u32) {}

    /// `glMaterialfv`. The face argument is accepted for source
    /// compatibility; front and back share one material here.
    pub fn materialfv(&mut self, _face: u32, pname: u32, params: &[f32]) {
        self.state.fixed.set_material_param(pname, params);
    }

    pub fn materialf(&mut self, _face: u32, pname: u32, param: f32) {
        self.state.fixed.set_material_param(pname, &[param]);
    }

    // --- Fog ----------------------------------------------------------------

    pub fn fogf(&mut self, pname: u32, param: f32) {
        let fog = &mut self.state.fixed.fog;
        match pname {
            glenum::GL_FOG_DENSITY => fog.density = param,
            glenum::GL_FOG_START => fog.start = param,
            glenum::GL_FOG_END => fog.end = param,
            glenum::GL_FOG_MODE => self.fogi(pname, param as i32),
            _ => {}
        }
    }

    pub fn fogi(&mut self, pname: u32, param: i32) {
        match pname {
            glenum::GL_FOG_MODE => {
                if let Some(mode) = FogMode::from_gl(param as u32) {
                    self.state.fixed.fog.mode = mode;
                }
            }
            _ => self.fogf(pname, param as f32),
        }
    }

    pub fn fogfv(&mut self, pname: u32, params: &[f32]) {
        if pname == glenum::GL_FOG_COLOR && params.len() >= 4 {
            self.state.fixed.fog.color = [params[0], params[1], params[2], params[3]];
        } else if let Some(&p) = params.first() {
            self.fogf(pname, p);
        }
    }

    // --- Alpha test ----------------------------------------------------------

    pub fn alpha_func(&mut self, func: u32, reference: f32) {
        if let Some(func) = AlphaFunc::from_gl(func) {
            self.state.fixed.alpha_test.func = func;
            self.state.fixed.alpha_test.reference = reference;
        }
    }

    // --- Texture environment ---------------------------------------------------

    pub fn tex_envi(&mut self, target: u32, pname: u32, param: i32) {
        if target != glenum::GL_TEXTURE_ENV {
            return;
        }
        match pname {
            glenum::GL_TEXTURE_ENV_MODE => {
                self.state.fixed.texenv[self.active_unit] = TexEnvMode::from_gl(param as u32);
            }
            // A combine setup selecting ADD for RGB is the one combine
            // configuration legacy content actually uses.
            glenum::GL_COMBINE_RGB if param as u32 == glenum::GL_ADD => {
                self.state.fixed.texenv[self.active_unit] = TexEnvMode::CombineAdd;
            }
            _ => {}
        }
    }

    pub fn tex_envf(&mut self, target: u32, pname: u32, param: f32) {
        self.tex_envi(target, pname, param as i32);
    }

    /// `glTexGeni`. Sphere mapping is the only generation mode implemented;
    /// it feeds texture unit 1 once `GL_TEXTURE_GEN_S`/`_T` are enabled.
    pub fn tex_geni(&mut self, coord: u32, pname: u32, param: i32) {
        if pname != glenum::GL_TEXTURE_GEN_MODE {
            return;
        }
        if param as u32 != glenum::GL_SPHERE_MAP {
            debug!("texgen mode {param:#x} unsupported, ignoring");
            return;
        }
        // Mode accepted; the enable flags gate it.
        let _ = coord;
    }

    // --- Current attributes -------------------------------------------------

    pub fn color4f(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.state.fixed.current_color = [r, g, b, a];
    }

    pub fn color3f(&mut self, r: f32, g: f32, b: f32) {
        self.color4f(r, g, b, 1.0);
    }

    pub fn color4fv(&mut self, c: &[f32; 4]) {
        self.state.fixed.current_color = *c;
    }

    pub fn color3fv(&mut self, c: &[f32; 3]) {
        self.color4f(c[0], c[1], c[2], 1.0);
    }

    pub fn color4ub(&mut self, r: u8, g: u8, b: u8, a: u8) {
        self.color4f(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        );
    }

    pub fn normal3f(&mut self, x: f32, y: f32, z: f32) {
        self.state.fixed.current_normal = [x, y, z];
    }

    pub fn tex_coord2f(&mut self, s: f32, t: f32) {
        self.state.fixed.current_texcoord = [s, t];
    }

    pub fn tex_coord2fv(&mut self, st: &[f32; 2]) {
        self.state.fixed.current_texcoord = *st;
    }

    // --- Texture units ----------------------------------------------------------

    pub fn active_texture(&mut self, unit: u32) {
        if let Some(i) = unit_index(unit) {
            self.active_unit = i;
        }
        unsafe { self.gl.active_texture(unit) };
    }

    /// `glBindTexture`, recording 2D bindings so draw-time unit resolution
    /// never has to query the driver.
    pub fn bind_texture(&mut self, target: u32, texture: Option<glow::Texture>) {
        if target == glow::TEXTURE_2D {
            self.bound[self.active_unit] = texture;
        }
        unsafe { self.gl.bind_texture(target, texture) };
    }

    // --- Client arrays -------------------------------------------------------

    pub fn enable_client_state(&mut self, array: u32) {
        self.set_client_state(array, true);
    }

    pub fn disable_client_state(&mut self, array: u32) {
        self.set_client_state(array, false);
    }

    fn set_client_state(&mut self, array: u32, on: bool) {
        let arrays = &mut self.state.arrays;
        match array {
            glenum::GL_VERTEX_ARRAY => arrays.position.enabled = on,
            glenum::GL_NORMAL_ARRAY => arrays.normal.enabled = on,
            glenum::GL_COLOR_ARRAY => arrays.color.enabled = on,
            glenum::GL_TEXTURE_COORD_ARRAY => {
                arrays.texcoord[arrays.active_texcoord_unit].enabled = on;
            }
            _ => {}
        }
    }

    pub fn client_active_texture(&mut self, unit: u32) {
        if let Some(i) = unit_index(unit) {
            self.state.arrays.active_texcoord_unit = i;
        }
    }

    pub fn vertex_pointer(&mut self, size: i32, ty: u32, stride: i32, ptr: *const u8) {
        self.state.arrays.position.set(size, ty, stride, ptr);
    }

    pub fn normal_pointer(&mut self, ty: u32, stride: i32, ptr: *const u8) {
        self.state.arrays.normal.set(3, ty, stride, ptr);
    }

    pub fn color_pointer(&mut self, size: i32, ty: u32, stride: i32, ptr: *const u8) {
        self.state.arrays.color.set(size, ty, stride, ptr);
    }

    pub fn tex_coord_pointer(&mut self, size: i32, ty: u32, stride: i32, ptr: *const u8) {
        let unit = self.state.arrays.active_texcoord_unit;
        self.state.arrays.texcoord[unit].set(size, ty, stride, ptr);
    }

    // --- Queries ------------------------------------------------------------

    pub fn get_floatv(&self, pname: u32, out: &mut [f32]) {
        match pname {
            glenum::GL_MODELVIEW_MATRIX => out[..16].copy_from_slice(&self.modelview_matrix()),
            glenum::GL_PROJECTION_MATRIX => out[..16].copy_from_slice(&self.projection_matrix()),
            glenum::GL_TEXTURE_MATRIX => out[..16].copy_from_slice(&self.texture_matrix()),
            glenum::GL_MATRIX_MODE => out[0] = self.state.matrices.target().to_gl() as f32,
            _ => unsafe { self.gl.get_parameter_f32_slice(pname, out) },
        }
    }

    pub fn get_integerv(&self, pname: u32, out: &mut [i32]) {
        match pname {
            glenum::GL_MATRIX_MODE => out[0] = self.state.matrices.target().to_gl() as i32,
            glenum::GL_MODELVIEW_MATRIX
            | glenum::GL_PROJECTION_MATRIX
            | glenum::GL_TEXTURE_MATRIX => {
                let mut m = [0.0f32; 16];
                self.get_floatv(pname, &mut m);
                for (o, v) in out.iter_mut().zip(m.iter()) {
                    *o = *v as i32;
                }
            }
            _ => unsafe { self.gl.get_parameter_i32_slice(pname, out) },
        }
    }

    // --- Display lists / polygon mode (accepted, not emulated) -----------------

    pub fn new_list(&mut self, _list: u32, _mode: u32) {
        debug!("display lists not emulated");
    }

    pub fn end_list(&mut self) {}

    pub fn call_list(&mut self, _list: u32) {}

    pub fn delete_lists(&mut self, _list: u32, _range: i32) {}

    pub fn polygon_mode(&mut self, _face: u32, _mode: u32) {
        debug!("polygon mode not emulated");
    }

    // --- Draws ---------------------------------------------------------------

    /// Texturing decision per unit: the cap must be on, a texture bound, and
    /// coordinates available from the given sources.
    fn units_enabled(&self, coords_available: [bool; 2]) -> [bool; 2] {
        let fixed = &self.state.fixed;
        [
            fixed.texture_2d[0] && self.bound[0].is_some() && coords_available[0],
            fixed.texture_2d[1] && self.bound[1].is_some() && coords_available[1],
        ]
    }

    /// `glDrawArrays` over the client arrays.
    ///
    /// # Safety
    ///
    /// Every enabled array pointer must be valid for elements
    /// `first .. first + count` at its declared layout.
    pub unsafe fn draw_arrays(&mut self, mode: u32, first: i32, count: i32) {
        let Some(prim) = Primitive::from_gl(mode) else {
            warn!("draw_arrays: unknown primitive {mode:#x}");
            return;
        };
        if count <= 0 || first < 0 {
            return;
        }
        let vertices = unsafe {
            arrays::gather(
                &self.state.arrays,
                first as usize,
                count as usize,
                self.state.fixed.current_color,
            )
        };
        let indices = vertex::decompose_range(prim, vertices.len())
            .map(|ix| dispatch::make_index_buffer(self.profile, ix, &mut self.wide_index_warned));
        let indices = match indices {
            Some(None) => return, // undrawable on this profile
            Some(Some(buf)) => Some(buf),
            None => None,
        };
        self.dispatch(prim, &vertices, indices.as_ref());
    }

    /// `glDrawElements` over the client arrays.
    ///
    /// # Safety
    ///
    /// `indices` must reference `count` valid indices of the given type, and
    /// every enabled array pointer must cover the highest index referenced.
    pub unsafe fn draw_elements(&mut self, mode: u32, count: i32, ty: u32, indices: *const u8) {
        let Some(prim) = Primitive::from_gl(mode) else {
            warn!("draw_elements: unknown primitive {mode:#x}");
            return;
        };
        let Some(ty) = IndexType::from_gl(ty) else {
            warn!("draw_elements: unknown index type");
            return;
        };
        if count <= 0 {
            return;
        }
        let wide = unsafe { arrays::read_indices(ty, count as usize, indices) };
        let Some(&max) = wide.iter().max() else {
            return;
        };
        let vertices = unsafe {
            arrays::gather(
                &self.state.arrays,
                0,
                max as usize + 1,
                self.state.fixed.current_color,
            )
        };
        let lowered = vertex::decompose(prim, &wide).unwrap_or(wide);
        let Some(buf) =
            dispatch::make_index_buffer(self.profile, lowered, &mut self.wide_index_warned)
        else {
            return;
        };
        self.dispatch(prim, &vertices, Some(&buf));
    }

    fn dispatch(
        &mut self,
        prim: Primitive,
        vertices: &[crate::Vertex],
        indices: Option<&dispatch::IndexBuffer>,
    ) {
        let arrays = &self.state.arrays;
        let coords = [
            arrays.texcoord_enabled(0),
            arrays.texcoord_enabled(1) || self.state.fixed.texgen_active(),
        ];
        let unit_enabled = self.units_enabled(coords);
        dispatch::draw(
            &self.gl,
            self.profile,
            &self.program,
            self.vbo,
            self.ibo,
            self.vao,
            &self.state,
            prim,
            vertices,
            indices,
            unit_enabled,
            arrays.color.enabled,
        );
    }

    // --- Immediate mode ---------------------------------------------------------

    pub fn begin(&mut self, mode: u32) {
        let Some(prim) = Primitive::from_gl(mode) else {
            warn!("begin: unknown primitive {mode:#x}");
            return;
        };
        self.state.immediate.begin(prim);
    }

    pub fn vertex3f(&mut self, x: f32, y: f32, z: f32) {
        let fixed = &self.state.fixed;
        let (normal, texcoord, color) = (
            fixed.current_normal,
            fixed.current_texcoord,
            fixed.current_color,
        );
        self.state.immediate.emit([x, y, z], normal, texcoord, color);
    }

    pub fn vertex2f(&mut self, x: f32, y: f32) {
        self.vertex3f(x, y, 0.0);
    }

    pub fn vertex3fv(&mut self, v: &[f32; 3]) {
        self.vertex3f(v[0], v[1], v[2]);
    }

    /// `glEnd`: closes the batch, lowers the topology and draws.
    pub fn end(&mut self) {
        let Some((prim, verts)) = self.state.immediate.end() else {
            return;
        };
        let vertices = verts.to_vec();

        let indices = vertex::decompose_range(prim, vertices.len())
            .map(|ix| dispatch::make_index_buffer(self.profile, ix, &mut self.wide_index_warned));
        let indices = match indices {
            Some(None) => return,
            Some(Some(buf)) => Some(buf),
            None => None,
        };

        // Immediate vertices always carry a captured color; unit 0 always
        // has coordinates, unit 1 only through sphere mapping.
        let unit_enabled = self.units_enabled([true, self.state.fixed.texgen_active()]);
        dispatch::draw(
            &self.gl,
            self.profile,
            &self.program,
            self.vbo,
            self.ibo,
            self.vao,
            &self.state,
            prim,
            &vertices,
            indices.as_ref(),
            unit_enabled,
            true,
        );
    }
}
