//! Fixed-function pipeline state: everything legacy `glEnable`, `glLight*`,
//! `glFog*`, `glAlphaFunc`, `glTexEnv*` and friends mutate. Plain data with
//! no GPU knowledge; the draw dispatcher reads it into uniforms.

use crate::arrays::ClientArrays;
use crate::glenum;
use crate::immediate::ImmediateBuffer;
use crate::matrix::MatrixEngine;
use glam::{Mat4, Vec4};

/// Light slots carried in state. How many the shader actually iterates is
/// capped by [`crate::Profile::max_lights`].
pub const MAX_LIGHTS: usize = 8;

/// Fog attenuation curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FogMode {
    Linear,
    Exp,
    Exp2,
}

impl FogMode {
    pub fn from_gl(mode: u32) -> Option<Self> {
        match mode {
            glenum::GL_LINEAR => Some(FogMode::Linear),
            glenum::GL_EXP => Some(FogMode::Exp),
            glenum::GL_EXP2 => Some(FogMode::Exp2),
            _ => None,
        }
    }

    /// Integer the fragment shader switches on.
    pub(crate) fn shader_index(self) -> i32 {
        match self {
            FogMode::Linear => 0,
            FogMode::Exp => 1,
            FogMode::Exp2 => 2,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FogState {
    pub enabled: bool,
    pub mode: FogMode,
    pub start: f32,
    pub end: f32,
    pub density: f32,
    pub color: [f32; 4],
}

impl Default for FogState {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: FogMode::Linear,
            start: 0.0,
            end: 1.0,
            density: 1.0,
            color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl FogState {
    /// Blend factor toward the fragment color for an eye-space depth. This
    /// is the CPU statement of the fragment shader's fog rule; 1 means no
    /// fog, 0 means fully fogged. Always clamped into [0, 1].
    pub fn factor(&self, depth: f32) -> f32 {
        let f = match self.mode {
            FogMode::Linear => (self.end - depth) / (self.end - self.start),
            FogMode::Exp => (-self.density * depth).exp(),
            FogMode::Exp2 => {
                let d = self.density * depth;
                (-d * d).exp()
            }
        };
        f.clamp(0.0, 1.0)
    }
}

/// Alpha-test comparison. The fragment is kept only when the comparison of
/// its alpha against the reference succeeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlphaFunc {
    Never,
    Less,
    Equal,
    Lequal,
    Greater,
    Notequal,
    Gequal,
    Always,
}

impl AlphaFunc {
    pub fn from_gl(func: u32) -> Option<Self> {
        match func {
            glenum::GL_NEVER => Some(AlphaFunc::Never),
            glenum::GL_LESS => Some(AlphaFunc::Less),
            glenum::GL_EQUAL => Some(AlphaFunc::Equal),
            glenum::GL_LEQUAL => Some(AlphaFunc::Lequal),
            glenum::GL_GREATER => Some(AlphaFunc::Greater),
            glenum::GL_NOTEQUAL => Some(AlphaFunc::Notequal),
            glenum::GL_GEQUAL => Some(AlphaFunc::Gequal),
            glenum::GL_ALWAYS => Some(AlphaFunc::Always),
            _ => None,
        }
    }

    pub(crate) fn shader_index(self) -> i32 {
        match self {
            AlphaFunc::Never => 0,
            AlphaFunc::Less => 1,
            AlphaFunc::Equal => 2,
            AlphaFunc::Lequal => 3,
            AlphaFunc::Greater => 4,
            AlphaFunc::Notequal => 5,
            AlphaFunc::Gequal => 6,
            AlphaFunc::Always => 7,
        }
    }

    /// Whether a fragment with this alpha survives the test. CPU statement
    /// of the fragment shader's discard rule.
    pub fn keeps(self, alpha: f32, reference: f32) -> bool {
        match self {
            AlphaFunc::Never => false,
            AlphaFunc::Less => alpha < reference,
            AlphaFunc::Equal => alpha == reference,
            AlphaFunc::Lequal => alpha <= reference,
            AlphaFunc::Greater => alpha > reference,
            AlphaFunc::Notequal => alpha != reference,
            AlphaFunc::Gequal => alpha >= reference,
            AlphaFunc::Always => true,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AlphaTestState {
    pub enabled: bool,
    pub func: AlphaFunc,
    pub reference: f32,
}

impl Default for AlphaTestState {
    fn default() -> Self {
        Self {
            enabled: false,
            func: AlphaFunc::Always,
            reference: 0.0,
        }
    }
}

/// How a sampled texel combines with the incoming fragment color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TexEnvMode {
    Modulate,
    Add,
    Replace,
    CombineAdd,
}

impl TexEnvMode {
    /// Unrecognized legacy modes (including `GL_DECAL`) fall back to
    /// modulate, the fixed-function default.
    pub fn from_gl(mode: u32) -> Self {
        match mode {
            glenum::GL_ADD => TexEnvMode::Add,
            glenum::GL_REPLACE => TexEnvMode::Replace,
            glenum::GL_COMBINE => TexEnvMode::CombineAdd,
            _ => TexEnvMode::Modulate,
        }
    }

    pub(crate) fn shader_index(self) -> i32 {
        match self {
            TexEnvMode::Modulate => 0,
            TexEnvMode::Add => 1,
            TexEnvMode::Replace => 2,
            TexEnvMode::CombineAdd => 3,
        }
    }

    /// Combines a sampled texel with the incoming fragment color. CPU
    /// statement of the fragment shader's per-unit combine rule. Add
    /// multiplies the alphas; combine-add keeps the incoming alpha.
    pub fn apply(self, c: [f32; 4], texel: [f32; 4]) -> [f32; 4] {
        let add_rgb = |i: usize| (c[i] + texel[i]).clamp(0.0, 1.0);
        match self {
            TexEnvMode::Modulate => [
                c[0] * texel[0],
                c[1] * texel[1],
                c[2] * texel[2],
                c[3] * texel[3],
            ],
            TexEnvMode::Add => [add_rgb(0), add_rgb(1), add_rgb(2), c[3] * texel[3]],
            TexEnvMode::Replace => texel,
            TexEnvMode::CombineAdd => [add_rgb(0), add_rgb(1), add_rgb(2), c[3]],
        }
    }
}

/// One light source. The position is stored in eye space: it was pushed
/// through the modelview matrix current at the time it was set, and is NOT
/// re-transformed when the matrix later changes (legacy GL semantics).
/// `position.w == 0` means directional, `1` means positional.
#[derive(Clone, Copy, Debug)]
pub struct Light {
    pub enabled: bool,
    pub position: [f32; 4],
    pub diffuse: [f32; 4],
    pub ambient: [f32; 4],
    pub specular: [f32; 4],
}

impl Default for Light {
    fn default() -> Self {
        Self {
            enabled: false,
            position: [0.0, 0.0, 1.0, 0.0],
            diffuse: [1.0, 1.0, 1.0, 1.0],
            ambient: [0.0, 0.0, 0.0, 1.0],
            specular: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Global material block. Folded into the lighting uniforms at upload time;
/// the white defaults make that fold the identity until the caller sets
/// materials. Specular and shininess are accepted and stored but do not
/// feed the per-vertex equation.
#[derive(Clone, Copy, Debug)]
pub struct Material {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub emission: [f32; 4],
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: [1.0, 1.0, 1.0, 1.0],
            diffuse: [1.0, 1.0, 1.0, 1.0],
            specular: [0.0, 0.0, 0.0, 1.0],
            emission: [0.0, 0.0, 0.0, 0.0],
            shininess: 0.0,
        }
    }
}

/// Everything the legacy enable/disable and parameter calls mutate.
#[derive(Clone, Debug)]
pub struct FixedFunctionState {
    pub lighting: bool,
    pub lights: [Light; MAX_LIGHTS],
    pub scene_ambient: [f32; 4],
    pub material: Material,
    pub fog: FogState,
    pub alpha_test: AlphaTestState,
    /// Env mode per texture unit.
    pub texenv: [TexEnvMode; 2],
    /// `GL_TEXTURE_2D` enable per unit.
    pub texture_2d: [bool; 2],
    pub texgen_s: bool,
    pub texgen_t: bool,
    /// Current draw color, also captured into immediate-mode vertices and
    /// substituted when the color array is disabled.
    pub current_color: [f32; 4],
    pub current_normal: [f32; 3],
    pub current_texcoord: [f32; 2],
}

impl Default for FixedFunctionState {
    fn default() -> Self {
        Self {
            lighting: false,
            lights: [Light::default(); MAX_LIGHTS],
            scene_ambient: [0.2, 0.2, 0.2, 1.0],
            material: Material::default(),
            fog: FogState::default(),
            alpha_test: AlphaTestState::default(),
            texenv: [TexEnvMode::Modulate; 2],
            texture_2d: [false; 2],
            texgen_s: false,
            texgen_t: false,
            current_color: [1.0, 1.0, 1.0, 1.0],
            current_normal: [0.0, 0.0, 1.0],
            current_texcoord: [0.0, 0.0],
        }
    }
}

impl FixedFunctionState {
    /// Stores a light position in eye space. The incoming 4-vector is
    /// transformed by the modelview matrix current *now*; later matrix
    /// changes do not touch it. `w = 0` keeps the light directional.
    pub fn set_light_position(&mut self, index: usize, position: [f32; 4], modelview: &Mat4) {
        if index >= MAX_LIGHTS {
            return;
        }
        let eye = *modelview * Vec4::from_array(position);
        self.lights[index].position = eye.to_array();
    }

    pub fn set_light_param(&mut self, index: usize, pname: u32, params: &[f32]) {
        if index >= MAX_LIGHTS || params.len() < 4 {
            return;
        }
        let v = [params[0], params[1], params[2], params[3]];
        match pname {
            glenum::GL_AMBIENT => self.lights[index].ambient = v,
            glenum::GL_DIFFUSE => self.lights[index].diffuse = v,
            glenum::GL_SPECULAR => self.lights[index].specular = v,
            _ => {}
        }
    }

    pub fn set_material_param(&mut self, pname: u32, params: &[f32]) {
        match pname {
            glenum::GL_SHININESS => {
                if let Some(&s) = params.first() {
                    self.material.shininess = s;
                }
            }
            _ => {
                if params.len() < 4 {
                    return;
                }
                let v = [params[0], params[1], params[2], params[3]];
                match pname {
                    glenum::GL_AMBIENT => self.material.ambient = v,
                    glenum::GL_DIFFUSE => self.material.diffuse = v,
                    glenum::GL_SPECULAR => self.material.specular = v,
                    glenum::GL_EMISSION => self.material.emission = v,
                    glenum::GL_AMBIENT_AND_DIFFUSE => {
                        self.material.ambient = v;
                        self.material.diffuse = v;
                    }
                    _ => {}
                }
            }
        }
    }

    /// Ambient term the shader receives: scene ambient scaled by the
    /// material ambient, plus the material emission.
    pub fn effective_ambient(&self) -> [f32; 4] {
        let mut out = [0.0; 4];
        for i in 0..4 {
            out[i] = self.scene_ambient[i] * self.material.ambient[i] + self.material.emission[i];
        }
        out
    }

    /// Whether sphere-map texcoord generation feeds unit 1.
    pub fn texgen_active(&self) -> bool {
        self.texgen_s || self.texgen_t
    }
}

/// The complete mutable state of one emulated context: matrix stacks, fixed
/// pipeline state, client-array descriptors and the immediate-mode buffer.
/// One aggregate instead of process globals, so multiple contexts (and unit
/// tests) can coexist.
#[derive(Default)]
pub struct RenderState {
    pub matrices: MatrixEngine,
    pub fixed: FixedFunctionState,
    pub arrays: ClientArrays,
    pub immediate: ImmediateBuffer,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::{AlphaFunc, FixedFunctionState, FogMode, FogState, TexEnvMode};
    use crate::glenum;
    use glam::{Mat4, Vec3, Vec4};

    #[test]
    fn fog_factor_is_always_clamped() {
        let mut fog = FogState {
            enabled: true,
            mode: FogMode::Linear,
            start: 10.0,
            end: 20.0,
            density: 1.0,
            color: [0.0; 4],
        };
        // Closer than start: >1 before clamping.
        assert_eq!(fog.factor(0.0), 1.0);
        // Beyond end: negative before clamping.
        assert_eq!(fog.factor(100.0), 0.0);
        assert!((fog.factor(15.0) - 0.5).abs() < 1e-6);

        fog.mode = FogMode::Exp;
        for depth in [0.0, 0.5, 10.0, 1e6] {
            let f = fog.factor(depth);
            assert!((0.0..=1.0).contains(&f), "exp factor {f} out of range");
        }
        fog.mode = FogMode::Exp2;
        for depth in [0.0, 0.5, 10.0, 1e6] {
            let f = fog.factor(depth);
            assert!((0.0..=1.0).contains(&f), "exp2 factor {f} out of range");
        }
    }

    #[test]
    fn exp2_squares_the_density_depth_product() {
        let fog = FogState {
            mode: FogMode::Exp2,
            density: 0.25,
            ..FogState::default()
        };
        let d = 0.25f32 * 3.0;
        assert!((fog.factor(3.0) - (-d * d).exp()).abs() < 1e-6);
    }

    #[test]
    fn alpha_lequal_keeps_at_reference_and_discards_above() {
        let f = AlphaFunc::Lequal;
        assert!(f.keeps(0.5, 0.5));
        assert!(!f.keeps(0.51, 0.5));
        assert!(f.keeps(0.1, 0.5));
    }

    #[test]
    fn alpha_always_and_never_ignore_the_reference() {
        for alpha in [0.0, 0.25, 1.0] {
            for reference in [0.0, 0.5, 1.0] {
                assert!(AlphaFunc::Always.keeps(alpha, reference));
                assert!(!AlphaFunc::Never.keeps(alpha, reference));
            }
        }
    }

    #[test]
    fn alpha_func_maps_from_the_full_legacy_range() {
        assert_eq!(AlphaFunc::from_gl(glenum::GL_NEVER), Some(AlphaFunc::Never));
        assert_eq!(
            AlphaFunc::from_gl(glenum::GL_GEQUAL),
            Some(AlphaFunc::Gequal)
        );
        assert_eq!(AlphaFunc::from_gl(0xDEAD), None);
    }

    #[test]
    fn texenv_unknown_modes_fall_back_to_modulate() {
        assert_eq!(TexEnvMode::from_gl(glenum::GL_DECAL), TexEnvMode::Modulate);
        assert_eq!(TexEnvMode::from_gl(glenum::GL_ADD), TexEnvMode::Add);
        assert_eq!(TexEnvMode::from_gl(0xFFFF), TexEnvMode::Modulate);
    }

    #[test]
    fn texenv_combine_rules_match_the_fragment_contract() {
        let c = [0.5, 0.5, 0.5, 0.8];
        let texel = [0.25, 0.75, 1.0, 0.5];

        assert_eq!(TexEnvMode::Modulate.apply(c, texel), [0.125, 0.375, 0.5, 0.4]);
        assert_eq!(TexEnvMode::Replace.apply(c, texel), texel);
        // Add saturates rgb and multiplies the alphas.
        assert_eq!(TexEnvMode::Add.apply(c, texel), [0.75, 1.0, 1.0, 0.4]);
    }

    #[test]
    fn combine_add_adds_rgb_but_keeps_the_incoming_alpha() {
        let c = [0.5, 0.5, 0.5, 0.8];
        let texel = [0.25, 0.75, 1.0, 0.5];
        let out = TexEnvMode::CombineAdd.apply(c, texel);
        assert_eq!(&out[..3], &[0.75, 1.0, 1.0]);
        assert_eq!(out[3], 0.8, "combine-add must not darken alpha");
    }

    #[test]
    fn light_position_is_frozen_in_eye_space_at_set_time() {
        let mut state = FixedFunctionState::default();
        let mv = Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0));
        state.set_light_position(0, [1.0, 2.0, 3.0, 1.0], &mv);
        assert_eq!(state.lights[0].position, [1.0, 2.0, -7.0, 1.0]);

        // A later matrix is irrelevant; the stored value does not move.
        assert_eq!(state.lights[0].position, [1.0, 2.0, -7.0, 1.0]);
    }

    #[test]
    fn directional_light_direction_is_eye_independent() {
        // The shader rule: w == 0 uses normalize(pos.xyz) regardless of the
        // eye-space vertex; w == 1 points from the vertex to the light.
        let mut state = FixedFunctionState::default();
        state.set_light_position(0, [0.0, 0.0, 1.0, 0.0], &Mat4::IDENTITY);
        let pos = Vec4::from_array(state.lights[0].position);
        assert_eq!(pos.w, 0.0);

        let dir_at = |eye: Vec3| -> Vec3 {
            if pos.w == 0.0 {
                pos.truncate().normalize()
            } else {
                (pos.truncate() - eye).normalize()
            }
        };
        let d0 = dir_at(Vec3::new(0.0, 0.0, 0.0));
        let d1 = dir_at(Vec3::new(5.0, -3.0, 2.0));
        assert!((d0 - d1).length() < 1e-6);
        assert!((d0.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn positional_light_direction_depends_on_the_eye_position() {
        let mut state = FixedFunctionState::default();
        state.set_light_position(0, [0.0, 10.0, 0.0, 1.0], &Mat4::IDENTITY);
        let pos = Vec4::from_array(state.lights[0].position);
        assert_eq!(pos.w, 1.0);

        let dir_at = |eye: Vec3| (pos.truncate() - eye).normalize();
        let d0 = dir_at(Vec3::new(0.0, 0.0, 0.0));
        let d1 = dir_at(Vec3::new(20.0, 0.0, 0.0));
        assert!((d0 - d1).length() > 0.5);
    }

    #[test]
    fn material_fold_defaults_to_identity() {
        let state = FixedFunctionState::default();
        assert_eq!(state.effective_ambient(), state.scene_ambient);
    }

    #[test]
    fn ambient_and_diffuse_sets_both_material_terms() {
        let mut state = FixedFunctionState::default();
        state.set_material_param(glenum::GL_AMBIENT_AND_DIFFUSE, &[0.3, 0.4, 0.5, 1.0]);
        assert_eq!(state.material.ambient, [0.3, 0.4, 0.5, 1.0]);
        assert_eq!(state.material.diffuse, [0.3, 0.4, 0.5, 1.0]);
    }
}
