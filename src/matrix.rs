//! Software matrix stacks mirroring the legacy modelview/projection/texture
//! state. All matrices are column-major; they cross the public API as
//! `[f32; 16]` arrays in the layout `glLoadMatrixf` expects.

use crate::glenum;
use glam::{Mat4, Vec3};

/// Legacy fixed stack depth. Push beyond it and pop at the bottom are
/// silently clamped, never fatal.
pub const STACK_DEPTH: usize = 32;

/// Which stack subsequent matrix operations apply to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatrixTarget {
    ModelView,
    Projection,
    Texture,
}

impl MatrixTarget {
    pub fn from_gl(mode: u32) -> Option<Self> {
        match mode {
            glenum::GL_MODELVIEW => Some(MatrixTarget::ModelView),
            glenum::GL_PROJECTION => Some(MatrixTarget::Projection),
            glenum::GL_TEXTURE => Some(MatrixTarget::Texture),
            _ => None,
        }
    }

    pub fn to_gl(self) -> u32 {
        match self {
            MatrixTarget::ModelView => glenum::GL_MODELVIEW,
            MatrixTarget::Projection => glenum::GL_PROJECTION,
            MatrixTarget::Texture => glenum::GL_TEXTURE,
        }
    }
}

/// One fixed-capacity matrix stack.
#[derive(Clone)]
pub struct MatrixStack {
    stack: [Mat4; STACK_DEPTH],
    top: usize,
}

impl MatrixStack {
    fn new() -> Self {
        Self {
            stack: [Mat4::IDENTITY; STACK_DEPTH],
            top: 0,
        }
    }

    /// Live top-of-stack matrix.
    pub fn top(&self) -> &Mat4 {
        &self.stack[self.top]
    }

    pub fn top_mut(&mut self) -> &mut Mat4 {
        &mut self.stack[self.top]
    }

    /// Current depth, 1-based (an empty stack still has its base matrix).
    pub fn depth(&self) -> usize {
        self.top + 1
    }

    /// Duplicates the top. A full stack ignores the push.
    pub fn push(&mut self) {
        if self.top < STACK_DEPTH - 1 {
            self.stack[self.top + 1] = self.stack[self.top];
            self.top += 1;
        }
    }

    /// Discards the top. Popping the base matrix is ignored.
    pub fn pop(&mut self) {
        if self.top > 0 {
            self.top -= 1;
        }
    }
}

/// The three matrix stacks plus the active-target selector.
pub struct MatrixEngine {
    modelview: MatrixStack,
    projection: MatrixStack,
    texture: MatrixStack,
    target: MatrixTarget,
}

impl Default for MatrixEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixEngine {
    pub fn new() -> Self {
        Self {
            modelview: MatrixStack::new(),
            projection: MatrixStack::new(),
            texture: MatrixStack::new(),
            target: MatrixTarget::ModelView,
        }
    }

    pub fn set_target(&mut self, target: MatrixTarget) {
        self.target = target;
    }

    pub fn target(&self) -> MatrixTarget {
        self.target
    }

    pub fn stack(&self, target: MatrixTarget) -> &MatrixStack {
        match target {
            MatrixTarget::ModelView => &self.modelview,
            MatrixTarget::Projection => &self.projection,
            MatrixTarget::Texture => &self.texture,
        }
    }

    fn stack_mut(&mut self) -> &mut MatrixStack {
        match self.target {
            MatrixTarget::ModelView => &mut self.modelview,
            MatrixTarget::Projection => &mut self.projection,
            MatrixTarget::Texture => &mut self.texture,
        }
    }

    /// Top of the currently selected stack.
    pub fn current(&self) -> &Mat4 {
        self.stack(self.target).top()
    }

    pub fn modelview(&self) -> &Mat4 {
        self.modelview.top()
    }

    pub fn projection(&self) -> &Mat4 {
        self.projection.top()
    }

    pub fn texture(&self) -> &Mat4 {
        self.texture.top()
    }

    pub fn load_identity(&mut self) {
        *self.stack_mut().top_mut() = Mat4::IDENTITY;
    }

    pub fn load(&mut self, m: &[f32; 16]) {
        *self.stack_mut().top_mut() = Mat4::from_cols_array(m);
    }

    /// Right-multiplies the incoming matrix: `current = current × m`,
    /// matching legacy composition order.
    pub fn mult(&mut self, m: &[f32; 16]) {
        let top = self.stack_mut().top_mut();
        *top = *top * Mat4::from_cols_array(m);
    }

    pub fn push(&mut self) {
        self.stack_mut().push();
    }

    pub fn pop(&mut self) {
        self.stack_mut().pop();
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        let top = self.stack_mut().top_mut();
        *top = *top * Mat4::from_translation(Vec3::new(x, y, z));
    }

    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        let top = self.stack_mut().top_mut();
        *top = *top * Mat4::from_scale(Vec3::new(x, y, z));
    }

    /// Rodrigues rotation of `angle` degrees around `(x, y, z)`. The axis is
    /// normalized internally; a near-zero-length axis makes this a no-op.
    pub fn rotate(&mut self, angle_deg: f32, x: f32, y: f32, z: f32) {
        let axis = Vec3::new(x, y, z);
        if axis.length() < 1e-7 {
            return;
        }
        let top = self.stack_mut().top_mut();
        *top = *top * Mat4::from_axis_angle(axis.normalize(), angle_deg.to_radians());
    }

    /// Multiplies an orthographic projection built from the six clip planes
    /// into the current matrix, as `glOrtho` does.
    pub fn ortho(&mut self, l: f64, r: f64, b: f64, t: f64, n: f64, f: f64) {
        let mut m = [0.0f32; 16];
        m[0] = (2.0 / (r - l)) as f32;
        m[5] = (2.0 / (t - b)) as f32;
        m[10] = (-2.0 / (f - n)) as f32;
        m[12] = (-(r + l) / (r - l)) as f32;
        m[13] = (-(t + b) / (t - b)) as f32;
        m[14] = (-(f + n) / (f - n)) as f32;
        m[15] = 1.0;
        self.mult(&m);
    }

    /// Multiplies a perspective frustum built from the six clip planes into
    /// the current matrix, as `glFrustum` does.
    pub fn frustum(&mut self, l: f64, r: f64, b: f64, t: f64, n: f64, f: f64) {
        let mut m = [0.0f32; 16];
        m[0] = (2.0 * n / (r - l)) as f32;
        m[5] = (2.0 * n / (t - b)) as f32;
        m[8] = ((r + l) / (r - l)) as f32;
        m[9] = ((t + b) / (t - b)) as f32;
        m[10] = (-(f + n) / (f - n)) as f32;
        m[11] = -1.0;
        m[14] = (-2.0 * f * n / (f - n)) as f32;
        self.mult(&m);
    }
}

#[cfg(test)]
mod tests {
    use super::{MatrixEngine, MatrixTarget, STACK_DEPTH};
    use glam::{Mat4, Vec4};

    fn assert_mat_eq(a: &Mat4, b: &Mat4, tol: f32) {
        let (a, b) = (a.to_cols_array(), b.to_cols_array());
        for i in 0..16 {
            assert!(
                (a[i] - b[i]).abs() <= tol,
                "matrices differ at element {i}: {} vs {}",
                a[i],
                b[i]
            );
        }
    }

    #[test]
    fn pop_restores_value_present_before_push() {
        let mut eng = MatrixEngine::new();
        eng.translate(3.0, -2.0, 5.0);
        eng.rotate(30.0, 0.0, 1.0, 0.0);
        let before = *eng.current();

        eng.push();
        eng.scale(9.0, 9.0, 9.0);
        eng.translate(1.0, 1.0, 1.0);
        eng.pop();

        assert_mat_eq(eng.current(), &before, 0.0);
    }

    #[test]
    fn depth_is_clamped_on_over_push_and_over_pop() {
        let mut eng = MatrixEngine::new();
        for _ in 0..100 {
            eng.push();
        }
        assert_eq!(eng.stack(MatrixTarget::ModelView).depth(), STACK_DEPTH);

        for _ in 0..300 {
            eng.pop();
        }
        assert_eq!(eng.stack(MatrixTarget::ModelView).depth(), 1);

        // Still usable after the abuse.
        eng.translate(1.0, 0.0, 0.0);
        eng.push();
        eng.pop();
        assert_eq!(eng.stack(MatrixTarget::ModelView).depth(), 1);
    }

    #[test]
    fn overfull_stack_ignores_push_instead_of_corrupting_top() {
        let mut eng = MatrixEngine::new();
        for i in 0..(STACK_DEPTH + 5) {
            eng.translate(i as f32, 0.0, 0.0);
            eng.push();
        }
        // The last few pushes were dropped, so the top keeps accumulating
        // translations without duplication.
        let x = eng.current().w_axis.x;
        let expected: f32 = (0..(STACK_DEPTH + 5)).map(|i| i as f32).sum();
        assert!((x - expected).abs() < 1e-3);
    }

    #[test]
    fn no_op_transforms_leave_identity() {
        let mut eng = MatrixEngine::new();
        eng.load_identity();
        eng.translate(0.0, 0.0, 0.0);
        eng.scale(1.0, 1.0, 1.0);
        eng.rotate(47.0, 0.0, 0.0, 0.0); // zero-length axis: no-op
        assert_mat_eq(eng.current(), &Mat4::IDENTITY, 1e-6);
    }

    #[test]
    fn rotation_axis_is_normalized() {
        let mut a = MatrixEngine::new();
        let mut b = MatrixEngine::new();
        a.rotate(90.0, 0.0, 0.0, 1.0);
        b.rotate(90.0, 0.0, 0.0, 10.0);
        assert_mat_eq(a.current(), b.current(), 1e-6);
    }

    #[test]
    fn symmetric_ortho_maps_corner_to_ndc_corner() {
        let (a, b, n, f) = (4.0, 3.0, 1.0, 100.0);
        let mut eng = MatrixEngine::new();
        eng.set_target(MatrixTarget::Projection);
        eng.ortho(-a, a, -b, b, n, f);

        let clip = *eng.projection() * Vec4::new(a as f32, b as f32, -(n as f32), 1.0);
        let ndc = clip / clip.w;
        assert!((ndc.x - 1.0).abs() < 1e-5);
        assert!((ndc.y - 1.0).abs() < 1e-5);
        assert!((ndc.z + 1.0).abs() < 1e-5);
    }

    #[test]
    fn symmetric_frustum_maps_near_corner_to_ndc_corner() {
        let (a, b, n, f) = (2.0, 1.5, 0.5, 200.0);
        let mut eng = MatrixEngine::new();
        eng.set_target(MatrixTarget::Projection);
        eng.frustum(-a, a, -b, b, n, f);

        let clip = *eng.projection() * Vec4::new(a as f32, b as f32, -(n as f32), 1.0);
        let ndc = clip / clip.w;
        assert!((ndc.x - 1.0).abs() < 1e-5);
        assert!((ndc.y - 1.0).abs() < 1e-5);
        assert!((ndc.z + 1.0).abs() < 1e-5);
    }

    #[test]
    fn mult_applies_incoming_on_the_right() {
        let mut eng = MatrixEngine::new();
        eng.translate(1.0, 0.0, 0.0);
        let rot = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2);
        eng.mult(&rot.to_cols_array());

        // current = T * R: a point at the origin lands on the translation.
        let p = *eng.current() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((p.x - 1.0).abs() < 1e-6 && p.y.abs() < 1e-6);
        // But the rotation applies before the translation for other points.
        let q = *eng.current() * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!((q.x - 1.0).abs() < 1e-5 && (q.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn stacks_are_independent_per_target() {
        let mut eng = MatrixEngine::new();
        eng.translate(5.0, 0.0, 0.0);
        eng.set_target(MatrixTarget::Projection);
        eng.load_identity();
        assert_mat_eq(eng.projection(), &Mat4::IDENTITY, 0.0);
        assert!((eng.modelview().w_axis.x - 5.0).abs() < 1e-6);
        eng.set_target(MatrixTarget::Texture);
        eng.scale(2.0, 2.0, 1.0);
        assert!((eng.texture().x_axis.x - 2.0).abs() < 1e-6);
        assert!((eng.projection().x_axis.x - 1.0).abs() < 1e-6);
    }
}
