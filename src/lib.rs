//! Fixed-function OpenGL 1.x pipeline emulation for shader-only GL contexts.
//!
//! Legacy renderers drive the GPU through matrix stacks, per-vertex lighting,
//! fog, multitexture env-combine, alpha test and immediate-mode vertex
//! submission, none of which exist on GLES2/WebGL or GLES3. This crate
//! rebuilds that pipeline on top of a [`glow`] context:
//!
//! * software matrix stacks mirror the modelview/projection/texture state,
//! * one shader program encodes the fixed-function lighting, fog, texturing
//!   and alpha-test equations, with every piece of legacy state exposed as a
//!   uniform,
//! * client-side arrays and `begin`/`end` submissions are assembled into one
//!   interleaved stream buffer per draw, with quads, quad-strips and
//!   polygons decomposed into triangles.
//!
//! The host owns window and context creation; [`Context::new`] takes the
//! ready [`glow::Context`] plus a [`Profile`] selecting the shading-language
//! dialect, and from then on the [`Context`] methods speak the legacy
//! vocabulary (`matrix_mode`, `lightfv`, `begin`/`vertex3f`/`end`, …) with
//! the original parameter order.
//!
//! The engine is strictly single-threaded, like the rendering loops it was
//! built for: `Context` holds raw client-array pointers and is neither
//! `Send` nor `Sync`.

pub mod arrays;
pub mod context;
mod dispatch;
pub mod glenum;
pub mod immediate;
pub mod matrix;
pub mod program;
pub mod state;
pub mod vertex;

pub use context::Context;
pub use state::RenderState;
pub use vertex::Vertex;

/// Shading-language capability of the underlying context.
///
/// The two profiles solve the same problem and share one engine; they differ
/// only in GLSL dialect, light-count limit and index-width support.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Profile {
    /// GLSL ES 1.00 targets: WebGL 1, OpenGL ES 2.0.
    Gles2,
    /// GLSL ES 3.00 targets: WebGL 2, OpenGL ES 3.0.
    Gles3,
}

impl Profile {
    /// Number of light slots the shader loop iterates over.
    pub fn max_lights(self) -> usize {
        match self {
            Profile::Gles2 => 4,
            Profile::Gles3 => 8,
        }
    }

    /// Whether 32-bit element indices can be passed to the driver.
    ///
    /// WebGL 1 / GLES2 only accept them behind `OES_element_index_uint`,
    /// which we do not probe for; GLES3 supports them unconditionally.
    pub fn supports_u32_indices(self) -> bool {
        matches!(self, Profile::Gles3)
    }

    /// GLES3 cores require a vertex array object to be bound; GLES2/WebGL1
    /// have no VAOs without extensions, so attribute state is set directly.
    pub(crate) fn uses_vao(self) -> bool {
        matches!(self, Profile::Gles3)
    }
}
