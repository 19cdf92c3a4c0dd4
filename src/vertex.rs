//! The interleaved vertex every draw path produces, and the triangle
//! decomposition of the legacy primitives modern GL dropped.

use bytemuck::{Pod, Zeroable};

use crate::glenum;

/// One assembled vertex in the stream buffer. Both the client-array path and
/// the immediate path produce this exact layout, so a single set of attribute
/// pointers serves every draw.
///
/// 56 bytes: position at 0, normal at 12, color at 24, texcoord0 at 40,
/// texcoord1 at 48.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
    pub texcoord0: [f32; 2],
    pub texcoord1: [f32; 2],
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            normal: [0.0, 0.0, 1.0],
            color: [1.0, 1.0, 1.0, 1.0],
            texcoord0: [0.0, 0.0],
            texcoord1: [0.0, 0.0],
        }
    }
}

/// Legacy primitive topologies. Quads, quad strips and polygons have no
/// modern equivalent and are lowered to indexed triangle lists before the
/// driver sees them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
    QuadStrip,
    Polygon,
}

impl Primitive {
    pub fn from_gl(mode: u32) -> Option<Self> {
        match mode {
            glenum::GL_POINTS => Some(Primitive::Points),
            glenum::GL_LINES => Some(Primitive::Lines),
            glenum::GL_LINE_LOOP => Some(Primitive::LineLoop),
            glenum::GL_LINE_STRIP => Some(Primitive::LineStrip),
            glenum::GL_TRIANGLES => Some(Primitive::Triangles),
            glenum::GL_TRIANGLE_STRIP => Some(Primitive::TriangleStrip),
            glenum::GL_TRIANGLE_FAN => Some(Primitive::TriangleFan),
            glenum::GL_QUADS => Some(Primitive::Quads),
            glenum::GL_QUAD_STRIP => Some(Primitive::QuadStrip),
            glenum::GL_POLYGON => Some(Primitive::Polygon),
            _ => None,
        }
    }

    /// Topology handed to the driver. The three legacy shapes come out as
    /// triangles because [`decompose`] has already rewritten their indices.
    pub fn gl_mode(self) -> u32 {
        match self {
            Primitive::Points => glow::POINTS,
            Primitive::Lines => glow::LINES,
            Primitive::LineLoop => glow::LINE_LOOP,
            Primitive::LineStrip => glow::LINE_STRIP,
            Primitive::TriangleStrip => glow::TRIANGLE_STRIP,
            Primitive::TriangleFan => glow::TRIANGLE_FAN,
            Primitive::Triangles | Primitive::Quads | Primitive::QuadStrip | Primitive::Polygon => {
                glow::TRIANGLES
            }
        }
    }

    pub fn needs_decompose(self) -> bool {
        matches!(
            self,
            Primitive::Quads | Primitive::QuadStrip | Primitive::Polygon
        )
    }
}

/// Rewrites an index list for a legacy topology into a triangle list.
/// Returns `None` for topologies the driver draws natively. Trailing
/// vertices that do not complete a quad or triangle are dropped.
pub fn decompose(prim: Primitive, indices: &[u32]) -> Option<Vec<u32>> {
    match prim {
        Primitive::Quads => {
            let quads = indices.len() / 4;
            let mut out = Vec::with_capacity(quads * 6);
            for q in indices.chunks_exact(4) {
                out.extend_from_slice(&[q[0], q[1], q[2], q[0], q[2], q[3]]);
            }
            Some(out)
        }
        Primitive::QuadStrip => {
            let quads = indices.len().saturating_sub(2) / 2;
            let mut out = Vec::with_capacity(quads * 6);
            for i in 0..quads {
                let a = indices[2 * i];
                let b = indices[2 * i + 1];
                let c = indices[2 * i + 2];
                let d = indices[2 * i + 3];
                // Strip vertices alternate sides; swap to keep winding.
                out.extend_from_slice(&[a, b, c, b, d, c]);
            }
            Some(out)
        }
        Primitive::Polygon => {
            if indices.len() < 3 {
                return Some(Vec::new());
            }
            let mut out = Vec::with_capacity((indices.len() - 2) * 3);
            for i in 1..indices.len() - 1 {
                out.extend_from_slice(&[indices[0], indices[i], indices[i + 1]]);
            }
            Some(out)
        }
        _ => None,
    }
}

/// [`decompose`] over the implicit index sequence `0..count`, for
/// non-indexed draws.
pub fn decompose_range(prim: Primitive, count: usize) -> Option<Vec<u32>> {
    if !prim.needs_decompose() {
        return None;
    }
    let seq: Vec<u32> = (0..count as u32).collect();
    decompose(prim, &seq)
}

#[cfg(test)]
mod tests {
    use super::{Primitive, Vertex, decompose, decompose_range};

    #[test]
    fn vertex_layout_is_56_bytes() {
        assert_eq!(std::mem::size_of::<Vertex>(), 56);
        let v = Vertex::default();
        let base = &v as *const Vertex as usize;
        assert_eq!(v.normal.as_ptr() as usize - base, 12);
        assert_eq!(v.color.as_ptr() as usize - base, 24);
        assert_eq!(v.texcoord0.as_ptr() as usize - base, 40);
        assert_eq!(v.texcoord1.as_ptr() as usize - base, 48);
    }

    #[test]
    fn quad_becomes_two_triangles_sharing_the_diagonal() {
        let out = decompose(Primitive::Quads, &[0, 1, 2, 3]).unwrap();
        assert_eq!(out, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn quads_drop_a_trailing_partial_quad() {
        let out = decompose(Primitive::Quads, &[0, 1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(out, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn polygon_fans_from_the_first_vertex() {
        let out = decompose(Primitive::Polygon, &[0, 1, 2, 3, 4]).unwrap();
        assert_eq!(out, vec![0, 1, 2, 0, 2, 3, 0, 3, 4]);
    }

    #[test]
    fn degenerate_polygon_yields_nothing() {
        assert_eq!(decompose(Primitive::Polygon, &[0, 1]).unwrap(), vec![]);
    }

    #[test]
    fn quad_strip_emits_one_quad_per_vertex_pair() {
        // 6 vertices = 2 quads = 4 triangles.
        let out = decompose_range(Primitive::QuadStrip, 6).unwrap();
        assert_eq!(out.len(), 12);
        assert_eq!(&out[..6], &[0, 1, 2, 1, 3, 2]);
        assert_eq!(&out[6..], &[2, 3, 4, 3, 5, 4]);
    }

    #[test]
    fn quad_strip_ignores_an_odd_trailing_vertex() {
        let out = decompose_range(Primitive::QuadStrip, 5).unwrap();
        assert_eq!(out.len(), 6);
    }

    #[test]
    fn native_topologies_pass_through() {
        assert!(decompose(Primitive::Triangles, &[0, 1, 2]).is_none());
        assert!(decompose_range(Primitive::TriangleFan, 5).is_none());
        assert_eq!(Primitive::Quads.gl_mode(), glow::TRIANGLES);
        assert_eq!(Primitive::TriangleStrip.gl_mode(), glow::TRIANGLE_STRIP);
    }
}
