//! Immediate-mode (`begin`/`end`) vertex accumulation.
//!
//! Vertices are captured into a fixed-capacity CPU buffer together with the
//! current normal, color and texcoord at the time each `vertex*` call lands.
//! `end` hands the buffer to the draw dispatcher, decomposing legacy
//! topologies on the way out.

use log::warn;

use crate::vertex::{Primitive, Vertex};

/// Vertices one `begin`/`end` pair can hold. Submissions past this point in
/// a single batch are dropped.
pub const CAPACITY: usize = 4096;

/// Accumulator for one `begin`/`end` batch.
#[derive(Debug)]
pub struct ImmediateBuffer {
    vertices: Vec<Vertex>,
    prim: Primitive,
    active: bool,
    overflowed: bool,
}

impl Default for ImmediateBuffer {
    fn default() -> Self {
        Self {
            vertices: Vec::with_capacity(CAPACITY),
            prim: Primitive::Triangles,
            active: false,
            overflowed: false,
        }
    }
}

impl ImmediateBuffer {
    /// Starts a new batch, discarding anything left from the previous one.
    pub fn begin(&mut self, prim: Primitive) {
        self.vertices.clear();
        self.prim = prim;
        self.active = true;
        self.overflowed = false;
    }

    /// Captures one vertex with the current attribute values. Ignored
    /// outside `begin`/`end`; silently dropped once the batch is full.
    pub fn emit(&mut self, position: [f32; 3], normal: [f32; 3], texcoord: [f32; 2], color: [f32; 4]) {
        if !self.active {
            return;
        }
        if self.vertices.len() >= CAPACITY {
            if !self.overflowed {
                warn!("immediate batch exceeded {CAPACITY} vertices, dropping the rest");
                self.overflowed = true;
            }
            return;
        }
        self.vertices.push(Vertex {
            position,
            normal,
            color,
            texcoord0: texcoord,
            texcoord1: texcoord,
        });
    }

    /// Closes the batch and exposes its contents. Returns `None` when no
    /// `begin` was pending or nothing was emitted.
    pub fn end(&mut self) -> Option<(Primitive, &[Vertex])> {
        if !self.active {
            return None;
        }
        self.active = false;
        if self.vertices.is_empty() {
            return None;
        }
        Some((self.prim, &self.vertices))
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::{CAPACITY, ImmediateBuffer};
    use crate::vertex::Primitive;

    #[test]
    fn emit_outside_begin_is_ignored() {
        let mut buf = ImmediateBuffer::default();
        buf.emit([0.0; 3], [0.0, 0.0, 1.0], [0.0; 2], [1.0; 4]);
        assert!(buf.end().is_none());
    }

    #[test]
    fn end_without_vertices_yields_nothing() {
        let mut buf = ImmediateBuffer::default();
        buf.begin(Primitive::Quads);
        assert!(buf.end().is_none());
        assert!(!buf.is_active());
    }

    #[test]
    fn vertices_capture_the_attributes_passed_in() {
        let mut buf = ImmediateBuffer::default();
        buf.begin(Primitive::Triangles);
        buf.emit([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.25, 0.75], [1.0, 0.0, 0.0, 1.0]);
        let (prim, verts) = buf.end().unwrap();
        assert_eq!(prim, Primitive::Triangles);
        assert_eq!(verts[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(verts[0].normal, [0.0, 1.0, 0.0]);
        assert_eq!(verts[0].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(verts[0].texcoord0, [0.25, 0.75]);
        // Sphere-map generation overwrites unit 1 in the shader; until then
        // both units carry the same coordinate.
        assert_eq!(verts[0].texcoord1, [0.25, 0.75]);
    }

    #[test]
    fn overfull_batches_drop_excess_vertices() {
        let mut buf = ImmediateBuffer::default();
        buf.begin(Primitive::Triangles);
        for _ in 0..CAPACITY + 10 {
            buf.emit([0.0; 3], [0.0, 0.0, 1.0], [0.0; 2], [1.0; 4]);
        }
        let (_, verts) = buf.end().unwrap();
        assert_eq!(verts.len(), CAPACITY);
    }

    #[test]
    fn begin_resets_the_previous_batch() {
        let mut buf = ImmediateBuffer::default();
        buf.begin(Primitive::Quads);
        buf.emit([0.0; 3], [0.0, 0.0, 1.0], [0.0; 2], [1.0; 4]);
        let _ = buf.end();

        buf.begin(Primitive::Polygon);
        buf.emit([9.0, 9.0, 9.0], [0.0, 0.0, 1.0], [0.0; 2], [1.0; 4]);
        let (prim, verts) = buf.end().unwrap();
        assert_eq!(prim, Primitive::Polygon);
        assert_eq!(verts.len(), 1);
        assert_eq!(verts[0].position, [9.0, 9.0, 9.0]);
    }
}
