//! Client-side vertex array state and CPU-side gather.
//!
//! Legacy renderers point the driver at application memory with
//! `glVertexPointer` and friends and expect it to be read lazily at draw
//! time. Shader-only GL has no client arrays, so at each draw the engine
//! walks the enabled pointers and assembles one interleaved [`Vertex`]
//! stream. The pointers are raw and unvalidated; the gather is `unsafe` and
//! trusts the caller exactly as the original API did.

use crate::glenum;
use crate::vertex::Vertex;

/// Component type of a client array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayType {
    Float,
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
}

impl ArrayType {
    /// Unknown component types fall back to float, the overwhelmingly
    /// common case.
    pub fn from_gl(ty: u32) -> Self {
        match ty {
            glenum::GL_BYTE => ArrayType::Byte,
            glenum::GL_UNSIGNED_BYTE => ArrayType::UnsignedByte,
            glenum::GL_SHORT => ArrayType::Short,
            glenum::GL_UNSIGNED_SHORT => ArrayType::UnsignedShort,
            glenum::GL_INT => ArrayType::Int,
            _ => ArrayType::Float,
        }
    }

    pub fn size_bytes(self) -> usize {
        match self {
            ArrayType::Byte | ArrayType::UnsignedByte => 1,
            ArrayType::Short | ArrayType::UnsignedShort => 2,
            ArrayType::Float | ArrayType::Int => 4,
        }
    }
}

/// One client array descriptor, as set by the legacy pointer calls.
#[derive(Clone, Copy, Debug)]
pub struct ClientArray {
    pub enabled: bool,
    pub size: i32,
    pub ty: ArrayType,
    /// Byte stride as passed in; 0 means tightly packed.
    pub stride: i32,
    pub ptr: *const u8,
}

impl ClientArray {
    fn new(size: i32) -> Self {
        Self {
            enabled: false,
            size,
            ty: ArrayType::Float,
            stride: 0,
            ptr: std::ptr::null(),
        }
    }

    pub fn set(&mut self, size: i32, ty: u32, stride: i32, ptr: *const u8) {
        self.size = size;
        self.ty = ArrayType::from_gl(ty);
        self.stride = stride;
        self.ptr = ptr;
    }

    /// Stride actually used when walking the array.
    pub fn effective_stride(&self) -> usize {
        if self.stride > 0 {
            self.stride as usize
        } else {
            self.size as usize * self.ty.size_bytes()
        }
    }

    fn usable(&self) -> bool {
        self.enabled && !self.ptr.is_null()
    }
}

/// The full set of legacy client arrays: position, normal, color and one
/// texcoord array per texture unit.
#[derive(Clone, Debug)]
pub struct ClientArrays {
    pub position: ClientArray,
    pub normal: ClientArray,
    pub color: ClientArray,
    pub texcoord: [ClientArray; 2],
    /// Unit the next `tex_coord_pointer`/texcoord enable applies to, as
    /// selected by `client_active_texture`.
    pub active_texcoord_unit: usize,
}

impl Default for ClientArrays {
    fn default() -> Self {
        Self {
            position: ClientArray::new(3),
            normal: ClientArray::new(3),
            color: ClientArray::new(4),
            texcoord: [ClientArray::new(2); 2],
            active_texcoord_unit: 0,
        }
    }
}

impl ClientArrays {
    pub fn texcoord_enabled(&self, unit: usize) -> bool {
        self.texcoord[unit].usable()
    }
}

/// Reads one component at `ptr`, converted to f32. Unsigned bytes are
/// normalized to [0, 1] (they only ever carry colors); everything else is a
/// plain numeric cast.
unsafe fn read_component(ty: ArrayType, ptr: *const u8) -> f32 {
    unsafe {
        match ty {
            ArrayType::Float => (ptr as *const f32).read_unaligned(),
            ArrayType::Byte => (ptr as *const i8).read_unaligned() as f32,
            ArrayType::UnsignedByte => ptr.read_unaligned() as f32 / 255.0,
            ArrayType::Short => (ptr as *const i16).read_unaligned() as f32,
            ArrayType::UnsignedShort => (ptr as *const u16).read_unaligned() as f32,
            ArrayType::Int => (ptr as *const i32).read_unaligned() as f32,
        }
    }
}

/// Reads up to `max` components of element `index` into `out`. Components
/// the array does not supply keep their incoming default.
unsafe fn read_element(array: &ClientArray, index: usize, out: &mut [f32]) {
    let base = unsafe { array.ptr.add(index * array.effective_stride()) };
    let comp = array.ty.size_bytes();
    let n = (array.size as usize).min(out.len());
    for (c, slot) in out.iter_mut().enumerate().take(n) {
        *slot = unsafe { read_component(array.ty, base.add(c * comp)) };
    }
}

/// Assembles `count` vertices starting at element `first` from the enabled
/// client arrays. Disabled arrays contribute the legacy defaults: normal
/// (0, 0, 1), the current color, texcoords (0, 0); a 2-component position
/// array leaves z at 0.
///
/// # Safety
///
/// Every enabled array pointer must reference memory valid for elements
/// `first .. first + count` at its declared size, type and stride.
pub unsafe fn gather(
    arrays: &ClientArrays,
    first: usize,
    count: usize,
    current_color: [f32; 4],
) -> Vec<Vertex> {
    let mut out = Vec::with_capacity(count);
    for i in first..first + count {
        let mut v = Vertex {
            color: current_color,
            ..Vertex::default()
        };
        if arrays.position.usable() {
            unsafe { read_element(&arrays.position, i, &mut v.position) };
        }
        if arrays.normal.usable() {
            unsafe { read_element(&arrays.normal, i, &mut v.normal) };
        }
        if arrays.color.usable() {
            unsafe { read_element(&arrays.color, i, &mut v.color) };
        }
        if arrays.texcoord[0].usable() {
            unsafe { read_element(&arrays.texcoord[0], i, &mut v.texcoord0) };
        }
        if arrays.texcoord[1].usable() {
            unsafe { read_element(&arrays.texcoord[1], i, &mut v.texcoord1) };
        }
        out.push(v);
    }
    out
}

/// Width of an element-index array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexType {
    U8,
    U16,
    U32,
}

impl IndexType {
    pub fn from_gl(ty: u32) -> Option<Self> {
        match ty {
            glenum::GL_UNSIGNED_BYTE => Some(IndexType::U8),
            glenum::GL_UNSIGNED_SHORT => Some(IndexType::U16),
            glenum::GL_UNSIGNED_INT => Some(IndexType::U32),
            _ => None,
        }
    }
}

/// Widens a client index array to u32 so decomposition and range scans work
/// on one type.
///
/// # Safety
///
/// `ptr` must reference `count` valid indices of the given width.
pub unsafe fn read_indices(ty: IndexType, count: usize, ptr: *const u8) -> Vec<u32> {
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let v = unsafe {
            match ty {
                IndexType::U8 => ptr.add(i).read_unaligned() as u32,
                IndexType::U16 => (ptr as *const u16).add(i).read_unaligned() as u32,
                IndexType::U32 => (ptr as *const u32).add(i).read_unaligned(),
            }
        };
        out.push(v);
    }
    out
}
