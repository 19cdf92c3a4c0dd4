//! Legacy OpenGL 1.x enumerants.
//!
//! These values are the wire contract with the calling renderer: every
//! state-setting method on [`crate::Context`] accepts them exactly as the
//! fixed-function API did. Only the enumerants the engine interprets are
//! listed; anything else is either passed through to the real GL or
//! silently ignored, matching the legacy driver's tolerance.

#![allow(missing_docs)]

// Matrix mode
pub const GL_MODELVIEW: u32 = 0x1700;
pub const GL_PROJECTION: u32 = 0x1701;
pub const GL_TEXTURE: u32 = 0x1702;

// Matrix queries
pub const GL_MATRIX_MODE: u32 = 0x0BA0;
pub const GL_MODELVIEW_MATRIX: u32 = 0x0BA6;
pub const GL_PROJECTION_MATRIX: u32 = 0x0BA7;
pub const GL_TEXTURE_MATRIX: u32 = 0x0BA8;

// Capabilities
pub const GL_LIGHTING: u32 = 0x0B50;
pub const GL_LIGHT0: u32 = 0x4000;
pub const GL_LIGHT1: u32 = 0x4001;
pub const GL_LIGHT2: u32 = 0x4002;
pub const GL_LIGHT3: u32 = 0x4003;
pub const GL_LIGHT4: u32 = 0x4004;
pub const GL_LIGHT5: u32 = 0x4005;
pub const GL_LIGHT6: u32 = 0x4006;
pub const GL_LIGHT7: u32 = 0x4007;
pub const GL_FOG: u32 = 0x0B60;
pub const GL_ALPHA_TEST: u32 = 0x0BC0;
pub const GL_TEXTURE_2D: u32 = 0x0DE1;
pub const GL_TEXTURE_GEN_S: u32 = 0x0C60;
pub const GL_TEXTURE_GEN_T: u32 = 0x0C61;

// Desktop-only capabilities the engine swallows so the shader-only GL
// underneath never sees an invalid enum.
pub const GL_COLOR_MATERIAL: u32 = 0x0B57;
pub const GL_NORMALIZE: u32 = 0x0BA1;
pub const GL_RESCALE_NORMAL: u32 = 0x803A;
pub const GL_COLOR_LOGIC_OP: u32 = 0x0BF2;
pub const GL_LINE_SMOOTH: u32 = 0x0B20;
pub const GL_LINE_STIPPLE: u32 = 0x0B24;
pub const GL_TEXTURE_1D: u32 = 0x0DE0;

// Light / material parameters
pub const GL_AMBIENT: u32 = 0x1200;
pub const GL_DIFFUSE: u32 = 0x1201;
pub const GL_SPECULAR: u32 = 0x1202;
pub const GL_POSITION: u32 = 0x1203;
pub const GL_EMISSION: u32 = 0x1600;
pub const GL_SHININESS: u32 = 0x1601;
pub const GL_AMBIENT_AND_DIFFUSE: u32 = 0x1602;
pub const GL_LIGHT_MODEL_AMBIENT: u32 = 0x0B53;

// Fog parameters
pub const GL_FOG_DENSITY: u32 = 0x0B62;
pub const GL_FOG_START: u32 = 0x0B63;
pub const GL_FOG_END: u32 = 0x0B64;
pub const GL_FOG_MODE: u32 = 0x0B65;
pub const GL_FOG_COLOR: u32 = 0x0B66;
pub const GL_EXP: u32 = 0x0800;
pub const GL_EXP2: u32 = 0x0801;
pub const GL_LINEAR: u32 = 0x2601;

// Alpha-test comparison functions
pub const GL_NEVER: u32 = 0x0200;
pub const GL_LESS: u32 = 0x0201;
pub const GL_EQUAL: u32 = 0x0202;
pub const GL_LEQUAL: u32 = 0x0203;
pub const GL_GREATER: u32 = 0x0204;
pub const GL_NOTEQUAL: u32 = 0x0205;
pub const GL_GEQUAL: u32 = 0x0206;
pub const GL_ALWAYS: u32 = 0x0207;

// Texture environment
pub const GL_TEXTURE_ENV: u32 = 0x2300;
pub const GL_TEXTURE_ENV_MODE: u32 = 0x2200;
pub const GL_MODULATE: u32 = 0x2100;
pub const GL_DECAL: u32 = 0x2101;
pub const GL_REPLACE: u32 = 0x1E01;
pub const GL_ADD: u32 = 0x0104;
pub const GL_COMBINE: u32 = 0x8570;
pub const GL_COMBINE_RGB: u32 = 0x8571;

// Texture coordinate generation
pub const GL_S: u32 = 0x2000;
pub const GL_T: u32 = 0x2001;
pub const GL_TEXTURE_GEN_MODE: u32 = 0x2500;
pub const GL_SPHERE_MAP: u32 = 0x2408;

// Client-side arrays
pub const GL_VERTEX_ARRAY: u32 = 0x8074;
pub const GL_NORMAL_ARRAY: u32 = 0x8075;
pub const GL_COLOR_ARRAY: u32 = 0x8076;
pub const GL_TEXTURE_COORD_ARRAY: u32 = 0x8078;

// Texture units
pub const GL_TEXTURE0: u32 = 0x84C0;
pub const GL_TEXTURE1: u32 = 0x84C1;

// Component / index types
pub const GL_BYTE: u32 = 0x1400;
pub const GL_UNSIGNED_BYTE: u32 = 0x1401;
pub const GL_SHORT: u32 = 0x1402;
pub const GL_UNSIGNED_SHORT: u32 = 0x1403;
pub const GL_INT: u32 = 0x1404;
pub const GL_UNSIGNED_INT: u32 = 0x1405;
pub const GL_FLOAT: u32 = 0x1406;

// Primitives
pub const GL_POINTS: u32 = 0x0000;
pub const GL_LINES: u32 = 0x0001;
pub const GL_LINE_LOOP: u32 = 0x0002;
pub const GL_LINE_STRIP: u32 = 0x0003;
pub const GL_TRIANGLES: u32 = 0x0004;
pub const GL_TRIANGLE_STRIP: u32 = 0x0005;
pub const GL_TRIANGLE_FAN: u32 = 0x0006;
pub const GL_QUADS: u32 = 0x0007;
pub const GL_QUAD_STRIP: u32 = 0x0008;
pub const GL_POLYGON: u32 = 0x0009;
