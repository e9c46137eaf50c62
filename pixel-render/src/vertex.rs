//! GPU vertex data types and the per-frame vertex stream.
//!
//! All GPU-facing types derive `bytemuck::Pod` + `Zeroable` for zero-copy
//! upload to GPU buffers.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};
use wgpu::{BufferAddress, VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

use crate::geometry::Color;

// ───────────────────────────────────────────────────────────────────
// Sprite vertex
// ───────────────────────────────────────────────────────────────────

/// One interleaved sprite vertex.
///
/// 36 bytes per vertex, 6 vertices per sprite (two triangles, no index
/// buffer), so 256 sprites = 55 KB of GPU memory.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    /// World-space position in pixels.
    pub position: [f32; 2],
    /// Texture coordinates in [0, 1] space.
    pub uv: [f32; 2],
    /// RGBA tint, each channel in [0.0, 1.0].
    pub color: [f32; 4],
    /// Texture unit the fragment samples from. Stored as a float so the
    /// whole vertex is one attribute type.
    pub texture_unit: f32,
}

impl SpriteVertex {
    pub const STRIDE: usize = std::mem::size_of::<SpriteVertex>();

    pub fn new(position: Vec2, uv: Vec2, color: Color, texture_unit: u32) -> Self {
        Self {
            position: position.to_array(),
            uv: uv.to_array(),
            color: color.to_array(),
            texture_unit: texture_unit as f32,
        }
    }

    pub fn layout() -> VertexBufferLayout<'static> {
        static ATTRS: &[VertexAttribute] = &[
            // location(0) = position
            VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: VertexFormat::Float32x2,
            },
            // location(1) = uv
            VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: VertexFormat::Float32x2,
            },
            // location(2) = color
            VertexAttribute {
                offset: 16,
                shader_location: 2,
                format: VertexFormat::Float32x4,
            },
            // location(3) = texture_unit
            VertexAttribute {
                offset: 32,
                shader_location: 3,
                format: VertexFormat::Float32,
            },
        ];
        VertexBufferLayout {
            array_stride: Self::STRIDE as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: ATTRS,
        }
    }
}

// ───────────────────────────────────────────────────────────────────
// Vertex stream
// ───────────────────────────────────────────────────────────────────

/// Vertices emitted per sprite: two triangles.
pub const VERTICES_PER_SPRITE: usize = 6;

/// Growable CPU-side vertex buffer filled during a flush.
///
/// Cleared (not freed) after every upload, so steady-state frames don't
/// allocate.
#[derive(Debug, Default)]
pub struct VertexStream {
    vertices: Vec<SpriteVertex>,
}

impl VertexStream {
    /// Pre-size for `sprite_capacity` sprites.
    pub fn with_sprite_capacity(sprite_capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(sprite_capacity * VERTICES_PER_SPRITE),
        }
    }

    /// Append one quad as two triangles.
    ///
    /// `corners` and `uvs` are in top-left, top-right, bottom-right,
    /// bottom-left order. Triangles are (BL, BR, TL) and (TL, BR, TR).
    pub fn push_quad(&mut self, corners: &[Vec2; 4], uvs: &[Vec2; 4], color: Color, unit: u32) {
        const ORDER: [usize; VERTICES_PER_SPRITE] = [3, 2, 0, 0, 2, 1];
        for i in ORDER {
            self.vertices
                .push(SpriteVertex::new(corners[i], uvs[i], color, unit));
        }
    }

    pub fn as_slice(&self) -> &[SpriteVertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn triangle_count(&self) -> u32 {
        (self.vertices.len() / 3) as u32
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// Drop the old storage and pre-size for a new sprite capacity.
    pub fn reallocate(&mut self, sprite_capacity: usize) {
        self.vertices = Vec::with_capacity(sprite_capacity * VERTICES_PER_SPRITE);
    }
}

// ───────────────────────────────────────────────────────────────────
// Camera uniform
// ───────────────────────────────────────────────────────────────────

/// Camera/viewport uniform sent to the GPU once per batch.
///
/// 64 bytes, fits in a single uniform buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    /// 4×4 view-projection matrix (column-major).
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn from_matrix(view_proj: Mat4) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
        }
    }

    /// Build an orthographic projection for a viewport of `width × height`
    /// pixels, with optional pan and zoom.
    ///
    /// Maps (0,0) to top-left, (width, height) to bottom-right, so Y grows
    /// downward like texture space.
    pub fn orthographic(width: f32, height: f32, pan_x: f32, pan_y: f32, zoom: f32) -> Self {
        // ndc_x = (world_x - pan_x) * (2 * zoom / width) - 1
        // ndc_y = 1 - (world_y - pan_y) * (2 * zoom / height)
        let sx = 2.0 * zoom / width;
        let sy = -2.0 * zoom / height; // flip Y for top-left origin
        let tx = -pan_x * sx - 1.0;
        let ty = -pan_y * sy + 1.0;

        Self {
            view_proj: [
                [sx,  0.0, 0.0, 0.0],
                [0.0, sy,  0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [tx,  ty,  0.0, 1.0],
            ],
        }
    }

    /// Identity: 1px = 1 unit, no pan, no zoom.
    pub fn identity(width: f32, height: f32) -> Self {
        Self::orthographic(width, height, 0.0, 0.0, 1.0)
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view_proj)
    }
}

// ===================================================================
// Tests
// ===================================================================
