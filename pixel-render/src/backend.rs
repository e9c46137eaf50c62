//! Capability interfaces between the batcher and whatever draws pixels.
//!
//! [`SpriteBatch`](crate::batch::SpriteBatch) only ever talks to a
//! [`GraphicsBackend`]; the wgpu implementation lives in
//! [`renderer`](crate::renderer) and a CPU capture implementation in
//! [`recording`](crate::recording).

use thiserror::Error;

use crate::vertex::{CameraUniform, SpriteVertex};

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Unknown texture {0:?}")]
    UnknownTexture(TextureId),
    #[error("Texture unit {unit} out of range (backend has {available})")]
    UnitOutOfRange { unit: u32, available: u32 },
    #[error("No render target bound")]
    NoTarget,
    #[error("Backend failure: {0}")]
    Other(String),
}

/// Stable identifier of a texture known to the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Anything the batch can draw from.
pub trait Texture {
    fn id(&self) -> TextureId;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

/// Plain value handle: id plus dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureRef {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

impl TextureRef {
    pub const fn new(id: u32, width: u32, height: u32) -> Self {
        Self {
            id: TextureId(id),
            width,
            height,
        }
    }
}

impl Texture for TextureRef {
    fn id(&self) -> TextureId {
        self.id
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

/// Color blending applied to every draw call of a batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// `src * src_alpha + dst * (1 - src_alpha)`.
    #[default]
    Normal,
    /// `src + dst`.
    Additive,
    /// `src * dst`.
    Multiply,
}

impl BlendMode {
    pub const ALL: [BlendMode; 3] = [BlendMode::Normal, BlendMode::Additive, BlendMode::Multiply];

    /// Dense index, used to key per-mode pipelines.
    pub fn index(self) -> usize {
        match self {
            BlendMode::Normal => 0,
            BlendMode::Additive => 1,
            BlendMode::Multiply => 2,
        }
    }
}

/// Graphics device as seen by the batcher.
///
/// Calls arrive in this order per sub-flush: zero or more
/// [`bind_texture`](Self::bind_texture), one
/// [`upload_vertices`](Self::upload_vertices), one
/// [`draw_triangles`](Self::draw_triangles). A unit keeps its binding until
/// it is rebound.
pub trait GraphicsBackend {
    /// Number of texture units a single draw call may sample from.
    /// Zero means the query failed; the batch then falls back to one.
    fn max_texture_units(&self) -> u32;

    /// (Re)allocate the device vertex buffer for `vertex_capacity` vertices.
    fn allocate_vertex_buffer(&mut self, vertex_capacity: usize) -> Result<(), BackendError>;

    fn set_blend_mode(&mut self, mode: BlendMode);

    /// Upload the view-projection used by subsequent draw calls.
    fn set_view(&mut self, camera: &CameraUniform);

    fn bind_texture(&mut self, unit: u32, texture: TextureId) -> Result<(), BackendError>;

    fn upload_vertices(&mut self, vertices: &[SpriteVertex]) -> Result<(), BackendError>;

    /// Draw the first `triangle_count` triangles of the last upload.
    fn draw_triangles(&mut self, triangle_count: u32) -> Result<(), BackendError>;
}
