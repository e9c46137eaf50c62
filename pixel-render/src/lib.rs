//! # pixel-render
//!
//! Batched 2D sprite rendering, with a `wgpu` backend.
//!
//! ## Architecture
//!
//! ```text
//!  game code
//!       │  draw / draw_rect / draw_text
//!       ▼
//!  SpriteBatch                      ◀─── pool, depth sort, unit assignment
//!       │  bind_texture / upload_vertices / draw_triangles
//!       ▼
//!  GraphicsBackend (trait)
//!       ├── WgpuRenderer            ◀─── GPU, one render pass per draw call
//!       └── RecordingBackend        ◀─── CPU capture for tests
//! ```
//!
//! ## Crate modules
//!
//! - [`batch`]: the sprite batch and its frame cycle
//! - [`backend`]: backend trait, texture handles, blend modes
//! - [`config`]: batch sizing
//! - [`record`]: sprite records and the fixed-size pool
//! - [`transform`]: sprite quad geometry
//! - [`texture_units`]: texture → unit assignment
//! - [`vertex`]: vertex and camera data types
//! - [`font`]: glyph metrics and the font trait
//! - [`geometry`]: rects and colors
//! - [`context`]: headless GPU device and target format
//! - [`pipelines`]: wgpu render pipelines
//! - [`renderer`]: wgpu backend
//! - [`recording`]: capturing backend

pub mod backend;
pub mod batch;
pub mod config;
pub mod context;
pub mod font;
pub mod geometry;
pub mod pipelines;
pub mod record;
pub mod recording;
pub mod renderer;
pub mod texture_units;
pub mod transform;
pub mod vertex;

// Re-exports for convenience
pub use backend::{BackendError, BlendMode, GraphicsBackend, Texture, TextureId, TextureRef};
pub use batch::{BatchError, FrameStats, Placement, SpriteBatch};
pub use config::BatchConfig;
pub use context::{GpuContext, GpuError};
pub use font::{Font, Glyph};
pub use geometry::{Color, Rect};
pub use recording::RecordingBackend;
pub use renderer::{RenderError, WgpuRenderer};
pub use vertex::{CameraUniform, SpriteVertex};
