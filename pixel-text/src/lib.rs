//! # pixel-text
//!
//! Bitmap fonts for `pixel-render`: pack glyph bitmaps into one sheet,
//! then draw text from it with `SpriteBatch::draw_text`.
//!
//! ## Architecture
//!
//! ```text
//! glyph bitmaps + metrics
//!     │
//!     ▼
//! GlyphAtlas (shelf packing) ──► RGBA sheet ──► GPU upload (TextureRef)
//!     │                                                │
//!     └──────────────► BitmapFont ◄────────────────────┘
//!                          │
//!                          ▼
//!                 SpriteBatch::draw_text
//! ```
//!
//! - **`atlas`**: CPU-side glyph atlas with shelf packing.
//! - **`font`**: `Font` implementation over a packed atlas.

pub mod atlas;
pub mod font;

// Re-exports for ergonomic use.
pub use atlas::{AtlasError, GlyphAtlas, GlyphMetrics};
pub use font::BitmapFont;
