//! Glyph atlas: CPU-side RGBA sheet of glyph bitmaps.
//!
//! Uses a simple row-based "shelf" packing algorithm. Each row (shelf)
//! has a fixed height determined by the first glyph placed on it.
//! When a glyph doesn't fit any shelf, a new shelf is started below the
//! last one.
//!
//! The packed sheet (`data`) is uploaded once as a texture; each glyph
//! keeps its pixel rectangle and placement metrics as a [`Glyph`].

use std::collections::HashMap;

use log::debug;
use pixel_render::Glyph;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AtlasError {
    #[error("Atlas size must be non-zero")]
    ZeroSize,
    #[error("No room left in the {size}x{size} atlas for {ch:?} ({width}x{height})")]
    Full {
        ch: char,
        width: u32,
        height: u32,
        size: u32,
    },
    #[error("Bitmap for {ch:?} is {actual} bytes, expected {alpha} (alpha) or {rgba} (RGBA)")]
    BitmapLength {
        ch: char,
        actual: usize,
        alpha: usize,
        rgba: usize,
    },
}

/// Placement metrics of a glyph bitmap, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphMetrics {
    /// Offset from the pen position to the bitmap's top-left.
    pub x_offset: f32,
    pub y_offset: f32,
    /// Horizontal pen advance after the glyph.
    pub x_advance: f32,
}

impl GlyphMetrics {
    /// No offset, advance of `x_advance`.
    pub fn advance(x_advance: f32) -> Self {
        Self {
            x_advance,
            ..Default::default()
        }
    }

    pub fn with_offset(mut self, x_offset: f32, y_offset: f32) -> Self {
        self.x_offset = x_offset;
        self.y_offset = y_offset;
        self
    }
}

/// Shelf (row) in the atlas.
#[derive(Debug)]
struct Shelf {
    /// Y offset of this shelf.
    y: u32,
    /// Height of this shelf, padding included.
    height: u32,
    /// Next free X position.
    cursor_x: u32,
}

/// Pixel-space rectangle within the atlas.
#[derive(Clone, Copy, Debug)]
struct AtlasRect {
    x: u32,
    y: u32,
}

/// CPU-side glyph atlas.
#[derive(Debug)]
pub struct GlyphAtlas {
    /// Atlas texture width and height in pixels (always square).
    pub size: u32,
    /// RGBA pixel data (size * size * 4 bytes).
    pub data: Vec<u8>,
    glyphs: HashMap<char, Glyph>,
    shelves: Vec<Shelf>,
    /// Padding between glyphs in pixels.
    padding: u32,
}

impl GlyphAtlas {
    /// Create an empty atlas (width = height = size).
    pub fn new(size: u32) -> Result<Self, AtlasError> {
        if size == 0 {
            return Err(AtlasError::ZeroSize);
        }
        let pixel_count = (size as usize) * (size as usize) * 4;
        Ok(Self {
            size,
            data: vec![0u8; pixel_count],
            glyphs: HashMap::new(),
            shelves: Vec::new(),
            padding: 1,
        })
    }

    /// Pixels left empty right of and below every glyph, so linear
    /// sampling doesn't bleed neighbours in.
    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    /// Number of glyphs currently in the atlas.
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn get(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    pub fn glyphs(&self) -> &HashMap<char, Glyph> {
        &self.glyphs
    }

    /// Pack a glyph bitmap and record its metrics.
    ///
    /// `pixels` is either alpha-only (`width * height` bytes, drawn as
    /// white with that alpha) or RGBA (`width * height * 4` bytes).
    /// Inserting a character that is already present returns the stored
    /// glyph unchanged.
    pub fn insert(
        &mut self,
        ch: char,
        width: u32,
        height: u32,
        pixels: &[u8],
        metrics: GlyphMetrics,
    ) -> Result<Glyph, AtlasError> {
        if let Some(glyph) = self.glyphs.get(&ch) {
            return Ok(*glyph);
        }

        let alpha = width as usize * height as usize;
        let rgba = alpha * 4;
        if pixels.len() != alpha && pixels.len() != rgba {
            return Err(AtlasError::BitmapLength {
                ch,
                actual: pixels.len(),
                alpha,
                rgba,
            });
        }

        let rect = self.allocate(width, height).ok_or(AtlasError::Full {
            ch,
            width,
            height,
            size: self.size,
        })?;
        self.blit_bitmap(rect, width, height, pixels);

        let glyph = Glyph {
            x: rect.x as f32,
            y: rect.y as f32,
            width: width as f32,
            height: height as f32,
            x_offset: metrics.x_offset,
            y_offset: metrics.y_offset,
            x_advance: metrics.x_advance,
        };
        self.glyphs.insert(ch, glyph);
        Ok(glyph)
    }


    // ---------------------------------------------------------------
    // Internal helpers
    // ---------------------------------------------------------------

    /// Allocate a rect on the atlas using shelf packing.
    fn allocate(&mut self, width: u32, height: u32) -> Option<AtlasRect> {
        let padded_w = width + self.padding;
        let padded_h = height + self.padding;
        if padded_w > self.size {
            return None; // Glyph wider than atlas.
        }

        // Try existing shelves.
        for shelf in &mut self.shelves {
            if shelf.height >= padded_h && shelf.cursor_x + padded_w <= self.size {
                let rect = AtlasRect {
                    x: shelf.cursor_x,
                    y: shelf.y,
                };
                shelf.cursor_x += padded_w;
                return Some(rect);
            }
        }

        // Start a new shelf.
        let shelf_y = self.shelves.last().map_or(0, |s| s.y + s.height);
        if shelf_y + padded_h > self.size {
            return None; // Atlas full.
        }

        self.shelves.push(Shelf {
            y: shelf_y,
            height: padded_h,
            cursor_x: padded_w,
        });
        debug!("Glyph atlas shelf {} at y={shelf_y}", self.shelves.len());

        Some(AtlasRect { x: 0, y: shelf_y })
    }

    /// Copy a bitmap into the sheet. Length was validated by the caller.
    fn blit_bitmap(&mut self, rect: AtlasRect, width: u32, height: u32, pixels: &[u8]) {
        let is_rgba = pixels.len() == (width * height * 4) as usize;

        for row in 0..height {
            for col in 0..width {
                let dst = (((rect.y + row) * self.size + rect.x + col) * 4) as usize;
                let src = (row * width + col) as usize;
                let texel = if is_rgba {
                    [
                        pixels[src * 4],
                        pixels[src * 4 + 1],
                        pixels[src * 4 + 2],
                        pixels[src * 4 + 3],
                    ]
                } else {
                    // White glyph with alpha.
                    [255, 255, 255, pixels[src]]
                };
                self.data[dst..dst + 4].copy_from_slice(&texel);
            }
        }
    }
}

// ===================================================================
// Tests
// ===================================================================
