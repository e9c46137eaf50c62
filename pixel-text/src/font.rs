//! [`Font`] over a packed glyph atlas.

use std::collections::HashMap;

use pixel_render::{Font, Glyph, TextureRef};

use crate::atlas::GlyphAtlas;

/// A glyph sheet uploaded as one texture, plus its metrics.
///
/// Build the atlas, upload `atlas.data` as an `atlas.size`² RGBA
/// texture, then wrap both:
///
/// ```ignore
/// let texture = renderer.create_texture(atlas.size, atlas.size, &atlas.data)?;
/// let font = BitmapFont::from_atlas(&atlas, texture, 16.0);
/// batch.draw_text(&font, "HP 10", pos, Color::WHITE, 32.0)?;
/// ```
#[derive(Clone, Debug)]
pub struct BitmapFont {
    glyphs: HashMap<char, Glyph>,
    texture: TextureRef,
    font_size: f32,
    computed_font_size: f32,
    horizontal_spacing: f32,
    vertical_spacing: f32,
}

impl BitmapFont {
    /// Glyph metrics in `atlas` are taken to be at `font_size` pixels.
    pub fn from_atlas(atlas: &GlyphAtlas, texture: TextureRef, font_size: f32) -> Self {
        Self::from_glyphs(atlas.glyphs().clone(), texture, font_size)
    }

    pub fn from_glyphs(glyphs: HashMap<char, Glyph>, texture: TextureRef, font_size: f32) -> Self {
        Self {
            glyphs,
            texture,
            font_size,
            computed_font_size: font_size,
            horizontal_spacing: 0.0,
            vertical_spacing: 0.0,
        }
    }

    /// Size the bitmaps were actually rasterized at, for sheets
    /// oversampled relative to their metrics.
    pub fn with_computed_font_size(mut self, size: f32) -> Self {
        self.computed_font_size = size;
        self
    }

    pub fn with_spacing(mut self, horizontal: f32, vertical: f32) -> Self {
        self.horizontal_spacing = horizontal;
        self.vertical_spacing = vertical;
        self
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Unscaled width of the widest line of `text`, in pixels at
    /// `font_size`. Characters without a glyph add nothing.
    pub fn measure(&self, text: &str, font_size: f32) -> f32 {
        let scale = font_size / self.font_size;
        text.split('\n')
            .map(|line| {
                line.chars()
                    .filter_map(|ch| self.glyphs.get(&ch))
                    .map(|g| g.x_advance * scale + self.horizontal_spacing)
                    .sum::<f32>()
            })
            .fold(0.0, f32::max)
    }
}

impl Font for BitmapFont {
    fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    fn font_size(&self) -> f32 {
        self.font_size
    }

    fn computed_font_size(&self) -> f32 {
        self.computed_font_size
    }

    fn horizontal_spacing(&self) -> f32 {
        self.horizontal_spacing
    }

    fn vertical_spacing(&self) -> f32 {
        self.vertical_spacing
    }

    fn texture(&self) -> TextureRef {
        self.texture
    }
}
