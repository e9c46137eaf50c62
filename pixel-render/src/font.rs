//! Font contract consumed by [`SpriteBatch::draw_text`](crate::batch::SpriteBatch::draw_text).
//!
//! A font here is a pre-rasterized glyph sheet: one texture plus per-glyph
//! metrics. Producing one (rasterizing, packing) is someone else's job;
//! see the `pixel-text` crate for a packer.

use glam::Vec2;

use crate::backend::TextureRef;
use crate::geometry::Rect;

/// Placement metrics of one glyph, in pixels at the font's rasterized size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Glyph {
    /// Top-left of the glyph image in the font texture.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Offset from the pen position to the glyph image's top-left.
    pub x_offset: f32,
    pub y_offset: f32,
    /// Horizontal pen advance after this glyph.
    pub x_advance: f32,
}

impl Glyph {
    /// Glyph image rectangle in texture space.
    pub fn source(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.x_offset, self.y_offset)
    }
}

pub trait Font {
    /// Metrics for `ch`, or `None` if the font has no glyph for it.
    fn glyph(&self, ch: char) -> Option<&Glyph>;

    /// Nominal size in pixels; offsets and advances scale against this.
    fn font_size(&self) -> f32;

    /// Size the glyph images were rasterized at; glyph quads scale against
    /// this. Differs from [`font_size`](Self::font_size) for oversampled
    /// sheets.
    fn computed_font_size(&self) -> f32 {
        self.font_size()
    }

    /// Extra pixels added after each glyph advance.
    fn horizontal_spacing(&self) -> f32 {
        0.0
    }

    /// Extra pixels added between lines.
    fn vertical_spacing(&self) -> f32 {
        0.0
    }

    /// The glyph sheet.
    fn texture(&self) -> TextureRef;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_source_and_offset() {
        let glyph = Glyph {
            x: 4.0,
            y: 8.0,
            width: 6.0,
            height: 10.0,
            x_offset: 1.0,
            y_offset: -9.0,
            x_advance: 7.0,
        };
        assert_eq!(glyph.source(), Rect::new(4.0, 8.0, 6.0, 10.0));
        assert_eq!(glyph.offset(), Vec2::new(1.0, -9.0));
    }
}
