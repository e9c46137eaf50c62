//! Demo scene: procedural textures, a block font, and the per-frame draw
//! list.

use std::error::Error;

use glam::Vec2;
use pixel_render::{
    BatchError, BlendMode, CameraUniform, Color, FrameStats, SpriteBatch, TextureRef,
    WgpuRenderer,
};
use pixel_text::{BitmapFont, GlyphAtlas, GlyphMetrics};

const TILE: u32 = 32;
const BALL: u32 = 16;
/// Block font cell, in bitmap pixels per pattern pixel.
const CELL: u32 = 2;

/// 3×5 block glyphs, `#` = ink.
const BLOCK_GLYPHS: &[(char, [&str; 5])] = &[
    (' ', ["...", "...", "...", "...", "..."]),
    (':', ["...", ".#.", "...", ".#.", "..."]),
    ('0', ["###", "#.#", "#.#", "#.#", "###"]),
    ('1', [".#.", "##.", ".#.", ".#.", "###"]),
    ('2', ["###", "..#", "###", "#..", "###"]),
    ('3', ["###", "..#", "###", "..#", "###"]),
    ('4', ["#.#", "#.#", "###", "..#", "..#"]),
    ('5', ["###", "#..", "###", "..#", "###"]),
    ('6', ["###", "#..", "###", "#.#", "###"]),
    ('7', ["###", "..#", "..#", "..#", "..#"]),
    ('8', ["###", "#.#", "###", "#.#", "###"]),
    ('9', ["###", "#.#", "###", "..#", "###"]),
    ('A', ["###", "#.#", "###", "#.#", "#.#"]),
    ('D', ["##.", "#.#", "#.#", "#.#", "##."]),
    ('E', ["###", "#..", "##.", "#..", "###"]),
    ('I', ["###", ".#.", ".#.", ".#.", "###"]),
    ('P', ["###", "#.#", "###", "#..", "#.."]),
    ('R', ["##.", "#.#", "##.", "#.#", "#.#"]),
    ('S', ["###", "#..", "###", "..#", "###"]),
    ('T', ["###", ".#.", ".#.", ".#.", ".#."]),
    ('W', ["#.#", "#.#", "#.#", "###", "#.#"]),
];

pub struct Scene {
    tile: TextureRef,
    ball: TextureRef,
    glow: TextureRef,
    font: BitmapFont,
    width: f32,
    height: f32,
}

impl Scene {
    /// Upload every texture the scene draws with.
    pub fn load(renderer: &mut WgpuRenderer, width: u32, height: u32) -> Result<Self, Box<dyn Error>> {
        let tile = renderer.create_texture(TILE, TILE, &checker(TILE, [48, 52, 64], [40, 44, 54]))?;
        let ball = renderer.create_texture(BALL, BALL, &disc(BALL, [255, 255, 255], false))?;
        let glow = renderer.create_texture(BALL, BALL, &disc(BALL, [255, 180, 80], true))?;

        let atlas = block_atlas()?;
        let sheet = renderer.create_texture(atlas.size, atlas.size, &atlas.data)?;
        let font = BitmapFont::from_atlas(&atlas, sheet, (5 * CELL) as f32).with_spacing(0.0, 4.0);

        Ok(Self {
            tile,
            ball,
            glow,
            font,
            width: width as f32,
            height: height as f32,
        })
    }

    /// Draw one frame at time `t` seconds. Two batches: the opaque scene
    /// and an additive glow pass over it.
    pub fn draw(
        &self,
        batch: &mut SpriteBatch<WgpuRenderer>,
        t: f32,
        hud: &str,
    ) -> Result<FrameStats, BatchError> {
        let view = CameraUniform::identity(self.width, self.height).matrix();
        let mut total = FrameStats::default();

        batch.begin(view, BlendMode::Normal)?;
        self.draw_background(batch)?;
        for (i, center) in self.orbit(t).into_iter().enumerate() {
            let hue = i as f32 / 12.0;
            batch.draw(
                &self.ball,
                center,
                None,
                Color::rgb(0.5 + 0.5 * hue, 0.8 - 0.5 * hue, 1.0 - hue),
                Vec2::splat(0.5),
                2.0,
                2.0,
                t + hue,
                i as i32 % 3,
            )?;
        }
        batch.draw_text_at_depth(&self.font, hud, Vec2::new(8.0, 8.0), Color::WHITE, 20.0, 10)?;
        accumulate(&mut total, batch.end()?);

        batch.begin(view, BlendMode::Additive)?;
        for center in self.orbit(t) {
            batch.draw(
                &self.glow,
                center,
                None,
                Color::WHITE.with_alpha(0.6),
                Vec2::splat(0.5),
                4.0,
                4.0,
                0.0,
                0,
            )?;
        }
        accumulate(&mut total, batch.end()?);

        Ok(total)
    }

    fn draw_background(&self, batch: &mut SpriteBatch<WgpuRenderer>) -> Result<(), BatchError> {
        let step = TILE as f32;
        let cols = (self.width / step).ceil() as u32;
        let rows = (self.height / step).ceil() as u32;
        for row in 0..rows {
            for col in 0..cols {
                batch.draw(
                    &self.tile,
                    Vec2::new(col as f32 * step, row as f32 * step),
                    None,
                    Color::WHITE,
                    Vec2::ZERO,
                    1.0,
                    1.0,
                    0.0,
                    -10,
                )?;
            }
        }
        Ok(())
    }

    /// Twelve points circling the screen center.
    fn orbit(&self, t: f32) -> Vec<Vec2> {
        let center = Vec2::new(self.width, self.height) * 0.5;
        let radius = self.width.min(self.height) * 0.3;
        (0..12)
            .map(|i| {
                let angle = t + i as f32 * std::f32::consts::TAU / 12.0;
                center + Vec2::from_angle(angle) * radius
            })
            .collect()
    }
}

fn accumulate(total: &mut FrameStats, stats: FrameStats) {
    total.sprite_count += stats.sprite_count;
    total.draw_calls += stats.draw_calls;
    total.pool_flushes += stats.pool_flushes;
    total.unit_flushes += stats.unit_flushes;
}

/// Two-tone checkerboard, 8px squares.
fn checker(size: u32, a: [u8; 3], b: [u8; 3]) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let [r, g, bl] = if (x / 8 + y / 8) % 2 == 0 { a } else { b };
            pixels.extend_from_slice(&[r, g, bl, 255]);
        }
    }
    pixels
}

/// Filled circle, hard-edged or fading out from the center.
fn disc(size: u32, rgb: [u8; 3], soft: bool) -> Vec<u8> {
    let radius = size as f32 * 0.5;
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance(Vec2::splat(radius)) / radius;
            let alpha = match (soft, d <= 1.0) {
                (_, false) => 0.0,
                (false, true) => 1.0,
                (true, true) => (1.0 - d) * (1.0 - d),
            };
            pixels.extend_from_slice(&[rgb[0], rgb[1], rgb[2], (alpha * 255.0) as u8]);
        }
    }
    pixels
}

/// Pack [`BLOCK_GLYPHS`] at `CELL`× scale.
fn block_atlas() -> Result<GlyphAtlas, Box<dyn Error>> {
    let (width, height) = (3 * CELL, 5 * CELL);
    let mut atlas = GlyphAtlas::new(64)?;
    for (ch, rows) in BLOCK_GLYPHS {
        let mut alpha = vec![0u8; (width * height) as usize];
        for (y, row) in rows.iter().enumerate() {
            for (x, cell) in row.bytes().enumerate() {
                if cell != b'#' {
                    continue;
                }
                for dy in 0..CELL as usize {
                    for dx in 0..CELL as usize {
                        let px = x * CELL as usize + dx;
                        let py = y * CELL as usize + dy;
                        alpha[py * width as usize + px] = 255;
                    }
                }
            }
        }
        atlas.insert(*ch, width, height, &alpha, GlyphMetrics::advance((4 * CELL) as f32))?;
    }
    Ok(atlas)
}
