//! Sprite batching: accumulate draw requests, flush them in as few draw
//! calls as the backend allows.
//!
//! ## Frame flow
//!
//! ```text
//!  begin(view, blend)
//!       │
//!       ▼
//!  draw / draw_rect / draw_text ──► SpritePool (one record per quad)
//!       │        │
//!       │        └─ pool full ──► flush()
//!       ▼
//!  end() ──► flush()
//!              │  1. stable depth sort (only if depths differ)
//!              │  2. walk records, assign texture units
//!              │       └─ units exhausted ──► sub-flush
//!              │  3. corners + UVs ──► VertexStream
//!              ▼  4. final sub-flush, reset
//!  GraphicsBackend: bind_texture* → upload_vertices → draw_triangles
//! ```
//!
//! Every sub-flush is exactly one upload plus one draw call.

use glam::{Mat4, Vec2};
use log::{debug, trace, warn};
use thiserror::Error;

use crate::backend::{BackendError, BlendMode, GraphicsBackend, Texture};
use crate::config::BatchConfig;
use crate::font::Font;
use crate::geometry::{Color, Rect};
use crate::record::{SpritePool, SpriteRecord};
use crate::texture_units::TextureUnits;
use crate::transform;
use crate::vertex::{CameraUniform, VertexStream, VERTICES_PER_SPRITE};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Invalid buffer capacity {0}, must be greater than zero")]
    InvalidCapacity(usize),
    #[error("begin() called while a batch is already in progress")]
    AlreadyStarted,
    #[error("Batch not started, call begin() first")]
    NotStarted,
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Counters for one begin/end cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Sprites (quads, glyphs included) emitted.
    pub sprite_count: u32,
    /// Draw calls issued, i.e. sub-flushes that carried geometry.
    pub draw_calls: u32,
    /// Implicit flushes forced by a full pool.
    pub pool_flushes: u32,
    /// Sub-flushes forced by running out of texture units.
    pub unit_flushes: u32,
}

/// How a quad's position and size are given.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Placement {
    /// Anchor position plus a scale applied to the texture (or source
    /// rect) size.
    Scaled { position: Vec2, scale: Vec2 },
    /// Explicit display rectangle; the anchor is placed at its origin.
    Area(Rect),
}

/// Batched sprite renderer over any [`GraphicsBackend`].
///
/// # Usage
///
/// ```ignore
/// let mut batch = SpriteBatch::new(backend, BatchConfig::default())?;
/// batch.begin(view, BlendMode::Normal)?;
/// batch.draw(&texture, pos, None, Color::WHITE, Vec2::ZERO, 1.0, 1.0, 0.0, 0)?;
/// batch.draw_text(&font, "score: 10", Vec2::new(8.0, 8.0), Color::WHITE, 16.0)?;
/// let stats = batch.end()?;
/// ```
pub struct SpriteBatch<B: GraphicsBackend> {
    backend: B,
    pool: SpritePool,
    stream: VertexStream,
    units: TextureUnits,
    last_depth: Option<i32>,
    depth_changed: bool,
    drawing: bool,
    stats: FrameStats,
}

impl<B: GraphicsBackend> SpriteBatch<B> {
    /// Create a batch and size the backend's vertex buffer for it.
    pub fn new(mut backend: B, config: BatchConfig) -> Result<Self, BatchError> {
        if config.capacity == 0 {
            return Err(BatchError::InvalidCapacity(config.capacity));
        }

        let unit_count =
            resolve_texture_units(config.texture_units, backend.max_texture_units());
        backend.allocate_vertex_buffer(config.capacity * VERTICES_PER_SPRITE)?;

        trace!("Buffer max size (sprites): {}", config.capacity);
        trace!("Texture units per draw call: {unit_count}");

        Ok(Self {
            backend,
            pool: SpritePool::new(config.capacity),
            stream: VertexStream::with_sprite_capacity(config.capacity),
            units: TextureUnits::new(unit_count),
            last_depth: None,
            depth_changed: false,
            drawing: false,
            stats: FrameStats::default(),
        })
    }

    // ───────────────────── Cycle ──────────────────────────────────

    /// Start a batch with the given view-projection and blend mode.
    pub fn begin(&mut self, view: Mat4, blend: BlendMode) -> Result<(), BatchError> {
        if self.drawing {
            return Err(BatchError::AlreadyStarted);
        }

        self.pool.reset();
        self.stream.clear();
        self.units.clear();
        self.last_depth = None;
        self.depth_changed = false;
        self.stats = FrameStats::default();

        self.backend.set_blend_mode(blend);
        self.backend.set_view(&CameraUniform::from_matrix(view));
        self.drawing = true;
        Ok(())
    }

    /// Flush everything pending and restore the default blend mode.
    pub fn end(&mut self) -> Result<FrameStats, BatchError> {
        if !self.drawing {
            return Err(BatchError::NotStarted);
        }
        self.drawing = false;

        let flushed = self.flush();
        self.backend.set_blend_mode(BlendMode::Normal);
        flushed?;

        let stats = std::mem::take(&mut self.stats);
        trace!(
            "Batch ended: {} sprites, {} draw call(s) ({} pool / {} unit sub-flushes)",
            stats.sprite_count,
            stats.draw_calls,
            stats.pool_flushes,
            stats.unit_flushes,
        );
        Ok(stats)
    }

    /// Reallocate the sprite pool and vertex buffers.
    ///
    /// Call between batches. Called mid-batch, pending sprites are dropped.
    pub fn resize_buffer(&mut self, capacity: usize) -> Result<(), BatchError> {
        if capacity == 0 {
            return Err(BatchError::InvalidCapacity(capacity));
        }
        if capacity == self.pool.capacity() {
            return Ok(());
        }
        if self.drawing && !self.pool.is_empty() {
            warn!(
                "resize_buffer during an active batch discards {} pending sprite(s)",
                self.pool.len()
            );
        }

        self.pool.resize(capacity);
        self.stream.reallocate(capacity);
        self.last_depth = None;
        self.depth_changed = false;
        self.backend
            .allocate_vertex_buffer(capacity * VERTICES_PER_SPRITE)?;

        debug!("Sprite buffer resized to {capacity}");
        Ok(())
    }

    // ───────────────────── Draw ───────────────────────────────────

    /// Queue a sprite placed at `position` and scaled relative to the
    /// texture (or `source`) size.
    #[allow(clippy::too_many_arguments)]
    pub fn draw<T: Texture + ?Sized>(
        &mut self,
        texture: &T,
        position: Vec2,
        source: Option<Rect>,
        color: Color,
        anchor: Vec2,
        scale_x: f32,
        scale_y: f32,
        rotation: f32,
        depth: i32,
    ) -> Result<(), BatchError> {
        let placement = Placement::Scaled {
            position,
            scale: Vec2::new(scale_x, scale_y),
        };
        self.draw_quad(texture, placement, source, color, anchor, rotation, depth)
    }

    /// Queue a sprite stretched over `display`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect<T: Texture + ?Sized>(
        &mut self,
        texture: &T,
        display: Rect,
        source: Option<Rect>,
        color: Color,
        anchor: Vec2,
        rotation: f32,
        depth: i32,
    ) -> Result<(), BatchError> {
        self.draw_quad(texture, Placement::Area(display), source, color, anchor, rotation, depth)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_quad<T: Texture + ?Sized>(
        &mut self,
        texture: &T,
        placement: Placement,
        source: Option<Rect>,
        color: Color,
        anchor: Vec2,
        rotation: f32,
        depth: i32,
    ) -> Result<(), BatchError> {
        if !self.drawing {
            return Err(BatchError::NotStarted);
        }

        let texture_size = Vec2::new(texture.width() as f32, texture.height() as f32);
        let (position, size) = match placement {
            Placement::Scaled { position, scale } => {
                let base = source.map_or(texture_size, |src| src.size());
                (position, base * scale)
            }
            Placement::Area(rect) => (rect.origin(), rect.size()),
        };

        self.push(SpriteRecord {
            active: true,
            texture: texture.id(),
            texture_size,
            position,
            size,
            anchor,
            rotation,
            depth,
            source,
            color,
        })
    }

    /// Queue one glyph quad per renderable character of `text`, at depth 0.
    pub fn draw_text<F: Font + ?Sized>(
        &mut self,
        font: &F,
        text: &str,
        position: Vec2,
        color: Color,
        font_size: f32,
    ) -> Result<(), BatchError> {
        self.draw_text_at_depth(font, text, position, color, font_size, 0)
    }

    /// [`draw_text`](Self::draw_text) with an explicit depth.
    ///
    /// `'\n'` starts a new line; characters the font has no glyph for are
    /// skipped.
    pub fn draw_text_at_depth<F: Font + ?Sized>(
        &mut self,
        font: &F,
        text: &str,
        position: Vec2,
        color: Color,
        font_size: f32,
        depth: i32,
    ) -> Result<(), BatchError> {
        if !self.drawing {
            return Err(BatchError::NotStarted);
        }

        let sheet = font.texture();
        let texture_size = Vec2::new(sheet.width as f32, sheet.height as f32);
        let scale = font_size / font.font_size();
        let computed_scale = font_size / font.computed_font_size();
        let line_advance = font.font_size() * scale + font.vertical_spacing();

        let mut pen = position;
        for ch in text.chars() {
            if ch == '\n' {
                pen.x = position.x;
                pen.y += line_advance;
                continue;
            }
            let Some(glyph) = font.glyph(ch) else {
                continue;
            };

            let record = SpriteRecord {
                active: true,
                texture: sheet.id,
                texture_size,
                position: pen + glyph.offset() * scale,
                size: Vec2::new(glyph.width, glyph.height) * computed_scale,
                anchor: Vec2::ZERO,
                rotation: 0.0,
                depth,
                source: Some(glyph.source()),
                color,
            };
            pen.x += glyph.x_advance * scale + font.horizontal_spacing();

            self.push(record)?;
        }
        Ok(())
    }

    // ───────────────────── Accessors ──────────────────────────────

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Sprites per flush.
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Texture units used per draw call.
    pub fn texture_units(&self) -> u32 {
        self.units.max_units()
    }

    /// Sprites queued and not yet flushed.
    pub fn pending(&self) -> usize {
        self.pool.len()
    }

    /// Between `begin` and `end`.
    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    // ───────────────────── Internals ──────────────────────────────

    /// Store a record, flushing first when the pool is full.
    fn push(&mut self, record: SpriteRecord) -> Result<(), BatchError> {
        loop {
            if let Some(slot) = self.pool.next() {
                if self.last_depth.is_some_and(|last| last != record.depth) {
                    self.depth_changed = true;
                }
                self.last_depth = Some(record.depth);
                *slot = record;
                return Ok(());
            }

            trace!("Sprite pool full ({}), flushing", self.pool.capacity());
            self.stats.pool_flushes += 1;
            self.flush()?;
        }
    }

    /// Emit every pending record and reset the cycle state.
    ///
    /// State is reset even when the backend fails, so a failed frame
    /// doesn't leak sprites into the next one.
    fn flush(&mut self) -> Result<(), BatchError> {
        if self.depth_changed {
            self.pool.sort_by_depth();
        }

        let emitted = Self::emit(
            &mut self.backend,
            self.pool.written(),
            &mut self.units,
            &mut self.stream,
            &mut self.stats,
        );

        self.pool.reset();
        self.stream.clear();
        self.depth_changed = false;
        self.last_depth = None;
        emitted
    }

    fn emit(
        backend: &mut B,
        records: &[SpriteRecord],
        units: &mut TextureUnits,
        stream: &mut VertexStream,
        stats: &mut FrameStats,
    ) -> Result<(), BatchError> {
        units.clear();

        for record in records.iter().filter(|r| r.active) {
            let unit = match units.lookup(record.texture) {
                Some(unit) => unit,
                None => {
                    if units.is_full() {
                        stats.unit_flushes += 1;
                        Self::submit(backend, stream, stats)?;
                        units.clear();
                    }
                    let unit = units.assign(record.texture);
                    backend.bind_texture(unit, record.texture)?;
                    unit
                }
            };

            stream.push_quad(&transform::corners(record), &record.uvs(), record.color, unit);
            stats.sprite_count += 1;
        }

        Self::submit(backend, stream, stats)
    }

    /// One upload plus one draw call. Empty streams issue nothing.
    fn submit(
        backend: &mut B,
        stream: &mut VertexStream,
        stats: &mut FrameStats,
    ) -> Result<(), BatchError> {
        if stream.is_empty() {
            return Ok(());
        }

        backend.upload_vertices(stream.as_slice())?;
        backend.draw_triangles(stream.triangle_count())?;
        stats.draw_calls += 1;
        trace!("Sub-flush: {} triangles", stream.triangle_count());

        stream.clear();
        Ok(())
    }
}

/// Units per draw call: the configured count, bounded by what the backend
/// reports. A backend reporting zero gets exactly one unit, whatever was
/// configured.
fn resolve_texture_units(configured: u32, reported: u32) -> u32 {
    match (configured, reported) {
        (_, 0) => {
            warn!("Backend reported no texture units, falling back to 1");
            1
        }
        (0, reported) => reported,
        (configured, reported) if configured > reported => {
            warn!("{configured} texture units requested, backend supports {reported}");
            reported
        }
        (configured, _) => configured,
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{TextureId, TextureRef};
    use crate::recording::RecordingBackend;

    const TEX: TextureRef = TextureRef::new(1, 64, 32);

    fn batch(capacity: usize, units: u32) -> SpriteBatch<RecordingBackend> {
        SpriteBatch::new(
            RecordingBackend::new(units),
            BatchConfig::default().with_capacity(capacity),
        )
        .unwrap()
    }

    fn draw_at(batch: &mut SpriteBatch<RecordingBackend>, tex: &TextureRef, x: f32, depth: i32) {
        batch
            .draw(tex, Vec2::new(x, 0.0), None, Color::WHITE, Vec2::ZERO, 1.0, 1.0, 0.0, depth)
            .unwrap();
    }

    /// x of the first (bottom-left) vertex of each emitted sprite.
    fn sprite_xs(backend: &RecordingBackend) -> Vec<f32> {
        backend
            .all_vertices()
            .chunks(VERTICES_PER_SPRITE)
            .map(|quad| quad[0].position[0])
            .collect()
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result = SpriteBatch::new(RecordingBackend::default(), BatchConfig::default().with_capacity(0));
        assert!(matches!(result, Err(BatchError::InvalidCapacity(0))));
    }

    #[test]
    fn test_new_allocates_backend_vertex_buffer() {
        let batch = batch(10, 4);
        assert_eq!(batch.backend().vertex_capacity(), 60);
        assert_eq!(batch.texture_units(), 4);
        assert_eq!(batch.capacity(), 10);
    }

    #[test]
    fn test_texture_unit_resolution() {
        assert_eq!(resolve_texture_units(0, 0), 1);
        assert_eq!(resolve_texture_units(0, 8), 8);
        assert_eq!(resolve_texture_units(4, 8), 4);
        assert_eq!(resolve_texture_units(16, 8), 8);
        assert_eq!(resolve_texture_units(3, 0), 1);
    }

    #[test]
    fn test_configured_units_fall_back_when_backend_reports_none() {
        let mut batch = SpriteBatch::new(
            RecordingBackend::new(0),
            BatchConfig::default().with_capacity(16).with_texture_units(3),
        )
        .unwrap();
        assert_eq!(batch.texture_units(), 1);

        batch.begin(Mat4::IDENTITY, BlendMode::Normal).unwrap();
        for id in 1..=3 {
            draw_at(&mut batch, &TextureRef::new(id, 8, 8), id as f32, 0);
        }
        let stats = batch.end().unwrap();

        assert_eq!(stats.sprite_count, 3);
        assert_eq!(stats.draw_calls, 3);
        assert_eq!(stats.unit_flushes, 2);
        assert_eq!(sprite_xs(batch.backend()), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_draw_outside_begin_fails() {
        let mut batch = batch(4, 1);
        let err = batch
            .draw(&TEX, Vec2::ZERO, None, Color::WHITE, Vec2::ZERO, 1.0, 1.0, 0.0, 0)
            .unwrap_err();
        assert!(matches!(err, BatchError::NotStarted));
        assert!(matches!(batch.end(), Err(BatchError::NotStarted)));
    }

    #[test]
    fn test_double_begin_fails() {
        let mut batch = batch(4, 1);
        batch.begin(Mat4::IDENTITY, BlendMode::Normal).unwrap();
        assert!(matches!(
            batch.begin(Mat4::IDENTITY, BlendMode::Normal),
            Err(BatchError::AlreadyStarted)
        ));
    }

    #[test]
    fn test_scaled_size_uses_source_rect() {
        let mut batch = batch(4, 1);
        batch.begin(Mat4::IDENTITY, BlendMode::Normal).unwrap();
        batch
            .draw(
                &TEX,
                Vec2::new(5.0, 5.0),
                Some(Rect::new(0.0, 0.0, 16.0, 8.0)),
                Color::WHITE,
                Vec2::ZERO,
                2.0,
                3.0,
                0.0,
                0,
            )
            .unwrap();
        batch.end().unwrap();

        let v = batch.backend().all_vertices();
        // Triangle 2, last vertex = top-right.
        assert_eq!(v[5].position, [5.0 + 32.0, 5.0]);
        // Bottom-left.
        assert_eq!(v[0].position, [5.0, 5.0 + 24.0]);
        assert_eq!(v[5].uv, [0.25, 0.0]);
        assert_eq!(v[0].uv, [0.0, 0.25]);
    }

    #[test]
    fn test_scaled_size_without_source_uses_texture() {
        let mut batch = batch(4, 1);
        batch.begin(Mat4::IDENTITY, BlendMode::Normal).unwrap();
        batch
            .draw(&TEX, Vec2::ZERO, None, Color::WHITE, Vec2::ZERO, 0.5, 0.5, 0.0, 0)
            .unwrap();
        batch.end().unwrap();
        let v = batch.backend().all_vertices();
        assert_eq!(v[5].position, [32.0, 0.0]);
        assert_eq!(v[0].position, [0.0, 16.0]);
    }

    #[test]
    fn test_draw_rect_uses_display_area() {
        let mut batch = batch(4, 1);
        batch.begin(Mat4::IDENTITY, BlendMode::Normal).unwrap();
        batch
            .draw_rect(
                &TEX,
                Rect::new(10.0, 20.0, 100.0, 50.0),
                None,
                Color::rgb(1.0, 0.0, 0.0),
                Vec2::ZERO,
                0.0,
                0,
            )
            .unwrap();
        batch.end().unwrap();
        let v = batch.backend().all_vertices();
        assert_eq!(v[0].position, [10.0, 70.0]);
        assert_eq!(v[5].position, [110.0, 20.0]);
        assert_eq!(v[0].color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_equal_depth_keeps_submission_order() {
        let mut batch = batch(16, 4);
        batch.begin(Mat4::IDENTITY, BlendMode::Normal).unwrap();
        for x in [3.0, 1.0, 2.0, 0.0] {
            draw_at(&mut batch, &TEX, x, 5);
        }
        batch.end().unwrap();
        assert_eq!(sprite_xs(batch.backend()), vec![3.0, 1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_mixed_depth_sorts_stably() {
        let mut batch = batch(16, 4);
        batch.begin(Mat4::IDENTITY, BlendMode::Normal).unwrap();
        for (x, depth) in [(0.0, 2), (1.0, -1), (2.0, 2), (3.0, 0), (4.0, -1)] {
            draw_at(&mut batch, &TEX, x, depth);
        }
        batch.end().unwrap();
        assert_eq!(sprite_xs(batch.backend()), vec![1.0, 4.0, 3.0, 0.0, 2.0]);
    }

    #[test]
    fn test_negative_depth_change_triggers_sort() {
        let mut batch = batch(16, 4);
        batch.begin(Mat4::IDENTITY, BlendMode::Normal).unwrap();
        draw_at(&mut batch, &TEX, 0.0, -1);
        draw_at(&mut batch, &TEX, 1.0, -5);
        batch.end().unwrap();
        assert_eq!(sprite_xs(batch.backend()), vec![1.0, 0.0]);
    }

    #[test]
    fn test_pool_full_flushes_before_next_draw() {
        let mut batch = batch(2, 4);
        batch.begin(Mat4::IDENTITY, BlendMode::Normal).unwrap();
        draw_at(&mut batch, &TEX, 0.0, 0);
        draw_at(&mut batch, &TEX, 1.0, 0);
        assert_eq!(batch.backend().draws.len(), 0);
        assert_eq!(batch.pending(), 2);

        draw_at(&mut batch, &TEX, 2.0, 0);
        assert_eq!(batch.backend().draws.len(), 1);
        assert_eq!(batch.pending(), 1);

        let stats = batch.end().unwrap();
        assert_eq!(stats.pool_flushes, 1);
        assert_eq!(stats.draw_calls, 2);
        assert_eq!(stats.sprite_count, 3);
    }

    #[test]
    fn test_exactly_capacity_draws_single_call() {
        let mut batch = batch(3, 4);
        batch.begin(Mat4::IDENTITY, BlendMode::Normal).unwrap();
        for x in 0..3 {
            draw_at(&mut batch, &TEX, x as f32, 0);
        }
        let stats = batch.end().unwrap();
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.pool_flushes, 0);
    }

    #[test]
    fn test_unit_exhaustion_sub_flushes() {
        let mut batch = batch(16, 2);
        batch.begin(Mat4::IDENTITY, BlendMode::Normal).unwrap();
        for id in 0..5 {
            draw_at(&mut batch, &TextureRef::new(id, 8, 8), id as f32, 0);
        }
        let stats = batch.end().unwrap();
        assert_eq!(stats.draw_calls, 3);
        assert_eq!(stats.unit_flushes, 2);

        let draws = &batch.backend().draws;
        assert_eq!(draws[0].sampled_textures(), vec![TextureId(0), TextureId(1)]);
        assert_eq!(draws[1].sampled_textures(), vec![TextureId(2), TextureId(3)]);
        assert_eq!(draws[2].sampled_textures(), vec![TextureId(4)]);
    }

    #[test]
    fn test_shared_texture_reuses_unit() {
        let mut batch = batch(16, 2);
        let other = TextureRef::new(2, 8, 8);
        batch.begin(Mat4::IDENTITY, BlendMode::Normal).unwrap();
        draw_at(&mut batch, &TEX, 0.0, 0);
        draw_at(&mut batch, &other, 1.0, 0);
        draw_at(&mut batch, &TEX, 2.0, 0);
        let stats = batch.end().unwrap();
        assert_eq!(stats.draw_calls, 1);

        let units: Vec<f32> = batch
            .backend()
            .all_vertices()
            .chunks(VERTICES_PER_SPRITE)
            .map(|q| q[0].texture_unit)
            .collect();
        assert_eq!(units, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_end_restores_normal_blend() {
        let mut batch = batch(4, 1);
        batch.begin(Mat4::IDENTITY, BlendMode::Additive).unwrap();
        draw_at(&mut batch, &TEX, 0.0, 0);
        batch.end().unwrap();

        let backend = batch.backend();
        assert_eq!(backend.draws[0].blend, BlendMode::Additive);
        assert_eq!(backend.blend_history, vec![BlendMode::Additive, BlendMode::Normal]);
    }

    #[test]
    fn test_empty_batch_issues_no_draw() {
        let mut batch = batch(4, 1);
        batch.begin(Mat4::IDENTITY, BlendMode::Normal).unwrap();
        let stats = batch.end().unwrap();
        assert_eq!(stats, FrameStats::default());
        assert!(batch.backend().draws.is_empty());
    }

    #[test]
    fn test_backend_failure_resets_state() {
        let mut batch = batch(4, 1);
        batch.begin(Mat4::IDENTITY, BlendMode::Multiply).unwrap();
        draw_at(&mut batch, &TEX, 0.0, 0);
        batch.backend_mut().fail_next_draw = Some("device lost".into());

        assert!(matches!(batch.end(), Err(BatchError::Backend(_))));
        assert_eq!(batch.pending(), 0);
        assert!(!batch.is_drawing());
        assert_eq!(batch.backend().blend_mode(), BlendMode::Normal);

        // The next frame starts clean.
        batch.begin(Mat4::IDENTITY, BlendMode::Normal).unwrap();
        draw_at(&mut batch, &TEX, 1.0, 0);
        let stats = batch.end().unwrap();
        assert_eq!(stats.sprite_count, 1);
    }

    #[test]
    fn test_resize_rejects_zero_and_reallocates() {
        let mut batch = batch(4, 1);
        assert!(matches!(batch.resize_buffer(0), Err(BatchError::InvalidCapacity(0))));
        batch.resize_buffer(8).unwrap();
        assert_eq!(batch.capacity(), 8);
        assert_eq!(batch.backend().vertex_capacity(), 48);
        assert_eq!(batch.backend().allocations, 2);

        // Same size is a no-op.
        batch.resize_buffer(8).unwrap();
        assert_eq!(batch.backend().allocations, 2);
    }

    #[test]
    fn test_resize_mid_batch_discards_pending() {
        let mut batch = batch(4, 1);
        batch.begin(Mat4::IDENTITY, BlendMode::Normal).unwrap();
        draw_at(&mut batch, &TEX, 0.0, 0);
        draw_at(&mut batch, &TEX, 1.0, 0);
        batch.resize_buffer(2).unwrap();
        assert_eq!(batch.pending(), 0);

        draw_at(&mut batch, &TEX, 2.0, 0);
        let stats = batch.end().unwrap();
        assert_eq!(stats.sprite_count, 1);
        assert_eq!(sprite_xs(batch.backend()), vec![2.0]);
    }

    #[test]
    fn test_view_matrix_reaches_backend() {
        let mut batch = batch(4, 1);
        let view = CameraUniform::identity(320.0, 240.0).matrix();
        batch.begin(view, BlendMode::Normal).unwrap();
        draw_at(&mut batch, &TEX, 0.0, 0);
        batch.end().unwrap();
        assert_eq!(batch.backend().draws[0].camera, CameraUniform::from_matrix(view));
    }
}
