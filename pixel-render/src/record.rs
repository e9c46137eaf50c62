//! Pooled sprite descriptors.
//!
//! The pool is a fixed arena of [`SpriteRecord`]s indexed by a write cursor.
//! A batch cycle fills records front to back; the flush consumes them and
//! rewinds the cursor. Nothing is freed between frames.

use glam::Vec2;

use crate::backend::TextureId;
use crate::geometry::{Color, Rect};

/// One queued sprite, meaningful only while `active` is set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteRecord {
    pub active: bool,
    pub texture: TextureId,
    /// Texture dimensions in pixels, used to normalize `source`.
    pub texture_size: Vec2,
    /// Anchor point in world space.
    pub position: Vec2,
    /// Displayed size in world units.
    pub size: Vec2,
    /// Normalized (0..1) anchor; both translation reference and rotation pivot.
    pub anchor: Vec2,
    /// Radians, clockwise in a Y-down world.
    pub rotation: f32,
    /// Sort key; lower draws first.
    pub depth: i32,
    /// Sub-rectangle of the texture in pixels; `None` = whole texture.
    pub source: Option<Rect>,
    pub color: Color,
}

impl Default for SpriteRecord {
    fn default() -> Self {
        Self {
            active: false,
            texture: TextureId(0),
            texture_size: Vec2::ONE,
            position: Vec2::ZERO,
            size: Vec2::ZERO,
            anchor: Vec2::ZERO,
            rotation: 0.0,
            depth: 0,
            source: None,
            color: Color::WHITE,
        }
    }
}

impl SpriteRecord {
    /// Texture coordinates in top-left, top-right, bottom-right, bottom-left
    /// order.
    pub fn uvs(&self) -> [Vec2; 4] {
        match self.source {
            None => [
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
            Some(src) => {
                let min = src.origin() / self.texture_size;
                let max = Vec2::new(src.right(), src.bottom()) / self.texture_size;
                [
                    Vec2::new(min.x, min.y),
                    Vec2::new(max.x, min.y),
                    Vec2::new(max.x, max.y),
                    Vec2::new(min.x, max.y),
                ]
            }
        }
    }
}

/// Fixed-capacity arena of reusable records.
#[derive(Debug)]
pub struct SpritePool {
    records: Vec<SpriteRecord>,
    cursor: usize,
}

impl SpritePool {
    /// `capacity` must be non-zero; the batch validates it first.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            records: vec![SpriteRecord::default(); capacity],
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    /// Number of records written this cycle.
    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    /// Hand out the next free record, already marked active.
    ///
    /// Returns `None` when the pool is full; the caller must flush first.
    pub fn next(&mut self) -> Option<&mut SpriteRecord> {
        let record = self.records.get_mut(self.cursor)?;
        self.cursor += 1;
        record.active = true;
        Some(record)
    }

    /// Records written this cycle.
    pub fn written(&self) -> &[SpriteRecord] {
        &self.records[..self.cursor]
    }

    /// Stable sort of the written range by depth, inactive records last.
    pub fn sort_by_depth(&mut self) {
        self.records[..self.cursor].sort_by_key(|r| (!r.active, r.depth));
    }

    /// Deactivate everything written and rewind the cursor.
    pub fn reset(&mut self) {
        for record in &mut self.records[..self.cursor] {
            record.active = false;
        }
        self.cursor = 0;
    }

    /// Reallocate with a new capacity, discarding any written records.
    pub fn resize(&mut self, capacity: usize) {
        debug_assert!(capacity > 0);
        self.records = vec![SpriteRecord::default(); capacity];
        self.cursor = 0;
    }
}
