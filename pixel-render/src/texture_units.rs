//! Texture id → texture unit assignment for one sub-flush.
//!
//! Units are handed out 0, 1, 2, … in order of first reference. The bound
//! is small (a few dozen at most), so the map is a linear-scan array.

use crate::backend::TextureId;

#[derive(Debug)]
pub struct TextureUnits {
    /// Index = unit.
    slots: Vec<TextureId>,
    max_units: u32,
    /// Most recent hit; consecutive sprites usually share a texture.
    last: Option<(TextureId, u32)>,
}

impl TextureUnits {
    /// `max_units` of zero is treated as one.
    pub fn new(max_units: u32) -> Self {
        let max_units = max_units.max(1);
        Self {
            slots: Vec::with_capacity(max_units as usize),
            max_units,
            last: None,
        }
    }

    pub fn max_units(&self) -> u32 {
        self.max_units
    }

    /// No free unit left for a texture that isn't already bound.
    pub fn is_full(&self) -> bool {
        self.slots.len() as u32 >= self.max_units
    }

    /// Unit already holding `texture` this sub-flush.
    pub fn lookup(&mut self, texture: TextureId) -> Option<u32> {
        if let Some((id, unit)) = self.last {
            if id == texture {
                return Some(unit);
            }
        }
        let unit = self.slots.iter().position(|&id| id == texture)? as u32;
        self.last = Some((texture, unit));
        Some(unit)
    }

    /// Give `texture` the next free unit.
    ///
    /// The caller checks [`is_full`](Self::is_full) first and sub-flushes
    /// when it is; the returned unit must then be bound on the backend.
    pub fn assign(&mut self, texture: TextureId) -> u32 {
        debug_assert!(!self.is_full(), "no free texture unit for {texture:?}");
        let unit = self.slots.len() as u32;
        self.slots.push(texture);
        self.last = Some((texture, unit));
        unit
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.last = None;
    }
}
