//! Batch construction parameters.

/// Sprites per sub-flush when nothing else is configured.
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Sprites the pool holds before an implicit flush. Must be non-zero.
    pub capacity: usize,
    /// Texture units per draw call. `0` = ask the backend.
    pub texture_units: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            texture_units: 0,
        }
    }
}

impl BatchConfig {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_texture_units(mut self, units: u32) -> Self {
        self.texture_units = units;
        self
    }
}
