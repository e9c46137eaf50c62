//! CPU backend that captures draw calls instead of issuing them.
//!
//! Used by tests and benchmarks, and handy for inspecting what a scene
//! batches into without a GPU.

use crate::backend::{BackendError, BlendMode, GraphicsBackend, TextureId};
use crate::vertex::{CameraUniform, SpriteVertex};

/// Default unit count, matching common desktop GL/wgpu limits.
pub const DEFAULT_RECORDED_UNITS: u32 = 16;

/// One captured draw call.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedDraw {
    pub blend: BlendMode,
    pub camera: CameraUniform,
    /// Texture per unit at draw time, index = unit.
    pub textures: Vec<Option<TextureId>>,
    pub vertices: Vec<SpriteVertex>,
    pub triangle_count: u32,
}

impl RecordedDraw {
    /// Distinct textures sampled by this draw's vertices.
    pub fn sampled_textures(&self) -> Vec<TextureId> {
        let mut ids: Vec<TextureId> = self
            .vertices
            .iter()
            .filter_map(|v| self.textures.get(v.texture_unit as usize).copied().flatten())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

#[derive(Debug)]
pub struct RecordingBackend {
    max_units: u32,
    vertex_capacity: usize,
    blend: BlendMode,
    camera: CameraUniform,
    units: Vec<Option<TextureId>>,
    staged: Vec<SpriteVertex>,
    /// Every draw call so far, oldest first.
    pub draws: Vec<RecordedDraw>,
    /// Every blend mode change, including restores.
    pub blend_history: Vec<BlendMode>,
    /// Number of vertex buffer (re)allocations.
    pub allocations: u32,
    /// When set, the next `draw_triangles` fails with this message.
    pub fail_next_draw: Option<String>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new(DEFAULT_RECORDED_UNITS)
    }
}

impl RecordingBackend {
    /// `max_units` is what [`GraphicsBackend::max_texture_units`] reports;
    /// pass 0 to simulate a failed query.
    pub fn new(max_units: u32) -> Self {
        Self {
            max_units,
            vertex_capacity: 0,
            blend: BlendMode::Normal,
            camera: CameraUniform::identity(1.0, 1.0),
            units: vec![None; max_units.max(1) as usize],
            staged: Vec::new(),
            draws: Vec::new(),
            blend_history: Vec::new(),
            allocations: 0,
            fail_next_draw: None,
        }
    }

    pub fn vertex_capacity(&self) -> usize {
        self.vertex_capacity
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    /// All drawn vertices, in submission order across draw calls.
    pub fn all_vertices(&self) -> Vec<SpriteVertex> {
        self.draws
            .iter()
            .flat_map(|d| d.vertices.iter().copied())
            .collect()
    }

    pub fn clear(&mut self) {
        self.draws.clear();
        self.blend_history.clear();
    }
}

impl GraphicsBackend for RecordingBackend {
    fn max_texture_units(&self) -> u32 {
        self.max_units
    }

    fn allocate_vertex_buffer(&mut self, vertex_capacity: usize) -> Result<(), BackendError> {
        self.vertex_capacity = vertex_capacity;
        self.allocations += 1;
        Ok(())
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
        self.blend_history.push(mode);
    }

    fn set_view(&mut self, camera: &CameraUniform) {
        self.camera = *camera;
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) -> Result<(), BackendError> {
        let available = self.units.len() as u32;
        let slot = self
            .units
            .get_mut(unit as usize)
            .ok_or(BackendError::UnitOutOfRange { unit, available })?;
        *slot = Some(texture);
        Ok(())
    }

    fn upload_vertices(&mut self, vertices: &[SpriteVertex]) -> Result<(), BackendError> {
        self.staged.clear();
        self.staged.extend_from_slice(vertices);
        Ok(())
    }

    fn draw_triangles(&mut self, triangle_count: u32) -> Result<(), BackendError> {
        if let Some(message) = self.fail_next_draw.take() {
            return Err(BackendError::Other(message));
        }
        let vertex_count = (triangle_count as usize * 3).min(self.staged.len());
        self.draws.push(RecordedDraw {
            blend: self.blend,
            camera: self.camera,
            textures: self.units.clone(),
            vertices: self.staged[..vertex_count].to_vec(),
            triangle_count,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Color;
    use glam::Vec2;

    #[test]
    fn test_records_draw_with_bound_units() {
        let mut backend = RecordingBackend::new(2);
        backend.bind_texture(1, TextureId(9)).unwrap();
        let v = SpriteVertex::new(Vec2::ZERO, Vec2::ZERO, Color::WHITE, 1);
        backend.upload_vertices(&[v; 3]).unwrap();
        backend.draw_triangles(1).unwrap();

        assert_eq!(backend.draws.len(), 1);
        let draw = &backend.draws[0];
        assert_eq!(draw.textures, vec![None, Some(TextureId(9))]);
        assert_eq!(draw.sampled_textures(), vec![TextureId(9)]);
        assert_eq!(draw.vertices.len(), 3);
    }

    #[test]
    fn test_bind_out_of_range_unit_fails() {
        let mut backend = RecordingBackend::new(1);
        let err = backend.bind_texture(1, TextureId(0)).unwrap_err();
        assert!(matches!(err, BackendError::UnitOutOfRange { unit: 1, available: 1 }));
    }

    #[test]
    fn test_fail_next_draw_is_one_shot() {
        let mut backend = RecordingBackend::default();
        backend.fail_next_draw = Some("device lost".into());
        assert!(backend.draw_triangles(0).is_err());
        assert!(backend.draw_triangles(0).is_ok());
    }
}
