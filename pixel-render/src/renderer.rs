//! wgpu implementation of [`GraphicsBackend`].
//!
//! Owns the GPU context, the sprite pipeline, and a registry of uploaded
//! textures. Every `draw_triangles` records and submits its own render
//! pass, so the vertex upload that precedes it is always the one it
//! draws.
//!
//! Rendering goes to whatever view [`WgpuRenderer::set_target`] was given,
//! created in the context's `target_format`.

use std::collections::HashMap;

use log::debug;
use thiserror::Error;
use wgpu::{
    Color, CommandEncoderDescriptor, Extent3d, FilterMode, LoadOp, Operations,
    RenderPassColorAttachment, RenderPassDescriptor, StoreOp, TextureDescriptor,
    TextureDimension, TextureFormat, TextureUsages, TextureView, TextureViewDescriptor,
};

use crate::backend::{BackendError, BlendMode, GraphicsBackend, TextureId, TextureRef};
use crate::context::GpuContext;
use crate::pipelines::sprite::{SpritePipeline, MAX_SPRITE_UNITS};
use crate::vertex::{CameraUniform, SpriteVertex};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid texture size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Texture data is {actual} bytes, expected {expected} (RGBA8)")]
    DataLength { expected: usize, actual: usize },
}

/// A texture living on the GPU.
struct GpuTexture {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: TextureView,
}

/// Sprite renderer backed by wgpu.
///
/// # Usage
///
/// ```ignore
/// let mut renderer = WgpuRenderer::new(gpu, 256);
/// let player = renderer.create_texture(16, 16, &rgba)?;
/// renderer.set_target(Some(target_view));
/// renderer.clear_target();
/// let mut batch = SpriteBatch::new(renderer, BatchConfig::default())?;
/// ```
pub struct WgpuRenderer {
    gpu: GpuContext,
    pipeline: SpritePipeline,
    textures: HashMap<TextureId, GpuTexture>,
    next_texture_id: u32,
    /// Bound to units nothing was assigned to.
    fallback: GpuTexture,
    bound: Vec<Option<TextureId>>,
    blend: BlendMode,
    target: Option<TextureView>,
    clear_color: Color,
}

impl WgpuRenderer {
    /// Create a renderer for the given GPU context.
    ///
    /// `sprite_capacity` sizes the initial vertex buffer; the batch
    /// reallocates it to its own capacity anyway.
    pub fn new(gpu: GpuContext, sprite_capacity: usize) -> Self {
        let units = gpu.max_texture_units().clamp(1, MAX_SPRITE_UNITS);
        let pipeline = SpritePipeline::new(
            &gpu.device,
            gpu.target_format,
            units,
            sprite_capacity * crate::vertex::VERTICES_PER_SPRITE,
        );
        let fallback = upload_texture(&gpu, 1, 1, &[255; 4]);

        debug!("Sprite renderer ready: {units} texture unit(s)");

        Self {
            gpu,
            pipeline,
            textures: HashMap::new(),
            next_texture_id: 1,
            fallback,
            bound: vec![None; units as usize],
            blend: BlendMode::Normal,
            target: None,
            clear_color: Color {
                r: 0.0,
                g: 0.0,
                b: 0.0,
                a: 1.0,
            },
        }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Set the background clear color.
    pub fn set_clear_color(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.clear_color = Color { r, g, b, a };
    }

    /// Sampling filter for every sprite texture.
    pub fn set_filter(&mut self, filter: FilterMode) {
        self.pipeline.set_filter(&self.gpu.device, filter);
    }

    /// View draw calls render into. `None` makes draws fail.
    pub fn set_target(&mut self, target: Option<TextureView>) {
        self.target = target;
    }

    /// Clear the current target to the clear color.
    pub fn clear_target(&self) -> Result<(), BackendError> {
        let target = self.target.as_ref().ok_or(BackendError::NoTarget)?;
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("sprite_clear_encoder"),
            });
        // The pass clears on load; nothing is drawn.
        let pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("sprite_clear_pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(self.clear_color),
                    store: StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        drop(pass);
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    // ───────────────────── Textures ───────────────────────────────

    /// Upload tightly packed RGBA8 pixels and register the texture.
    pub fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureRef, RenderError> {
        let max = self.gpu.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(RenderError::InvalidSize { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(RenderError::DataLength {
                expected,
                actual: rgba.len(),
            });
        }

        let id = TextureId(self.next_texture_id);
        self.next_texture_id += 1;
        self.textures
            .insert(id, upload_texture(&self.gpu, width, height, rgba));

        debug!("Texture {id:?} uploaded ({width}x{height})");
        Ok(TextureRef::new(id.0, width, height))
    }

    /// Drop a texture. Later draws referencing it fail with
    /// [`BackendError::UnknownTexture`].
    pub fn destroy_texture(&mut self, id: TextureId) -> bool {
        for slot in self.bound.iter_mut().filter(|slot| **slot == Some(id)) {
            *slot = None;
        }
        self.textures.remove(&id).is_some()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

impl GraphicsBackend for WgpuRenderer {
    fn max_texture_units(&self) -> u32 {
        self.pipeline.units()
    }

    fn allocate_vertex_buffer(&mut self, vertex_capacity: usize) -> Result<(), BackendError> {
        self.pipeline
            .reallocate_vertices(&self.gpu.device, vertex_capacity);
        Ok(())
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
    }

    fn set_view(&mut self, camera: &CameraUniform) {
        self.pipeline.upload_camera(&self.gpu.queue, camera);
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) -> Result<(), BackendError> {
        let available = self.bound.len() as u32;
        if !self.textures.contains_key(&texture) {
            return Err(BackendError::UnknownTexture(texture));
        }
        let slot = self
            .bound
            .get_mut(unit as usize)
            .ok_or(BackendError::UnitOutOfRange { unit, available })?;
        *slot = Some(texture);
        Ok(())
    }

    fn upload_vertices(&mut self, vertices: &[SpriteVertex]) -> Result<(), BackendError> {
        self.pipeline
            .upload_vertices(&self.gpu.device, &self.gpu.queue, vertices);
        Ok(())
    }

    fn draw_triangles(&mut self, triangle_count: u32) -> Result<(), BackendError> {
        let target = self.target.as_ref().ok_or(BackendError::NoTarget)?;

        let mut views = Vec::with_capacity(self.bound.len());
        for slot in &self.bound {
            let view = match slot {
                Some(id) => {
                    &self
                        .textures
                        .get(id)
                        .ok_or(BackendError::UnknownTexture(*id))?
                        .view
                }
                None => &self.fallback.view,
            };
            views.push(view);
        }
        let bind_group = self.pipeline.texture_bind_group(&self.gpu.device, &views);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("sprite_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("sprite_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Load,
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.pipeline
                .draw(&mut pass, self.blend, &bind_group, triangle_count * 3);
        }
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

fn upload_texture(gpu: &GpuContext, width: u32, height: u32, rgba: &[u8]) -> GpuTexture {
    let size = Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = gpu.device.create_texture(&TextureDescriptor {
        label: Some("sprite_texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: TextureFormat::Rgba8UnormSrgb,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });

    gpu.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4), // RGBA = 4 bytes per pixel
            rows_per_image: Some(height),
        },
        size,
    );

    let view = texture.create_view(&TextureViewDescriptor::default());
    GpuTexture { texture, view }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Texture;
    use crate::batch::SpriteBatch;
    use crate::config::BatchConfig;
    use crate::geometry::Color as SpriteColor;
    use glam::Vec2;

    fn headless_target(gpu: &GpuContext, size: u32) -> TextureView {
        gpu.device
            .create_texture(&TextureDescriptor {
                label: Some("test_target"),
                size: Extent3d {
                    width: size,
                    height: size,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: TextureDimension::D2,
                format: gpu.target_format,
                usage: TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&TextureViewDescriptor::default())
    }

    #[test]
    fn test_create_texture_validates_input() {
        // May fail in CI without a GPU; skip gracefully.
        if let Ok(gpu) = pollster::block_on(GpuContext::new_headless()) {
            let mut renderer = WgpuRenderer::new(gpu, 16);
            assert!(matches!(
                renderer.create_texture(0, 4, &[]),
                Err(RenderError::InvalidSize { .. })
            ));
            assert!(matches!(
                renderer.create_texture(2, 2, &[0; 15]),
                Err(RenderError::DataLength { expected: 16, actual: 15 })
            ));

            let tex = renderer.create_texture(2, 2, &[255; 16]).unwrap();
            assert_eq!((tex.width(), tex.height()), (2, 2));
            assert_eq!(renderer.texture_count(), 1);
            assert!(renderer.destroy_texture(tex.id()));
            assert!(!renderer.destroy_texture(tex.id()));
        }
    }

    #[test]
    fn test_bind_unknown_texture_fails() {
        if let Ok(gpu) = pollster::block_on(GpuContext::new_headless()) {
            let mut renderer = WgpuRenderer::new(gpu, 16);
            assert!(matches!(
                renderer.bind_texture(0, TextureId(99)),
                Err(BackendError::UnknownTexture(TextureId(99)))
            ));
        }
    }

    #[test]
    fn test_draw_without_target_fails() {
        if let Ok(gpu) = pollster::block_on(GpuContext::new_headless()) {
            let mut renderer = WgpuRenderer::new(gpu, 16);
            assert!(matches!(renderer.draw_triangles(2), Err(BackendError::NoTarget)));
            assert!(matches!(renderer.clear_target(), Err(BackendError::NoTarget)));
        }
    }

    #[test]
    fn test_batch_renders_offscreen() {
        if let Ok(gpu) = pollster::block_on(GpuContext::new_headless()) {
            let target = headless_target(&gpu, 64);
            let mut renderer = WgpuRenderer::new(gpu, 16);
            let a = renderer.create_texture(1, 1, &[255, 0, 0, 255]).unwrap();
            let b = renderer.create_texture(1, 1, &[0, 0, 255, 255]).unwrap();
            renderer.set_target(Some(target));
            renderer.clear_target().unwrap();

            let mut batch = SpriteBatch::new(renderer, BatchConfig::default()).unwrap();
            let view = CameraUniform::identity(64.0, 64.0).matrix();
            batch.begin(view, BlendMode::Additive).unwrap();
            for (i, tex) in [a, b, a].iter().enumerate() {
                batch
                    .draw(
                        tex,
                        Vec2::new(i as f32 * 8.0, 0.0),
                        None,
                        SpriteColor::WHITE,
                        Vec2::ZERO,
                        8.0,
                        8.0,
                        0.0,
                        0,
                    )
                    .unwrap();
            }
            let stats = batch.end().unwrap();
            assert_eq!(stats.sprite_count, 3);
            assert!(stats.draw_calls >= 1);
            assert_eq!(batch.backend().blend, BlendMode::Normal);
        }
    }
}
