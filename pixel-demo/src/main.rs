//! Pixel demo: headless sprite batching on wgpu.
//!
//! Renders a few frames of a procedural scene (tiled background, rotating
//! sprites, additive glow, block-font HUD) into an off-screen texture and
//! logs the batch statistics of each. Run with `RUST_LOG=trace` to see
//! every sub-flush.

mod scene;

use std::error::Error;

use log::info;
use pixel_render::config::DEFAULT_CAPACITY;
use pixel_render::{BatchConfig, FrameStats, GpuContext, SpriteBatch, WgpuRenderer};
use wgpu::{Extent3d, TextureDescriptor, TextureDimension, TextureUsages, TextureViewDescriptor};

use scene::Scene;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 360;
const FRAMES: u32 = 5;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let gpu = pollster::block_on(GpuContext::new_headless())?;
    info!(
        "GPU: {:?}, {} sampled texture(s) per stage",
        gpu.adapter_name(),
        gpu.max_texture_units()
    );

    let target = gpu.device.create_texture(&TextureDescriptor {
        label: Some("pixel_demo_target"),
        size: Extent3d {
            width: WIDTH,
            height: HEIGHT,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: gpu.target_format,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    let mut renderer = WgpuRenderer::new(gpu, DEFAULT_CAPACITY);
    renderer.set_clear_color(0.06, 0.06, 0.08, 1.0);
    let scene = Scene::load(&mut renderer, WIDTH, HEIGHT)?;
    renderer.set_target(Some(target.create_view(&TextureViewDescriptor::default())));

    let mut batch = SpriteBatch::new(renderer, BatchConfig::default())?;
    info!(
        "Batch ready: {} sprites per flush, {} texture unit(s)",
        batch.capacity(),
        batch.texture_units()
    );

    let mut last = FrameStats::default();
    for frame in 0..FRAMES {
        batch.backend().clear_target()?;
        let hud = format!("SPRITES: {}  DRAWS: {}", last.sprite_count, last.draw_calls);
        last = scene.draw(&mut batch, frame as f32 / 60.0, &hud)?;
        info!(
            "Frame {frame}: {} sprites, {} draw call(s), {} pool / {} unit sub-flushes",
            last.sprite_count, last.draw_calls, last.pool_flushes, last.unit_flushes
        );
    }

    info!("Rendered {FRAMES} frames at {WIDTH}x{HEIGHT}");
    Ok(())
}
