//! Headless wgpu device for sprite rendering.
//!
//! The batch never presents anything itself: it draws into whatever view
//! the renderer is pointed at, so the context only needs an adapter, a
//! device and the color format render targets are created with.

use log::debug;
use thiserror::Error;
use wgpu::{
    Adapter, Device, DeviceDescriptor, Instance, InstanceDescriptor, PowerPreference, Queue,
    RequestAdapterOptions, TextureFormat,
};

/// Color format of render targets created against this context.
pub const TARGET_FORMAT: TextureFormat = TextureFormat::Rgba8UnormSrgb;

#[derive(Error, Debug)]
pub enum GpuError {
    #[error("No GPU adapter available")]
    NoAdapter,
    #[error("Device request failed: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// Device, queue and target format shared by the renderer and its callers.
pub struct GpuContext {
    pub device: Device,
    pub queue: Queue,
    pub adapter: Adapter,
    pub target_format: TextureFormat,
}

impl GpuContext {
    /// Open the preferred adapter without a window.
    ///
    /// The device is requested with the adapter's own limits so the
    /// texture unit count reflects the hardware, not wgpu's defaults.
    pub async fn new_headless() -> Result<Self, GpuError> {
        let instance = Instance::new(&InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let descriptor = DeviceDescriptor {
            label: Some("pixel_device"),
            required_limits: adapter.limits(),
            ..Default::default()
        };
        let (device, queue) = adapter.request_device(&descriptor, None).await?;

        let context = Self {
            device,
            queue,
            adapter,
            target_format: TARGET_FORMAT,
        };
        debug!(
            "GPU context on {:?}: {} sampled texture(s) per stage",
            context.adapter_name(),
            context.max_texture_units()
        );
        Ok(context)
    }

    pub fn adapter_name(&self) -> String {
        self.adapter.get_info().name
    }

    /// Sampled textures a fragment shader may bind on this device.
    pub fn max_texture_units(&self) -> u32 {
        self.device.limits().max_sampled_textures_per_shader_stage
    }
}

// ===================================================================
// Tests
// ===================================================================
