//! Sprite render pipeline: interleaved triangle lists sampling from up to
//! N textures per draw call.
//!
//! WGSL is generated for the unit count the device allows: one
//! `texture_2d` binding per unit plus one shared sampler. Each vertex
//! carries the unit it samples from. One pipeline exists per
//! [`BlendMode`], built up front.

use wgpu::{
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout,
    BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingResource, BindingType,
    BlendComponent, BlendFactor, BlendOperation, BlendState, Buffer, BufferBindingType,
    BufferDescriptor, BufferUsages, ColorTargetState, ColorWrites, Device, FilterMode,
    FragmentState, FrontFace, MultisampleState, PipelineCompilationOptions, PipelineLayout,
    PipelineLayoutDescriptor, PolygonMode, PrimitiveState, PrimitiveTopology, Queue,
    RenderPass, RenderPipeline, RenderPipelineDescriptor, Sampler, SamplerBindingType,
    SamplerDescriptor, ShaderModule, ShaderModuleDescriptor, ShaderStages, TextureFormat,
    TextureSampleType, TextureView, TextureViewDimension, VertexState,
};

use crate::backend::BlendMode;
use crate::vertex::{CameraUniform, SpriteVertex};

/// Upper bound on texture units, whatever the device allows.
pub const MAX_SPRITE_UNITS: u32 = 16;

const SHADER_TEMPLATE: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> camera: Camera;
@group(1) @binding(0) var s_sprite: sampler;
@@BINDINGS@@

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) color: vec4<f32>,
    @location(3) unit: f32,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
    @location(2) @interpolate(flat) unit: u32,
};

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.view_proj * vec4<f32>(input.position, 0.0, 1.0);
    out.uv = input.uv;
    out.color = input.color;
    out.unit = u32(input.unit + 0.5);
    return out;
}

fn sample_unit(unit: u32, uv: vec2<f32>) -> vec4<f32> {
    var texel = vec4<f32>(1.0, 1.0, 1.0, 1.0);
    switch unit {
@@CASES@@
        default: {}
    }
    return texel;
}

@fragment
fn fs_main(frag: VertexOutput) -> @location(0) vec4<f32> {
    return sample_unit(frag.unit, frag.uv) * frag.color;
}
"#;

/// WGSL for a pipeline with `units` texture bindings.
pub fn shader_source(units: u32) -> String {
    let units = units.clamp(1, MAX_SPRITE_UNITS);
    let mut bindings = String::new();
    let mut cases = String::new();
    for unit in 0..units {
        bindings.push_str(&format!(
            "@group(1) @binding({}) var t_unit{unit}: texture_2d<f32>;\n",
            unit + 1
        ));
        // Level-0 sampling: the unit index is non-uniform.
        cases.push_str(&format!(
            "        case {unit}u: {{ texel = textureSampleLevel(t_unit{unit}, s_sprite, uv, 0.0); }}\n"
        ));
    }
    SHADER_TEMPLATE
        .replace("@@BINDINGS@@", &bindings)
        .replace("@@CASES@@", &cases)
}

/// GL-style blend equations for each mode.
pub fn blend_state(mode: BlendMode) -> BlendState {
    let (src_factor, dst_factor) = match mode {
        BlendMode::Normal => (BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha),
        BlendMode::Additive => (BlendFactor::One, BlendFactor::One),
        BlendMode::Multiply => (BlendFactor::Dst, BlendFactor::Zero),
    };
    let component = BlendComponent {
        src_factor,
        dst_factor,
        operation: BlendOperation::Add,
    };
    BlendState {
        color: component,
        alpha: component,
    }
}

/// Owns the wgpu pipelines, buffers, and bind group layouts for sprites.
pub struct SpritePipeline {
    /// Indexed by [`BlendMode::index`].
    pipelines: Vec<RenderPipeline>,
    units: u32,

    // Geometry
    vertex_buffer: Buffer,
    vertex_capacity: usize,
    vertex_count: u32,

    // Camera
    camera_buffer: Buffer,
    camera_bind_group: BindGroup,

    // Textures
    texture_bgl: BindGroupLayout,
    sampler: Sampler,
}

impl SpritePipeline {
    /// Create the pipelines and allocate GPU buffers.
    pub fn new(
        device: &Device,
        target_format: TextureFormat,
        units: u32,
        vertex_capacity: usize,
    ) -> Self {
        let units = units.clamp(1, MAX_SPRITE_UNITS);

        // ── Shader ──────────────────────────────────────────────
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("sprite_shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source(units).into()),
        });

        // ── Camera bind group layout (group 0) ──────────────────
        let camera_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("sprite_camera_bgl"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        // ── Texture bind group layout (group 1) ─────────────────
        let mut texture_entries = vec![BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::FRAGMENT,
            ty: BindingType::Sampler(SamplerBindingType::Filtering),
            count: None,
        }];
        texture_entries.extend((0..units).map(|unit| BindGroupLayoutEntry {
            binding: unit + 1,
            visibility: ShaderStages::FRAGMENT,
            ty: BindingType::Texture {
                sample_type: TextureSampleType::Float { filterable: true },
                view_dimension: TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        }));
        let texture_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("sprite_texture_bgl"),
            entries: &texture_entries,
        });

        // ── Pipelines, one per blend mode ───────────────────────
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("sprite_pipeline_layout"),
            bind_group_layouts: &[&camera_bgl, &texture_bgl],
            push_constant_ranges: &[],
        });
        let pipelines = BlendMode::ALL
            .iter()
            .map(|&mode| {
                Self::create_pipeline(device, &pipeline_layout, &shader, target_format, mode)
            })
            .collect();

        // ── Camera uniform buffer ───────────────────────────────
        let camera_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("sprite_camera_ub"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let camera_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("sprite_camera_bg"),
            layout: &camera_bgl,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        Self {
            pipelines,
            units,
            vertex_buffer: Self::create_vertex_buffer(device, vertex_capacity),
            vertex_capacity: vertex_capacity.max(1),
            vertex_count: 0,
            camera_buffer,
            camera_bind_group,
            texture_bgl,
            sampler: Self::create_sampler(device, FilterMode::Nearest),
        }
    }

    fn create_pipeline(
        device: &Device,
        layout: &PipelineLayout,
        shader: &ShaderModule,
        target_format: TextureFormat,
        mode: BlendMode,
    ) -> RenderPipeline {
        let label = format!("sprite_pipeline_{mode:?}").to_lowercase();
        device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(layout),
            vertex: VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                buffers: &[SpriteVertex::layout()],
            },
            fragment: Some(FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                targets: &[Some(ColorTargetState {
                    format: target_format,
                    blend: Some(blend_state(mode)),
                    write_mask: ColorWrites::ALL,
                })],
            }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: None, // rotated and flipped sprites wind both ways
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_vertex_buffer(device: &Device, vertex_capacity: usize) -> Buffer {
        device.create_buffer(&BufferDescriptor {
            label: Some("sprite_vb"),
            size: (vertex_capacity.max(1) * SpriteVertex::STRIDE) as u64,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_sampler(device: &Device, filter: FilterMode) -> Sampler {
        device.create_sampler(&SamplerDescriptor {
            label: Some("sprite_sampler"),
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            ..Default::default()
        })
    }

    /// Texture units the shader was built with.
    pub fn units(&self) -> u32 {
        self.units
    }

    pub fn vertex_capacity(&self) -> usize {
        self.vertex_capacity
    }

    /// Vertices from the last upload.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Nearest for pixel art, linear for smooth scaling.
    pub fn set_filter(&mut self, device: &Device, filter: FilterMode) {
        self.sampler = Self::create_sampler(device, filter);
    }

    // ───────────────────── Upload ─────────────────────────────────

    /// Replace the vertex buffer with one holding `vertex_capacity` vertices.
    pub fn reallocate_vertices(&mut self, device: &Device, vertex_capacity: usize) {
        self.vertex_buffer = Self::create_vertex_buffer(device, vertex_capacity);
        self.vertex_capacity = vertex_capacity.max(1);
        self.vertex_count = 0;
    }

    /// Upload vertices for the next draw, growing the buffer if needed.
    pub fn upload_vertices(&mut self, device: &Device, queue: &Queue, vertices: &[SpriteVertex]) {
        if vertices.len() > self.vertex_capacity {
            log::debug!(
                "Sprite vertex buffer grown from {} to {} vertices",
                self.vertex_capacity,
                vertices.len()
            );
            self.reallocate_vertices(device, vertices.len());
        }
        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(vertices));
        self.vertex_count = vertices.len() as u32;
    }

    /// Upload the camera uniform.
    pub fn upload_camera(&self, queue: &Queue, camera: &CameraUniform) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(camera));
    }

    /// Bind group for one draw call; `views[unit]` is sampled for `unit`.
    pub fn texture_bind_group(&self, device: &Device, views: &[&TextureView]) -> BindGroup {
        let mut entries = vec![BindGroupEntry {
            binding: 0,
            resource: BindingResource::Sampler(&self.sampler),
        }];
        entries.extend(views.iter().enumerate().map(|(unit, view)| BindGroupEntry {
            binding: unit as u32 + 1,
            resource: BindingResource::TextureView(view),
        }));
        device.create_bind_group(&BindGroupDescriptor {
            label: Some("sprite_texture_bg"),
            layout: &self.texture_bgl,
            entries: &entries,
        })
    }

    // ───────────────────── Draw ───────────────────────────────────

    /// Record one draw of the first `vertex_count` uploaded vertices.
    pub fn draw(
        &self,
        pass: &mut RenderPass<'_>,
        mode: BlendMode,
        textures: &BindGroup,
        vertex_count: u32,
    ) {
        let vertex_count = vertex_count.min(self.vertex_count);
        if vertex_count == 0 {
            return;
        }

        let bytes = vertex_count as u64 * SpriteVertex::STRIDE as u64;
        pass.set_pipeline(&self.pipelines[mode.index()]);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        pass.set_bind_group(1, textures, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..bytes));
        pass.draw(0..vertex_count, 0..1);
    }
}

// ===================================================================
// Tests
// ===================================================================
