use wgpu::util::DeviceExt;
use wgpu::{BindGroup, BindGroupLayout, Buffer, Device, RenderPipeline, TextureView};

use crate::vertex::{canvas_quad, TexturedVertex, QUAD_INDICES};

/// Uniform block for the paint pass. Mirrors `PaintUniforms` in
/// `shaders/paint.wgsl`; field order and padding must match the WGSL layout.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PaintUniforms {
    /// Texel space to clip space of the paint target.
    pub view_proj: [[f32; 4]; 4],
    pub stroke_start: [f32; 2],
    pub stroke_end: [f32; 2],
    /// Straight RGB in xyz; w is unused.
    pub brush_color: [f32; 4],
    pub brush_radius: f32,
    pub brush_softness: f32,
    pub stamp_alpha: f32,
    pub _padding: f32,
}

impl PaintUniforms {
    pub fn new(paint_extent: (u32, u32)) -> Self {
        Self {
            view_proj: paint_ortho_matrix(paint_extent),
            stroke_start: [0.0, 0.0],
            stroke_end: [0.0, 0.0],
            brush_color: [0.0, 0.0, 0.0, 1.0],
            brush_radius: 1.0,
            brush_softness: 0.0,
            stamp_alpha: 0.0,
            _padding: 0.0,
        }
    }
}

/// Uniform block for the present pass.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PresentUniforms {
    /// Texel space to window clip space, from the camera.
    pub view_proj: [[f32; 4]; 4],
}

impl PresentUniforms {
    pub fn new() -> Self {
        Self {
            view_proj: identity_matrix(),
        }
    }
}

impl Default for PresentUniforms {
    fn default() -> Self {
        Self::new()
    }
}

/// Column-major orthographic transform mapping paint texels `[0,w] x [0,h]`
/// onto the offscreen target's clip space. No y flip: the paint target is
/// addressed in the same orientation it is sampled in.
pub(crate) fn paint_ortho_matrix(extent: (u32, u32)) -> [[f32; 4]; 4] {
    let (w, h) = (extent.0 as f32, extent.1 as f32);
    [
        [2.0 / w, 0.0, 0.0, 0.0],
        [0.0, 2.0 / h, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [-1.0, -1.0, 0.0, 1.0],
    ]
}

pub(crate) fn identity_matrix() -> [[f32; 4]; 4] {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Texel format of the two paint surface copies. Not sRGB: the surface holds
/// premultiplied values the shader composites linearly.
pub const PAINT_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Creates a bind group layout for a single uniform buffer visible to both
/// shader stages.
pub fn create_uniform_bind_group_layout(device: &Device) -> BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("uniform_bind_group_layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Creates the texture + sampler bind group layout both passes use to sample
/// a paint surface copy.
pub fn create_surface_bind_group_layout(device: &Device) -> BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("surface_bind_group_layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

fn create_uniform_bind_group(device: &Device, buffer: &Buffer) -> BindGroup {
    let bind_group_layout = create_uniform_bind_group_layout(device);
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
        label: Some("uniform_bind_group"),
    })
}

/// The paint pass reads texels aligned one-to-one with the target, so it
/// samples with nearest filtering to avoid bleeding between texels.
pub fn create_paint_sampler(device: &Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

/// The present pass shows the surface under arbitrary zoom, so it filters
/// linearly.
pub fn create_present_sampler(device: &Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// One copy of the double-buffered paint surface.
pub fn create_paint_texture(device: &Device, extent: (u32, u32)) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Paint Surface Texture"),
        size: wgpu::Extent3d {
            width: extent.0,
            height: extent.1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: PAINT_TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

/// Uploads the canvas-covering quad for a pass.
pub fn create_quad_buffers(device: &Device, extent: (u32, u32)) -> (Buffer, Buffer) {
    let vertices = canvas_quad(extent);
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Quad Vertex Buffer"),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Quad Index Buffer"),
        contents: bytemuck::cast_slice(&QUAD_INDICES),
        usage: wgpu::BufferUsages::INDEX,
    });
    (vertex_buffer, index_buffer)
}

/// Creates the paint pipeline plus its uniform plumbing.
///
/// The pipeline writes without fixed-function blending: compositing happens
/// in the shader, which reads the previous surface copy and replaces every
/// texel of the target.
pub fn create_paint_pipeline(
    paint_extent: (u32, u32),
    device: &Device,
) -> (PaintUniforms, Buffer, BindGroup, RenderPipeline) {
    let uniforms = PaintUniforms::new(paint_extent);

    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Paint Uniform Buffer"),
        contents: bytemuck::cast_slice(&[uniforms]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let bind_group = create_uniform_bind_group(device, &uniform_buffer);

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Paint Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("./shaders/paint.wgsl").into()),
    });

    let uniform_layout = create_uniform_bind_group_layout(device);
    let surface_layout = create_surface_bind_group_layout(device);
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Paint Pipeline Layout"),
        bind_group_layouts: &[&uniform_layout, &surface_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Paint Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[TexturedVertex::desc()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: PAINT_TEXTURE_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    (uniforms, uniform_buffer, bind_group, pipeline)
}

/// Creates the present pipeline plus its uniform plumbing.
pub fn create_present_pipeline(
    device: &Device,
    config: &wgpu::SurfaceConfiguration,
) -> (PresentUniforms, Buffer, BindGroup, RenderPipeline) {
    let uniforms = PresentUniforms::new();

    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Present Uniform Buffer"),
        contents: bytemuck::cast_slice(&[uniforms]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let bind_group = create_uniform_bind_group(device, &uniform_buffer);

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Present Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("./shaders/present.wgsl").into()),
    });

    let uniform_layout = create_uniform_bind_group_layout(device);
    let surface_layout = create_surface_bind_group_layout(device);
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Present Pipeline Layout"),
        bind_group_layouts: &[&uniform_layout, &surface_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Present Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[TexturedVertex::desc()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: config.format,
                blend: Some(wgpu::BlendState {
                    color: wgpu::BlendComponent {
                        src_factor: wgpu::BlendFactor::One,
                        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                        operation: wgpu::BlendOperation::Add,
                    },
                    alpha: wgpu::BlendComponent {
                        src_factor: wgpu::BlendFactor::One,
                        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                        operation: wgpu::BlendOperation::Add,
                    },
                }),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    (uniforms, uniform_buffer, bind_group, pipeline)
}

/// Begins the paint pass onto one surface copy. The quad covers the whole
/// target, so the clear is never visible; it exists so the pass starts from
/// a defined state.
pub fn create_paint_pass<'a>(
    encoder: &'a mut wgpu::CommandEncoder,
    target: &TextureView,
) -> wgpu::RenderPass<'a> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Paint Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

/// Begins the present pass onto the window surface, cleared to the workspace
/// background color.
pub fn create_present_pass<'a>(
    encoder: &'a mut wgpu::CommandEncoder,
    target: &TextureView,
) -> wgpu::RenderPass<'a> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Present Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color {
                    r: 0.5,
                    g: 0.5,
                    b: 0.5,
                    a: 1.0,
                }),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}
