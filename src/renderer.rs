//! The GPU renderer: owns the wgpu device, the window surface, both render
//! pipelines and the double-buffered paint target.
//!
//! Each frame runs up to two passes. The paint pass runs only when the frame
//! carries a stroke segment; it reads the committed surface copy, stamps the
//! segment and writes the other copy. The present pass always runs and draws
//! whichever copy is current through the camera transform.

use wgpu::{CompositeAlphaMode, InstanceDescriptor, SurfaceTarget};

use crate::canvas::FrameInput;
use crate::paint_surface::PaintSurface;
use crate::pipeline::{
    create_paint_pass, create_paint_pipeline, create_paint_sampler, create_present_pass,
    create_present_pipeline, create_present_sampler, create_quad_buffers, PaintUniforms,
    PresentUniforms,
};
use crate::vertex::QUAD_INDICES;

pub struct Renderer<'a> {
    #[allow(dead_code)]
    instance: wgpu::Instance,
    surface: Option<wgpu::Surface<'a>>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    physical_size: (u32, u32),
    scale_factor: f64,

    paint_surface: PaintSurface,

    paint_uniforms: PaintUniforms,
    paint_uniform_buffer: wgpu::Buffer,
    paint_bind_group: wgpu::BindGroup,
    paint_pipeline: wgpu::RenderPipeline,

    present_uniforms: PresentUniforms,
    present_uniform_buffer: wgpu::Buffer,
    present_bind_group: wgpu::BindGroup,
    present_pipeline: wgpu::RenderPipeline,

    quad_vertex_buffer: wgpu::Buffer,
    quad_index_buffer: wgpu::Buffer,
}

impl<'a> Renderer<'a> {
    /// Creates a renderer bound to a window surface.
    ///
    /// GPU bootstrap failures here are unrecoverable for the application, so
    /// this panics rather than returning an error.
    pub async fn new(
        window: impl Into<SurfaceTarget<'static>>,
        physical_size: (u32, u32),
        scale_factor: f64,
        paint_extent: (u32, u32),
    ) -> Self {
        let instance = wgpu::Instance::new(&InstanceDescriptor::default());
        let surface = instance
            .create_surface(window)
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .unwrap();

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .unwrap();

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: physical_size.0,
            height: physical_size.1,
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: CompositeAlphaMode::Opaque,
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        Self::build_from_device(
            instance,
            Some(surface),
            device,
            queue,
            config,
            physical_size,
            scale_factor,
            paint_extent,
        )
    }

    /// Creates a renderer without a window surface.
    ///
    /// Painting still works and accumulates into the offscreen surface;
    /// calling [`render`] panics because there is nothing to present to.
    /// Returns `None` when no GPU adapter is available, so tests can skip
    /// instead of failing.
    ///
    /// [`render`]: Renderer::render
    pub async fn try_new_headless(physical_size: (u32, u32), paint_extent: (u32, u32)) -> Option<Self> {
        let instance = wgpu::Instance::new(&InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .ok()?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: wgpu::TextureFormat::Bgra8UnormSrgb,
            width: physical_size.0,
            height: physical_size.1,
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: CompositeAlphaMode::Opaque,
            view_formats: vec![],
        };

        Some(Self::build_from_device(
            instance,
            None,
            device,
            queue,
            config,
            physical_size,
            1.0,
            paint_extent,
        ))
    }

    pub async fn new_headless(physical_size: (u32, u32), paint_extent: (u32, u32)) -> Self {
        Self::try_new_headless(physical_size, paint_extent)
            .await
            .expect("Failed to find a suitable GPU adapter for headless rendering")
    }

    /// Shared constructor: takes the wgpu primitives produced by `new()` or
    /// `new_headless()` and builds the full `Renderer`.
    #[allow(clippy::too_many_arguments)]
    fn build_from_device(
        instance: wgpu::Instance,
        surface: Option<wgpu::Surface<'a>>,
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: wgpu::SurfaceConfiguration,
        physical_size: (u32, u32),
        scale_factor: f64,
        paint_extent: (u32, u32),
    ) -> Self {
        let paint_sampler = create_paint_sampler(&device);
        let present_sampler = create_present_sampler(&device);

        let paint_surface =
            PaintSurface::new(&device, &paint_sampler, &present_sampler, paint_extent);

        let (paint_uniforms, paint_uniform_buffer, paint_bind_group, paint_pipeline) =
            create_paint_pipeline(paint_extent, &device);
        let (present_uniforms, present_uniform_buffer, present_bind_group, present_pipeline) =
            create_present_pipeline(&device, &config);

        let (quad_vertex_buffer, quad_index_buffer) = create_quad_buffers(&device, paint_extent);

        Self {
            instance,
            surface,
            device,
            queue,
            config,
            physical_size,
            scale_factor,
            paint_surface,
            paint_uniforms,
            paint_uniform_buffer,
            paint_bind_group,
            paint_pipeline,
            present_uniforms,
            present_uniform_buffer,
            present_bind_group,
            present_pipeline,
            quad_vertex_buffer,
            quad_index_buffer,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn size(&self) -> (u32, u32) {
        self.physical_size
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn paint_surface(&self) -> &PaintSurface {
        &self.paint_surface
    }

    /// Reconfigures the window surface after a resize. The paint surface is
    /// untouched: the painting does not change size with the window.
    pub fn resize(&mut self, new_physical_size: (u32, u32)) {
        if new_physical_size.0 == 0 || new_physical_size.1 == 0 {
            return;
        }
        self.physical_size = new_physical_size;
        self.config.width = new_physical_size.0;
        self.config.height = new_physical_size.1;
        if let Some(surface) = &self.surface {
            surface.configure(&self.device, &self.config);
        }
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor;
    }

    /// Renders one frame from the canvas state snapshot.
    ///
    /// When `frame.segment` is present the paint pass stamps it into the
    /// write copy of the paint surface and the surface flips afterwards,
    /// exactly once. Frames without a segment leave the painting untouched
    /// and only re-present.
    pub fn render(&mut self, frame: &FrameInput) -> Result<(), wgpu::SurfaceError> {
        let surface = self
            .surface
            .as_ref()
            .expect("render() called on a headless renderer");
        let surface_texture = surface.get_current_texture()?;
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let painted = self.encode_frame(frame, Some(&surface_view));

        surface_texture.present();
        if painted {
            self.paint_surface.flip();
        }
        Ok(())
    }

    /// Runs the paint pass without presenting. Useful headless, where
    /// strokes accumulate into the offscreen surface and are read back
    /// separately.
    pub fn paint_only(&mut self, frame: &FrameInput) {
        let painted = self.encode_frame(frame, None);
        if painted {
            self.paint_surface.flip();
        }
    }

    /// Reads the committed paint surface back into `pixels` as tightly
    /// packed RGBA8 rows and returns the surface extent.
    ///
    /// Blocks until the copy completes. Intended for headless use and
    /// pixel-level tests; the interactive path never reads the surface back.
    pub fn read_paint_surface(&self, pixels: &mut Vec<u8>) -> (u32, u32) {
        let (width, height) = self.paint_surface.extent();
        let unpadded_bytes_per_row = width * 4;
        let padded_bytes_per_row = unpadded_bytes_per_row
            .div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let readback_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Paint Readback Buffer"),
            size: (padded_bytes_per_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Paint Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            self.paint_surface.committed_texture().as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &readback_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let buffer_slice = readback_buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = self.device.poll(wgpu::PollType::Wait);
        receiver
            .recv()
            .expect("map_async callback dropped")
            .expect("Failed to map readback buffer");

        let data = buffer_slice.get_mapped_range();
        pixels.clear();
        pixels.reserve((unpadded_bytes_per_row * height) as usize);
        for row in 0..height {
            let offset = (row * padded_bytes_per_row) as usize;
            pixels.extend_from_slice(&data[offset..offset + unpadded_bytes_per_row as usize]);
        }
        drop(data);
        readback_buffer.unmap();

        (width, height)
    }

    /// Encodes and submits the frame's passes. Returns whether the paint
    /// pass ran.
    fn encode_frame(&mut self, frame: &FrameInput, present_target: Option<&wgpu::TextureView>) -> bool {
        let painted = frame.segment.is_some();

        if let Some((start, end)) = frame.segment {
            self.paint_uniforms.stroke_start = [start.x, start.y];
            self.paint_uniforms.stroke_end = [end.x, end.y];
            self.paint_uniforms.brush_color = [
                frame.brush_rgb[0],
                frame.brush_rgb[1],
                frame.brush_rgb[2],
                1.0,
            ];
            self.paint_uniforms.brush_radius = frame.brush_radius;
            self.paint_uniforms.brush_softness = frame.brush_softness;
            self.paint_uniforms.stamp_alpha = frame.stamp_alpha;
            self.queue.write_buffer(
                &self.paint_uniform_buffer,
                0,
                bytemuck::cast_slice(&[self.paint_uniforms]),
            );
        }

        self.present_uniforms.view_proj = frame.view_proj;
        self.queue.write_buffer(
            &self.present_uniform_buffer,
            0,
            bytemuck::cast_slice(&[self.present_uniforms]),
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        if painted {
            let mut pass = create_paint_pass(&mut encoder, self.paint_surface.write_target());
            pass.set_pipeline(&self.paint_pipeline);
            pass.set_bind_group(0, &self.paint_bind_group, &[]);
            pass.set_bind_group(1, self.paint_surface.committed_bind_group(), &[]);
            pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
            pass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
        }

        if let Some(target) = present_target {
            let mut pass = create_present_pass(&mut encoder, target);
            pass.set_pipeline(&self.present_pipeline);
            pass.set_bind_group(0, &self.present_bind_group, &[]);
            pass.set_bind_group(1, self.paint_surface.present_bind_group(painted), &[]);
            pass.set_vertex_buffer(0, self.quad_vertex_buffer.slice(..));
            pass.set_index_buffer(self.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, 0..1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        painted
    }
}
