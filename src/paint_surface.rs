use wgpu::{BindGroup, Device, Texture, TextureView};

use crate::pipeline::{create_paint_texture, create_surface_bind_group_layout};

/// The double-buffered offscreen paint target.
///
/// One copy is committed (the accumulated painting so far), the other is the
/// write target for the current frame's paint pass. A pass never reads the
/// copy it writes; [`PaintSurface::flip`] swaps the roles exactly once per
/// committed paint frame. Frames that paint nothing leave the index alone.
pub struct PaintSurface {
    textures: [Texture; 2],
    views: [TextureView; 2],
    /// Nearest-filtered bind groups for the paint pass, which reads texels
    /// aligned one-to-one with the target.
    paint_bind_groups: [BindGroup; 2],
    /// Linear-filtered bind groups for the present pass, which shows the
    /// surface under arbitrary zoom.
    present_bind_groups: [BindGroup; 2],
    /// Index of the copy the next paint pass writes. The committed copy is
    /// the other one.
    write_index: usize,
    extent: (u32, u32),
}

impl PaintSurface {
    /// Creates both copies. New textures are zero-initialized, so the canvas
    /// starts fully transparent.
    pub fn new(
        device: &Device,
        paint_sampler: &wgpu::Sampler,
        present_sampler: &wgpu::Sampler,
        extent: (u32, u32),
    ) -> Self {
        let layout = create_surface_bind_group_layout(device);
        let textures = [
            create_paint_texture(device, extent),
            create_paint_texture(device, extent),
        ];
        let views = [
            textures[0].create_view(&wgpu::TextureViewDescriptor::default()),
            textures[1].create_view(&wgpu::TextureViewDescriptor::default()),
        ];
        let paint_bind_groups = [
            create_sample_bind_group(device, &layout, &views[0], paint_sampler),
            create_sample_bind_group(device, &layout, &views[1], paint_sampler),
        ];
        let present_bind_groups = [
            create_sample_bind_group(device, &layout, &views[0], present_sampler),
            create_sample_bind_group(device, &layout, &views[1], present_sampler),
        ];
        Self {
            textures,
            views,
            paint_bind_groups,
            present_bind_groups,
            write_index: 0,
            extent,
        }
    }

    pub fn extent(&self) -> (u32, u32) {
        self.extent
    }

    /// View the current paint pass renders into.
    pub fn write_target(&self) -> &TextureView {
        &self.views[self.write_index]
    }

    /// Bind group over the committed copy, for the paint pass to read.
    pub fn committed_bind_group(&self) -> &BindGroup {
        &self.paint_bind_groups[self.write_index ^ 1]
    }

    /// Bind group over the copy the present pass should show. After a painted
    /// frame this is the freshly written copy; call it before [`flip`], with
    /// `painted` saying whether the paint pass ran this frame.
    ///
    /// [`flip`]: PaintSurface::flip
    pub fn present_bind_group(&self, painted: bool) -> &BindGroup {
        if painted {
            &self.present_bind_groups[self.write_index]
        } else {
            &self.present_bind_groups[self.write_index ^ 1]
        }
    }

    /// Commits the frame's paint pass output by swapping the copies' roles.
    /// Call exactly once per frame that painted.
    pub fn flip(&mut self) {
        self.write_index ^= 1;
    }

    /// Texture backing the committed copy, for readback.
    pub fn committed_texture(&self) -> &Texture {
        &self.textures[self.write_index ^ 1]
    }
}

fn create_sample_bind_group(
    device: &Device,
    layout: &wgpu::BindGroupLayout,
    view: &TextureView,
    sampler: &wgpu::Sampler,
) -> BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some("surface_sample_bind_group"),
    })
}
