use bytemuck::{Pod, Zeroable};

/// A quad vertex: position in canvas-texel space plus texture coordinates.
/// Both render passes draw the same canvas-sized quad through different
/// transforms.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TexturedVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

impl TexturedVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TexturedVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Two triangles covering the quad.
pub(crate) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

/// A canvas-covering quad with texel positions in `[0, w] x [0, h]` and
/// matching texture coordinates.
pub(crate) fn canvas_quad(extent: (u32, u32)) -> [TexturedVertex; 4] {
    let (w, h) = (extent.0 as f32, extent.1 as f32);
    [
        TexturedVertex {
            position: [0.0, 0.0],
            tex_coords: [0.0, 0.0],
        },
        TexturedVertex {
            position: [0.0, h],
            tex_coords: [0.0, 1.0],
        },
        TexturedVertex {
            position: [w, h],
            tex_coords: [1.0, 1.0],
        },
        TexturedVertex {
            position: [w, 0.0],
            tex_coords: [1.0, 0.0],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_corners_match_texture_coordinates() {
        let quad = canvas_quad((1024, 512));
        for vertex in quad {
            assert_eq!(vertex.position[0], vertex.tex_coords[0] * 1024.0);
            assert_eq!(vertex.position[1], vertex.tex_coords[1] * 512.0);
        }
    }
}
