//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Opaque color from a `0xRRGGBB` literal
pub const fn rgb(hex: u32) -> [f32; 4] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
        1.0,
    ]
}

/// Colors for map and robot
pub mod colors {
    use super::rgb;

    pub const BACKGROUND: [f32; 4] = rgb(0xf2f6f8);
    pub const GROUND: [f32; 4] = rgb(0xdde5ea);
    pub const TILE_TOP: [f32; 4] = rgb(0xc9d3d9);
    /// Face whose rotated normal points along -z (darker)
    pub const TILE_FRONT: [f32; 4] = rgb(0xadb8bd);
    /// Face whose rotated normal points along -x (lighter)
    pub const TILE_SIDE: [f32; 4] = rgb(0xe5f0f5);
    pub const OUTLINE: [f32; 4] = rgb(0x485256);
    pub const LAMP_OFF: [f32; 4] = rgb(0x0468fb);
    pub const LAMP_ON: [f32; 4] = rgb(0xffe545);
    pub const ROBOT_BODY: [f32; 4] = rgb(0x3a8f5c);
    pub const ROBOT_EYE: [f32; 4] = rgb(0xffffff);
    pub const ROBOT_FLASH: [f32; 4] = rgb(0xfff3a0);
    pub const SPAWN_MARKER: [f32; 4] = [0.9, 0.2, 0.3, 0.85];
    pub const HOVER: [f32; 4] = [1.0, 1.0, 1.0, 0.35];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_channels() {
        assert_eq!(rgb(0xff0000), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(rgb(0x00ff00)[1], 1.0);
        assert_eq!(colors::OUTLINE[3], 1.0);
    }

    #[test]
    fn test_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        let v = [Vertex::new(1.0, 2.0, [0.5; 4])];
        let bytes: &[u8] = bytemuck::cast_slice(&v);
        assert_eq!(bytes.len(), 24);
    }
}
