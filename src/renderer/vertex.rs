use crate::model::MeshSnapshot;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub(crate) position: [f32; 3],
    pub(crate) normal: [f32; 3],
    pub(crate) uv: [f32; 2],
    pub(crate) color: [f32; 4],
}

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: (size_of::<[f32; 3]>() * 2) as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: (size_of::<[f32; 3]>() * 2 + size_of::<[f32; 2]>())
                        as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }

    /// Interleave a snapshot. Missing attributes fall back to a +Z normal,
    /// zero texcoords and opaque white.
    pub fn from_snapshot(snapshot: &MeshSnapshot) -> Vec<Vertex> {
        snapshot
            .positions
            .iter()
            .enumerate()
            .map(|(i, &position)| Vertex {
                position,
                normal: snapshot.normals.get(i).copied().unwrap_or([0.0, 0.0, 1.0]),
                uv: snapshot.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
                color: snapshot.colors.get(i).copied().unwrap_or([1.0; 4]),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_stride_matches_struct() {
        assert_eq!(size_of::<Vertex>(), 48);
        assert_eq!(Vertex::desc().array_stride, 48);
        assert_eq!(Vertex::desc().attributes[3].offset, 32);
    }

    #[test]
    fn snapshot_gaps_are_filled() {
        let snapshot = MeshSnapshot {
            positions: vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
            tex_coords: vec![[0.5, 0.25]],
            ..MeshSnapshot::default()
        };
        let vertices = Vertex::from_snapshot(&snapshot);
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[0].uv, [0.5, 0.25]);
        assert_eq!(vertices[1].uv, [0.0, 0.0]);
        assert_eq!(vertices[1].normal, [0.0, 0.0, 1.0]);
        assert_eq!(vertices[1].color, [1.0; 4]);
    }
}
