/// Where one mesh lives in the shared vertex and index buffers, plus what to
/// bind when drawing it.
#[derive(Debug)]
pub struct MeshRenderInfo {
    pub index_start: u32,
    pub index_count: u32,
    pub base_vertex: i32,
    pub texture_id: Option<usize>,
    pub material_bind_group: wgpu::BindGroup,
}

/// Line-list topology of the wireframe copy. Built once per model, since
/// animation only moves vertices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WireTopology {
    #[default]
    Stale,
    Built { index_count: u32 },
}

impl WireTopology {
    pub fn needs_build(&self) -> bool {
        matches!(self, WireTopology::Stale)
    }

    pub fn index_count(&self) -> u32 {
        match self {
            WireTopology::Stale => 0,
            WireTopology::Built { index_count } => *index_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_without_lines_is_not_rebuilt() {
        let mut topology = WireTopology::default();
        assert!(topology.needs_build());

        topology = WireTopology::Built { index_count: 0 };
        assert!(!topology.needs_build());
        assert_eq!(topology.index_count(), 0);
    }

    #[test]
    fn built_topology_reports_its_lines() {
        let topology = WireTopology::Built { index_count: 12 };
        assert!(!topology.needs_build());
        assert_eq!(topology.index_count(), 12);
        assert_eq!(WireTopology::Stale.index_count(), 0);
    }
}
