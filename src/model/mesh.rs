/// Triangle mesh in its bind pose.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
    // Four influences per vertex, empty when the mesh is not skinned
    pub joints: Vec<[u16; 4]>,
    pub weights: Vec<[f32; 4]>,
    pub node: usize,
    pub skin: Option<usize>,
    pub material_id: Option<usize>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_skinned(&self) -> bool {
        self.skin.is_some() && !self.joints.is_empty() && self.joints.len() == self.weights.len()
    }
}

/// Vertices of one mesh for the current animated frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshSnapshot {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
    pub material_id: Option<usize>,
}

impl MeshSnapshot {
    /// Bind pose copy of `mesh`.
    pub fn from_mesh(mesh: &Mesh) -> Self {
        Self {
            positions: mesh.positions.clone(),
            normals: mesh.normals.clone(),
            tex_coords: mesh.tex_coords.clone(),
            colors: mesh.colors.clone(),
            indices: mesh.indices.clone(),
            material_id: mesh.material_id,
        }
    }

    /// Unique triangle edges as index pairs, for wireframe drawing.
    pub fn wireframe_indices(&self) -> Vec<u32> {
        let mut seen = std::collections::HashSet::new();
        let mut lines = Vec::with_capacity(self.indices.len() * 2);
        for tri in self.indices.chunks_exact(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                let key = (a.min(b), a.max(b));
                if seen.insert(key) {
                    lines.push(a);
                    lines.push(b);
                }
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_wireframe_shares_diagonal_once() {
        let snapshot = MeshSnapshot {
            positions: vec![[0.0; 3]; 4],
            indices: vec![0, 1, 2, 2, 1, 3],
            ..MeshSnapshot::default()
        };
        let lines = snapshot.wireframe_indices();
        // 4 outer edges + 1 shared diagonal
        assert_eq!(lines.len(), 10);
    }

    #[test]
    fn skinned_requires_matching_influences() {
        let mut mesh = Mesh {
            skin: Some(0),
            joints: vec![[0; 4]; 2],
            weights: vec![[1.0, 0.0, 0.0, 0.0]],
            ..Mesh::default()
        };
        assert!(!mesh.is_skinned());
        mesh.weights.push([1.0, 0.0, 0.0, 0.0]);
        assert!(mesh.is_skinned());
    }
}
