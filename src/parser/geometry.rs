use nalgebra_glm as glm;

/// Triangle list from raw indices. A triangle referencing a vertex past
/// `vertex_count` is dropped whole, as is a trailing partial triangle.
pub fn triangle_indices(indices: impl IntoIterator<Item = u32>, vertex_count: usize) -> Vec<u32> {
    let indices: Vec<u32> = indices.into_iter().collect();
    let mut dropped = 0usize;
    let mut triangles = Vec::with_capacity(indices.len() - indices.len() % 3);

    for tri in indices.chunks_exact(3) {
        if tri.iter().all(|&i| (i as usize) < vertex_count) {
            triangles.extend_from_slice(tri);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        log::warn!("Dropped {dropped} triangles with out-of-range indices");
    }
    triangles
}

/// Area-weighted vertex normals for meshes that ship without them.
pub fn compute_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![glm::vec3(0.0, 0.0, 0.0); positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (Some(pa), Some(pb), Some(pc)) = (positions.get(a), positions.get(b), positions.get(c))
        else {
            continue;
        };
        let pa = glm::make_vec3(pa);
        let face = glm::cross(&(glm::make_vec3(pb) - pa), &(glm::make_vec3(pc) - pa));
        acc[a] += face;
        acc[b] += face;
        acc[c] += face;
    }
    acc.into_iter()
        .map(|n| {
            let len = glm::length(&n);
            if len > f32::EPSILON {
                [n.x / len, n.y / len, n.z / len]
            } else {
                [0.0, 0.0, 1.0]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn out_of_range_index_drops_its_whole_triangle() {
        assert_eq!(triangle_indices([0, 1, 7, 0, 1, 2], 3), vec![0, 1, 2]);
        assert_eq!(triangle_indices([0, 1, 2, 2, 1, 3], 3), vec![0, 1, 2]);
    }

    #[test]
    fn trailing_indices_are_dropped() {
        assert_eq!(triangle_indices([0, 1, 2, 3], 4), vec![0, 1, 2]);
        assert!(triangle_indices([0, 1], 2).is_empty());
    }

    #[test]
    fn normals_follow_winding() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let normals = compute_normals(&positions, &[0, 1, 2]);
        assert_relative_eq!(normals[0][2], 1.0);

        let flipped = compute_normals(&positions, &[0, 2, 1]);
        assert_relative_eq!(flipped[1][2], -1.0);
    }

    #[test]
    fn unused_vertices_get_a_default_normal() {
        let positions = [[0.0; 3]; 4];
        let normals = compute_normals(&positions, &[]);
        assert_eq!(normals, vec![[0.0, 0.0, 1.0]; 4]);
    }
}
