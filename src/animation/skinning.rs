// CPU linear blend skinning

use crate::model::{Mesh, MeshSnapshot};
use nalgebra_glm as glm;

fn transform_point(m: &glm::Mat4, p: &[f32; 3]) -> glm::Vec3 {
    let v = m * glm::vec4(p[0], p[1], p[2], 1.0);
    glm::vec3(v.x, v.y, v.z)
}

fn normalized(v: glm::Vec3) -> [f32; 3] {
    let len = glm::length(&v);
    if len > f32::EPSILON {
        let n = v / len;
        [n.x, n.y, n.z]
    } else {
        [v.x, v.y, v.z]
    }
}

/// Mesh transformed rigidly by `matrix`.
pub fn transform_mesh(mesh: &Mesh, matrix: &glm::Mat4) -> MeshSnapshot {
    let normal_matrix = glm::inverse_transpose(glm::mat4_to_mat3(matrix));
    let mut snapshot = MeshSnapshot::from_mesh(mesh);

    snapshot.positions = mesh
        .positions
        .iter()
        .map(|p| {
            let v = transform_point(matrix, p);
            [v.x, v.y, v.z]
        })
        .collect();
    snapshot.normals = mesh
        .normals
        .iter()
        .map(|n| normalized(normal_matrix * glm::vec3(n[0], n[1], n[2])))
        .collect();

    snapshot
}

/// Mesh deformed by `joint_matrices` (global joint matrix times inverse
/// bind matrix, one per skin joint).
pub fn skin_mesh(mesh: &Mesh, joint_matrices: &[glm::Mat4]) -> MeshSnapshot {
    let mut snapshot = MeshSnapshot::from_mesh(mesh);

    for (i, pos) in mesh.positions.iter().enumerate() {
        let (Some(joints), Some(weights)) = (mesh.joints.get(i), mesh.weights.get(i)) else {
            continue;
        };

        let mut blended = glm::Mat4::zeros();
        let mut total = 0.0;
        for (&joint, &weight) in joints.iter().zip(weights.iter()) {
            if weight <= 0.0 {
                continue;
            }
            let Some(m) = joint_matrices.get(joint as usize) else {
                continue;
            };
            blended += m * weight;
            total += weight;
        }

        // Unweighted vertices stay in bind pose
        if total <= f32::EPSILON {
            continue;
        }
        blended /= total;

        let p = transform_point(&blended, pos);
        snapshot.positions[i] = [p.x, p.y, p.z];

        if let Some(n) = mesh.normals.get(i) {
            let m3 = glm::mat4_to_mat3(&blended);
            snapshot.normals[i] = normalized(m3 * glm::vec3(n[0], n[1], n[2]));
        }
    }

    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_vertex_mesh() -> Mesh {
        Mesh {
            positions: vec![[0.0, 1.0, 0.0], [0.0, 2.0, 0.0]],
            normals: vec![[1.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            indices: vec![0, 1, 1],
            joints: vec![[0, 0, 0, 0], [0, 1, 0, 0]],
            weights: vec![[1.0, 0.0, 0.0, 0.0], [0.5, 0.5, 0.0, 0.0]],
            skin: Some(0),
            ..Mesh::default()
        }
    }

    #[test]
    fn identity_joints_keep_bind_pose() {
        let mesh = two_vertex_mesh();
        let identity: glm::Mat4 = glm::identity();
        let snapshot = skin_mesh(&mesh, &[identity, identity]);
        assert_eq!(snapshot.positions, mesh.positions);
        assert_eq!(snapshot.normals, mesh.normals);
        assert_eq!(snapshot.indices, mesh.indices);
    }

    #[test]
    fn weights_blend_between_joints() {
        let mesh = two_vertex_mesh();
        let identity: glm::Mat4 = glm::identity();
        let shifted = glm::translation(&glm::vec3(4.0, 0.0, 0.0));
        let snapshot = skin_mesh(&mesh, &[identity, shifted]);

        assert_eq!(snapshot.positions[0], [0.0, 1.0, 0.0]);
        assert_relative_eq!(snapshot.positions[1][0], 2.0);
        assert_relative_eq!(snapshot.positions[1][1], 2.0);
    }

    #[test]
    fn missing_joint_matrices_leave_vertex_alone() {
        let mesh = two_vertex_mesh();
        let snapshot = skin_mesh(&mesh, &[]);
        assert_eq!(snapshot.positions, mesh.positions);
    }

    #[test]
    fn rigid_transform_rotates_normals() {
        let mesh = two_vertex_mesh();
        let rot = glm::rotation(std::f32::consts::FRAC_PI_2, &glm::vec3(0.0, 0.0, 1.0));
        let snapshot = transform_mesh(&mesh, &rot);
        assert_relative_eq!(snapshot.positions[0][0], -1.0, epsilon = 1e-6);
        assert_relative_eq!(snapshot.normals[0][1], 1.0, epsilon = 1e-6);
    }
}
