// Node hierarchy resolution

use crate::model::{Node, compose};
use nalgebra_glm as glm;

/// Animated local transform of one node.
#[derive(Debug, Clone)]
pub struct NodePose {
    pub translation: glm::Vec3,
    pub rotation: glm::Quat,
    pub scale: glm::Vec3,
}

impl NodePose {
    pub fn from_node(node: &Node) -> Self {
        Self {
            translation: node.translation,
            rotation: node.rotation,
            scale: node.scale,
        }
    }

    pub fn matrix(&self) -> glm::Mat4 {
        compose(&self.translation, &self.rotation, &self.scale)
    }
}

/// Model-space matrix of every node, given its local pose.
/// Parents may appear after their children in `nodes`.
pub fn global_matrices(nodes: &[Node], poses: &[NodePose]) -> Vec<glm::Mat4> {
    let mut globals: Vec<Option<glm::Mat4>> = vec![None; nodes.len()];

    for start in 0..nodes.len() {
        if globals[start].is_some() {
            continue;
        }

        // Collect the chain of unresolved ancestors, root-most last
        let mut chain = vec![start];
        let mut current = start;
        while let Some(parent) = nodes[current].parent {
            if parent >= nodes.len() || globals[parent].is_some() || chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = parent;
        }

        for &idx in chain.iter().rev() {
            let local = poses
                .get(idx)
                .map(NodePose::matrix)
                .unwrap_or_else(|| nodes[idx].local_matrix());
            let parent_global = nodes[idx]
                .parent
                .and_then(|p| globals.get(p).copied().flatten());
            globals[idx] = Some(match parent_global {
                Some(parent) => parent * local,
                None => local,
            });
        }
    }

    globals
        .into_iter()
        .map(|m| m.unwrap_or_else(glm::identity))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn node(parent: Option<usize>, x: f32) -> Node {
        Node {
            parent,
            translation: glm::vec3(x, 0.0, 0.0),
            ..Node::default()
        }
    }

    #[test]
    fn children_accumulate_parent_transforms() {
        // Child listed before its parent
        let nodes = vec![node(Some(1), 1.0), node(None, 2.0), node(Some(0), 4.0)];
        let poses: Vec<NodePose> = nodes.iter().map(NodePose::from_node).collect();
        let globals = global_matrices(&nodes, &poses);

        let origin = glm::vec4(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!((globals[1] * origin).x, 2.0);
        assert_relative_eq!((globals[0] * origin).x, 3.0);
        assert_relative_eq!((globals[2] * origin).x, 7.0);
    }

    #[test]
    fn rotated_parent_rotates_child_offset() {
        let mut parent = node(None, 0.0);
        parent.rotation = glm::quat_angle_axis(std::f32::consts::FRAC_PI_2, &glm::vec3(0.0, 0.0, 1.0));
        let nodes = vec![parent, node(Some(0), 1.0)];
        let poses: Vec<NodePose> = nodes.iter().map(NodePose::from_node).collect();
        let globals = global_matrices(&nodes, &poses);

        let p = globals[1] * glm::vec4(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn parent_cycle_does_not_hang() {
        let nodes = vec![node(Some(1), 1.0), node(Some(0), 1.0)];
        let poses: Vec<NodePose> = nodes.iter().map(NodePose::from_node).collect();
        assert_eq!(global_matrices(&nodes, &poses).len(), 2);
    }
}
