// Playback of every clip of a model and the resulting animated meshes

use super::interpolation::{Sample, sample_channel};
use super::player::{AnimationPlayer, LoopState};
use super::skeleton::{NodePose, global_matrices};
use super::skinning::{skin_mesh, transform_mesh};
use crate::model::{ChannelTarget, MeshSnapshot, Model};
use nalgebra_glm as glm;

/// Main animation system
pub struct AnimationSystem {
    players: Vec<AnimationPlayer>,
    poses: Vec<NodePose>,
    globals: Vec<glm::Mat4>,
    snapshots: Vec<MeshSnapshot>,
}

impl AnimationSystem {
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
            poses: Vec::new(),
            globals: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    /// Reset to a fresh, stopped player per clip and compute the bind pose.
    pub fn init_from_model(&mut self, model: &Model) {
        self.players = model
            .animations
            .iter()
            .map(|clip| AnimationPlayer::new(clip.duration))
            .collect();
        self.poses.clear();
        self.globals.clear();
        self.snapshots.clear();
        self.apply(model);

        log::debug!(
            "Animation system initialized: {} clips, {} nodes, {} meshes",
            self.players.len(),
            model.nodes.len(),
            model.meshes.len()
        );
    }

    pub fn animation_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, index: usize) -> Option<&AnimationPlayer> {
        self.players.get(index)
    }

    pub fn play_all(&mut self) {
        self.players.iter_mut().for_each(AnimationPlayer::play);
    }

    pub fn set_paused_for_all(&mut self, paused: bool) {
        for player in &mut self.players {
            player.set_paused(paused);
        }
    }

    pub fn set_loop_state_for_all(&mut self, state: LoopState) {
        for player in &mut self.players {
            player.set_loop_state(state);
        }
    }

    pub fn set_position_for_all(&mut self, position: f32) {
        for player in &mut self.players {
            player.set_position(position);
        }
    }

    /// Advance every playing, unpaused clip by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        for player in &mut self.players {
            player.update(dt);
        }
    }

    /// Sample every playing clip into node poses, resolve the hierarchy and
    /// rebuild the animated mesh snapshots.
    pub fn apply(&mut self, model: &Model) {
        self.poses.clear();
        self.poses.extend(model.nodes.iter().map(NodePose::from_node));

        // Later clips override channels of earlier ones
        for (clip, player) in model.animations.iter().zip(&self.players) {
            if !player.is_playing() {
                continue;
            }
            let time = player.time();
            for channel in &clip.channels {
                let Some(pose) = self.poses.get_mut(channel.node) else {
                    continue;
                };
                match (channel.target, sample_channel(channel, time)) {
                    (ChannelTarget::Translation, Some(Sample::Vec3(v))) => pose.translation = v,
                    (ChannelTarget::Scale, Some(Sample::Vec3(v))) => pose.scale = v,
                    (ChannelTarget::Rotation, Some(Sample::Quat(q))) => pose.rotation = q,
                    _ => {}
                }
            }
        }

        self.globals = global_matrices(&model.nodes, &self.poses);

        self.snapshots = model
            .meshes
            .iter()
            .map(|mesh| {
                let skin = mesh.skin.and_then(|s| model.skins.get(s));
                match skin {
                    Some(skin) if mesh.is_skinned() => {
                        let joint_matrices: Vec<glm::Mat4> = skin
                            .joints
                            .iter()
                            .enumerate()
                            .map(|(j, &node)| self.global(node) * skin.inverse_bind(j))
                            .collect();
                        skin_mesh(mesh, &joint_matrices)
                    }
                    _ => transform_mesh(mesh, &self.global(mesh.node)),
                }
            })
            .collect();
    }

    fn global(&self, node: usize) -> glm::Mat4 {
        self.globals.get(node).copied().unwrap_or_else(glm::identity)
    }

    /// Animated snapshot of mesh `index` for the current frame.
    pub fn current_animated_mesh(&self, index: usize) -> Option<&MeshSnapshot> {
        self.snapshots.get(index)
    }

    pub fn animated_meshes(&self) -> &[MeshSnapshot] {
        &self.snapshots
    }
}

impl Default for AnimationSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AnimationClip, Channel, ChannelValues, Interpolation, Mesh, Node, Skin,
    };
    use approx::assert_relative_eq;

    /// Root joint with a child joint one unit up; a single vertex bound to
    /// the child. The clip slides the root along x by 10 over 2 seconds.
    fn rigged_model() -> Model {
        let nodes = vec![
            Node {
                name: "root".into(),
                ..Node::default()
            },
            Node {
                name: "tip".into(),
                parent: Some(0),
                translation: glm::vec3(0.0, 1.0, 0.0),
                ..Node::default()
            },
            Node {
                name: "mesh".into(),
                ..Node::default()
            },
        ];
        let skin = Skin {
            name: "skin".into(),
            joints: vec![0, 1],
            inverse_bind_matrices: vec![
                glm::identity(),
                glm::translation(&glm::vec3(0.0, -1.0, 0.0)),
            ],
        };
        let mesh = Mesh {
            positions: vec![[0.0, 1.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            indices: vec![0, 1, 2],
            joints: vec![[1, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
            weights: vec![[1.0, 0.0, 0.0, 0.0]; 3],
            node: 2,
            skin: Some(0),
            ..Mesh::default()
        };
        let clip = AnimationClip {
            name: "slide".into(),
            duration: 2.0,
            channels: vec![Channel {
                node: 0,
                target: ChannelTarget::Translation,
                interpolation: Interpolation::Linear,
                times: vec![0.0, 2.0],
                values: ChannelValues::Vec3(vec![glm::vec3(0.0, 0.0, 0.0), glm::vec3(10.0, 0.0, 0.0)]),
            }],
        };
        Model {
            name: "rig".into(),
            meshes: vec![mesh],
            nodes,
            skins: vec![skin],
            animations: vec![clip],
            ..Model::default()
        }
    }

    #[test]
    fn stopped_clips_show_bind_pose() {
        let model = rigged_model();
        let mut system = AnimationSystem::new();
        system.init_from_model(&model);

        assert_eq!(system.animation_count(), 1);
        let mesh = system.current_animated_mesh(0).map(|m| m.positions.clone());
        assert_eq!(mesh, Some(model.meshes[0].positions.clone()));
    }

    #[test]
    fn scrubbing_moves_skinned_vertices() {
        let model = rigged_model();
        let mut system = AnimationSystem::new();
        system.init_from_model(&model);
        system.play_all();
        system.set_paused_for_all(true);
        system.set_position_for_all(0.5);
        system.apply(&model);

        let Some(mesh) = system.current_animated_mesh(0) else {
            panic!("mesh snapshot missing");
        };
        assert_relative_eq!(mesh.positions[0][0], 5.0, epsilon = 1e-5);
        assert_relative_eq!(mesh.positions[0][1], 1.0, epsilon = 1e-5);
        assert_relative_eq!(mesh.positions[2][0], 6.0, epsilon = 1e-5);
    }

    #[test]
    fn update_advances_only_unpaused_players() {
        let model = rigged_model();
        let mut system = AnimationSystem::new();
        system.init_from_model(&model);
        system.play_all();
        system.set_paused_for_all(true);
        system.update(1.0);
        assert_eq!(system.player(0).map(AnimationPlayer::position), Some(0.0));

        system.set_paused_for_all(false);
        system.update(1.0);
        assert_eq!(system.player(0).map(AnimationPlayer::position), Some(0.5));
    }

    #[test]
    fn unskinned_mesh_follows_its_node() {
        let mut model = rigged_model();
        model.meshes[0].skin = None;
        model.meshes[0].node = 1;
        let mut system = AnimationSystem::new();
        system.init_from_model(&model);

        let Some(mesh) = system.current_animated_mesh(0) else {
            panic!("mesh snapshot missing");
        };
        assert_relative_eq!(mesh.positions[1][1], 1.0, epsilon = 1e-6);
    }
}
