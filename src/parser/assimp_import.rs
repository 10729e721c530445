// Assimp import for Collada, DirectX and the other formats glTF does not cover.

use crate::error::ViewerError;
use crate::model::{
    AnimationClip, Channel, ChannelTarget, ChannelValues, Interpolation, Material, Mesh, Model,
    Node, Skin, Texture,
};
use crate::parser::geometry::{compute_normals, triangle_indices};
use nalgebra_glm as glm;
use russimp::animation::Animation as AiAnimation;
use russimp::material::{Material as AiMaterial, PropertyTypeInfo, TextureType};
use russimp::mesh::Mesh as AiMesh;
use russimp::node::Node as AiNode;
use russimp::scene::{PostProcess, Scene};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Extensions routed through Assimp, lower case.
pub const EXTENSIONS: &[&str] = &["dae", "x", "fbx", "obj", "3ds", "ms3d", "md5mesh", "blend"];

/// Assimp counts key times in ticks; files without a rate use this one.
const DEFAULT_TICKS_PER_SECOND: f64 = 25.0;

pub fn import_file(path: &Path) -> Result<Model, ViewerError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| ViewerError::new("invalid-path").with_arg("path", path.display()))?;

    let scene = Scene::from_file(
        path_str,
        vec![
            PostProcess::Triangulate,
            PostProcess::JoinIdenticalVertices,
            PostProcess::GenerateSmoothNormals,
            PostProcess::LimitBoneWeights,
            PostProcess::SortByPrimitiveType,
            PostProcess::FlipUVs,
        ],
    )
    .map_err(|e| ViewerError::new("assimp-error").with_arg("reason", format!("{e:?}")))?;

    let base_dir = path.parent().unwrap_or(Path::new("."));
    Ok(build_model(&scene, base_dir))
}

fn build_model(scene: &Scene, base_dir: &Path) -> Model {
    let mut nodes = Vec::new();
    let mut mesh_refs = Vec::new();
    if let Some(root) = &scene.root {
        walk_nodes(root, None, &mut nodes, &mut mesh_refs);
    }

    let node_index: HashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n): (usize, &Node)| (n.name.as_str(), i))
        .collect();

    let mut meshes = Vec::new();
    let mut skins = Vec::new();
    for &(node, mesh_id) in &mesh_refs {
        let Some(ai_mesh) = scene.meshes.get(mesh_id as usize) else {
            log::warn!("Node {node} references missing mesh {mesh_id}");
            continue;
        };
        if let Some(mesh) = read_mesh(ai_mesh, node, &node_index, &mut skins) {
            meshes.push(mesh);
        }
    }

    let mut textures = TextureCache::new(base_dir);
    let materials = scene
        .materials
        .iter()
        .map(|m| read_material(m, &mut textures))
        .collect();

    let animations = scene
        .animations
        .iter()
        .enumerate()
        .map(|(idx, a)| read_animation(idx, a, &node_index))
        .collect();

    Model {
        meshes,
        materials,
        textures: textures.into_textures(),
        nodes,
        skins,
        animations,
        ..Model::default()
    }
}

/// Flatten the node tree depth first, recording which node owns which mesh.
fn walk_nodes(
    node: &AiNode,
    parent: Option<usize>,
    nodes: &mut Vec<Node>,
    mesh_refs: &mut Vec<(usize, u32)>,
) {
    let index = nodes.len();
    let t = &node.transformation;
    let matrix = glm::Mat4::new(
        t.a1, t.a2, t.a3, t.a4, t.b1, t.b2, t.b3, t.b4, t.c1, t.c2, t.c3, t.c4, t.d1, t.d2, t.d3,
        t.d4,
    );
    let (translation, rotation, scale) = decompose(&matrix);
    nodes.push(Node {
        name: node.name.clone(),
        parent,
        translation,
        rotation,
        scale,
    });
    mesh_refs.extend(node.meshes.iter().map(|&m| (index, m)));

    for child in node.children.borrow().iter() {
        walk_nodes(child, Some(index), nodes, mesh_refs);
    }
}

/// Split an affine matrix into translation, rotation and scale.
fn decompose(m: &glm::Mat4) -> (glm::Vec3, glm::Quat, glm::Vec3) {
    let translation = glm::vec3(m[(0, 3)], m[(1, 3)], m[(2, 3)]);
    let columns = [0, 1, 2].map(|c| glm::vec3(m[(0, c)], m[(1, c)], m[(2, c)]));
    let mut scale = glm::vec3(
        glm::length(&columns[0]),
        glm::length(&columns[1]),
        glm::length(&columns[2]),
    );

    let basis = glm::Mat3::from_columns(&columns);
    if glm::determinant(&basis) < 0.0 {
        scale.x = -scale.x;
    }
    if scale.iter().any(|s| s.abs() <= f32::EPSILON) {
        return (translation, glm::quat_identity(), scale);
    }

    let rotation = glm::Mat3::from_columns(&[
        columns[0] / scale.x,
        columns[1] / scale.y,
        columns[2] / scale.z,
    ]);
    (translation, glm::quat_normalize(&glm::mat3_to_quat(&rotation)), scale)
}

fn read_mesh(
    ai: &AiMesh,
    node: usize,
    node_index: &HashMap<&str, usize>,
    skins: &mut Vec<Skin>,
) -> Option<Mesh> {
    let positions: Vec<[f32; 3]> = ai.vertices.iter().map(|v| [v.x, v.y, v.z]).collect();
    let vertex_count = positions.len();

    // Points and lines are sorted into their own meshes
    let indices = triangle_indices(
        ai.faces
            .iter()
            .filter(|f| f.0.len() == 3)
            .flat_map(|f| f.0.iter().copied()),
        vertex_count,
    );
    if vertex_count == 0 || indices.is_empty() {
        log::debug!("Skipping mesh '{}' without triangles", ai.name);
        return None;
    }

    let normals = if ai.normals.len() == vertex_count {
        ai.normals.iter().map(|n| [n.x, n.y, n.z]).collect()
    } else {
        compute_normals(&positions, &indices)
    };
    let tex_coords = ai
        .texture_coords
        .first()
        .and_then(Option::as_ref)
        .map(|uvs| uvs.iter().map(|uv| [uv.x, uv.y]).collect())
        .unwrap_or_default();
    let colors = ai
        .colors
        .first()
        .and_then(Option::as_ref)
        .map(|cs| cs.iter().map(|c| [c.r, c.g, c.b, c.a]).collect())
        .unwrap_or_default();

    let mut mesh = Mesh {
        name: ai.name.clone(),
        positions,
        normals,
        tex_coords,
        colors,
        indices,
        node,
        material_id: Some(ai.material_index as usize),
        ..Mesh::default()
    };

    if !ai.bones.is_empty() {
        let mut influences: Vec<Vec<(u16, f32)>> = vec![Vec::new(); vertex_count];
        let mut joints = Vec::with_capacity(ai.bones.len());
        let mut inverse_bind_matrices = Vec::with_capacity(ai.bones.len());

        for bone in &ai.bones {
            let Some(&bone_node) = node_index.get(bone.name.as_str()) else {
                log::warn!("Bone '{}' of mesh '{}' has no node", bone.name, ai.name);
                continue;
            };
            let Ok(joint) = u16::try_from(joints.len()) else {
                log::warn!("Mesh '{}' has more bones than a joint index holds", ai.name);
                break;
            };
            joints.push(bone_node);
            let o = &bone.offset_matrix;
            inverse_bind_matrices.push(glm::Mat4::new(
                o.a1, o.a2, o.a3, o.a4, o.b1, o.b2, o.b3, o.b4, o.c1, o.c2, o.c3, o.c4, o.d1,
                o.d2, o.d3, o.d4,
            ));
            for w in &bone.weights {
                if let Some(list) = influences.get_mut(w.vertex_id as usize) {
                    list.push((joint, w.weight));
                }
            }
        }

        let (vertex_joints, vertex_weights): (Vec<[u16; 4]>, Vec<[f32; 4]>) =
            influences.into_iter().map(strongest_four).unzip();
        mesh.joints = vertex_joints;
        mesh.weights = vertex_weights;
        mesh.skin = Some(skins.len());
        skins.push(Skin {
            name: ai.name.clone(),
            joints,
            inverse_bind_matrices,
        });
    }

    Some(mesh)
}

/// Keep the four heaviest influences of a vertex, normalized to sum to one.
fn strongest_four(mut influences: Vec<(u16, f32)>) -> ([u16; 4], [f32; 4]) {
    influences.sort_by(|a, b| b.1.total_cmp(&a.1));
    influences.truncate(4);

    let mut joints = [0u16; 4];
    let mut weights = [0.0f32; 4];
    for (slot, (joint, weight)) in influences.into_iter().enumerate() {
        joints[slot] = joint;
        weights[slot] = weight.max(0.0);
    }

    let total: f32 = weights.iter().sum();
    if total > f32::EPSILON {
        weights.iter_mut().for_each(|w| *w /= total);
    }
    (joints, weights)
}

/// Diffuse textures referenced by file, decoded once each.
struct TextureCache<'a> {
    base_dir: &'a Path,
    textures: Vec<Texture>,
    by_file: HashMap<String, Option<usize>>,
}

impl<'a> TextureCache<'a> {
    fn new(base_dir: &'a Path) -> Self {
        Self {
            base_dir,
            textures: Vec::new(),
            by_file: HashMap::new(),
        }
    }

    fn get(&mut self, file: &str) -> Option<usize> {
        if let Some(&cached) = self.by_file.get(file) {
            return cached;
        }

        let id = match self.decode(file) {
            Ok(texture) => {
                self.textures.push(texture);
                Some(self.textures.len() - 1)
            }
            Err(e) => {
                log::warn!("Texture '{file}' not loaded: {e}");
                None
            }
        };
        self.by_file.insert(file.to_string(), id);
        id
    }

    fn decode(&self, file: &str) -> Result<Texture, ViewerError> {
        if file.starts_with('*') {
            return Err(ViewerError::new("embedded-texture").with_arg("file", file));
        }

        let path = self.resolve(file);
        let rgba = image::open(&path)?.to_rgba8();
        Ok(Texture {
            name: file.to_string(),
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        })
    }

    /// Paths are often written on another machine; fall back to the bare
    /// file name next to the model.
    fn resolve(&self, file: &str) -> PathBuf {
        let normalized = file.replace('\\', "/");
        let direct = self.base_dir.join(&normalized);
        if direct.exists() {
            return direct;
        }
        match Path::new(&normalized).file_name() {
            Some(name) => self.base_dir.join(name),
            None => direct,
        }
    }

    fn into_textures(self) -> Vec<Texture> {
        self.textures
    }
}

fn read_material(ai: &AiMaterial, textures: &mut TextureCache) -> Material {
    let mut material = Material::default();

    for prop in &ai.properties {
        match (prop.key.as_str(), &prop.data) {
            ("?mat.name", PropertyTypeInfo::String(name)) => material.name = name.clone(),
            ("$clr.diffuse", PropertyTypeInfo::FloatArray(v)) => material.diffuse = rgba(v),
            ("$clr.ambient", PropertyTypeInfo::FloatArray(v)) => material.ambient = rgba(v),
            ("$clr.specular", PropertyTypeInfo::FloatArray(v)) => material.specular = rgba(v),
            ("$clr.emissive", PropertyTypeInfo::FloatArray(v)) => material.emissive = rgba(v),
            ("$mat.shininess", PropertyTypeInfo::FloatArray(v)) => {
                if let Some(&s) = v.first() {
                    material.shininess = s.max(0.0);
                }
            }
            ("$tex.file", PropertyTypeInfo::String(file))
                if prop.semantic == TextureType::Diffuse && prop.index == 0 =>
            {
                material.texture_id = textures.get(file);
            }
            _ => {}
        }
    }

    material
}

fn rgba(values: &[f32]) -> [f32; 4] {
    let at = |i: usize, default: f32| values.get(i).copied().unwrap_or(default);
    [at(0, 0.0), at(1, 0.0), at(2, 0.0), at(3, 1.0)]
}

fn read_animation(
    idx: usize,
    ai: &AiAnimation,
    node_index: &HashMap<&str, usize>,
) -> AnimationClip {
    let ticks_per_second = if ai.ticks_per_second > 0.0 {
        ai.ticks_per_second
    } else {
        DEFAULT_TICKS_PER_SECOND
    };
    let seconds = |ticks: f64| (ticks / ticks_per_second) as f32;

    let mut channels = Vec::new();
    for node_anim in &ai.channels {
        let Some(&node) = node_index.get(node_anim.name.as_str()) else {
            log::debug!("Animation channel for unknown node '{}'", node_anim.name);
            continue;
        };

        if !node_anim.position_keys.is_empty() {
            channels.push(Channel {
                node,
                target: ChannelTarget::Translation,
                interpolation: Interpolation::Linear,
                times: node_anim.position_keys.iter().map(|k| seconds(k.time)).collect(),
                values: ChannelValues::Vec3(
                    node_anim
                        .position_keys
                        .iter()
                        .map(|k| glm::vec3(k.value.x, k.value.y, k.value.z))
                        .collect(),
                ),
            });
        }
        if !node_anim.rotation_keys.is_empty() {
            channels.push(Channel {
                node,
                target: ChannelTarget::Rotation,
                interpolation: Interpolation::Linear,
                times: node_anim.rotation_keys.iter().map(|k| seconds(k.time)).collect(),
                values: ChannelValues::Quat(
                    node_anim
                        .rotation_keys
                        .iter()
                        .map(|k| glm::quat(k.value.x, k.value.y, k.value.z, k.value.w))
                        .collect(),
                ),
            });
        }
        if !node_anim.scaling_keys.is_empty() {
            channels.push(Channel {
                node,
                target: ChannelTarget::Scale,
                interpolation: Interpolation::Linear,
                times: node_anim.scaling_keys.iter().map(|k| seconds(k.time)).collect(),
                values: ChannelValues::Vec3(
                    node_anim
                        .scaling_keys
                        .iter()
                        .map(|k| glm::vec3(k.value.x, k.value.y, k.value.z))
                        .collect(),
                ),
            });
        }
    }

    let name = if ai.name.is_empty() {
        format!("animation{idx}")
    } else {
        ai.name.clone()
    };

    AnimationClip {
        name,
        duration: seconds(ai.duration).max(AnimationClip::compute_duration(&channels)),
        channels,
    }
}
