// glTF 2.0 import: meshes, node hierarchy, skins, materials, images and clips.

use crate::error::ViewerError;
use crate::parser::geometry::{compute_normals, triangle_indices};
use crate::model::{
    AnimationClip, Channel, ChannelTarget, ChannelValues, Interpolation, Material, Mesh, Model,
    Node, Skin, Texture,
};
use gltf::animation::util::ReadOutputs;
use gltf::mesh::Mode;
use nalgebra_glm as glm;
use std::path::Path;

pub fn import_file(path: &Path) -> Result<Model, ViewerError> {
    let (document, buffers, images) = gltf::import(path)?;
    Ok(build_model(&document, &buffers, &images))
}

#[cfg(test)]
pub fn import_slice(bytes: &[u8]) -> Result<Model, ViewerError> {
    let (document, buffers, images) = gltf::import_slice(bytes)?;
    Ok(build_model(&document, &buffers, &images))
}

fn build_model(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
) -> Model {
    let name = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .and_then(|s| s.name().map(str::to_string))
        .unwrap_or_default();

    Model {
        name,
        meshes: read_meshes(document, buffers),
        materials: document.materials().map(read_material).collect(),
        textures: images.iter().enumerate().map(|(i, img)| read_image(i, img)).collect(),
        nodes: read_nodes(document),
        skins: read_skins(document, buffers),
        animations: read_animations(document, buffers),
        ..Model::default()
    }
}

fn read_nodes(document: &gltf::Document) -> Vec<Node> {
    let mut nodes: Vec<Node> = document
        .nodes()
        .map(|node| {
            let (t, r, s) = node.transform().decomposed();
            Node {
                name: node.name().unwrap_or_default().to_string(),
                parent: None,
                translation: glm::vec3(t[0], t[1], t[2]),
                rotation: glm::quat(r[0], r[1], r[2], r[3]),
                scale: glm::vec3(s[0], s[1], s[2]),
            }
        })
        .collect();

    for node in document.nodes() {
        for child in node.children() {
            if let Some(entry) = nodes.get_mut(child.index()) {
                entry.parent = Some(node.index());
            }
        }
    }

    nodes
}

fn read_meshes(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Vec<Mesh> {
    let mut meshes = Vec::new();

    // Meshes are instanced through nodes so each copy knows its transform
    for node in document.nodes() {
        let Some(mesh) = node.mesh() else {
            continue;
        };

        for (prim_idx, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != Mode::Triangles {
                log::warn!(
                    "Skipping primitive {} of mesh '{}': mode {:?}",
                    prim_idx,
                    mesh.name().unwrap_or_default(),
                    primitive.mode()
                );
                continue;
            }

            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));

            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let vertex_count = positions.len();

            let indices = match reader.read_indices() {
                Some(indices) => triangle_indices(indices.into_u32(), vertex_count),
                None => triangle_indices(0..vertex_count as u32, vertex_count),
            };

            let normals = match reader.read_normals() {
                Some(normals) => normals.collect(),
                None => compute_normals(&positions, &indices),
            };
            let tex_coords = reader
                .read_tex_coords(0)
                .map(|tc| tc.into_f32().collect())
                .unwrap_or_default();
            let colors = reader
                .read_colors(0)
                .map(|c| c.into_rgba_f32().collect())
                .unwrap_or_default();
            let joints = reader
                .read_joints(0)
                .map(|j| j.into_u16().collect())
                .unwrap_or_default();
            let weights = reader
                .read_weights(0)
                .map(|w| w.into_f32().collect())
                .unwrap_or_default();

            meshes.push(Mesh {
                name: mesh.name().unwrap_or_default().to_string(),
                positions,
                normals,
                tex_coords,
                colors,
                indices,
                joints,
                weights,
                node: node.index(),
                skin: node.skin().map(|s| s.index()),
                material_id: primitive.material().index(),
            });
        }
    }

    meshes
}

fn read_material(material: gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let texture_id = pbr
        .base_color_texture()
        .map(|info| info.texture().source().index());
    Material::from_pbr(
        material.name().unwrap_or_default(),
        pbr.base_color_factor(),
        pbr.metallic_factor(),
        pbr.roughness_factor(),
        material.emissive_factor(),
        texture_id,
    )
}

fn read_image(index: usize, data: &gltf::image::Data) -> Texture {
    match to_rgba8(data) {
        Some(rgba) => Texture {
            name: format!("image{index}"),
            rgba,
            width: data.width,
            height: data.height,
        },
        None => {
            log::warn!(
                "Image {} has unsupported format {:?}, using white",
                index,
                data.format
            );
            Texture::white()
        }
    }
}

fn to_rgba8(data: &gltf::image::Data) -> Option<Vec<u8>> {
    use gltf::image::Format;

    let (w, h) = (data.width, data.height);
    let pixels = data.pixels.clone();
    let image: image::DynamicImage = match data.format {
        Format::R8G8B8A8 => {
            return (pixels.len() == (w as usize) * (h as usize) * 4).then_some(pixels);
        }
        Format::R8G8B8 => image::RgbImage::from_raw(w, h, pixels)?.into(),
        Format::R8G8 => image::GrayAlphaImage::from_raw(w, h, pixels)?.into(),
        Format::R8 => image::GrayImage::from_raw(w, h, pixels)?.into(),
        _ => return None,
    };
    Some(image.to_rgba8().into_raw())
}

fn read_skins(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Vec<Skin> {
    document
        .skins()
        .map(|skin| {
            let reader = skin.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
            let inverse_bind_matrices = reader
                .read_inverse_bind_matrices()
                .map(|mats| {
                    mats.map(|m| glm::Mat4::from_column_slice(m.as_flattened()))
                        .collect()
                })
                .unwrap_or_default();
            Skin {
                name: skin.name().unwrap_or_default().to_string(),
                joints: skin.joints().map(|j| j.index()).collect(),
                inverse_bind_matrices,
            }
        })
        .collect()
}

fn read_animations(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Vec<AnimationClip> {
    document
        .animations()
        .enumerate()
        .map(|(idx, animation)| {
            let channels: Vec<Channel> = animation
                .channels()
                .filter_map(|channel| {
                    let reader =
                        channel.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
                    let times: Vec<f32> = reader.read_inputs()?.collect();
                    let (target, values) = match reader.read_outputs()? {
                        ReadOutputs::Translations(t) => (
                            ChannelTarget::Translation,
                            ChannelValues::Vec3(t.map(|v| glm::make_vec3(&v)).collect()),
                        ),
                        ReadOutputs::Scales(s) => (
                            ChannelTarget::Scale,
                            ChannelValues::Vec3(s.map(|v| glm::make_vec3(&v)).collect()),
                        ),
                        ReadOutputs::Rotations(r) => (
                            ChannelTarget::Rotation,
                            ChannelValues::Quat(
                                r.into_f32()
                                    .map(|q| glm::quat(q[0], q[1], q[2], q[3]))
                                    .collect(),
                            ),
                        ),
                        ReadOutputs::MorphTargetWeights(_) => return None,
                    };
                    let interpolation = match channel.sampler().interpolation() {
                        gltf::animation::Interpolation::Step => Interpolation::Step,
                        gltf::animation::Interpolation::Linear => Interpolation::Linear,
                        gltf::animation::Interpolation::CubicSpline => Interpolation::CubicSpline,
                    };
                    Some(Channel {
                        node: channel.target().node().index(),
                        target,
                        interpolation,
                        times,
                        values,
                    })
                })
                .collect();

            AnimationClip {
                name: animation
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("animation{idx}")),
                duration: AnimationClip::compute_duration(&channels),
                channels,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationSystem;
    use approx::assert_relative_eq;

    /// One triangle under a parent node whose translation is keyed from
    /// x = 0 to x = 2 over one second.
    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "name": "walker", "nodes": [0] } ],
        "nodes": [
            { "name": "hips", "children": [1], "translation": [0.0, 0.0, 0.0] },
            { "name": "body", "mesh": 0 }
        ],
        "meshes": [
            { "name": "tri", "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 } ] }
        ],
        "materials": [
            { "name": "paint", "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 1.0], "metallicFactor": 0.0 } }
        ],
        "animations": [
            {
                "name": "slide",
                "channels": [ { "sampler": 0, "target": { "node": 0, "path": "translation" } } ],
                "samplers": [ { "input": 2, "output": 3, "interpolation": "LINEAR" } ]
            }
        ],
        "buffers": [
            { "byteLength": 76, "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAAEAAAAAAAAAAAA==" }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 },
            { "buffer": 0, "byteOffset": 44, "byteLength": 8 },
            { "buffer": 0, "byteOffset": 52, "byteLength": 24 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" },
            { "bufferView": 2, "componentType": 5126, "count": 2, "type": "SCALAR", "min": [0.0], "max": [1.0] },
            { "bufferView": 3, "componentType": 5126, "count": 2, "type": "VEC3" }
        ]
    }"#;

    #[test]
    fn imports_hierarchy_mesh_material_and_clip() {
        let model = match import_slice(TRIANGLE_GLTF.as_bytes()) {
            Ok(model) => model,
            Err(e) => panic!("import failed: {e}"),
        };

        assert_eq!(model.name, "walker");
        assert_eq!(model.nodes.len(), 2);
        assert_eq!(model.nodes[1].parent, Some(0));

        assert_eq!(model.meshes.len(), 1);
        let mesh = &model.meshes[0];
        assert_eq!(mesh.node, 1);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        // Normals are generated when missing
        assert_eq!(mesh.normals.len(), 3);
        assert_relative_eq!(mesh.normals[0][2], 1.0);

        assert_eq!(model.materials.len(), 1);
        assert_eq!(model.materials[0].diffuse, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(model.material_for(mesh).map(|m| m.name.as_str()), Some("paint"));

        assert_eq!(model.animation_count(), 1);
        let clip = &model.animations[0];
        assert_eq!(clip.name, "slide");
        assert_relative_eq!(clip.duration, 1.0);
        assert_eq!(clip.channels[0].target, ChannelTarget::Translation);
    }

    #[test]
    fn imported_clip_drives_child_mesh() {
        let model = match import_slice(TRIANGLE_GLTF.as_bytes()) {
            Ok(model) => model,
            Err(e) => panic!("import failed: {e}"),
        };
        let mut system = AnimationSystem::new();
        system.init_from_model(&model);
        system.play_all();
        system.set_paused_for_all(true);
        system.set_position_for_all(0.5);
        system.apply(&model);

        let Some(snapshot) = system.current_animated_mesh(0) else {
            panic!("no snapshot");
        };
        assert_relative_eq!(snapshot.positions[1][0], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(import_slice(b"not a gltf").is_err());
    }
}
