use crate::animation::AnimationSystem;
use crate::error::ViewerError;
use crate::model::{Bounds, Model};
#[cfg(feature = "assimp")]
use crate::parser::assimp_import;
use crate::parser::gltf_import;
use std::path::Path;

/// Decoder a file extension is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Gltf,
    #[cfg(feature = "assimp")]
    Assimp,
}

/// Pick the decoder for `path` from its extension, case-insensitively.
pub fn format_for(path: &Path) -> Option<ModelFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "gltf" | "glb" => Some(ModelFormat::Gltf),
        #[cfg(feature = "assimp")]
        other if assimp_import::EXTENSIONS.contains(&other) => Some(ModelFormat::Assimp),
        _ => None,
    }
}

/// Load a model file, dispatching on its extension.
pub fn load(path: &Path) -> Result<Model, ViewerError> {
    let mut model = match format_for(path) {
        Some(ModelFormat::Gltf) => gltf_import::import_file(path)?,
        #[cfg(feature = "assimp")]
        Some(ModelFormat::Assimp) => assimp_import::import_file(path)?,
        None => {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            return Err(ViewerError::new("unsupported-format")
                .with_arg("path", path.display())
                .with_arg("ext", ext));
        }
    };

    if model.name.is_empty() {
        model.name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model")
            .to_string();
    }

    finish(model).map_err(|e| e.with_arg("path", path.display()))
}

fn finish(mut model: Model) -> Result<Model, ViewerError> {
    if model.meshes.iter().all(|m| m.positions.is_empty() || m.indices.is_empty()) {
        return Err(ViewerError::new("empty-model").with_arg("name", &model.name));
    }

    model.bounds = bind_pose_bounds(&model);

    log::info!(
        "Loaded model '{}': {} meshes, {} materials, {} textures, {} nodes, {} skins, {} animations",
        model.name,
        model.meshes.len(),
        model.materials.len(),
        model.textures.len(),
        model.nodes.len(),
        model.skins.len(),
        model.animations.len()
    );

    Ok(model)
}

/// Bounds of every mesh after node and skin transforms at rest.
fn bind_pose_bounds(model: &Model) -> Bounds {
    let mut system = AnimationSystem::new();
    system.init_from_model(model);

    let mut bounds = Bounds::empty();
    for snapshot in system.animated_meshes() {
        for p in &snapshot.positions {
            bounds.extend(*p);
        }
    }
    if bounds.is_empty() {
        Bounds::default()
    } else {
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "assimp")]
    #[test]
    fn slot_models_go_through_assimp() {
        for file in [
            "astroBoy_walk.dae",
            "TurbochiFromXSI.dae",
            "dwarf.x",
            "monster-animated-character-X.X",
        ] {
            assert_eq!(format_for(Path::new(file)), Some(ModelFormat::Assimp), "{file}");
        }
    }

    #[test]
    fn gltf_extensions_are_case_insensitive() {
        assert_eq!(format_for(Path::new("walk.glb")), Some(ModelFormat::Gltf));
        assert_eq!(format_for(Path::new("data/Walk.GLTF")), Some(ModelFormat::Gltf));
    }

    #[test]
    fn unknown_extensions_are_unsupported() {
        assert_eq!(format_for(Path::new("notes.txt")), None);
        assert_eq!(format_for(Path::new("no_extension")), None);

        let err = load(Path::new("data/notes.txt")).err();
        assert_eq!(err.as_ref().map(|e| e.key), Some("unsupported-format"));
        assert_eq!(
            err.and_then(|e| e.args.get("ext").cloned()).as_deref(),
            Some("txt")
        );
    }

    #[cfg(feature = "assimp")]
    #[test]
    fn missing_directx_file_is_a_load_error() {
        let path = std::env::temp_dir().join("animvis-rs-missing-dwarf.x");
        let err = load(&path).err();
        assert!(err.is_some_and(|e| e.key != "unsupported-format"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("animvis-rs-missing-model.glb");
        assert!(load(&path).is_err());
    }
}
