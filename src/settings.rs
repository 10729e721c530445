use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFY_APP_NAME: &str = "animvis-rs";

/// One entry of the four model slots selected with keys 1-4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSlot {
    pub file: String,
    pub separate_specular: bool,
    /// Extra rotation applied after placement: degrees and axis.
    pub rotation: Option<(f32, [f32; 3])>,
}

impl ModelSlot {
    fn new(file: &str, separate_specular: bool) -> Self {
        Self {
            file: file.to_string(),
            separate_specular,
            rotation: None,
        }
    }

    pub fn resolve(&self, asset_dir: &Path) -> PathBuf {
        let path = Path::new(&self.file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            asset_dir.join(path)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightSettings {
    pub position: [f32; 3],
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub global_ambient: [f32; 3],
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 600.0],
            ambient: [0.0, 0.0, 0.0],
            diffuse: [1.0, 1.0, 1.0],
            specular: [1.0, 1.0, 1.0],
            global_ambient: [0.2, 0.2, 0.2],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerSettings {
    pub background: [u8; 3],
    pub show_help: bool,
    pub window_size: [u32; 2],
    pub asset_dir: PathBuf,
    pub light: LightSettings,
    pub slots: [ModelSlot; 4],
}

impl Default for ViewerSettings {
    fn default() -> Self {
        let mut monster = ModelSlot::new("monster-animated-character-X.X", false);
        monster.rotation = Some((-90.0, [0.0, 0.0, 1.0]));

        Self {
            background: [50, 50, 0],
            show_help: true,
            window_size: [1024, 768],
            asset_dir: PathBuf::from("data"),
            light: LightSettings::default(),
            slots: [
                ModelSlot::new("astroBoy_walk.dae", true),
                ModelSlot::new("TurbochiFromXSI.dae", true),
                ModelSlot::new("dwarf.x", false),
                monster,
            ],
        }
    }
}

impl ViewerSettings {
    /// Stored settings; confy writes the defaults on first run.
    pub fn load() -> Self {
        match confy::load(CONFY_APP_NAME, "viewer") {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Falling back to default settings: {e}");
                Self::default()
            }
        }
    }

    /// Slot by zero-based index.
    pub fn slot(&self, index: usize) -> Option<&ModelSlot> {
        self.slots.get(index)
    }

    pub fn background_rgb(&self) -> [f64; 3] {
        self.background.map(|c| c as f64 / 255.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_slot_table() {
        let settings = ViewerSettings::default();
        assert_eq!(settings.background, [50, 50, 0]);
        assert!(settings.show_help);

        let files: Vec<&str> = settings.slots.iter().map(|s| s.file.as_str()).collect();
        assert_eq!(
            files,
            vec![
                "astroBoy_walk.dae",
                "TurbochiFromXSI.dae",
                "dwarf.x",
                "monster-animated-character-X.X"
            ]
        );

        let specular: Vec<bool> = settings.slots.iter().map(|s| s.separate_specular).collect();
        assert_eq!(specular, vec![true, true, false, false]);

        assert!(settings.slots[..3].iter().all(|s| s.rotation.is_none()));
        assert_eq!(settings.slots[3].rotation, Some((-90.0, [0.0, 0.0, 1.0])));
        assert!(settings.slot(4).is_none());
    }

    #[test]
    fn resolve_joins_relative_files_onto_asset_dir() {
        let slot = ModelSlot::new("dwarf.x", false);
        assert_eq!(slot.resolve(Path::new("data")), PathBuf::from("data/dwarf.x"));

        let absolute = std::env::temp_dir().join("astroBoy_walk.glb");
        let slot = ModelSlot::new(absolute.to_str().unwrap_or_default(), true);
        assert_eq!(slot.resolve(Path::new("data")), absolute);
    }

    #[test]
    fn background_is_normalized() {
        let rgb = ViewerSettings::default().background_rgb();
        assert!((rgb[0] - 50.0 / 255.0).abs() < 1e-9);
        assert_eq!(rgb[2], 0.0);
    }
}
