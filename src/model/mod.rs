mod animation;
mod material;
mod mesh;
mod skeleton;
mod texture;

pub use animation::*;
pub use material::*;
pub use mesh::*;
pub use skeleton::*;
pub use texture::*;

/// A loaded model: geometry, node hierarchy, skins, materials and clips.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub nodes: Vec<Node>,
    pub skins: Vec<Skin>,
    pub animations: Vec<AnimationClip>,
    pub bounds: Bounds,
}

impl Model {
    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    pub fn material_for(&self, mesh: &Mesh) -> Option<&Material> {
        mesh.material_id.and_then(|id| self.materials.get(id))
    }

    pub fn texture_for(&self, mesh: &Mesh) -> Option<usize> {
        self.material_for(mesh)
            .and_then(|m| m.texture_id)
            .filter(|&id| id < self.textures.len())
    }
}

/// Axis-aligned box in model space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: [0.0; 3],
            max: [0.0; 3],
        }
    }
}

impl Bounds {
    pub fn empty() -> Self {
        Self {
            min: [f32::INFINITY; 3],
            max: [f32::NEG_INFINITY; 3],
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    pub fn extend(&mut self, p: [f32; 3]) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    /// Largest side length, zero for an empty box.
    pub fn max_extent(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        (0..3)
            .map(|i| self.max[i] - self.min[i])
            .fold(0.0, f32::max)
    }
}
