use nalgebra_glm as glm;

/// Scene graph node. `parent` is an index into `Model::nodes`.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub parent: Option<usize>,
    pub translation: glm::Vec3,
    pub rotation: glm::Quat,
    pub scale: glm::Vec3,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: String::new(),
            parent: None,
            translation: glm::vec3(0.0, 0.0, 0.0),
            rotation: glm::quat_identity(),
            scale: glm::vec3(1.0, 1.0, 1.0),
        }
    }
}

impl Node {
    pub fn local_matrix(&self) -> glm::Mat4 {
        compose(&self.translation, &self.rotation, &self.scale)
    }
}

/// T * R * S
pub fn compose(t: &glm::Vec3, r: &glm::Quat, s: &glm::Vec3) -> glm::Mat4 {
    let translation = glm::translation(t);
    let rotation = glm::quat_to_mat4(&glm::quat_normalize(r));
    let scale = glm::scaling(s);
    translation * rotation * scale
}

#[derive(Debug, Clone, Default)]
pub struct Skin {
    pub name: String,
    pub joints: Vec<usize>,
    pub inverse_bind_matrices: Vec<glm::Mat4>,
}

impl Skin {
    pub fn inverse_bind(&self, joint: usize) -> glm::Mat4 {
        self.inverse_bind_matrices
            .get(joint)
            .copied()
            .unwrap_or_else(glm::identity)
    }
}
