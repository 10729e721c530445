/// Fixed-function style material used by the lit shader.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub diffuse: [f32; 4],
    pub ambient: [f32; 4],
    pub specular: [f32; 4],
    pub emissive: [f32; 4],
    pub shininess: f32,
    pub texture_id: Option<usize>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse: [0.8, 0.8, 0.8, 1.0],
            ambient: [0.2, 0.2, 0.2, 1.0],
            specular: [0.0, 0.0, 0.0, 1.0],
            emissive: [0.0, 0.0, 0.0, 1.0],
            shininess: 0.2,
            texture_id: None,
        }
    }
}

impl Material {
    /// Approximates Phong terms from glTF metallic-roughness parameters.
    pub fn from_pbr(
        name: &str,
        base_color: [f32; 4],
        metallic: f32,
        roughness: f32,
        emissive: [f32; 3],
        texture_id: Option<usize>,
    ) -> Self {
        let spec = 0.04 + 0.96 * metallic.clamp(0.0, 1.0);
        let gloss = 1.0 - roughness.clamp(0.0, 1.0);
        Self {
            name: name.to_string(),
            diffuse: base_color,
            ambient: [base_color[0], base_color[1], base_color[2], base_color[3]],
            specular: [spec, spec, spec, 1.0],
            emissive: [emissive[0], emissive[1], emissive[2], 1.0],
            shininess: 2.0 + gloss * gloss * 126.0,
            texture_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rough_dielectric_is_dull() {
        let m = Material::from_pbr("skin", [1.0, 0.5, 0.5, 1.0], 0.0, 1.0, [0.0; 3], None);
        assert!((m.specular[0] - 0.04).abs() < 1e-6);
        assert_eq!(m.shininess, 2.0);
        assert_eq!(m.diffuse, [1.0, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn smooth_metal_is_shiny() {
        let m = Material::from_pbr("armor", [1.0; 4], 1.0, 0.0, [0.0; 3], Some(0));
        assert!((m.specular[0] - 1.0).abs() < 1e-6);
        assert_eq!(m.shininess, 128.0);
        assert_eq!(m.texture_id, Some(0));
    }
}
