use crate::model::Material;
use crate::settings::LightSettings;
use nalgebra_glm as glm;

fn mat4_cols(m: &glm::Mat4) -> [[f32; 4]; 4] {
    let mut cols = [[0.0; 4]; 4];
    for (i, col) in cols.iter_mut().enumerate() {
        for (j, v) in col.iter_mut().enumerate() {
            *v = m[(j, i)];
        }
    }
    cols
}

fn rgb1(c: [f32; 3]) -> [f32; 4] {
    [c[0], c[1], c[2], 1.0]
}

/// Camera and light, written once per frame.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye_position: [f32; 4],
    pub light_position: [f32; 4],
    pub light_ambient: [f32; 4],
    pub light_diffuse: [f32; 4],
    pub light_specular: [f32; 4],
    pub global_ambient: [f32; 4],
    pub flags: [f32; 4], // separate_specular + lighting + padding
}

impl FrameUniform {
    pub fn new(
        view_proj: &glm::Mat4,
        eye: [f32; 3],
        light: &LightSettings,
        separate_specular: bool,
    ) -> Self {
        Self {
            view_proj: mat4_cols(view_proj),
            eye_position: rgb1(eye),
            light_position: rgb1(light.position),
            light_ambient: rgb1(light.ambient),
            light_diffuse: rgb1(light.diffuse),
            light_specular: rgb1(light.specular),
            global_ambient: rgb1(light.global_ambient),
            flags: [if separate_specular { 1.0 } else { 0.0 }, 1.0, 0.0, 0.0],
        }
    }
}

/// Placement of one drawn copy.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl DrawUniform {
    pub fn new(model: &glm::Mat4) -> Self {
        Self {
            model: mat4_cols(model),
            normal: mat4_cols(&super::camera::normal_matrix(model)),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub diffuse: [f32; 4],
    pub ambient: [f32; 4],
    pub specular: [f32; 4],
    pub emissive: [f32; 4],
    pub params: [f32; 4], // shininess + has_texture + padding
}

impl MaterialUniform {
    pub fn new(material: &Material, has_texture: bool) -> Self {
        Self {
            diffuse: material.diffuse,
            ambient: material.ambient,
            specular: material.specular,
            emissive: material.emissive,
            params: [
                material.shininess,
                if has_texture { 1.0 } else { 0.0 },
                0.0,
                0.0,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_are_16_byte_aligned() {
        assert_eq!(size_of::<FrameUniform>() % 16, 0);
        assert_eq!(size_of::<DrawUniform>(), 128);
        assert_eq!(size_of::<MaterialUniform>(), 80);
    }

    #[test]
    fn matrices_are_column_major() {
        let m = glm::translation(&glm::vec3(1.0, 2.0, 3.0));
        let u = DrawUniform::new(&m);
        assert_eq!(u.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(u.model[0], [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn frame_flags_carry_separate_specular() {
        let light = LightSettings::default();
        let on = FrameUniform::new(&glm::identity(), [0.0; 3], &light, true);
        let off = FrameUniform::new(&glm::identity(), [0.0; 3], &light, false);
        assert_eq!(on.flags[0], 1.0);
        assert_eq!(off.flags[0], 0.0);
        assert_eq!(on.light_position, [0.0, 0.0, 600.0, 1.0]);
    }

    #[test]
    fn material_marks_textured_draws() {
        let u = MaterialUniform::new(&Material::default(), true);
        assert_eq!(u.params[1], 1.0);
        assert_eq!(u.diffuse, Material::default().diffuse);
    }
}
