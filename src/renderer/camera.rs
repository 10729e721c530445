use crate::model::Bounds;
use nalgebra_glm as glm;

pub const FIELD_OF_VIEW: f32 = 60.0;

/// Horizontal offsets of the solid and wireframe copies from the model anchor.
pub const SOLID_OFFSET_X: f32 = 100.0;
pub const WIREFRAME_OFFSET_X: f32 = -300.0;

/// Distance from the camera to the z = 0 plane when that plane exactly
/// fills a window of `height` pixels.
pub fn eye_distance(height: f32) -> f32 {
    (height * 0.5) / (FIELD_OF_VIEW.to_radians() * 0.5).tan()
}

/// Perspective camera looking at the window plane. World `(x, y, 0)` lands
/// on window pixel `(x, y)`, y pointing down.
pub fn screen_view_proj(width: f32, height: f32) -> glm::Mat4 {
    let width = width.max(1.0);
    let height = height.max(1.0);
    let dist = eye_distance(height);

    let eye = glm::vec3(width * 0.5, height * 0.5, dist);
    let center = glm::vec3(width * 0.5, height * 0.5, 0.0);
    let view = glm::look_at_rh(&eye, &center, &glm::vec3(0.0, 1.0, 0.0));
    let proj = glm::perspective_rh_zo(
        width / height,
        FIELD_OF_VIEW.to_radians(),
        dist / 10.0,
        dist * 10.0,
    );
    let flip_y = glm::scaling(&glm::vec3(1.0, -1.0, 1.0));

    flip_y * proj * view
}

/// Uniform scale bringing the largest bind-pose extent to half the window width.
pub fn normalized_scale(bounds: &Bounds, window_width: f32) -> f32 {
    let extent = bounds.max_extent();
    if extent > f32::EPSILON {
        (window_width * 0.5) / extent
    } else {
        1.0
    }
}

/// Placement of the model: anchor translation, upright flip, normalizing
/// scale and the slot's extra rotation.
pub fn model_matrix(
    position: [f32; 3],
    slot_rotation: Option<(f32, [f32; 3])>,
    bounds: &Bounds,
    window_width: f32,
) -> glm::Mat4 {
    let mut m = glm::translation(&glm::make_vec3(&position));
    m = glm::rotate(&m, 180.0_f32.to_radians(), &glm::vec3(1.0, 0.0, 0.0));
    let s = normalized_scale(bounds, window_width);
    m = glm::scale(&m, &glm::vec3(s, s, s));
    if let Some((degrees, axis)) = slot_rotation {
        let axis = glm::make_vec3(&axis);
        if glm::length(&axis) > f32::EPSILON {
            m = glm::rotate(&m, degrees.to_radians(), &glm::normalize(&axis));
        }
    }
    m
}

/// Transform of one drawn copy: moved `offset_x` pixels sideways from the
/// anchor and spun about the vertical axis through it by `-mouse_x` degrees.
pub fn scene_matrix(position: [f32; 3], mouse_x: f32, offset_x: f32) -> glm::Mat4 {
    let to_copy = glm::translation(&glm::vec3(position[0] + offset_x, position[1], 0.0));
    let spin = glm::rotation((-mouse_x).to_radians(), &glm::vec3(0.0, 1.0, 0.0));
    let back = glm::translation(&glm::vec3(-position[0], -position[1], 0.0));
    to_copy * spin * back
}

/// Matrix for transforming normals by `m`.
pub fn normal_matrix(m: &glm::Mat4) -> glm::Mat4 {
    glm::transpose(&glm::inverse(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn project(m: &glm::Mat4, p: [f32; 3]) -> glm::Vec3 {
        let clip = m * glm::vec4(p[0], p[1], p[2], 1.0);
        glm::vec3(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
    }

    #[test]
    fn window_corners_map_to_ndc_corners() {
        let vp = screen_view_proj(800.0, 600.0);

        let top_left = project(&vp, [0.0, 0.0, 0.0]);
        assert_relative_eq!(top_left.x, -1.0, epsilon = 1e-4);
        assert_relative_eq!(top_left.y, 1.0, epsilon = 1e-4);

        let bottom_right = project(&vp, [800.0, 600.0, 0.0]);
        assert_relative_eq!(bottom_right.x, 1.0, epsilon = 1e-4);
        assert_relative_eq!(bottom_right.y, -1.0, epsilon = 1e-4);
        assert!(bottom_right.z > 0.0 && bottom_right.z < 1.0);
    }

    #[test]
    fn closer_points_have_smaller_depth() {
        let vp = screen_view_proj(800.0, 600.0);
        let near = project(&vp, [400.0, 300.0, 100.0]);
        let far = project(&vp, [400.0, 300.0, -100.0]);
        assert!(near.z < far.z);
    }

    #[test]
    fn scale_normalizes_largest_extent() {
        let bounds = Bounds {
            min: [-1.0, 0.0, -0.5],
            max: [1.0, 4.0, 0.5],
        };
        assert_relative_eq!(normalized_scale(&bounds, 800.0), 100.0);
        assert_eq!(normalized_scale(&Bounds::default(), 800.0), 1.0);
    }

    #[test]
    fn model_stands_on_its_anchor() {
        let bounds = Bounds {
            min: [-1.0, 0.0, -1.0],
            max: [1.0, 2.0, 1.0],
        };
        let m = model_matrix([400.0, 510.0, 0.0], None, &bounds, 800.0);

        let feet = m * glm::vec4(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(feet.x, 400.0, epsilon = 1e-3);
        assert_relative_eq!(feet.y, 510.0, epsilon = 1e-3);

        // Model up is screen up, so y shrinks towards the head
        let head = m * glm::vec4(0.0, 2.0, 0.0, 1.0);
        assert_relative_eq!(head.y, 510.0 - 400.0, epsilon = 1e-3);
    }

    #[test]
    fn slot_rotation_turns_model_space() {
        let bounds = Bounds {
            min: [0.0, 0.0, 0.0],
            max: [1.0, 1.0, 1.0],
        };
        let plain = model_matrix([0.0; 3], None, &bounds, 2.0);
        let turned = model_matrix([0.0; 3], Some((-90.0, [0.0, 0.0, 1.0])), &bounds, 2.0);

        let x_axis = glm::vec4(1.0, 0.0, 0.0, 1.0);
        let y_axis = glm::vec4(0.0, -1.0, 0.0, 1.0);
        let a = turned * x_axis;
        let b = plain * y_axis;
        assert_relative_eq!(a.x, b.x, epsilon = 1e-5);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-5);
    }

    #[test]
    fn scene_matrix_shifts_copy_without_spin() {
        let m = scene_matrix([400.0, 500.0, 0.0], 0.0, SOLID_OFFSET_X);
        let p = m * glm::vec4(400.0, 500.0, 0.0, 1.0);
        assert_relative_eq!(p.x, 500.0, epsilon = 1e-4);
        assert_relative_eq!(p.y, 500.0, epsilon = 1e-4);
    }

    #[test]
    fn scene_matrix_spins_about_anchor() {
        let m = scene_matrix([400.0, 500.0, 0.0], 90.0, WIREFRAME_OFFSET_X);
        let anchor = m * glm::vec4(400.0, 500.0, 0.0, 1.0);
        assert_relative_eq!(anchor.x, 100.0, epsilon = 1e-3);

        // -90 degrees about y sends +x to +z
        let side = m * glm::vec4(410.0, 500.0, 0.0, 1.0);
        assert_relative_eq!(side.x, 100.0, epsilon = 1e-3);
        assert_relative_eq!(side.z, 10.0, epsilon = 1e-3);
    }
}
