use nalgebra_glm as glm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
    CubicSpline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTarget {
    Translation,
    Rotation,
    Scale,
}

/// Keyframe values. For cubic splines every key stores
/// `[in_tangent, value, out_tangent]`, so `values.len() == 3 * times.len()`.
#[derive(Debug, Clone)]
pub enum ChannelValues {
    Vec3(Vec<glm::Vec3>),
    Quat(Vec<glm::Quat>),
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub node: usize,
    pub target: ChannelTarget,
    pub interpolation: Interpolation,
    pub times: Vec<f32>,
    pub values: ChannelValues,
}

#[derive(Debug, Clone, Default)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub channels: Vec<Channel>,
}

impl AnimationClip {
    /// Duration from the last key of every channel.
    pub fn compute_duration(channels: &[Channel]) -> f32 {
        channels
            .iter()
            .filter_map(|c| c.times.last().copied())
            .fold(0.0, f32::max)
    }
}
