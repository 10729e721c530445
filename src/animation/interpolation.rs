// Keyframe interpolation for node channels

use crate::model::{Channel, ChannelValues, Interpolation};
use nalgebra_glm as glm;

/// Value of a channel at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Vec3(glm::Vec3),
    Quat(glm::Quat),
}

/// Surrounding keys for `time`: `(previous, next, factor)`.
/// `None` for the next key means `time` is outside the keyed range and
/// `previous` should be used as is.
fn locate(times: &[f32], time: f32) -> Option<(usize, Option<usize>, f32)> {
    if times.is_empty() {
        return None;
    }

    let idx = times.partition_point(|&k| k <= time);
    if idx == 0 {
        // Before first key
        return Some((0, None, 0.0));
    }
    if idx == times.len() {
        // After last key
        return Some((times.len() - 1, None, 0.0));
    }

    let prev = idx - 1;
    let span = times[idx] - times[prev];
    let factor = if span > 0.0 {
        (time - times[prev]) / span
    } else {
        0.0
    };
    Some((prev, Some(idx), factor))
}

fn hermite(u: f32) -> (f32, f32, f32, f32) {
    let u2 = u * u;
    let u3 = u2 * u;
    (
        2.0 * u3 - 3.0 * u2 + 1.0,
        u3 - 2.0 * u2 + u,
        -2.0 * u3 + 3.0 * u2,
        u3 - u2,
    )
}

/// Slerp along the shorter arc, falling back to normalized lerp for
/// nearly parallel quaternions.
pub fn quat_slerp(a: &glm::Quat, b: &glm::Quat, t: f32) -> glm::Quat {
    let mut b = *b;
    let mut cos = a.coords.dot(&b.coords);
    if cos < 0.0 {
        b = -b;
        cos = -cos;
    }

    if cos > 0.9995 {
        let lerped = a.coords * (1.0 - t) + b.coords * t;
        return glm::quat_normalize(&glm::Quat::from(lerped));
    }

    let theta = cos.clamp(-1.0, 1.0).acos();
    let sin = theta.sin();
    let wa = ((1.0 - t) * theta).sin() / sin;
    let wb = (t * theta).sin() / sin;
    glm::Quat::from(a.coords * wa + b.coords * wb)
}

pub fn lerp_vec3(a: &glm::Vec3, b: &glm::Vec3, t: f32) -> glm::Vec3 {
    a + (b - a) * t
}

fn key_value<T: Copy>(values: &[T], interpolation: Interpolation, key: usize) -> Option<T> {
    match interpolation {
        Interpolation::CubicSpline => values.get(key * 3 + 1).copied(),
        _ => values.get(key).copied(),
    }
}

/// Sample a channel at `time` seconds.
pub fn sample_channel(channel: &Channel, time: f32) -> Option<Sample> {
    let (prev, next, u) = locate(&channel.times, time)?;
    let interp = channel.interpolation;

    match &channel.values {
        ChannelValues::Vec3(values) => {
            let a = key_value(values, interp, prev)?;
            let Some(next) = next else {
                return Some(Sample::Vec3(a));
            };
            let b = key_value(values, interp, next)?;
            let v = match interp {
                Interpolation::Step => a,
                Interpolation::Linear => lerp_vec3(&a, &b, u),
                Interpolation::CubicSpline => {
                    let dt = channel.times[next] - channel.times[prev];
                    let out_tan = values.get(prev * 3 + 2).copied()?;
                    let in_tan = values.get(next * 3).copied()?;
                    let (h00, h10, h01, h11) = hermite(u);
                    a * h00 + out_tan * (h10 * dt) + b * h01 + in_tan * (h11 * dt)
                }
            };
            Some(Sample::Vec3(v))
        }
        ChannelValues::Quat(values) => {
            let a = key_value(values, interp, prev)?;
            let Some(next) = next else {
                return Some(Sample::Quat(glm::quat_normalize(&a)));
            };
            let b = key_value(values, interp, next)?;
            let q = match interp {
                Interpolation::Step => a,
                Interpolation::Linear => quat_slerp(&a, &b, u),
                Interpolation::CubicSpline => {
                    let dt = channel.times[next] - channel.times[prev];
                    let out_tan = values.get(prev * 3 + 2).copied()?;
                    let in_tan = values.get(next * 3).copied()?;
                    let (h00, h10, h01, h11) = hermite(u);
                    let coords = a.coords * h00
                        + out_tan.coords * (h10 * dt)
                        + b.coords * h01
                        + in_tan.coords * (h11 * dt);
                    glm::Quat::from(coords)
                }
            };
            Some(Sample::Quat(glm::quat_normalize(&q)))
        }
    }
}
