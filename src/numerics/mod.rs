extern crate nalgebra as na;

use na::{Vector3,Rotation3};
use crate::{float,Float};

/**
 * Rotation about the vertical axis only. Pitch/roll misalignment between
 * the tracked frames is assumed negligible for all calibrations.
 */
pub fn yaw_rotate_vec(yaw: Float, vec: &Vector3<Float>) -> Vector3<Float> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), yaw)*vec
}

pub fn wrap_to_pi(angle: Float) -> Float {
    let two_pi = 2.0*float::consts::PI;
    let wrapped = (angle + float::consts::PI) % two_pi;
    match wrapped {
        w if w <= 0.0 => w + float::consts::PI,
        w => w - float::consts::PI
    }
}

pub fn first_differences(data: &[Vector3<Float>]) -> Vec<Vector3<Float>> {
    data.windows(2).map(|w| w[1]-w[0]).collect()
}
