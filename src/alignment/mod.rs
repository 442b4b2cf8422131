extern crate nalgebra as na;

use na::{Vector3,UnitQuaternion};
use crate::numerics::yaw_rotate_vec;
use crate::trajectory::{PoseSample,PoseTrajectory};
use crate::{EvalError,Float,Result};

/**
 * Rigid yaw+translation calibration mapping an estimator frame onto the
 * ground-truth frame. Computed once from a reference agent and reused
 * unchanged for every agent of that estimator source.
 */
#[derive(Debug,Copy,Clone)]
pub struct AlignmentTransform {
    pub yaw: Float,
    pub translation: Vector3<Float>
}

impl AlignmentTransform {

    /// Calibrates at the estimator's first sample time. The translation is
    /// taken against the already-rotated estimate position, so applying the
    /// transform maps the reference pose exactly onto ground truth.
    pub fn between(ground_truth: &PoseTrajectory, estimate: &PoseTrajectory) -> Result<AlignmentTransform> {
        let t0 = estimate.first().t;
        if t0 > ground_truth.last().t || estimate.last().t < ground_truth.first().t {
            return Err(EvalError::AlignmentUnavailable{agent: estimate.agent(), kind: estimate.source()});
        }
        let yaw = ground_truth.yaw(t0) - estimate.first().yaw();
        let translation = ground_truth.position(t0) - yaw_rotate_vec(yaw,&estimate.first().position);
        Ok(AlignmentTransform{yaw,translation})
    }

    pub fn apply(&self, position: &Vector3<Float>) -> Vector3<Float> {
        yaw_rotate_vec(self.yaw,position) + self.translation
    }
}

/// Pure transformation: returns a rebuilt trajectory, the source is left
/// untouched.
pub fn align(trajectory: &PoseTrajectory, transform: &AlignmentTransform) -> Result<PoseTrajectory> {
    let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), transform.yaw);
    let samples = trajectory.samples().iter().map(|s| {
        let quaternion = (rotation*UnitQuaternion::from_quaternion(s.quaternion)).into_inner();
        PoseSample{
            t: s.t,
            position: transform.apply(&s.position),
            quaternion,
            ypr: s.ypr + Vector3::new(transform.yaw,0.0,0.0)
        }
    }).collect::<Vec<PoseSample>>();
    PoseTrajectory::build(trajectory.agent(),trajectory.source(),samples)
}
