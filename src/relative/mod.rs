extern crate nalgebra as na;

use std::collections::HashMap;
use na::Vector3;
use serde::{Serialize,Deserialize};
use crate::numerics::{wrap_to_pi,yaw_rotate_vec};
use crate::statistics::{linear_fit,ErrorSample};
use crate::trajectory::{trajectory_for,TrajectoryMap};
use crate::{AgentId,Float,Result};

/// Relative-pose constraint between two (possibly non-simultaneous)
/// trajectory points, expressed in agent a's yaw frame.
#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct LoopClosure {
    pub ts_a: Float,
    pub ts_b: Float,
    pub id_a: AgentId,
    pub id_b: AgentId,
    pub dpos: Vector3<Float>,
    pub dyaw: Float
}

/// Visual detection of agent b by agent a: unit bearing direction plus an
/// inverse-depth scalar, and the self poses reported by both agents at
/// detection time.
#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct Detection {
    pub ts: Float,
    pub id_a: AgentId,
    pub id_b: AgentId,
    pub dpos: Vector3<Float>,
    pub inv_dep: Float,
    pub self_pos_a: Vector3<Float>,
    pub self_pos_b: Vector3<Float>
}

#[derive(Debug,Copy,Clone,Serialize,Deserialize)]
pub struct RangeMeasurement {
    pub ts: Float,
    pub id_a: AgentId,
    pub id_b: AgentId,
    pub distance: Float
}

#[derive(Debug,Clone)]
pub struct LoopError {
    pub t: Float,
    pub dpos_gt: Vector3<Float>,
    pub dpos_measured: Vector3<Float>,
    pub dpos_err: Vector3<Float>,
    pub dyaw_err: Float
}

/// Ground-truth relative position of b seen from a, in a's yaw frame.
fn relative_position_gt(pos_a: &Vector3<Float>, yaw_a: Float, pos_b: &Vector3<Float>) -> Vector3<Float> {
    yaw_rotate_vec(-yaw_a,&(pos_b - pos_a))
}

pub fn evaluate_loop(ground_truth: &TrajectoryMap, closure: &LoopClosure) -> Result<LoopError> {
    let traj_a = trajectory_for(ground_truth,closure.id_a)?;
    let traj_b = trajectory_for(ground_truth,closure.id_b)?;
    let yaw_a = traj_a.yaw(closure.ts_a);
    let yaw_b = traj_b.yaw(closure.ts_b);
    let dpos_gt = relative_position_gt(&traj_a.position(closure.ts_a),yaw_a,&traj_b.position(closure.ts_b));
    let dyaw_gt = yaw_b - yaw_a;
    Ok(LoopError{
        t: closure.ts_a.max(closure.ts_b),
        dpos_gt,
        dpos_measured: closure.dpos,
        dpos_err: dpos_gt - closure.dpos,
        dyaw_err: wrap_to_pi(dyaw_gt - closure.dyaw)
    })
}

/// An unknown agent id fails that closure only; the batch proceeds.
pub fn evaluate_loops(ground_truth: &TrajectoryMap, closures: &[LoopClosure]) -> Vec<LoopError> {
    closures.iter().filter_map(|closure| match evaluate_loop(ground_truth,closure) {
        Ok(error) => Some(error),
        Err(e) => {
            log::warn!("skipping loop closure {} -> {}: {}",closure.id_a,closure.id_b,e);
            None
        }
    }).collect()
}

#[derive(Debug,Clone)]
pub struct DetectionError {
    pub t: Float,
    pub dpos_gt: Vector3<Float>,
    pub dpos_measured: Vector3<Float>,
    pub dpos_err: Vector3<Float>,
    pub inv_dep_gt: Float,
    pub inv_dep_measured: Float
}

impl DetectionError {
    pub fn inv_dep_sample(&self) -> ErrorSample {
        ErrorSample::new(self.t,self.inv_dep_measured,self.inv_dep_gt)
    }
}

#[derive(Debug,Clone,Default)]
pub struct DetectionOptions {
    /// Only evaluate detections made by this agent when set.
    pub observer: Option<AgentId>,
    /// Compensate for the detection sensor sitting away from the tracked
    /// reference point, using the reported self pose against the
    /// visual-odometry trajectory.
    pub correct_self_pose: bool,
    /// Per-agent clock offsets applied to the ground-truth lookups.
    pub time_offsets: HashMap<AgentId,Float>
}

impl DetectionOptions {
    fn offset(&self, agent: AgentId) -> Float {
        self.time_offsets.get(&agent).copied().unwrap_or(0.0)
    }
}

pub fn evaluate_detection(ground_truth: &TrajectoryMap, visual_odometry: &TrajectoryMap, detection: &Detection, options: &DetectionOptions) -> Result<DetectionError> {
    let traj_a = trajectory_for(ground_truth,detection.id_a)?;
    let traj_b = trajectory_for(ground_truth,detection.id_b)?;

    let yaw_a_gt = traj_a.yaw(detection.ts);
    let dt = options.offset(detection.id_b);
    let mut pos_a_gt = traj_a.position(detection.ts + dt);
    let pos_b_gt = traj_b.position(detection.ts + dt);

    if options.correct_self_pose {
        let vo_a = trajectory_for(visual_odometry,detection.id_a)?;
        let local = detection.self_pos_a - vo_a.position(detection.ts);
        let correction = yaw_rotate_vec(yaw_a_gt,&yaw_rotate_vec(-vo_a.yaw(detection.ts),&local));
        pos_a_gt += correction;
    }

    let dpos_gt = relative_position_gt(&pos_a_gt,yaw_a_gt,&pos_b_gt);
    let inv_dep_gt = 1.0/dpos_gt.norm();
    let dpos_gt = dpos_gt*inv_dep_gt;

    Ok(DetectionError{
        t: detection.ts,
        dpos_gt,
        dpos_measured: detection.dpos,
        dpos_err: dpos_gt - detection.dpos,
        inv_dep_gt,
        inv_dep_measured: detection.inv_dep
    })
}

pub fn evaluate_detections(ground_truth: &TrajectoryMap, visual_odometry: &TrajectoryMap, detections: &[Detection], options: &DetectionOptions) -> Vec<DetectionError> {
    detections.iter()
        .filter(|d| options.observer.map_or(true, |id| d.id_a == id))
        .filter_map(|detection| match evaluate_detection(ground_truth,visual_odometry,detection,options) {
            Ok(error) => Some(error),
            Err(e) => {
                log::warn!("skipping detection {} -> {}: {}",detection.id_a,detection.id_b,e);
                None
            }
        }).collect()
}

/// Error samples of one ranging sensor pair plus a degree-1 least-squares
/// calibration of ground truth against the raw distance. The fit is absent
/// when the measured distances carry no spread.
#[derive(Debug,Clone)]
pub struct RangeEvaluation {
    pub samples: Vec<ErrorSample>,
    pub fit: Option<(Float,Float)>
}

pub fn evaluate_ranges(ground_truth: &TrajectoryMap, ranges: &[RangeMeasurement], time_offsets: &HashMap<AgentId,Float>) -> HashMap<AgentId,RangeEvaluation> {
    let mut grouped = HashMap::<AgentId,Vec<ErrorSample>>::new();

    for range in ranges {
        let offset = |id: AgentId| time_offsets.get(&id).copied().unwrap_or(0.0);
        let traj_a = trajectory_for(ground_truth,range.id_a);
        let traj_b = trajectory_for(ground_truth,range.id_b);
        match (traj_a,traj_b) {
            (Ok(a),Ok(b)) => {
                let dis_gt = (b.position(range.ts + offset(range.id_b)) - a.position(range.ts + offset(range.id_a))).norm();
                grouped.entry(range.id_b).or_default().push(ErrorSample::new(range.ts,range.distance,dis_gt));
            },
            (Err(e),_) | (_,Err(e)) => log::warn!("skipping range {} -> {}: {}",range.id_a,range.id_b,e)
        }
    }

    let mut evaluations = HashMap::<AgentId,RangeEvaluation>::new();
    for (id,samples) in grouped {
        let measured = samples.iter().map(|s| s.predicted).collect::<Vec<Float>>();
        let gt = samples.iter().map(|s| s.reference).collect::<Vec<Float>>();
        let fit = match linear_fit(&measured,&gt) {
            Ok(fit) => Some(fit),
            Err(e) => {
                log::warn!("no distance calibration for agent {}: {}",id,e);
                None
            }
        };
        evaluations.insert(id,RangeEvaluation{samples,fit});
    }
    evaluations
}
