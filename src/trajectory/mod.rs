extern crate nalgebra as na;

use std::collections::HashMap;
use na::{Vector3,Quaternion,UnitQuaternion};
use crate::{AgentId,EvalError,Float,Result,SourceKind};

/// Yaw/pitch/roll from a (w,x,y,z) quaternion. The asin argument is
/// clamped so gimbal-degenerate inputs stay finite.
pub fn quaternion_to_ypr(w: Float, x: Float, y: Float, z: Float) -> Vector3<Float> {
    let yaw = (2.0*(w*z + x*y)).atan2(1.0 - 2.0*(y*y + z*z));
    let pitch = (2.0*(w*y - z*x)).clamp(-1.0,1.0).asin();
    let roll = (2.0*(w*x + y*z)).atan2(1.0 - 2.0*(x*x + y*y));
    Vector3::new(yaw,pitch,roll)
}

#[derive(Debug,Clone)]
pub struct PoseSample {
    pub t: Float,
    pub position: Vector3<Float>,
    pub quaternion: Quaternion<Float>,
    pub ypr: Vector3<Float>
}

impl PoseSample {
    pub fn new(t: Float, position: Vector3<Float>, quaternion: Quaternion<Float>) -> PoseSample {
        let ypr = quaternion_to_ypr(quaternion.w,quaternion.i,quaternion.j,quaternion.k);
        PoseSample{t,position,quaternion,ypr}
    }

    /// For streams that only carry a heading (fused estimates, visual odometry).
    pub fn from_position_yaw(t: Float, position: Vector3<Float>, yaw: Float) -> PoseSample {
        let quaternion = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw).into_inner();
        PoseSample{t,position,quaternion,ypr: Vector3::new(yaw,0.0,0.0)}
    }

    pub fn yaw(&self) -> Float {
        self.ypr[0]
    }
}

pub type TrajectoryMap = HashMap<AgentId,PoseTrajectory>;

pub fn trajectory_for<'a>(map: &'a TrajectoryMap, agent: AgentId) -> Result<&'a PoseTrajectory> {
    map.get(&agent).ok_or(EvalError::UnknownAgent(agent))
}

/**
 * Time-ordered pose record of one agent from one data source. Exposes
 * position and attitude as continuous functions of time: piecewise-linear
 * between bracketing samples, linearly extrapolated outside the sampled
 * range (never clamped).
 */
#[derive(Debug,Clone)]
pub struct PoseTrajectory {
    agent: AgentId,
    source: SourceKind,
    samples: Vec<PoseSample>
}

impl PoseTrajectory {

    /// Drops pre-epoch (t < 0) and out-of-order samples, then requires at
    /// least 2 remaining to build the interpolants.
    pub fn build(agent: AgentId, source: SourceKind, samples: Vec<PoseSample>) -> Result<PoseTrajectory> {
        let mut retained = Vec::<PoseSample>::with_capacity(samples.len());
        let total = samples.len();
        for sample in samples {
            if sample.t < 0.0 {
                continue;
            }
            match retained.last() {
                Some(prev) if sample.t < prev.t => continue,
                _ => retained.push(sample)
            }
        }
        if retained.len() < total {
            log::warn!("agent {} ({}): dropped {} of {} samples (pre-epoch or out of order)",agent,source,total-retained.len(),total);
        }
        if retained.len() < 2 {
            return Err(EvalError::InsufficientData{agent,kind: source,count: retained.len()});
        }
        Ok(PoseTrajectory{agent,source,samples: retained})
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    pub fn samples(&self) -> &[PoseSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> &PoseSample {
        &self.samples[0]
    }

    pub fn last(&self) -> &PoseSample {
        &self.samples[self.samples.len()-1]
    }

    pub fn timestamps(&self) -> Vec<Float> {
        self.samples.iter().map(|s| s.t).collect()
    }

    pub fn positions(&self) -> Vec<Vector3<Float>> {
        self.samples.iter().map(|s| s.position).collect()
    }

    pub fn position(&self, t: Float) -> Vector3<Float> {
        let (i,j) = self.bracket(t);
        Self::lerp(t,&self.samples[i],&self.samples[j],|s| s.position)
    }

    /// Attitude as (yaw,pitch,roll), interpolated componentwise like the
    /// position channels.
    pub fn attitude(&self, t: Float) -> Vector3<Float> {
        let (i,j) = self.bracket(t);
        Self::lerp(t,&self.samples[i],&self.samples[j],|s| s.ypr)
    }

    pub fn yaw(&self, t: Float) -> Float {
        self.attitude(t)[0]
    }

    /// Sum of the norms of the first differences of the sampled positions.
    pub fn path_length(&self) -> Float {
        self.samples.windows(2).fold(0.0, |acc, w| acc + (w[1].position-w[0].position).norm())
    }

    // Indices of the segment bracketing t; the first or last segment when t
    // is outside the sampled range, so the same expression extrapolates.
    fn bracket(&self, t: Float) -> (usize,usize) {
        let n = self.samples.len();
        let upper = self.samples.partition_point(|s| s.t <= t);
        match upper {
            0 => (0,1),
            u if u >= n => (n-2,n-1),
            u => (u-1,u)
        }
    }

    fn lerp<F>(t: Float, a: &PoseSample, b: &PoseSample, field: F) -> Vector3<Float> where F: Fn(&PoseSample) -> Vector3<Float> {
        let dt = b.t - a.t;
        if dt <= 0.0 {
            return field(a);
        }
        let u = (t - a.t)/dt;
        field(a) + (field(b) - field(a))*u
    }
}
