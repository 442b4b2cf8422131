extern crate nalgebra as na;

use na::Vector3;
use serde::{Serialize,Deserialize};
use crate::numerics::first_differences;
use crate::statistics::vector_rmse;
use crate::trajectory::PoseTrajectory;
use crate::{EvalError,Float,Result};

/// Search grid for the clock-offset scan, in seconds.
#[derive(Debug,Copy,Clone,Serialize,Deserialize)]
pub struct TimeGrid {
    pub min: Float,
    pub max: Float,
    pub step: Float
}

impl Default for TimeGrid {
    fn default() -> TimeGrid {
        TimeGrid{min: -1.0, max: 1.0, step: 0.01}
    }
}

impl TimeGrid {
    /// A grid with a non-positive step or an inverted range yields no
    /// candidates; `calibrate` then reports `EmptySeries`.
    pub fn offsets(&self) -> Vec<Float> {
        if self.step <= 0.0 || self.max < self.min {
            log::warn!("invalid time grid [{},{}] step {}",self.min,self.max,self.step);
            return Vec::new();
        }
        let steps = ((self.max-self.min)/self.step).round() as i64;
        (0..=steps).map(|k| self.min + (k as Float)*self.step).collect()
    }
}

#[derive(Debug,Clone)]
pub struct TimeOffsetCalibration {
    pub best_dt: Float,
    pub rmse: Vector3<Float>
}

/// Position-optimal and velocity-optimal clock offsets; the two objectives
/// need not agree.
#[derive(Debug,Clone)]
pub struct TimeCalibration {
    pub position: TimeOffsetCalibration,
    pub velocity: TimeOffsetCalibration
}

/**
 * Brute-force scan of dt over the grid: ground truth is resampled at the
 * estimator timestamps shifted by dt and scored by the Euclidean norm of the
 * per-axis RMSE, once against positions and once against first differences.
 * Candidates are visited in increasing dt order and only a strictly smaller
 * norm replaces the incumbent, so the first optimum seen wins ties.
 */
pub fn calibrate(ground_truth: &PoseTrajectory, estimate: &PoseTrajectory, grid: &TimeGrid) -> Result<TimeCalibration> {
    let timestamps = estimate.timestamps();
    let est_pos = estimate.positions();
    let est_vel = first_differences(&est_pos);

    let mut best_pos: Option<TimeOffsetCalibration> = None;
    let mut best_vel: Option<TimeOffsetCalibration> = None;

    for dt in grid.offsets() {
        let gt_pos = timestamps.iter().map(|&t| ground_truth.position(t + dt)).collect::<Vec<Vector3<Float>>>();
        let gt_vel = first_differences(&gt_pos);

        let rmse_pos = vector_rmse(&gt_pos,&est_pos)?;
        let rmse_vel = vector_rmse(&gt_vel,&est_vel)?;

        if best_pos.as_ref().map_or(true, |b| rmse_pos.norm() < b.rmse.norm()) {
            best_pos = Some(TimeOffsetCalibration{best_dt: dt, rmse: rmse_pos});
        }
        if best_vel.as_ref().map_or(true, |b| rmse_vel.norm() < b.rmse.norm()) {
            best_vel = Some(TimeOffsetCalibration{best_dt: dt, rmse: rmse_vel});
        }
    }

    match (best_pos,best_vel) {
        (Some(position),Some(velocity)) => {
            log::info!("time calibration for agent {}: position dt {:+.3}s, velocity dt {:+.3}s",
                estimate.agent(),position.best_dt,velocity.best_dt);
            Ok(TimeCalibration{position,velocity})
        },
        _ => Err(EvalError::EmptySeries)
    }
}
