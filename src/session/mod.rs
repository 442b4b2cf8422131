extern crate nalgebra as na;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use na::Vector3;
use crate::alignment::{align,AlignmentTransform};
use crate::relative::{self,Detection,DetectionOptions,LoopClosure,RangeMeasurement};
use crate::statistics::{ErrorStatistic,ScalarStatistic,vector_rmse};
use crate::time_calib::{calibrate,TimeCalibration};
use crate::trajectory::{trajectory_for,PoseTrajectory,TrajectoryMap};
use crate::{io,AgentId,EvalError,Float,Result,SourceKind};

pub mod evaluation_parameters;

pub use evaluation_parameters::EvaluationParameters;

/**
 * One trial's worth of trajectories and inter-agent observations, plus the
 * derived reports. Alignment replaces the estimator trajectories with
 * rebuilt aligned copies; the ingested ground truth is never touched.
 */
#[derive(Debug)]
pub struct EvaluationSession {
    params: EvaluationParameters,
    ground_truth: TrajectoryMap,
    fused: TrajectoryMap,
    visual_odometry: TrajectoryMap,
    // Detection self poses are reported in the raw odometry frame, so the
    // pre-alignment trajectories stay available for that evaluation.
    visual_odometry_raw: TrajectoryMap,
    offline_path: TrajectoryMap,
    loops: Vec<LoopClosure>,
    detections: Vec<Detection>,
    ranges: Vec<RangeMeasurement>
}

impl EvaluationSession {
    pub fn new(params: EvaluationParameters) -> EvaluationSession {
        EvaluationSession{
            params,
            ground_truth: HashMap::new(),
            fused: HashMap::new(),
            visual_odometry: HashMap::new(),
            visual_odometry_raw: HashMap::new(),
            offline_path: HashMap::new(),
            loops: Vec::new(),
            detections: Vec::new(),
            ranges: Vec::new()
        }
    }

    pub fn params(&self) -> &EvaluationParameters {
        &self.params
    }

    pub fn insert_trajectory(&mut self, trajectory: PoseTrajectory) {
        let map = match trajectory.source() {
            SourceKind::GroundTruth => &mut self.ground_truth,
            SourceKind::FusedEstimate => &mut self.fused,
            SourceKind::VisualOdometry => {
                self.visual_odometry_raw.insert(trajectory.agent(),trajectory.clone());
                &mut self.visual_odometry
            },
            SourceKind::OfflinePath => &mut self.offline_path
        };
        map.insert(trajectory.agent(),trajectory);
    }

    pub fn set_loops(&mut self, loops: Vec<LoopClosure>) {
        self.loops = loops;
    }

    pub fn set_detections(&mut self, detections: Vec<Detection>) {
        self.detections = detections;
    }

    pub fn set_ranges(&mut self, ranges: Vec<RangeMeasurement>) {
        self.ranges = ranges;
    }

    pub fn ground_truth(&self) -> &TrajectoryMap {
        &self.ground_truth
    }

    pub fn trajectory(&self, agent: AgentId, source: SourceKind) -> Result<&PoseTrajectory> {
        let map = match source {
            SourceKind::GroundTruth => &self.ground_truth,
            SourceKind::FusedEstimate => &self.fused,
            SourceKind::VisualOdometry => &self.visual_odometry,
            SourceKind::OfflinePath => &self.offline_path
        };
        trajectory_for(map,agent)
    }

    /// Frame calibration of every estimator source. A source whose
    /// calibration fails stays unaligned and is logged; the other sources
    /// proceed independently.
    pub fn align(&mut self) {
        if let Err(e) = self.align_fused() {
            log::warn!("fused/offline alignment unavailable: {}",e);
        }
        self.align_visual_odometry();
    }

    /// Fused and offline-path trajectories share a single transform derived
    /// from the main agent.
    pub fn align_fused(&mut self) -> Result<()> {
        if self.fused.is_empty() {
            return Ok(());
        }
        let gt = trajectory_for(&self.ground_truth,self.params.main_agent)?;
        let reference = trajectory_for(&self.fused,self.params.main_agent)?;
        let transform = AlignmentTransform::between(gt,reference)?;
        log::info!("fused frame calibration: yaw {:.3} rad, translation {:.3} {:.3} {:.3}",
            transform.yaw,transform.translation[0],transform.translation[1],transform.translation[2]);
        Self::align_map(&mut self.fused,&transform)?;
        Self::align_map(&mut self.offline_path,&transform)
    }

    /// Visual odometry starts at each agent's own origin, so it is
    /// calibrated per agent. An agent whose calibration fails stays
    /// unaligned and is logged; the remaining agents proceed.
    pub fn align_visual_odometry(&mut self) {
        for (&agent,vo) in self.visual_odometry.iter_mut() {
            let transform = trajectory_for(&self.ground_truth,agent)
                .and_then(|gt| AlignmentTransform::between(gt,vo));
            let aligned = transform.and_then(|transform| {
                log::info!("visual-odometry calibration for agent {}: yaw {:.3} rad",agent,transform.yaw);
                align(vo,&transform)
            });
            match aligned {
                Ok(trajectory) => *vo = trajectory,
                Err(e) => log::warn!("visual-odometry alignment for agent {} unavailable: {}",agent,e)
            }
        }
    }

    fn align_map(map: &mut TrajectoryMap, transform: &AlignmentTransform) -> Result<()> {
        for trajectory in map.values_mut() {
            *trajectory = align(trajectory,transform)?;
        }
        Ok(())
    }

    pub fn time_calibration(&self, agent: AgentId) -> Result<TimeCalibration> {
        let gt = trajectory_for(&self.ground_truth,agent)?;
        let est = trajectory_for(&self.fused,agent)?;
        calibrate(gt,est,&self.params.time_grid)
    }

    /// Per-axis RMSE of every estimator trajectory against ground truth
    /// resampled at the estimator's own timestamps (plus the agent's clock
    /// offset).
    pub fn absolute_errors(&self) -> Vec<AbsoluteErrorReport> {
        let mut reports = Vec::<AbsoluteErrorReport>::new();
        for (source,map) in [(SourceKind::FusedEstimate,&self.fused),
                             (SourceKind::VisualOdometry,&self.visual_odometry),
                             (SourceKind::OfflinePath,&self.offline_path)] {
            for (&agent,est) in map {
                match self.absolute_error(agent,est) {
                    Ok(rmse) => reports.push(AbsoluteErrorReport{agent,source,rmse}),
                    Err(e) => log::warn!("no absolute error for agent {} ({}): {}",agent,source,e)
                }
            }
        }
        reports.sort_by_key(|r| r.agent);
        reports
    }

    fn absolute_error(&self, agent: AgentId, est: &PoseTrajectory) -> Result<Vector3<Float>> {
        let gt = trajectory_for(&self.ground_truth,agent)?;
        let dt = self.params.offset(agent);
        let gt_pos = est.timestamps().iter().map(|&t| gt.position(t + dt)).collect::<Vec<Vector3<Float>>>();
        vector_rmse(&est.positions(),&gt_pos)
    }

    /// Relative-position error between the main agent and every other agent,
    /// both series resampled at the main fused trajectory's timestamps.
    pub fn relative_errors(&self) -> Result<Vec<RelativeErrorReport>> {
        let main = self.params.main_agent;
        let gt_main = trajectory_for(&self.ground_truth,main)?;
        let fused_main = trajectory_for(&self.fused,main)?;
        let ts = fused_main.timestamps();

        let mut reports = Vec::<RelativeErrorReport>::new();
        for &agent in &self.params.agents {
            if agent == main {
                continue;
            }
            let gt_other = match trajectory_for(&self.ground_truth,agent) {
                Ok(t) => t,
                Err(e) => {
                    log::warn!("skipping relative error {} -> {}: {}",main,agent,e);
                    continue;
                }
            };
            let fused_other = match trajectory_for(&self.fused,agent) {
                Ok(t) => t,
                Err(e) => {
                    log::warn!("skipping relative error {} -> {}: {}",main,agent,e);
                    continue;
                }
            };
            let dt = self.params.offset(agent);
            let dp_gt = ts.iter().map(|&t| gt_other.position(t + dt) - gt_main.position(t + self.params.offset(main))).collect::<Vec<Vector3<Float>>>();
            let dp_fused = ts.iter().map(|&t| fused_other.position(t) - fused_main.position(t)).collect::<Vec<Vector3<Float>>>();
            let stats = ErrorStatistic::from_series(&dp_fused,&dp_gt,self.params.histogram_bins,self.params.histogram_range)?;
            reports.push(RelativeErrorReport{agent_a: main, agent_b: agent, position: stats});
        }
        Ok(reports)
    }

    pub fn loop_errors(&self) -> Result<LoopReport> {
        let errors = relative::evaluate_loops(&self.ground_truth,&self.loops);
        if errors.is_empty() {
            return Err(EvalError::EmptySeries);
        }
        let measured = errors.iter().map(|e| e.dpos_measured).collect::<Vec<Vector3<Float>>>();
        let gt = errors.iter().map(|e| e.dpos_gt).collect::<Vec<Vector3<Float>>>();
        let yaw_samples = errors.iter()
            .map(|e| crate::statistics::ErrorSample::new(e.t,0.0,e.dyaw_err))
            .collect::<Vec<crate::statistics::ErrorSample>>();
        Ok(LoopReport{
            count: errors.len(),
            position: ErrorStatistic::from_series(&measured,&gt,self.params.histogram_bins,self.params.histogram_range)?,
            yaw: ScalarStatistic::from_samples(&yaw_samples,self.params.histogram_bins,self.params.histogram_range)?,
            errors
        })
    }

    pub fn detection_errors(&self) -> Result<DetectionReport> {
        let options = DetectionOptions{
            observer: Some(self.params.main_agent),
            correct_self_pose: self.params.correct_self_pose,
            time_offsets: self.params.time_offsets.clone()
        };
        let errors = relative::evaluate_detections(&self.ground_truth,&self.visual_odometry_raw,&self.detections,&options);
        if errors.is_empty() {
            return Err(EvalError::EmptySeries);
        }
        let measured = errors.iter().map(|e| e.dpos_measured).collect::<Vec<Vector3<Float>>>();
        let gt = errors.iter().map(|e| e.dpos_gt).collect::<Vec<Vector3<Float>>>();
        let inv_dep = errors.iter().map(|e| e.inv_dep_sample()).collect::<Vec<crate::statistics::ErrorSample>>();
        Ok(DetectionReport{
            count: errors.len(),
            direction: ErrorStatistic::from_series(&measured,&gt,self.params.histogram_bins,self.params.histogram_range)?,
            inverse_depth: ScalarStatistic::from_samples(&inv_dep,self.params.histogram_bins,self.params.histogram_range)?,
            errors
        })
    }

    pub fn range_errors(&self) -> Result<HashMap<AgentId,RangeReport>> {
        let evaluations = relative::evaluate_ranges(&self.ground_truth,&self.ranges,&self.params.time_offsets);
        let mut reports = HashMap::<AgentId,RangeReport>::new();
        for (agent,evaluation) in evaluations {
            let distance = ScalarStatistic::from_samples(&evaluation.samples,self.params.histogram_bins,self.params.histogram_range)?;
            reports.insert(agent,RangeReport{
                count: evaluation.samples.len(),
                distance,
                fit: evaluation.fit
            });
        }
        Ok(reports)
    }

    /// Writes every trajectory of the trial in the interchange format, one
    /// file per agent per source, subsampled by the configured skip.
    pub fn write_trajectories(&self, directory: &Path) -> Result<()> {
        for map in [&self.ground_truth,&self.fused,&self.visual_odometry,&self.offline_path] {
            for trajectory in map.values() {
                let name = format!("{}_agent{}.txt",trajectory.source(),trajectory.agent());
                io::write_pose_file(&directory.join(name),trajectory,self.params.output_skip)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug,Clone)]
pub struct AbsoluteErrorReport {
    pub agent: AgentId,
    pub source: SourceKind,
    pub rmse: Vector3<Float>
}

impl fmt::Display for AbsoluteErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,"RMSE {} agent {}: {:.3},{:.3},{:.3}",self.source,self.agent,self.rmse[0],self.rmse[1],self.rmse[2])
    }
}

#[derive(Debug,Clone)]
pub struct RelativeErrorReport {
    pub agent_a: AgentId,
    pub agent_b: AgentId,
    pub position: ErrorStatistic
}

impl fmt::Display for RelativeErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,"relative {} -> {}: {}",self.agent_a,self.agent_b,self.position)
    }
}

#[derive(Debug,Clone)]
pub struct LoopReport {
    pub count: usize,
    pub position: ErrorStatistic,
    pub yaw: ScalarStatistic,
    pub errors: Vec<relative::LoopError>
}

impl fmt::Display for LoopReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,"{} loops, position {} yaw {}",self.count,self.position,self.yaw)
    }
}

#[derive(Debug,Clone)]
pub struct DetectionReport {
    pub count: usize,
    pub direction: ErrorStatistic,
    pub inverse_depth: ScalarStatistic,
    pub errors: Vec<relative::DetectionError>
}

impl fmt::Display for DetectionReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,"{} detections, direction {} inverse depth {}",self.count,self.direction,self.inverse_depth)
    }
}

#[derive(Debug,Clone)]
pub struct RangeReport {
    pub count: usize,
    pub distance: ScalarStatistic,
    pub fit: Option<(Float,Float)>
}

impl fmt::Display for RangeReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,"{} ranges, {}",self.count,self.distance)?;
        if let Some((slope,intercept)) = self.fit {
            write!(f," fit {:.3}*d{:+.3}",slope,intercept)?;
        }
        Ok(())
    }
}
