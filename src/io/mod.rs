extern crate nalgebra as na;

use std::fs::File;
use std::io::{BufRead,BufReader,BufWriter,Write};
use std::path::Path;
use na::{Quaternion,Vector3};
use serde::{Serialize,Deserialize};
use crate::trajectory::{PoseSample,PoseTrajectory};
use crate::{AgentId,EvalError,Float,Result,SourceKind};

/// Ground-truth pose record: full orientation as a (w,x,y,z) quaternion.
#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct PoseRecord {
    pub t: Float,
    pub position: Vector3<Float>,
    pub quaternion: [Float;4]
}

/// Fused-estimate record; the estimator only publishes a heading.
#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct FusedRecord {
    pub t: Float,
    pub agent: AgentId,
    pub position: Vector3<Float>,
    pub yaw: Float
}

/// Visual-odometry record; samples without valid odometry are dropped at
/// ingestion.
#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct VisualOdometryRecord {
    pub t: Float,
    pub agent: AgentId,
    pub position: Vector3<Float>,
    pub yaw: Float,
    pub valid: bool
}

/// Raw ranging record; inactive entries are excluded.
#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct RangeRecord {
    pub t: Float,
    pub id_a: AgentId,
    pub id_b: AgentId,
    pub active: bool,
    pub distance: Float
}

pub fn trajectory_from_pose_records(agent: AgentId, source: SourceKind, records: &[PoseRecord]) -> Result<PoseTrajectory> {
    let samples = records.iter().map(|r| {
        let [w,x,y,z] = r.quaternion;
        PoseSample::new(r.t,r.position,Quaternion::new(w,x,y,z))
    }).collect::<Vec<PoseSample>>();
    PoseTrajectory::build(agent,source,samples)
}

pub fn trajectory_from_fused_records(agent: AgentId, records: &[FusedRecord]) -> Result<PoseTrajectory> {
    let samples = records.iter()
        .filter(|r| r.agent == agent)
        .map(|r| PoseSample::from_position_yaw(r.t,r.position,r.yaw))
        .collect::<Vec<PoseSample>>();
    PoseTrajectory::build(agent,SourceKind::FusedEstimate,samples)
}

pub fn trajectory_from_vo_records(agent: AgentId, records: &[VisualOdometryRecord]) -> Result<PoseTrajectory> {
    let total = records.iter().filter(|r| r.agent == agent).count();
    let samples = records.iter()
        .filter(|r| r.agent == agent && r.valid)
        .map(|r| PoseSample::from_position_yaw(r.t,r.position,r.yaw))
        .collect::<Vec<PoseSample>>();
    if samples.len() < total {
        log::warn!("agent {}: dropped {} visual-odometry records without valid odometry",agent,total-samples.len());
    }
    PoseTrajectory::build(agent,SourceKind::VisualOdometry,samples)
}

pub fn active_ranges(records: &[RangeRecord]) -> Vec<crate::relative::RangeMeasurement> {
    records.iter().filter(|r| r.active).map(|r| crate::relative::RangeMeasurement{
        ts: r.t,
        id_a: r.id_a,
        id_b: r.id_b,
        distance: r.distance
    }).collect()
}

/**
 * Per-sample trajectory interchange format, one line per retained sample:
 * `t x y z qx qy qz qw` (quaternion scalar last). `skip` keeps every skip-th
 * sample; 1 writes everything.
 */
pub fn write_pose_file(path: &Path, trajectory: &PoseTrajectory, skip: usize) -> Result<()> {
    let skip = skip.max(1);
    let mut writer = BufWriter::new(File::create(path)?);
    for (i,sample) in trajectory.samples().iter().enumerate() {
        if i % skip != 0 {
            continue;
        }
        let p = &sample.position;
        // Quaternion coords are stored (i,j,k,w)
        let q = &sample.quaternion.coords;
        writeln!(writer,"{} {} {} {} {} {} {} {}",sample.t,p[0],p[1],p[2],q[0],q[1],q[2],q[3])?;
    }
    Ok(())
}

/// Reads the interchange format back. Malformed lines are logged and
/// dropped, matching the best-effort ingestion of the other streams.
pub fn read_pose_file(path: &Path, agent: AgentId, source: SourceKind) -> Result<PoseTrajectory> {
    let reader = BufReader::new(File::open(path)?);
    let mut samples = Vec::<PoseSample>::new();
    for (idx,line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_pose_line(&line,idx+1) {
            Ok(sample) => samples.push(sample),
            Err(e) => log::warn!("{}: {}",path.display(),e)
        }
    }
    PoseTrajectory::build(agent,source,samples)
}

fn parse_pose_line(line: &str, line_number: usize) -> Result<PoseSample> {
    let fields = line.split_whitespace()
        .map(|s| s.parse::<Float>().map_err(|e| EvalError::Parse{line: line_number, reason: e.to_string()}))
        .collect::<Result<Vec<Float>>>()?;
    if fields.len() != 8 {
        return Err(EvalError::Parse{line: line_number, reason: format!("expected 8 fields, got {}",fields.len())});
    }
    let position = Vector3::new(fields[1],fields[2],fields[3]);
    // File order is scalar-last, Quaternion::new is scalar-first
    let quaternion = Quaternion::new(fields[7],fields[4],fields[5],fields[6]);
    Ok(PoseSample::new(fields[0],position,quaternion))
}
