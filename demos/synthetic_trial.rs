extern crate nalgebra as na;

use color_eyre::eyre::Result;
use na::Vector3;
use swarm_eval::numerics::yaw_rotate_vec;
use swarm_eval::relative::{LoopClosure,RangeMeasurement};
use swarm_eval::session::{EvaluationParameters,EvaluationSession};
use swarm_eval::trajectory::{PoseSample,PoseTrajectory};
use swarm_eval::{Float,SourceKind};

fn circle_samples(radius: Float, phase: Float, duration: Float, rate: Float) -> Vec<PoseSample> {
    let n = (duration*rate) as usize;
    (0..=n).map(|i| {
        let t = (i as Float)/rate;
        let angle = 0.2*t + phase;
        let position = Vector3::new(radius*angle.cos(),radius*angle.sin(),1.0);
        PoseSample::from_position_yaw(t,position,angle)
    }).collect()
}

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let params = EvaluationParameters::default();
    let mut session = EvaluationSession::new(params);

    // Two agents on concentric circles; the estimator frame is offset by a
    // constant yaw and translation against the tracking system.
    let yaw_offset = 0.3;
    let translation = Vector3::new(1.0,-0.5,0.2);
    for (agent,radius,phase) in [(1,2.0,0.0),(2,3.0,1.5)] {
        let gt = circle_samples(radius,phase,60.0,10.0);
        let est = gt.iter().map(|s| PoseSample::from_position_yaw(
            s.t,
            yaw_rotate_vec(-yaw_offset,&(s.position - translation)),
            s.yaw() - yaw_offset)).collect::<Vec<PoseSample>>();
        session.insert_trajectory(PoseTrajectory::build(agent,SourceKind::GroundTruth,gt)?);
        session.insert_trajectory(PoseTrajectory::build(agent,SourceKind::FusedEstimate,est)?);
    }

    session.align();

    for report in session.absolute_errors() {
        println!("{}",report);
    }
    for report in session.relative_errors()? {
        println!("{}",report);
    }

    let calibration = session.time_calibration(2)?;
    println!("best dt (position) {:+.3}s, best dt (velocity) {:+.3}s",
        calibration.position.best_dt,calibration.velocity.best_dt);

    // A perfect loop closure and a slightly biased ranging sensor.
    let gt1 = session.trajectory(1,SourceKind::GroundTruth)?;
    let gt2 = session.trajectory(2,SourceKind::GroundTruth)?;
    let dpos = yaw_rotate_vec(-gt1.yaw(10.0),&(gt2.position(12.0) - gt1.position(10.0)));
    let dyaw = gt2.yaw(12.0) - gt1.yaw(10.0);
    let ranges = (0..600).map(|i| {
        let t = (i as Float)*0.1;
        let dis = (gt2.position(t) - gt1.position(t)).norm();
        RangeMeasurement{ts: t, id_a: 1, id_b: 2, distance: 0.95*dis + 0.1}
    }).collect::<Vec<RangeMeasurement>>();

    session.set_loops(vec![LoopClosure{ts_a: 10.0, ts_b: 12.0, id_a: 1, id_b: 2, dpos, dyaw}]);
    session.set_ranges(ranges);

    println!("{}",session.loop_errors()?);
    for (agent,report) in session.range_errors()? {
        println!("agent {}: {}",agent,report);
    }

    Ok(())
}
