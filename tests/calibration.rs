use nalgebra as na;
use rand::thread_rng;
use rand::Rng;

use na::Vector3;
use rand_distr::{Distribution,Normal};
use swarm_eval::alignment::{align,AlignmentTransform};
use swarm_eval::numerics::{wrap_to_pi,yaw_rotate_vec};
use swarm_eval::statistics;
use swarm_eval::time_calib::{calibrate,TimeGrid};
use swarm_eval::trajectory::{PoseSample,PoseTrajectory};
use swarm_eval::{float,EvalError,Float,SourceKind};

const EPS: Float = 1e-9;

fn wavy_trajectory(agent: usize, source: SourceKind, delay: Float) -> PoseTrajectory {
    let samples = (0..=2000).map(|i| {
        let t = (i as Float)*0.01;
        let s = t - delay;
        let position = Vector3::new(2.0*(0.4*s).sin(),1.5*(0.3*s).cos(),0.1*s);
        PoseSample::from_position_yaw(t,position,0.05*s)
    }).collect::<Vec<PoseSample>>();
    PoseTrajectory::build(agent,source,samples).unwrap()
}

#[test]
fn test_aligner_recovers_known_transform() {
    let theta: Float = 0.7;
    let translation = Vector3::new(1.2,-0.4,0.3);
    let gt = wavy_trajectory(1,SourceKind::GroundTruth,0.0);
    // Estimate expressed in a frame rotated by theta and shifted by translation
    let est_samples = gt.samples().iter().map(|s| PoseSample::from_position_yaw(
        s.t,
        yaw_rotate_vec(-theta,&(s.position - translation)),
        s.yaw() - theta)).collect::<Vec<PoseSample>>();
    let est = PoseTrajectory::build(1,SourceKind::FusedEstimate,est_samples).unwrap();

    let transform = AlignmentTransform::between(&gt,&est).unwrap();
    assert!((transform.yaw - theta).abs() < EPS);
    assert!((transform.translation - translation).norm() < EPS);

    let aligned = align(&est,&transform).unwrap();
    for (a,g) in aligned.samples().iter().zip(gt.samples().iter()) {
        assert!((a.position - g.position).norm() < 1e-6);
        assert!((a.yaw() - g.yaw()).abs() < 1e-6);
    }
}

#[test]
fn test_aligner_translation_only() {
    let v = Vector3::new(0.5,0.0,0.0);
    let gt = wavy_trajectory(1,SourceKind::GroundTruth,0.0);
    let est_samples = gt.samples().iter().map(|s| PoseSample::from_position_yaw(s.t,s.position - v,s.yaw())).collect::<Vec<PoseSample>>();
    let est = PoseTrajectory::build(1,SourceKind::FusedEstimate,est_samples).unwrap();

    let transform = AlignmentTransform::between(&gt,&est).unwrap();
    assert!(transform.yaw.abs() < EPS);
    assert!((transform.translation - v).norm() < EPS);
}

#[test]
fn test_aligner_unavailable_without_overlap() {
    let gt = wavy_trajectory(1,SourceKind::GroundTruth,0.0);
    let est_samples = (0..10).map(|i| {
        let t = 100.0 + (i as Float);
        PoseSample::from_position_yaw(t,Vector3::zeros(),0.0)
    }).collect::<Vec<PoseSample>>();
    let est = PoseTrajectory::build(1,SourceKind::FusedEstimate,est_samples).unwrap();
    assert!(matches!(AlignmentTransform::between(&gt,&est), Err(EvalError::AlignmentUnavailable{..})));
}

#[test]
fn test_time_offset_recovered_within_one_step() {
    let dt0: Float = 0.25;
    let grid = TimeGrid::default();
    let gt = wavy_trajectory(1,SourceKind::GroundTruth,dt0);
    let est = wavy_trajectory(1,SourceKind::FusedEstimate,0.0);

    let calibration = calibrate(&gt,&est,&grid).unwrap();
    assert!((calibration.position.best_dt - dt0).abs() <= grid.step + EPS);
    assert!((calibration.velocity.best_dt - dt0).abs() <= grid.step + EPS);
}

#[test]
fn test_time_offset_tie_break_is_first_candidate() {
    // Stationary agents: resampling constant positions is exact for every
    // dt, so both objectives are bit-identical across the whole grid and
    // the scan must keep the first candidate.
    let stationary = |src,position: Vector3<Float>| {
        let s = (0..=100).map(|i| PoseSample::from_position_yaw((i as Float)*0.1,position,0.0)).collect::<Vec<PoseSample>>();
        PoseTrajectory::build(1,src,s).unwrap()
    };
    let grid = TimeGrid::default();
    let gt = stationary(SourceKind::GroundTruth,Vector3::new(1.0,2.0,3.0));
    let est = stationary(SourceKind::FusedEstimate,Vector3::new(1.5,2.0,3.0));
    let calibration = calibrate(&gt,&est,&grid).unwrap();
    assert!((calibration.position.best_dt - grid.min).abs() < EPS);
    assert!((calibration.velocity.best_dt - grid.min).abs() < EPS);
}

#[test]
fn test_invalid_time_grid_is_rejected() {
    let degenerate = TimeGrid{min: -1.0, max: 1.0, step: 0.0};
    assert!(degenerate.offsets().is_empty());
    let inverted = TimeGrid{min: 1.0, max: -1.0, step: 0.01};
    assert!(inverted.offsets().is_empty());

    let gt = wavy_trajectory(1,SourceKind::GroundTruth,0.0);
    let est = wavy_trajectory(1,SourceKind::FusedEstimate,0.0);
    assert!(matches!(calibrate(&gt,&est,&degenerate), Err(EvalError::EmptySeries)));
}

#[test]
fn test_rmse_of_identical_series_is_zero() {
    let mut rng = thread_rng();
    let x = (0..100).map(|_| rng.gen::<Float>()).collect::<Vec<Float>>();
    assert_eq!(statistics::rmse(&x,&x).unwrap(),0.0);
}

#[test]
fn test_rmse_constant_offset() {
    let x: Vec<Float> = vec![0.0;50];
    let y: Vec<Float> = vec![0.5;50];
    assert!((statistics::rmse(&x,&y).unwrap() - 0.5).abs() < EPS);
    assert!((statistics::bias(&x,&y).unwrap() - 0.5).abs() < EPS);
    assert!(statistics::rmse_debiased(&x,&y).unwrap() < EPS);
}

#[test]
fn test_empty_series_is_an_error() {
    let empty: Vec<Float> = Vec::new();
    assert!(matches!(statistics::rmse(&empty,&empty), Err(EvalError::EmptySeries)));
    assert!(matches!(statistics::rmse(&[1.0],&[1.0,2.0]), Err(EvalError::EmptySeries)));
    assert!(matches!(statistics::gaussian_fit(&empty), Err(EvalError::EmptySeries)));
}

#[test]
fn test_gaussian_fit_recovers_distribution() {
    let mu = 0.3;
    let sigma = 0.2;
    let normal = Normal::new(mu,sigma).unwrap();
    let mut rng = thread_rng();
    let samples = (0..5000).map(|_| normal.sample(&mut rng)).collect::<Vec<Float>>();
    let (fit_mu,fit_sigma) = statistics::gaussian_fit(&samples).unwrap();
    assert!((fit_mu - mu).abs() < 0.02);
    assert!((fit_sigma - sigma).abs() < 0.02);
}

#[test]
fn test_histogram_is_density_normalized() {
    let mut rng = thread_rng();
    let samples = (0..1000).map(|_| rng.gen_range(-0.5..0.5)).collect::<Vec<Float>>();
    let bins = statistics::histogram(&samples,20,(-0.5,0.5)).unwrap();
    let bin_width = 1.0/20.0;
    let integral: Float = bins.iter().map(|b| b*bin_width).sum();
    assert!((integral - 1.0).abs() < EPS);
}

#[test]
fn test_linear_fit_recovers_affine_relation() {
    let x = (0..100).map(|i| i as Float).collect::<Vec<Float>>();
    let y = x.iter().map(|v| 0.734*v + 0.257).collect::<Vec<Float>>();
    let (slope,intercept) = statistics::linear_fit(&x,&y).unwrap();
    assert!((slope - 0.734).abs() < EPS);
    assert!((intercept - 0.257).abs() < 1e-6);
}

#[test]
fn test_wrap_to_pi() {
    assert!((wrap_to_pi(3.0*float::consts::PI) - float::consts::PI).abs() < EPS);
    assert!((wrap_to_pi(-0.1) + 0.1).abs() < EPS);
    assert!((wrap_to_pi(float::consts::PI + 0.2) - (0.2 - float::consts::PI)).abs() < EPS);
}
