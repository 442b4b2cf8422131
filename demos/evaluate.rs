use std::path::{Path,PathBuf};
use color_eyre::eyre::{eyre,Result};
use swarm_eval::io::read_pose_file;
use swarm_eval::session::{EvaluationParameters,EvaluationSession};
use swarm_eval::SourceKind;

/**
 * Evaluates a recorded trial from trajectory files in the interchange format
 * (`t x y z qx qy qz qw`), laid out as `<dir>/<source>_agent<n>.txt`.
 *
 * Usage: evaluate <data-dir> [params.yaml] [output-dir]
 */
fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let data_dir = PathBuf::from(args.next().ok_or_else(|| eyre!("usage: evaluate <data-dir> [params.yaml] [output-dir]"))?);
    let params = match args.next() {
        Some(path) => EvaluationParameters::load(Path::new(&path))?,
        None => EvaluationParameters::default()
    };
    let output_dir = args.next().map(PathBuf::from);

    let mut session = EvaluationSession::new(params.clone());
    for &agent in &params.agents {
        for source in [SourceKind::GroundTruth,SourceKind::FusedEstimate,SourceKind::VisualOdometry,SourceKind::OfflinePath] {
            let path = data_dir.join(format!("{}_agent{}.txt",source,agent));
            if !path.exists() {
                continue;
            }
            match read_pose_file(&path,agent,source) {
                Ok(trajectory) => {
                    println!("agent {} ({}): {} samples, path length {:.3} m",agent,source,trajectory.len(),trajectory.path_length());
                    session.insert_trajectory(trajectory);
                },
                Err(e) => log::warn!("{}: {}",path.display(),e)
            }
        }
    }

    session.align();

    for report in session.absolute_errors() {
        println!("{}",report);
    }
    match session.relative_errors() {
        Ok(reports) => for report in reports {
            println!("{}",report);
        },
        Err(e) => log::warn!("relative errors unavailable: {}",e)
    }
    for &agent in &params.agents {
        match session.time_calibration(agent) {
            Ok(calibration) => println!("agent {}: best dt (position) {:+.3}s rmse {:.3}, best dt (velocity) {:+.3}s",
                agent,calibration.position.best_dt,calibration.position.rmse.norm(),calibration.velocity.best_dt),
            Err(e) => log::warn!("time calibration unavailable for agent {}: {}",agent,e)
        }
    }

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(&dir)?;
        session.write_trajectories(&dir)?;
        println!("wrote aligned trajectories to {}",dir.display());
    }

    Ok(())
}
