use std::fmt;
use thiserror::Error;

pub mod numerics;
pub mod trajectory;
pub mod alignment;
pub mod time_calib;
pub mod relative;
pub mod statistics;
pub mod io;
pub mod session;

macro_rules! define_float {
    ($f:tt) => {
        pub use std::$f as float;
        pub type Float = $f;
    }
}

define_float!(f64);

pub type AgentId = usize;

#[derive(Debug,Copy,Clone,PartialEq,Eq,Hash,serde::Serialize,serde::Deserialize)]
pub enum SourceKind {
    GroundTruth,
    FusedEstimate,
    VisualOdometry,
    OfflinePath
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SourceKind::GroundTruth => write!(f,"ground_truth"),
            SourceKind::FusedEstimate => write!(f,"fused_estimate"),
            SourceKind::VisualOdometry => write!(f,"visual_odometry"),
            SourceKind::OfflinePath => write!(f,"offline_path")
        }
    }
}

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("fewer than 2 samples for agent {agent} ({kind}): got {count}")]
    InsufficientData { agent: AgentId, kind: SourceKind, count: usize },

    #[error("no trajectory for agent {0}")]
    UnknownAgent(AgentId),

    #[error("no overlapping reference sample between ground truth and {kind} of agent {agent}")]
    AlignmentUnavailable { agent: AgentId, kind: SourceKind },

    #[error("statistic requested over an empty or mismatched series")]
    EmptySeries,

    #[error("io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record at line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, EvalError>;
