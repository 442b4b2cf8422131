use std::collections::HashMap;
use std::path::Path;
use serde::{Serialize,Deserialize};
use crate::time_calib::TimeGrid;
use crate::{AgentId,EvalError,Float,Result};

/// Trial-level configuration, deserializable from YAML.
#[derive(Debug,Clone,Serialize,Deserialize)]
#[serde(default)]
pub struct EvaluationParameters {
    pub agents: Vec<AgentId>,
    pub main_agent: AgentId,
    pub time_grid: TimeGrid,
    /// Per-agent clock offsets applied to ground-truth lookups, seconds.
    pub time_offsets: HashMap<AgentId,Float>,
    pub correct_self_pose: bool,
    /// Keep every n-th sample when writing trajectory files.
    pub output_skip: usize,
    pub histogram_bins: usize,
    pub histogram_range: (Float,Float)
}

impl Default for EvaluationParameters {
    fn default() -> EvaluationParameters {
        EvaluationParameters{
            agents: vec![1,2],
            main_agent: 1,
            time_grid: TimeGrid::default(),
            time_offsets: HashMap::new(),
            correct_self_pose: false,
            output_skip: 1,
            histogram_bins: 50,
            histogram_range: (-0.5,0.5)
        }
    }
}

impl EvaluationParameters {
    pub fn load(path: &Path) -> Result<EvaluationParameters> {
        let contents = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&contents).map_err(|e| EvalError::Parse{line: 0, reason: e.to_string()})
    }

    pub fn offset(&self, agent: AgentId) -> Float {
        self.time_offsets.get(&agent).copied().unwrap_or(0.0)
    }
}
