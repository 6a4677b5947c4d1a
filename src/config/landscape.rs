use super::traits::{invalid, ConfigSection};
use crate::error::KolandscapeError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LandscapeConfig {
    /// Mutational steps away from the focal genome (1 or 2).
    pub steps: u8,
    pub num_tasks: usize,
    pub detail_args: Vec<String>,
    /// Detail file written by the simulator.
    pub analysis_output: String,
    pub analyze_file: String,
    /// Where to write the analyze script.
    pub dump_dir: String,
}

impl Default for LandscapeConfig {
    fn default() -> Self {
        Self {
            steps: 1,
            num_tasks: 6,
            detail_args: vec!["sequence".to_string(), "viable".to_string()],
            analysis_output: "mutants.dat".to_string(),
            analyze_file: "analyze_mutants.cfg".to_string(),
            dump_dir: "./dump".to_string(),
        }
    }
}

impl LandscapeConfig {
    pub fn detail_columns(&self) -> Vec<String> {
        self.detail_args
            .iter()
            .cloned()
            .chain((0..self.num_tasks).map(|i| format!("task.{}", i)))
            .collect()
    }
}

impl ConfigSection for LandscapeConfig {
    fn section_name() -> &'static str {
        "landscape"
    }

    fn validate(&self) -> Result<(), KolandscapeError> {
        if !matches!(self.steps, 1 | 2) {
            return Err(invalid(
                Self::section_name(),
                format!("steps must be 1 or 2, got {}", self.steps),
            ));
        }
        if self.analysis_output.is_empty() {
            return Err(invalid(Self::section_name(), "analysis_output must not be empty"));
        }
        Ok(())
    }
}
