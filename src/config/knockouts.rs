use super::traits::{invalid, ConfigSection};
use crate::error::KolandscapeError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnockoutConfig {
    /// Instruction written over knocked-out sites. Must be in the instruction set.
    pub noop_instruction: String,
    /// Number of `task.N` detail columns to request.
    pub num_tasks: usize,
    /// Detail columns requested ahead of the task columns.
    pub detail_args: Vec<String>,
    /// Evaluate a random subset of this many site pairs instead of all of them.
    pub pair_sample_size: Option<usize>,
    pub seed: Option<u64>,
    /// Run-directory subfolder for per-genotype detail files.
    pub detail_dir: String,
    pub analyze_file: String,
    pub pairwise_analyze_file: String,
    /// Remove analyze scripts and detail files once the table is written.
    pub cleanup: bool,
}

impl Default for KnockoutConfig {
    fn default() -> Self {
        Self {
            noop_instruction: "nop-X".to_string(),
            num_tasks: 6,
            detail_args: vec![
                "sequence".to_string(),
                "viable".to_string(),
                "gest_time".to_string(),
            ],
            pair_sample_size: None,
            seed: None,
            detail_dir: "knockouts".to_string(),
            analyze_file: "analyze_knockouts.cfg".to_string(),
            pairwise_analyze_file: "analyze_pairwise_knockouts.cfg".to_string(),
            cleanup: false,
        }
    }
}

impl KnockoutConfig {
    /// Full DETAIL argument list: configured columns followed by `task.0..task.N-1`.
    pub fn detail_columns(&self) -> Vec<String> {
        self.detail_args
            .iter()
            .cloned()
            .chain((0..self.num_tasks).map(|i| format!("task.{}", i)))
            .collect()
    }
}

impl ConfigSection for KnockoutConfig {
    fn section_name() -> &'static str {
        "knockouts"
    }

    fn validate(&self) -> Result<(), KolandscapeError> {
        if self.noop_instruction.is_empty() {
            return Err(invalid(Self::section_name(), "no-op instruction must be named"));
        }
        if self.pair_sample_size == Some(0) {
            return Err(invalid(
                Self::section_name(),
                "pair_sample_size must be positive when set",
            ));
        }
        if self.detail_dir.is_empty() {
            return Err(invalid(Self::section_name(), "detail_dir must not be empty"));
        }
        Ok(())
    }
}
