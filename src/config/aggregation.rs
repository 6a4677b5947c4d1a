use super::traits::{invalid, ConfigSection};
use crate::error::KolandscapeError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Substring identifying run directories under the data directory.
    pub run_marker: String,
    /// Run-directory subfolder holding per-run outputs.
    pub data_subdir: String,
    pub cmd_log: String,
    pub knockout_file: String,
    pub pairwise_knockout_file: String,
    pub mutant_file: String,
    /// Configuration fields that identify a treatment (replicates share these).
    pub treatment_fields: Vec<String>,
    /// Configuration fields that identify a single replicate.
    pub replicate_fields: Vec<String>,
    /// Configuration fields copied onto long-form architecture rows.
    pub architecture_fields: Vec<String>,
    /// Also write the per-site long-form architecture table.
    pub lineage_architecture: bool,
    /// Appended to output file names when non-empty.
    pub output_id: String,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        let treatment_fields: Vec<String> = ["env_condition", "env_type", "env_chg_rate", "COPY_MUT_PROB"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut replicate_fields = treatment_fields.clone();
        replicate_fields.push("RANDOM_SEED".to_string());
        let architecture_fields = ["env_condition", "env_type", "env_chg_rate", "RANDOM_SEED", "COPY_MUT_PROB"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        Self {
            run_marker: "RUN_".to_string(),
            data_subdir: "data".to_string(),
            cmd_log: "cmd.log".to_string(),
            knockout_file: "knockouts.csv".to_string(),
            pairwise_knockout_file: "pairwise-knockouts.csv".to_string(),
            mutant_file: "mutants.dat".to_string(),
            treatment_fields,
            replicate_fields,
            architecture_fields,
            lineage_architecture: true,
            output_id: String::new(),
        }
    }
}

impl AggregationConfig {
    /// `base.ext` or `base_<output_id>.ext`.
    pub fn output_name(&self, base: &str, ext: &str) -> String {
        if self.output_id.is_empty() {
            format!("{}.{}", base, ext)
        } else {
            format!("{}_{}.{}", base, self.output_id, ext)
        }
    }
}

impl ConfigSection for AggregationConfig {
    fn section_name() -> &'static str {
        "aggregation"
    }

    fn validate(&self) -> Result<(), KolandscapeError> {
        if self.run_marker.is_empty() {
            return Err(invalid(Self::section_name(), "run_marker must not be empty"));
        }
        if self.treatment_fields.is_empty() {
            return Err(invalid(Self::section_name(), "treatment_fields must not be empty"));
        }
        Ok(())
    }
}
