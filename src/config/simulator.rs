use super::traits::{invalid, ConfigSection};
use crate::error::KolandscapeError;
use serde::{Deserialize, Serialize};

/// How to invoke the external simulator in analyze mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub executable: String,
    /// Extra command-line arguments, passed through verbatim.
    pub args: Vec<String>,
    /// Kill the simulator after this many seconds. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
    /// File (relative to the run directory) receiving simulator stdout.
    pub log_file: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            executable: "./avida".to_string(),
            args: Vec::new(),
            timeout_secs: None,
            log_file: "knockouts.log".to_string(),
        }
    }
}

impl ConfigSection for SimulatorConfig {
    fn section_name() -> &'static str {
        "simulator"
    }

    fn validate(&self) -> Result<(), KolandscapeError> {
        if self.executable.trim().is_empty() {
            return Err(invalid(Self::section_name(), "executable must not be empty"));
        }
        if self.timeout_secs == Some(0) {
            return Err(invalid(Self::section_name(), "timeout_secs must be positive"));
        }
        Ok(())
    }
}
