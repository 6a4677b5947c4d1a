use super::traits::{invalid, ConfigSection};
use crate::error::KolandscapeError;
use crate::types::{Phenotype, TaskSet};
use serde::{Deserialize, Serialize};

/// Tracked tasks and the two environment task partitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Task names in phenotype bit order.
    pub tasks: Vec<String>,
    pub env_a: Vec<String>,
    pub env_b: Vec<String>,
    /// Detail-file column holding the 0/1 viability flag.
    pub viability_field: String,
    /// Genotype-file column holding the genome sequence.
    pub sequence_field: String,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            tasks: ["not", "nand", "and", "ornot", "or", "andnot"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            env_a: ["not", "and", "or"].iter().map(|s| s.to_string()).collect(),
            env_b: ["nand", "ornot", "andnot"].iter().map(|s| s.to_string()).collect(),
            viability_field: "is_viable_(0/1)".to_string(),
            sequence_field: "genome_sequence".to_string(),
        }
    }
}

impl TaskConfig {
    pub fn num_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn task_index(&self, name: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t == name)
    }

    pub fn task_name(&self, index: usize) -> &str {
        self.tasks.get(index).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn env_a_tasks(&self) -> TaskSet {
        self.env_a.iter().filter_map(|t| self.task_index(t)).collect()
    }

    pub fn env_b_tasks(&self) -> TaskSet {
        self.env_b.iter().filter_map(|t| self.task_index(t)).collect()
    }

    /// Ideal phenotype for environment A (`101010` with the default tasks).
    pub fn profile_env_a(&self) -> Phenotype {
        self.profile_of(&self.env_a_tasks())
    }

    pub fn profile_env_b(&self) -> Phenotype {
        self.profile_of(&self.env_b_tasks())
    }

    pub fn profile_all(&self) -> Phenotype {
        Phenotype::new(vec![true; self.num_tasks()])
    }

    /// `;`-joined names of the given tasks, in configured task order.
    pub fn join_names(&self, tasks: &TaskSet) -> String {
        tasks
            .iter()
            .map(|&t| self.task_name(t))
            .collect::<Vec<_>>()
            .join(";")
    }

    fn profile_of(&self, tasks: &TaskSet) -> Phenotype {
        Phenotype::new((0..self.num_tasks()).map(|i| tasks.contains(&i)).collect())
    }
}

impl ConfigSection for TaskConfig {
    fn section_name() -> &'static str {
        "tasks"
    }

    fn validate(&self) -> Result<(), KolandscapeError> {
        if self.tasks.is_empty() {
            return Err(invalid(Self::section_name(), "task list must not be empty"));
        }
        for (i, task) in self.tasks.iter().enumerate() {
            if self.tasks[..i].contains(task) {
                return Err(invalid(
                    Self::section_name(),
                    format!("duplicate task '{}'", task),
                ));
            }
        }
        for task in self.env_a.iter().chain(self.env_b.iter()) {
            if self.task_index(task).is_none() {
                return Err(invalid(
                    Self::section_name(),
                    format!("environment task '{}' is not a tracked task", task),
                ));
            }
        }
        if self.viability_field.is_empty() || self.sequence_field.is_empty() {
            return Err(invalid(Self::section_name(), "field names must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profiles() {
        let config = TaskConfig::default();
        assert_eq!(config.profile_env_a().bitstring(), "101010");
        assert_eq!(config.profile_env_b().bitstring(), "010101");
        assert_eq!(config.profile_all().bitstring(), "111111");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_env_task_rejected() {
        let config = TaskConfig {
            env_a: vec!["xor".to_string()],
            ..TaskConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_join_names_uses_task_order() {
        let config = TaskConfig::default();
        let tasks: TaskSet = [4, 0, 2].into_iter().collect();
        assert_eq!(config.join_names(&tasks), "not;and;or");
    }
}
