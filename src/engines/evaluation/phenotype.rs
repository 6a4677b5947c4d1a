use crate::error::{KolandscapeError, Result};
use crate::types::{Observation, Phenotype, Record};

/// Map one detail row to its task bit-vector and viability flag.
///
/// A task counts only when its counter is strictly positive. Every task in
/// `task_names` must be present in the row.
pub fn extract_phenotype(
    record: &Record,
    task_names: &[String],
    viability_field: &str,
) -> Result<Observation> {
    let viable = record.get_count(viability_field)? != 0.0;

    let mut bits = Vec::with_capacity(task_names.len());
    for task in task_names {
        if !record.contains(task) {
            return Err(KolandscapeError::SchemaMismatch(format!(
                "task column '{}' missing from detail row",
                task
            )));
        }
        bits.push(record.get_count(task)? > 0.0);
    }

    Ok(Observation::new(Phenotype::new(bits), viable))
}
