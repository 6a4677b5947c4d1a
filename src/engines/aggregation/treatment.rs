use crate::error::{KolandscapeError, Result};
use crate::types::Record;
use std::collections::BTreeMap;

/// Per-replicate co-occurrence fields averaged across a treatment.
pub const AVERAGED_FIELDS: [&str; 8] = [
    "task_1_prob",
    "task_2_prob",
    "task_1_count",
    "task_2_count",
    "pmi",
    "npmi",
    "joint_prob",
    "joint_count",
];

/// `field-value` pairs joined with `__`.
pub fn treatment_id(params: &Record, fields: &[String]) -> Result<String> {
    let parts = fields
        .iter()
        .map(|f| Ok(format!("{}-{}", f, params.get(f)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("__"))
}

#[derive(Debug, Clone, Default)]
struct TreatmentEntry {
    fields: Record,
    replicates: BTreeMap<(usize, usize), Vec<Record>>,
}

/// Replicate rows grouped by treatment and task pair.
#[derive(Debug, Clone, Default)]
pub struct TreatmentAggregator {
    treatments: BTreeMap<String, TreatmentEntry>,
}

impl TreatmentAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one replicate's stats for task pair `(t1, t2)`. The treatment
    /// is created on first sight with the given identifying fields.
    pub fn add(&mut self, treatment: &str, fields: &Record, pair: (usize, usize), stats: Record) {
        self.treatments
            .entry(treatment.to_string())
            .or_insert_with(|| TreatmentEntry {
                fields: fields.clone(),
                replicates: BTreeMap::new(),
            })
            .replicates
            .entry(pair)
            .or_default()
            .push(stats);
    }

    pub fn num_treatments(&self) -> usize {
        self.treatments.len()
    }

    pub fn num_replicates(&self, treatment: &str, pair: (usize, usize)) -> usize {
        self.treatments
            .get(treatment)
            .and_then(|t| t.replicates.get(&pair))
            .map_or(0, |r| r.len())
    }

    /// One row per (treatment, task pair): identifying fields, the pair's ids
    /// and names, and `<field>_avg` for every averaged field.
    pub fn summary_rows(&self, task_names: &[String]) -> Result<Vec<Record>> {
        let mut rows = Vec::new();
        for entry in self.treatments.values() {
            for (&(t1, t2), replicates) in &entry.replicates {
                let mut row = entry.fields.clone();
                row.insert("task_1_id", t1);
                row.insert("task_2_id", t2);
                row.insert("task_1_name", task_name(task_names, t1)?);
                row.insert("task_2_name", task_name(task_names, t2)?);
                for field in AVERAGED_FIELDS {
                    let mut sum = 0.0;
                    for rep in replicates {
                        sum += rep.get_count(field)?;
                    }
                    row.insert(format!("{}_avg", field), sum / replicates.len() as f64);
                }
                rows.push(row);
            }
        }
        Ok(rows)
    }
}

fn task_name(task_names: &[String], index: usize) -> Result<&str> {
    task_names.get(index).map(|s| s.as_str()).ok_or_else(|| {
        KolandscapeError::SchemaMismatch(format!("task index {} out of range", index))
    })
}
