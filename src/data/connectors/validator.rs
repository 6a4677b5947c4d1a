use crate::error::{KolandscapeError, Result};
use crate::types::Record;

pub struct DataValidator;

impl DataValidator {
    /// Every row must carry every field in `required`.
    pub fn validate_required_fields(rows: &[Record], required: &[&str], context: &str) -> Result<()> {
        for (i, row) in rows.iter().enumerate() {
            for field in required {
                if !row.contains(field) {
                    return Err(KolandscapeError::SchemaMismatch(format!(
                        "{}: row {} is missing required field '{}'",
                        context, i, field
                    )));
                }
            }
        }
        Ok(())
    }

    /// Task counters must be present for every tracked task.
    pub fn validate_task_columns(rows: &[Record], tasks: &[String], context: &str) -> Result<()> {
        let required: Vec<&str> = tasks.iter().map(|t| t.as_str()).collect();
        Self::validate_required_fields(rows, &required, context)
    }

    /// Check for minimum required rows
    pub fn validate_minimum_rows(rows: &[Record], min_rows: usize, context: &str) -> Result<()> {
        if rows.len() < min_rows {
            return Err(KolandscapeError::SchemaMismatch(format!(
                "{}: {} rows, minimum {} required",
                context,
                rows.len(),
                min_rows
            )));
        }
        Ok(())
    }
}
