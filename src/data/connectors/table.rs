use super::csv::CsvConnector;
use crate::error::{KolandscapeError, Result};
use crate::types::Record;
use std::path::Path;

/// Rows destined for one output CSV. Columns are the alphabetically sorted
/// field names of the first row; every later row must have the same set.
#[derive(Debug, Clone)]
pub struct SummaryTable {
    name: String,
    header: Option<Vec<String>>,
    rows: Vec<Record>,
}

impl SummaryTable {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            header: None,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Record) -> Result<()> {
        let fields: Vec<String> = row.field_names().map(|f| f.to_string()).collect();
        match &self.header {
            None => self.header = Some(fields),
            Some(header) if *header != fields => {
                return Err(KolandscapeError::SchemaMismatch(format!(
                    "{} header mismatch: expected {:?}, found {:?}",
                    self.name, header, fields
                )));
            }
            Some(_) => {}
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn extend<I: IntoIterator<Item = Record>>(&mut self, rows: I) -> Result<()> {
        for row in rows {
            self.push(row)?;
        }
        Ok(())
    }

    pub fn header(&self) -> &[String] {
        self.header.as_deref().unwrap_or(&[])
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        log::info!(
            "Writing {} ({} rows) to {}",
            self.name,
            self.rows.len(),
            path.as_ref().display()
        );
        CsvConnector::write_records(path, self.header(), &self.rows)
    }
}
