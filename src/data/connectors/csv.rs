use crate::error::{KolandscapeError, Result};
use crate::types::Record;
use polars::prelude::*;
use std::path::Path;

pub struct CsvConnector;

impl CsvConnector {
    /// Load CSV file into a DataFrame with every column kept as a string.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(KolandscapeError::missing_file(path));
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()
            .map_err(|e| {
                KolandscapeError::SchemaMismatch(format!(
                    "Failed to read CSV {}: {}",
                    path.display(),
                    e
                ))
            })?;

        Ok(df)
    }

    /// Load a CSV file as one record per row.
    pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
        let df = Self::load(path)?;
        Self::to_records(&df)
    }

    pub fn to_records(df: &DataFrame) -> Result<Vec<Record>> {
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();

        let mut columns = Vec::with_capacity(names.len());
        for name in &names {
            columns.push(df.column(name)?.cast(&DataType::String)?);
        }
        let strings = columns
            .iter()
            .map(|c| c.str())
            .collect::<PolarsResult<Vec<_>>>()?;

        let mut records = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let mut record = Record::new();
            for (name, values) in names.iter().zip(&strings) {
                record.insert(name.as_str(), values.get(i).unwrap_or(""));
            }
            records.push(record);
        }
        Ok(records)
    }

    /// Write records under `header`; fields a record lacks are left empty.
    pub fn write_records<P: AsRef<Path>>(path: P, header: &[String], rows: &[Record]) -> Result<()> {
        let columns: Vec<Column> = header
            .iter()
            .map(|field| {
                let values: Vec<String> = rows
                    .iter()
                    .map(|r| r.get_opt(field).unwrap_or("").to_string())
                    .collect();
                Column::new(field.as_str().into(), values)
            })
            .collect();
        let mut df = DataFrame::new(columns)?;

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = std::fs::File::create(path.as_ref())?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)?;
        Ok(())
    }
}
