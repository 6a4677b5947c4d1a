use super::types::{DatTable, LegendStyle};
use crate::error::{KolandscapeError, Result};
use crate::types::Record;
use std::path::Path;

const DETAIL_LEGEND_MARKER: &str = "# Legend:";
const NUMBERED_LEGEND_MARKER: &str = "#  1:";

/// Reader for the simulator's legend-delimited flat files.
pub struct DatReader;

impl DatReader {
    pub fn read<P: AsRef<Path>>(path: P, backfill_missing_fields: bool) -> Result<DatTable> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(KolandscapeError::missing_file(path));
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, backfill_missing_fields).map_err(|e| match e {
            KolandscapeError::Format(msg) => {
                KolandscapeError::Format(format!("{}: {}", path.display(), msg))
            }
            KolandscapeError::SchemaMismatch(msg) => {
                KolandscapeError::SchemaMismatch(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn parse(content: &str, backfill_missing_fields: bool) -> Result<DatTable> {
        let lines: Vec<&str> = content.trim().lines().collect();

        let (style, legend_start) = Self::sniff_legend(&lines)?;

        let mut fields = Vec::new();
        let mut data_start = lines.len();
        for (i, raw) in lines.iter().enumerate().skip(legend_start) {
            let line = raw.trim();
            if line.is_empty() {
                data_start = i;
                break;
            }
            if !line.starts_with('#') {
                return Err(KolandscapeError::Format(format!(
                    "legend is not terminated by a blank line (line {}: '{}')",
                    i + 1,
                    line
                )));
            }
            fields.push(Self::field_name(line));
        }
        if fields.is_empty() {
            return Err(KolandscapeError::Format("legend declares no fields".to_string()));
        }

        let mut rows = Vec::new();
        for (i, raw) in lines.iter().enumerate().skip(data_start) {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let mut tokens: Vec<&str> = line.split(' ').collect();
            if tokens.len() > fields.len() {
                return Err(KolandscapeError::SchemaMismatch(format!(
                    "line {} has {} values but the legend declares {} fields",
                    i + 1,
                    tokens.len(),
                    fields.len()
                )));
            }
            if tokens.len() < fields.len() {
                if !backfill_missing_fields {
                    return Err(KolandscapeError::SchemaMismatch(format!(
                        "line {} has {} values but the legend declares {} fields",
                        i + 1,
                        tokens.len(),
                        fields.len()
                    )));
                }
                tokens.resize(fields.len(), "");
            }
            rows.push(Record::from_pairs(
                fields.iter().map(|f| f.as_str()).zip(tokens),
            ));
        }

        Ok(DatTable { style, fields, rows })
    }

    fn sniff_legend(lines: &[&str]) -> Result<(LegendStyle, usize)> {
        for (i, raw) in lines.iter().enumerate() {
            let line = raw.trim();
            if line == DETAIL_LEGEND_MARKER {
                return Ok((LegendStyle::Detail, i + 1));
            }
            if line.contains(NUMBERED_LEGEND_MARKER) {
                return Ok((LegendStyle::Numbered, i));
            }
        }
        Err(KolandscapeError::Format(
            "unrecognized file format: no '# Legend:' or '#  1:' preamble".to_string(),
        ))
    }

    /// `#  2: Is Viable (0/1)` -> `is_viable_(0/1)`.
    fn field_name(line: &str) -> String {
        // 3-input logic task names carry a parenthesised formula with colons.
        let line = if line.contains("Logic 3") {
            line.split('(').next().unwrap_or(line)
        } else {
            line
        };
        line.rsplit(':')
            .next()
            .unwrap_or(line)
            .trim()
            .to_lowercase()
            .replace(' ', "_")
    }
}
