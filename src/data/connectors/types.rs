use crate::engines::generation::genome::Genome;
use crate::error::{KolandscapeError, Result};
use crate::types::Record;
use serde::{Deserialize, Serialize};

/// The two legend preambles the simulator writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegendStyle {
    /// Analyze-mode detail files and `.spop` files: a `# Legend:` marker line.
    Detail,
    /// Time-series `.dat` files: numbered `#  1:` comment lines.
    Numbered,
}

/// A parsed `.dat` / `.spop` file.
#[derive(Debug, Clone)]
pub struct DatTable {
    pub style: LegendStyle,
    pub fields: Vec<String>,
    pub rows: Vec<Record>,
}

impl DatTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One reference genome plus the simulator metadata carried along with it.
#[derive(Debug, Clone)]
pub struct GenotypeRecord {
    /// Position of the genotype in its input file.
    pub genotype_id: usize,
    pub sequence: Genome,
    pub tree_depth: String,
    pub update_born: Option<String>,
    pub source: Record,
}

impl GenotypeRecord {
    pub fn from_record(genotype_id: usize, record: Record, sequence_field: &str) -> Result<Self> {
        let sequence = Genome::from(record.get(sequence_field)?);
        if sequence.is_empty() {
            return Err(KolandscapeError::Format(format!(
                "genotype {} has an empty '{}'",
                genotype_id, sequence_field
            )));
        }
        let tree_depth = record.get("tree_depth")?.to_string();
        let update_born = record.get_opt("update_born").map(|s| s.to_string());

        Ok(Self {
            genotype_id,
            sequence,
            tree_depth,
            update_born,
            source: record,
        })
    }

    pub fn from_table(table: &DatTable, sequence_field: &str) -> Result<Vec<Self>> {
        table
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| Self::from_record(i, row.clone(), sequence_field))
            .collect()
    }
}
