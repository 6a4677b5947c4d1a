use crate::engines::generation::genome::Genome;
use crate::error::Result;
use std::path::Path;

/// Batch script for the simulator's analyze mode: one block per batch of
/// genomes, each ending in a DETAIL command that writes one row per genome,
/// in load order.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeScript {
    blocks: Vec<String>,
}

impl AnalyzeScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_batch<'a, I>(&mut self, genomes: I, output: &str, detail_columns: &[String])
    where
        I: IntoIterator<Item = &'a Genome>,
    {
        let loads = genomes
            .into_iter()
            .map(|g| format!("LOAD_SEQUENCE {}", g))
            .collect::<Vec<_>>()
            .join("\n");

        self.blocks.push(format!(
            "PURGE_BATCH\n\n{}\n\nRECALC\n\nDETAIL {} {}\n",
            loads,
            output,
            detail_columns.join(" ")
        ));
    }

    pub fn num_batches(&self) -> usize {
        self.blocks.len()
    }

    pub fn render(&self) -> String {
        self.blocks.join("\n")
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.render())?;
        Ok(())
    }
}
