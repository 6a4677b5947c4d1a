use crate::config::AggregationConfig;
use crate::data::connectors::{RunParams, SummaryTable};
use crate::engines::generation::ProgressCallback;
use crate::error::{KolandscapeError, Result};
use crate::types::Record;
use std::path::{Path, PathBuf};

/// One replicate's output directory.
#[derive(Debug, Clone)]
pub struct RunDir {
    pub name: String,
    pub path: PathBuf,
}

impl RunDir {
    /// `<run>/<data_subdir>/<file>`
    pub fn data_file(&self, config: &AggregationConfig, file: &str) -> PathBuf {
        self.path.join(&config.data_subdir).join(file)
    }

    /// Command-line parameters plus derived environment fields.
    pub fn params(&self, config: &AggregationConfig) -> Result<Record> {
        RunParams::read(self.path.join(&config.cmd_log))?.to_record()
    }

    /// Fail with `MissingFile` unless every file exists.
    pub fn require(&self, files: &[PathBuf]) -> Result<()> {
        match files.iter().find(|f| !f.exists()) {
            Some(missing) => Err(KolandscapeError::missing_file(missing)),
            None => Ok(()),
        }
    }
}

/// Run directories under `data_dir` whose name contains `marker`, sorted by name.
pub fn discover_runs(data_dir: &Path, marker: &str) -> Result<Vec<RunDir>> {
    if !data_dir.is_dir() {
        return Err(KolandscapeError::missing_file(data_dir));
    }
    let mut runs = Vec::new();
    for entry in std::fs::read_dir(data_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.contains(marker) && entry.path().is_dir() {
            runs.push(RunDir {
                name,
                path: entry.path(),
            });
        }
    }
    runs.sort_by(|a, b| a.name.cmp(&b.name));
    log::info!("Found {} run directories.", runs.len());
    Ok(runs)
}

/// Runs excluded from an aggregation because an input was missing.
#[derive(Debug, Clone, Default)]
pub struct IncompleteRuns {
    names: Vec<String>,
}

impl IncompleteRuns {
    pub fn push(&mut self, name: &str) {
        self.names.push(name.to_string());
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Sorted run names, one per line.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut names = self.names.clone();
        names.sort();
        std::fs::write(path, names.join("\n"))?;
        Ok(())
    }
}

/// Visit every run. A run whose visitor fails with a skippable error is
/// recorded as incomplete; any other error aborts the batch.
pub fn for_each_run<C, F>(
    runs: &[RunDir],
    progress: &mut C,
    incomplete: &mut IncompleteRuns,
    mut visit: F,
) -> Result<usize>
where
    C: ProgressCallback,
    F: FnMut(usize, &RunDir) -> Result<()>,
{
    let mut processed = 0;
    for (i, run) in runs.iter().enumerate() {
        progress.on_run_start(i, runs.len(), &run.path.display().to_string());
        match visit(i, run) {
            Ok(()) => processed += 1,
            Err(e) if e.is_skippable() => {
                progress.on_run_skipped(&run.name, &e.to_string());
                incomplete.push(&run.name);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(processed)
}

/// Files written by one aggregation.
#[derive(Debug, Clone, Default)]
pub struct AggregationReport {
    pub runs_found: usize,
    pub runs_processed: usize,
    pub incomplete: Vec<String>,
    pub outputs: Vec<PathBuf>,
}

impl AggregationReport {
    pub(crate) fn write_table(&mut self, table: &SummaryTable, path: PathBuf) -> Result<()> {
        if table.is_empty() {
            log::warn!("No rows to write to {}", path.display());
            return Ok(());
        }
        table.write(&path)?;
        self.outputs.push(path);
        Ok(())
    }

    pub(crate) fn write_incomplete(&mut self, incomplete: &IncompleteRuns, path: PathBuf) -> Result<()> {
        incomplete.write(&path)?;
        self.incomplete = incomplete.names().to_vec();
        self.outputs.push(path);
        Ok(())
    }
}

/// Values of `fields` taken from a run's parameters.
pub fn select_fields(params: &Record, fields: &[String]) -> Result<Record> {
    let mut record = Record::new();
    for field in fields {
        record.insert(field.as_str(), params.get(field)?);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::generation::{ChannelProgressCallback, ProgressMessage};

    #[test]
    fn test_discover_runs_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["RUN_C10_2", "RUN_C10_1", "notes", "RUN_C11_1"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("RUN_file.txt"), "").unwrap();

        let runs = discover_runs(dir.path(), "RUN_").unwrap();
        let names: Vec<_> = runs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["RUN_C10_1", "RUN_C10_2", "RUN_C11_1"]);
    }

    #[test]
    fn test_skippable_errors_are_recorded() {
        let runs: Vec<RunDir> = ["RUN_b", "RUN_a"]
            .iter()
            .map(|n| RunDir {
                name: n.to_string(),
                path: PathBuf::from(n),
            })
            .collect();
        let (tx, rx) = std::sync::mpsc::channel();
        let mut progress = ChannelProgressCallback::new(tx);
        let mut incomplete = IncompleteRuns::default();

        let processed = for_each_run(&runs, &mut progress, &mut incomplete, |i, run| {
            if i == 0 {
                Err(KolandscapeError::missing_file(run.path.join("cmd.log")))
            } else {
                Ok(())
            }
        })
        .unwrap();

        assert_eq!(processed, 1);
        assert_eq!(incomplete.names(), &["RUN_b".to_string()]);
        let messages: Vec<ProgressMessage> = rx.try_iter().collect();
        assert!(matches!(messages[1], ProgressMessage::RunSkipped { .. }));

        let dir = tempfile::tempdir().unwrap();
        let mut more = incomplete.clone();
        more.push("RUN_a");
        more.write(dir.path().join("incomplete.log")).unwrap();
        let written = std::fs::read_to_string(dir.path().join("incomplete.log")).unwrap();
        assert_eq!(written, "RUN_a\nRUN_b");
    }

    #[test]
    fn test_fatal_errors_abort() {
        let runs = vec![RunDir {
            name: "RUN_0".to_string(),
            path: PathBuf::from("RUN_0"),
        }];
        let mut progress = crate::engines::generation::ConsoleProgressCallback;
        let mut incomplete = IncompleteRuns::default();
        let result = for_each_run(&runs, &mut progress, &mut incomplete, |_, _| {
            Err(KolandscapeError::SchemaMismatch("header".into()))
        });
        assert!(result.is_err());
        assert!(incomplete.is_empty());
    }
}
