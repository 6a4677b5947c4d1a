use super::runs::{
    discover_runs, for_each_run, select_fields, AggregationReport, IncompleteRuns, RunDir,
};
use super::treatment::{treatment_id, TreatmentAggregator};
use crate::config::AppConfig;
use crate::data::connectors::{DataValidator, DatReader, SummaryTable};
use crate::engines::analysis::LandscapeAnalysis;
use crate::engines::generation::ProgressCallback;
use crate::error::Result;
use crate::types::Record;
use std::path::Path;

/// Everything one run contributes to the landscape aggregation.
#[derive(Debug, Clone)]
pub struct LandscapeRunSummary {
    pub params: Record,
    pub analysis: LandscapeAnalysis,
}

pub fn summarize_landscape_run(config: &AppConfig, run: &RunDir) -> Result<LandscapeRunSummary> {
    let agg = &config.aggregation;
    let mutant_path = run.data_file(agg, &agg.mutant_file);
    run.require(&[mutant_path.clone(), run.path.join(&agg.cmd_log)])?;

    let params = run.params(agg)?;
    let detail = DatReader::read(&mutant_path, false)?;
    let context = mutant_path.display().to_string();
    DataValidator::validate_minimum_rows(&detail.rows, 1, &context)?;
    DataValidator::validate_task_columns(&detail.rows, &config.tasks.tasks, &context)?;
    let analysis = LandscapeAnalysis::from_rows(&detail.rows, &config.tasks)?;
    log::debug!(
        "{}: {} mutants, {} viable",
        run.name,
        analysis.total_mutants,
        analysis.num_viable
    );
    Ok(LandscapeRunSummary { params, analysis })
}

struct LandscapeTables {
    summary: SummaryTable,
    cooccurrence: SummaryTable,
    distances: SummaryTable,
    phenotypes: SummaryTable,
    treatments: TreatmentAggregator,
}

impl LandscapeTables {
    fn new() -> Self {
        Self {
            summary: SummaryTable::new("landscape_run_summary"),
            cooccurrence: SummaryTable::new("landscape_task_cooccurrence"),
            distances: SummaryTable::new("mutant_phenotype_distances"),
            phenotypes: SummaryTable::new("mutant_phen_distribution"),
            treatments: TreatmentAggregator::new(),
        }
    }

    fn add(&mut self, config: &AppConfig, run_index: usize, run: LandscapeRunSummary) -> Result<()> {
        let agg = &config.aggregation;
        let LandscapeRunSummary { params, analysis } = run;

        let mut summary = params.clone();
        summary.extend(&analysis.summary_record());
        self.summary.push(summary)?;

        let replicate = select_fields(&params, &agg.replicate_fields)?;
        self.cooccurrence.extend(analysis.cooccurrence_rows(&replicate))?;
        self.phenotypes.extend(analysis.phenotype_rows(&replicate))?;

        let treatment_fields = select_fields(&params, &agg.treatment_fields)?;
        let treatment = treatment_id(&params, &agg.treatment_fields)?;
        self.distances
            .extend(analysis.distance_rows(&treatment_fields, run_index + 1))?;

        let n = config.tasks.num_tasks();
        for i in 0..n {
            for j in 0..n {
                self.treatments
                    .add(&treatment, &treatment_fields, (i, j), analysis.pair_stats(i, j));
            }
        }
        Ok(())
    }
}

/// Aggregate the mutant detail files of every run under `data_dir`.
pub fn aggregate_landscape<C: ProgressCallback>(
    config: &AppConfig,
    data_dir: &Path,
    dump_dir: &Path,
    progress: &mut C,
) -> Result<AggregationReport> {
    let agg = &config.aggregation;
    let runs = discover_runs(data_dir, &agg.run_marker)?;
    std::fs::create_dir_all(dump_dir)?;

    let mut tables = LandscapeTables::new();
    let mut incomplete = IncompleteRuns::default();

    let processed = for_each_run(&runs, progress, &mut incomplete, |i, run| {
        let result = summarize_landscape_run(config, run)?;
        tables.add(config, i, result)
    })?;

    let mut treatment_summary = SummaryTable::new("landscape_task_cooccurrence_treatment_summary");
    treatment_summary.extend(tables.treatments.summary_rows(&config.tasks.tasks)?)?;

    let mut report = AggregationReport {
        runs_found: runs.len(),
        runs_processed: processed,
        ..AggregationReport::default()
    };
    let outputs = [
        (&tables.summary, "landscape_run_summary"),
        (&tables.cooccurrence, "landscape_task_cooccurrence"),
        (&treatment_summary, "landscape_task_cooccurrence_treatment_summary"),
        (&tables.distances, "mutant_phenotype_distances"),
        (&tables.phenotypes, "mutant_phen_distribution"),
    ];
    for (table, base) in outputs {
        report.write_table(table, dump_dir.join(agg.output_name(base, "csv")))?;
    }
    report.write_incomplete(
        &incomplete,
        dump_dir.join(agg.output_name("incomplete_runs_landscape", "log")),
    )?;
    Ok(report)
}
