use super::runs::{
    discover_runs, for_each_run, select_fields, AggregationReport, IncompleteRuns, RunDir,
};
use crate::config::AppConfig;
use crate::data::connectors::{CsvConnector, DataValidator, SummaryTable};
use crate::engines::analysis::{
    extant_index, group_by_genotype, lineage_architecture, GenotypeArchitecture,
};
use crate::engines::generation::ProgressCallback;
use crate::error::{KolandscapeError, Result};
use crate::types::Record;
use std::path::Path;

/// What one run contributes to the single-knockout aggregation.
#[derive(Debug, Clone)]
pub struct KnockoutRunSummary {
    pub summary: Record,
    pub long_form: Vec<Record>,
}

/// Single-site architecture of every genotype in one run's lineage.
pub fn summarize_knockout_run(config: &AppConfig, run: &RunDir) -> Result<KnockoutRunSummary> {
    let agg = &config.aggregation;
    let knockout_path = run.data_file(agg, &agg.knockout_file);
    run.require(&[knockout_path.clone(), run.path.join(&agg.cmd_log)])?;

    let params = run.params(agg)?;
    let rows = CsvConnector::load_records(&knockout_path)?;
    let context = knockout_path.display().to_string();
    DataValidator::validate_required_fields(
        &rows,
        &[
            "genotype_id",
            "ko_pos",
            "tree_depth",
            config.tasks.sequence_field.as_str(),
            config.tasks.viability_field.as_str(),
        ],
        &context,
    )?;
    DataValidator::validate_task_columns(&rows, &config.tasks.tasks, &context)?;
    let groups = group_by_genotype(rows)?;
    let lineage = lineage_architecture(&groups, &config.tasks)?;
    let extant = extant_genotype(&lineage).ok_or_else(|| {
        KolandscapeError::Format(format!("{} holds no genotypes", knockout_path.display()))
    })?;
    log::debug!(
        "{}: {} genotypes, extant genotype {}",
        run.name,
        lineage.len(),
        extant.genotype_id
    );

    let mut summary = params.clone();
    summary.extend(&extant.extant_summary());

    let long_form = if agg.lineage_architecture {
        let run_fields = select_fields(&params, &agg.architecture_fields)?;
        lineage
            .iter()
            .flat_map(|genotype| genotype.long_form(&run_fields, &config.tasks))
            .collect()
    } else {
        Vec::new()
    };

    Ok(KnockoutRunSummary { summary, long_form })
}

fn extant_genotype(lineage: &[GenotypeArchitecture]) -> Option<&GenotypeArchitecture> {
    let born: Vec<Option<i64>> = lineage.iter().map(|g| g.update_born).collect();
    extant_index(&born).map(|i| &lineage[i])
}

/// Aggregate the single-knockout tables of every run under `data_dir`.
pub fn aggregate_knockouts<C: ProgressCallback>(
    config: &AppConfig,
    data_dir: &Path,
    dump_dir: &Path,
    progress: &mut C,
) -> Result<AggregationReport> {
    let agg = &config.aggregation;
    let runs = discover_runs(data_dir, &agg.run_marker)?;
    std::fs::create_dir_all(dump_dir)?;

    let mut summaries = SummaryTable::new("knockouts_run_summary");
    let mut long_form = SummaryTable::new("lineage_arch_long");
    let mut incomplete = IncompleteRuns::default();

    let processed = for_each_run(&runs, progress, &mut incomplete, |_, run| {
        let result = summarize_knockout_run(config, run)?;
        summaries.push(result.summary)?;
        long_form.extend(result.long_form)
    })?;

    let mut report = AggregationReport {
        runs_found: runs.len(),
        runs_processed: processed,
        ..AggregationReport::default()
    };
    report.write_table(&summaries, dump_dir.join(agg.output_name("knockouts_run_summary", "csv")))?;
    if agg.lineage_architecture {
        report.write_table(&long_form, dump_dir.join(agg.output_name("lineage_arch_long", "csv")))?;
    }
    report.write_incomplete(
        &incomplete,
        dump_dir.join(agg.output_name("incomplete_runs_knockouts", "log")),
    )?;
    Ok(report)
}
