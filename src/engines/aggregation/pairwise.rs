use super::runs::{discover_runs, for_each_run, AggregationReport, IncompleteRuns, RunDir};
use crate::config::AppConfig;
use crate::data::connectors::{CsvConnector, DataValidator, SummaryTable};
use crate::engines::analysis::{
    classify, extant_index, group_by_genotype, ClassificationReport, GenotypeRows, KnockoutTable,
    PairCoverage,
};
use crate::engines::evaluation::{KnockoutLayout, PAIR_SAMPLE_FIELD};
use crate::engines::generation::ProgressCallback;
use crate::error::{KolandscapeError, Result};
use crate::types::Record;
use serde::Serialize;
use std::path::Path;

/// Per-site classification of one run, as written to the JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct PairwiseRunReport {
    pub run: String,
    pub genotype_id: i64,
    pub generated_at: String,
    pub classification: ClassificationReport,
}

#[derive(Debug, Clone)]
pub struct PairwiseRunSummary {
    pub summary: Record,
    pub report: PairwiseRunReport,
}

/// Classify the extant genotype of one run's pairwise knockout table.
pub fn summarize_pairwise_run(config: &AppConfig, run: &RunDir) -> Result<PairwiseRunSummary> {
    let agg = &config.aggregation;
    let layout = KnockoutLayout::Pairwise;
    let knockout_path = run.data_file(agg, &agg.pairwise_knockout_file);
    run.require(&[knockout_path.clone(), run.path.join(&agg.cmd_log)])?;

    let params = run.params(agg)?;
    let rows = CsvConnector::load_records(&knockout_path)?;
    let context = knockout_path.display().to_string();
    DataValidator::validate_required_fields(
        &rows,
        &[
            "genotype_id",
            "ko_pos_0",
            "ko_pos_1",
            config.tasks.sequence_field.as_str(),
            config.tasks.viability_field.as_str(),
        ],
        &context,
    )?;
    DataValidator::validate_task_columns(&rows, &config.tasks.tasks, &context)?;
    let groups = group_by_genotype(rows)?;
    let focal = extant_group(&groups, layout)?.ok_or_else(|| {
        KolandscapeError::Format(format!("{} holds no genotypes", knockout_path.display()))
    })?;

    let genome_len = focal.genome_len(layout, &config.tasks.sequence_field)?;
    let table = KnockoutTable::from_rows(&focal.rows, layout, &config.tasks, genome_len)?;
    let coverage = recorded_coverage(focal, layout, config)?;
    let classification = classify(&table, coverage)?;
    log::debug!(
        "{}: genotype {} classified over {} pairs",
        run.name,
        focal.genotype_id,
        classification.pairs_classified()
    );

    let mut performed: Vec<&str> = classification
        .control()
        .phenotype
        .tasks()
        .iter()
        .map(|&t| config.tasks.task_name(t))
        .collect();
    performed.sort_unstable();

    let counts = classification.counts();
    let mut summary = params;
    summary.insert("num_tasks_performed", counts.num_tasks_performed);
    summary.insert("tasks_performed", performed.join(";"));
    summary.extend(&counts.to_record(&config.tasks));

    Ok(PairwiseRunSummary {
        summary,
        report: PairwiseRunReport {
            run: run.name.clone(),
            genotype_id: focal.genotype_id,
            generated_at: chrono::Utc::now().to_rfc3339(),
            classification: classification.report(&config.tasks),
        },
    })
}

/// Tables carrying a sample size were built from sampled pairs. Older tables
/// without the column fall back to the configured sampling.
fn recorded_coverage(
    focal: &GenotypeRows,
    layout: KnockoutLayout,
    config: &AppConfig,
) -> Result<PairCoverage> {
    let control = focal.control(layout)?;
    let sampled = if control.contains(PAIR_SAMPLE_FIELD) {
        control.get_i64(PAIR_SAMPLE_FIELD)? >= 0
    } else {
        config.knockouts.pair_sample_size.is_some()
    };
    Ok(if sampled {
        PairCoverage::Sampled
    } else {
        PairCoverage::Complete
    })
}

fn extant_group(groups: &[GenotypeRows], layout: KnockoutLayout) -> Result<Option<&GenotypeRows>> {
    let born = groups
        .iter()
        .map(|g| g.update_born(layout))
        .collect::<Result<Vec<_>>>()?;
    Ok(extant_index(&born).map(|i| &groups[i]))
}

/// Aggregate the pairwise knockout tables of every run under `data_dir`.
/// With `json_report`, the per-site classification of every run is also
/// written as JSON.
pub fn aggregate_pairwise<C: ProgressCallback>(
    config: &AppConfig,
    data_dir: &Path,
    dump_dir: &Path,
    json_report: bool,
    progress: &mut C,
) -> Result<AggregationReport> {
    let agg = &config.aggregation;
    let runs = discover_runs(data_dir, &agg.run_marker)?;
    std::fs::create_dir_all(dump_dir)?;

    let mut summaries = SummaryTable::new("pairwise_knockouts_run_summary");
    let mut reports = Vec::new();
    let mut incomplete = IncompleteRuns::default();

    let processed = for_each_run(&runs, progress, &mut incomplete, |_, run| {
        let result = summarize_pairwise_run(config, run)?;
        summaries.push(result.summary)?;
        reports.push(result.report);
        Ok(())
    })?;

    let mut report = AggregationReport {
        runs_found: runs.len(),
        runs_processed: processed,
        ..AggregationReport::default()
    };
    report.write_table(
        &summaries,
        dump_dir.join(agg.output_name("pairwise_knockouts_run_summary", "csv")),
    )?;
    if json_report && !reports.is_empty() {
        let path = dump_dir.join(agg.output_name("pairwise_knockouts_sites", "json"));
        std::fs::write(&path, serde_json::to_string_pretty(&reports)?)?;
        report.outputs.push(path);
    }
    report.write_incomplete(
        &incomplete,
        dump_dir.join(agg.output_name("incomplete_runs_pairwise", "log")),
    )?;
    Ok(report)
}
