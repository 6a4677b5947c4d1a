use super::simulator::{AnalyzeRequest, Simulator};
use crate::config::AppConfig;
use crate::data::connectors::{DatReader, GenotypeRecord, InstructionMap, SummaryTable};
use crate::engines::generation::{
    generate_landscape, AnalyzeScript, KnockoutSetBuilder, KnockoutVariant, ProgressCallback,
};
use crate::error::{KolandscapeError, Result};
use crate::types::Record;
use std::path::{Path, PathBuf};

/// Inputs and destination for one knockout pipeline invocation.
#[derive(Debug, Clone)]
pub struct PipelinePaths {
    pub inst_set: PathBuf,
    /// `.dat`/`.spop` file holding the genotype(s) to knock out.
    pub input: PathBuf,
    pub run_dir: PathBuf,
    /// CSV receiving the back-labelled knockout rows.
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub genotypes: usize,
    pub variants: usize,
    pub output: PathBuf,
}

/// Pairwise knockout column recording how many pairs were sampled; `-1` when
/// every pair was built.
pub const PAIR_SAMPLE_FIELD: &str = "pair_sample_size";

/// How knockout positions are written back onto detail rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnockoutLayout {
    /// `ko_pos`
    Single,
    /// `ko_pos_0`, `ko_pos_1`; single sites repeat their position.
    Pairwise,
}

impl KnockoutLayout {
    fn detail_prefix(&self) -> &'static str {
        match self {
            Self::Single => "knockouts",
            Self::Pairwise => "pairwise_knockouts",
        }
    }

    fn label(&self, variant: &KnockoutVariant, pair_sample_size: Option<usize>, row: &mut Record) {
        match self {
            Self::Single => row.insert("ko_pos", variant.site.ko_pos()),
            Self::Pairwise => {
                let (p0, p1) = variant.site.ko_pos_pair();
                row.insert("ko_pos_0", p0);
                row.insert("ko_pos_1", p1);
                row.insert(
                    PAIR_SAMPLE_FIELD,
                    pair_sample_size.map_or(-1, |n| n as i64),
                );
            }
        }
    }
}

struct GenotypeJob {
    genotype: GenotypeRecord,
    variants: Vec<KnockoutVariant>,
    detail_file: PathBuf,
}

/// Builds knockouts, runs them through the simulator and writes the
/// back-labelled knockout table.
pub struct KnockoutPipeline<'a, S: Simulator> {
    config: &'a AppConfig,
    simulator: &'a S,
}

impl<'a, S: Simulator> KnockoutPipeline<'a, S> {
    pub fn new(config: &'a AppConfig, simulator: &'a S) -> Self {
        Self { config, simulator }
    }

    /// Single-site knockouts for every genotype in the input file.
    pub fn run_single<C: ProgressCallback>(
        &self,
        paths: &PipelinePaths,
        progress: &mut C,
    ) -> Result<PipelineReport> {
        let (builder, genotypes) = self.prepare(paths)?;
        let total = genotypes.len();

        let mut jobs = Vec::with_capacity(total);
        for genotype in genotypes {
            let variants = builder.single(&genotype.sequence);
            progress.on_genotype_complete(genotype.genotype_id, total, variants.len());
            jobs.push(self.job(KnockoutLayout::Single, genotype, variants));
        }

        self.evaluate(
            paths,
            &self.config.knockouts.analyze_file,
            KnockoutLayout::Single,
            jobs,
        )
    }

    /// Single and paired knockouts of the focal (first) genotype.
    pub fn run_pairwise<C: ProgressCallback>(
        &self,
        paths: &PipelinePaths,
        progress: &mut C,
    ) -> Result<PipelineReport> {
        let (mut builder, genotypes) = self.prepare(paths)?;
        if genotypes.len() > 1 {
            log::warn!(
                "Found {} genotypes in {}; pairwise knockouts use only the first",
                genotypes.len(),
                paths.input.display()
            );
        }
        let Some(focal) = genotypes.into_iter().next() else {
            return Err(KolandscapeError::Format(format!(
                "no genomes found in {}",
                paths.input.display()
            )));
        };

        let variants = builder.pairwise(&focal.sequence);
        progress.on_genotype_complete(focal.genotype_id, 1, variants.len());
        let job = self.job(KnockoutLayout::Pairwise, focal, variants);

        self.evaluate(
            paths,
            &self.config.knockouts.pairwise_analyze_file,
            KnockoutLayout::Pairwise,
            vec![job],
        )
    }

    fn prepare(&self, paths: &PipelinePaths) -> Result<(KnockoutSetBuilder, Vec<GenotypeRecord>)> {
        let inst_map = InstructionMap::read(&paths.inst_set)?;
        let noop = inst_map.require(&self.config.knockouts.noop_instruction)?;

        let table = DatReader::read(&paths.input, false)?;
        let genotypes = GenotypeRecord::from_table(&table, &self.config.tasks.sequence_field)?;
        if genotypes.is_empty() {
            return Err(KolandscapeError::Format(format!(
                "no genomes found in {}",
                paths.input.display()
            )));
        }
        for genotype in &genotypes {
            check_alphabet(&inst_map, genotype)?;
        }

        if !paths.run_dir.is_dir() {
            return Err(KolandscapeError::missing_file(&paths.run_dir));
        }
        std::fs::create_dir_all(paths.run_dir.join(&self.config.knockouts.detail_dir))?;

        let builder = KnockoutSetBuilder::new(
            noop,
            self.config.knockouts.pair_sample_size,
            self.config.knockouts.seed,
        );
        Ok((builder, genotypes))
    }

    fn job(
        &self,
        layout: KnockoutLayout,
        genotype: GenotypeRecord,
        variants: Vec<KnockoutVariant>,
    ) -> GenotypeJob {
        let detail_file = Path::new(&self.config.knockouts.detail_dir).join(format!(
            "{}_id-{}.dat",
            layout.detail_prefix(),
            genotype.genotype_id
        ));
        GenotypeJob {
            genotype,
            variants,
            detail_file,
        }
    }

    fn evaluate(
        &self,
        paths: &PipelinePaths,
        analyze_file: &str,
        layout: KnockoutLayout,
        jobs: Vec<GenotypeJob>,
    ) -> Result<PipelineReport> {
        let detail_columns = self.config.knockouts.detail_columns();
        let mut script = AnalyzeScript::new();
        for job in &jobs {
            script.add_batch(
                job.variants.iter().map(|v| &v.genome),
                &job.detail_file.to_string_lossy(),
                &detail_columns,
            );
        }
        let script_path = paths.run_dir.join(analyze_file);
        script.write(&script_path)?;

        let request = AnalyzeRequest {
            run_dir: paths.run_dir.clone(),
            analyze_file: PathBuf::from(analyze_file),
            inst_set: Some(paths.inst_set.clone()),
            outputs: jobs.iter().map(|j| j.detail_file.clone()).collect(),
        };
        let detail_paths = self.simulator.analyze(&request)?;

        let mut table = SummaryTable::new(paths.output.display().to_string());
        let mut variants = 0;
        for (job, detail_path) in jobs.iter().zip(&detail_paths) {
            let detail = DatReader::read(detail_path, false)?;
            let rows = back_label(
                layout,
                self.config.knockouts.pair_sample_size,
                job,
                detail.rows,
                detail_path,
            )?;
            variants += rows.len();
            table.extend(rows)?;
        }
        table.write(&paths.output)?;

        if self.config.knockouts.cleanup {
            std::fs::remove_file(&script_path)?;
            for path in &detail_paths {
                std::fs::remove_file(path)?;
            }
        }

        Ok(PipelineReport {
            genotypes: jobs.len(),
            variants,
            output: paths.output.clone(),
        })
    }
}

/// Detail rows come back in load order: row `i` describes variant `i`.
fn back_label(
    layout: KnockoutLayout,
    pair_sample_size: Option<usize>,
    job: &GenotypeJob,
    rows: Vec<Record>,
    detail_path: &Path,
) -> Result<Vec<Record>> {
    if rows.len() != job.variants.len() {
        return Err(KolandscapeError::SchemaMismatch(format!(
            "{}: expected {} knockout rows for genotype {}, found {}",
            detail_path.display(),
            job.variants.len(),
            job.genotype.genotype_id,
            rows.len()
        )));
    }

    let mut labelled = Vec::with_capacity(rows.len());
    for (variant, mut row) in job.variants.iter().zip(rows) {
        if let Some(sequence) = row.get_opt("genome_sequence") {
            if sequence != variant.genome.to_string() {
                return Err(KolandscapeError::SchemaMismatch(format!(
                    "{}: row for knockout {:?} has sequence {}",
                    detail_path.display(),
                    variant.site,
                    sequence
                )));
            }
        }
        layout.label(variant, pair_sample_size, &mut row);
        row.insert("genotype_id", job.genotype.genotype_id);
        row.insert("tree_depth", &job.genotype.tree_depth);
        if let Some(update_born) = &job.genotype.update_born {
            row.insert("update_born", update_born);
        }
        labelled.push(row);
    }
    Ok(labelled)
}

fn check_alphabet(inst_map: &InstructionMap, genotype: &GenotypeRecord) -> Result<()> {
    match genotype
        .sequence
        .symbols()
        .iter()
        .find(|&&c| inst_map.name_of(c).is_none())
    {
        Some(c) => Err(KolandscapeError::Configuration(format!(
            "genotype {} uses code '{}' which is not in the instruction set",
            genotype.genotype_id, c
        ))),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutantReport {
    pub mutants: usize,
    pub script: PathBuf,
}

/// Writes the mutational-landscape analyze script for the focal genotype.
pub struct MutantPipeline<'a> {
    config: &'a AppConfig,
}

impl<'a> MutantPipeline<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    pub fn write_script(&self, inst_set: &Path, input: &Path) -> Result<MutantReport> {
        let landscape = &self.config.landscape;
        let inst_map = InstructionMap::read(inst_set)?;
        let table = DatReader::read(input, false)?;
        let genotypes = GenotypeRecord::from_table(&table, &self.config.tasks.sequence_field)?;
        if genotypes.len() > 1 {
            log::warn!("Found more than one genome, landscaping only the first genome in the file.");
        }
        let Some(focal) = genotypes.into_iter().next() else {
            return Err(KolandscapeError::Format(format!(
                "no genomes found in {}",
                input.display()
            )));
        };

        let mutants = generate_landscape(&focal.sequence, inst_map.alphabet(), landscape.steps)?;
        log::info!("Number of mutants generated: {}", mutants.len());

        std::fs::create_dir_all(&landscape.dump_dir)?;
        let script_path = Path::new(&landscape.dump_dir).join(&landscape.analyze_file);
        let mut script = AnalyzeScript::new();
        script.add_batch(&mutants, &landscape.analysis_output, &landscape.detail_columns());
        script.write(&script_path)?;

        Ok(MutantReport {
            mutants: mutants.len(),
            script: script_path,
        })
    }

    /// Run a written script through analyze mode; returns the detail file.
    pub fn analyze<S: Simulator>(
        &self,
        simulator: &S,
        report: &MutantReport,
        run_dir: &Path,
    ) -> Result<PathBuf> {
        let script = std::fs::canonicalize(&report.script)
            .map_err(|_| KolandscapeError::missing_file(&report.script))?;
        let request = AnalyzeRequest {
            run_dir: run_dir.to_path_buf(),
            analyze_file: script,
            inst_set: None,
            outputs: vec![PathBuf::from(&self.config.landscape.analysis_output)],
        };
        let mut outputs = simulator.analyze(&request)?;
        outputs
            .pop()
            .ok_or_else(|| KolandscapeError::missing_file(run_dir.join(&self.config.landscape.analysis_output)))
    }
}
