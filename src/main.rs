use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kolandscape::config::{AppConfig, ConfigManager};
use kolandscape::engines::aggregation::{
    aggregate_knockouts, aggregate_landscape, aggregate_pairwise, AggregationReport,
};
use kolandscape::engines::evaluation::{
    AvidaSimulator, KnockoutPipeline, MutantPipeline, PipelinePaths, PipelineReport,
};
use kolandscape::engines::generation::ConsoleProgressCallback;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kolandscape")]
#[command(author, version, about = "Knockout and mutational-landscape analysis of Avida genomes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the analyze script for every 1- or 2-step mutant of a genome
    Mutants {
        /// Instruction set definition
        #[arg(long)]
        inst_set: PathBuf,

        /// Genotype file; only the first genome is used
        #[arg(long)]
        input: PathBuf,

        /// Also run the script in this Avida run directory
        #[arg(long)]
        run_dir: Option<PathBuf>,
    },

    /// Single-site knockouts of every genotype in a lineage file
    Knockouts {
        #[command(flatten)]
        paths: PipelineArgs,
    },

    /// Single and paired knockouts of the first genotype in a file
    PairwiseKnockouts {
        #[command(flatten)]
        paths: PipelineArgs,

        /// Knock out this many randomly sampled site pairs instead of all of them
        #[arg(long)]
        sample: Option<usize>,

        /// Seed for pair sampling
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Summarize single-knockout architecture across runs
    AggregateKnockouts {
        #[command(flatten)]
        dirs: AggregateArgs,
    },

    /// Summarize pairwise site classification across runs
    AggregatePairwise {
        #[command(flatten)]
        dirs: AggregateArgs,

        /// Also write the per-site classification as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize mutational landscapes across runs
    AggregateLandscape {
        #[command(flatten)]
        dirs: AggregateArgs,
    },

    /// Write the effective configuration as TOML
    InitConfig {
        /// Output file path
        #[arg(default_value = "kolandscape.toml")]
        output: PathBuf,
    },
}

#[derive(clap::Args)]
struct PipelineArgs {
    /// Instruction set definition
    #[arg(long)]
    inst_set: PathBuf,

    /// Genotype file (.dat or .spop)
    #[arg(long)]
    input: PathBuf,

    /// Avida run directory
    #[arg(long, default_value = ".")]
    run_dir: PathBuf,

    /// Knockout table to write
    #[arg(short, long)]
    output: PathBuf,
}

impl From<PipelineArgs> for PipelinePaths {
    fn from(args: PipelineArgs) -> Self {
        PipelinePaths {
            inst_set: args.inst_set,
            input: args.input,
            run_dir: args.run_dir,
            output: args.output,
        }
    }
}

#[derive(clap::Args)]
struct AggregateArgs {
    /// Directory holding the run directories
    #[arg(long)]
    data_dir: PathBuf,

    /// Directory receiving the aggregated tables
    #[arg(long, default_value = ".")]
    dump_dir: PathBuf,

    /// Suffix appended to output file names
    #[arg(long)]
    output_id: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let manager = ConfigManager::new();
    if let Some(path) = &cli.config {
        manager
            .load_from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?;
    }

    match cli.command {
        Commands::Mutants {
            inst_set,
            input,
            run_dir,
        } => {
            let config = manager.get();
            let pipeline = MutantPipeline::new(&config);
            let report = pipeline.write_script(&inst_set, &input)?;
            log::info!(
                "Wrote {} mutants to {}",
                report.mutants,
                report.script.display()
            );
            if let Some(run_dir) = run_dir {
                let simulator = AvidaSimulator::new(config.simulator.clone());
                let detail = pipeline.analyze(&simulator, &report, &run_dir)?;
                log::info!("Mutant details written to {}", detail.display());
            }
        }
        Commands::Knockouts { paths } => {
            let config = manager.get();
            let simulator = AvidaSimulator::new(config.simulator.clone());
            let report = KnockoutPipeline::new(&config, &simulator)
                .run_single(&paths.into(), &mut ConsoleProgressCallback)?;
            log_pipeline(&report);
        }
        Commands::PairwiseKnockouts {
            paths,
            sample,
            seed,
        } => {
            if sample.is_some() || seed.is_some() {
                manager.update(|c| {
                    if sample.is_some() {
                        c.knockouts.pair_sample_size = sample;
                    }
                    if seed.is_some() {
                        c.knockouts.seed = seed;
                    }
                })?;
            }
            let config = manager.get();
            let simulator = AvidaSimulator::new(config.simulator.clone());
            let report = KnockoutPipeline::new(&config, &simulator)
                .run_pairwise(&paths.into(), &mut ConsoleProgressCallback)?;
            log_pipeline(&report);
        }
        Commands::AggregateKnockouts { dirs } => {
            let config = aggregation_config(&manager, &dirs)?;
            let report = aggregate_knockouts(
                &config,
                &dirs.data_dir,
                &dirs.dump_dir,
                &mut ConsoleProgressCallback,
            )?;
            log_aggregation(&report);
        }
        Commands::AggregatePairwise { dirs, json } => {
            let config = aggregation_config(&manager, &dirs)?;
            let report = aggregate_pairwise(
                &config,
                &dirs.data_dir,
                &dirs.dump_dir,
                json,
                &mut ConsoleProgressCallback,
            )?;
            log_aggregation(&report);
        }
        Commands::AggregateLandscape { dirs } => {
            let config = aggregation_config(&manager, &dirs)?;
            let report = aggregate_landscape(
                &config,
                &dirs.data_dir,
                &dirs.dump_dir,
                &mut ConsoleProgressCallback,
            )?;
            log_aggregation(&report);
        }
        Commands::InitConfig { output } => {
            manager.save_to_file(&output)?;
            println!("Wrote configuration to {}", output.display());
        }
    }

    Ok(())
}

fn aggregation_config(manager: &ConfigManager, dirs: &AggregateArgs) -> Result<AppConfig> {
    if let Some(id) = &dirs.output_id {
        manager.update(|c| c.aggregation.output_id = id.clone())?;
    }
    Ok(manager.get())
}

fn log_pipeline(report: &PipelineReport) {
    log::info!(
        "Evaluated {} knockouts of {} genotype(s); wrote {}",
        report.variants,
        report.genotypes,
        report.output.display()
    );
}

fn log_aggregation(report: &AggregationReport) {
    log::info!(
        "Processed {}/{} runs ({} incomplete)",
        report.runs_processed,
        report.runs_found,
        report.incomplete.len()
    );
    for output in &report.outputs {
        log::info!("Wrote {}", output.display());
    }
}
