pub mod phenotype;
pub mod pipeline;
pub mod simulator;

pub use phenotype::extract_phenotype;
pub use pipeline::{KnockoutLayout, KnockoutPipeline, MutantPipeline, MutantReport, PipelinePaths, PipelineReport, PAIR_SAMPLE_FIELD};
pub use simulator::{collect_outputs, AnalyzeRequest, AvidaSimulator, Simulator};
