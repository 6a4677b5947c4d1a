pub mod analyze_script;
pub mod genome;
pub mod knockouts;
pub mod mutants;
pub mod progress;

pub use analyze_script::AnalyzeScript;
pub use genome::Genome;
pub use knockouts::{
    build_paired_knockouts, build_single_knockouts, sample_paired_knockouts, KnockoutSetBuilder,
    KnockoutVariant,
};
pub use mutants::{generate_landscape, generate_point_mutants};
pub use progress::{ChannelProgressCallback, ConsoleProgressCallback, ProgressCallback, ProgressMessage};
