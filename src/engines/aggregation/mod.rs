pub mod knockouts;
pub mod landscape;
pub mod pairwise;
pub mod runs;
pub mod treatment;

pub use knockouts::{aggregate_knockouts, summarize_knockout_run, KnockoutRunSummary};
pub use landscape::{aggregate_landscape, summarize_landscape_run, LandscapeRunSummary};
pub use pairwise::{aggregate_pairwise, summarize_pairwise_run, PairwiseRunReport, PairwiseRunSummary};
pub use runs::{discover_runs, select_fields, AggregationReport, IncompleteRuns, RunDir};
pub use treatment::{treatment_id, TreatmentAggregator};
