pub mod aggregation;
pub mod analysis;
pub mod evaluation;
pub mod generation;
