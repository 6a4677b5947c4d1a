//! Knockout and mutational-landscape analysis of digital-evolution genomes.
//!
//! Genomes are knocked out site by site (or site pair by site pair) and
//! mutated, the variants are evaluated by an external Avida simulator in
//! analyze mode, and the resulting phenotypes are classified into
//! coding, redundant and recovery sites and summarized across runs.

pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod types;

pub use error::{KolandscapeError, Result};
