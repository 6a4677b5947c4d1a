pub mod architecture;
pub mod classifier;
pub mod distance;
pub mod genotypes;
pub mod landscape;

pub use architecture::{
    analyze_genotype, analyze_sites, lineage_architecture, GenotypeArchitecture, SiteArchitecture,
    SiteCategory,
};
pub use classifier::{
    classify, ClassificationCounts, ClassificationReport, KnockoutTable, PairCoverage, PairEffect,
    SiteClassification, SiteClassifier, SiteRecord,
};
pub use distance::{hamming_dist, simple_match_coeff};
pub use genotypes::{extant_index, group_by_genotype, GenotypeRows};
pub use landscape::{entropy, LandscapeAnalysis, PhenotypeBucket};
