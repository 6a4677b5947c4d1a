pub mod traits;
pub mod tasks;
pub mod knockouts;
pub mod landscape;
pub mod simulator;
pub mod aggregation;
pub mod manager;

pub use manager::{AppConfig, ConfigManager};
pub use tasks::TaskConfig;
pub use knockouts::KnockoutConfig;
pub use landscape::LandscapeConfig;
pub use simulator::SimulatorConfig;
pub use aggregation::AggregationConfig;
