use super::{
    aggregation::AggregationConfig,
    knockouts::KnockoutConfig,
    landscape::LandscapeConfig,
    simulator::SimulatorConfig,
    tasks::TaskConfig,
    traits::ConfigSection,
};
use crate::error::KolandscapeError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix for environment overrides, e.g. `KOLANDSCAPE__KNOCKOUTS__SEED=7`.
pub const ENV_PREFIX: &str = "KOLANDSCAPE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tasks: TaskConfig,
    pub knockouts: KnockoutConfig,
    pub landscape: LandscapeConfig,
    pub simulator: SimulatorConfig,
    pub aggregation: AggregationConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), KolandscapeError> {
        self.tasks.validate()?;
        self.knockouts.validate()?;
        self.landscape.validate()?;
        self.simulator.validate()?;
        self.aggregation.validate()?;
        Ok(())
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Load a TOML file, layered with `KOLANDSCAPE__*` environment overrides.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), KolandscapeError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(KolandscapeError::missing_file(path));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: AppConfig = settings.try_deserialize()?;

        config.validate()?;
        log::debug!("Loaded configuration from {}", path.display());

        *self.config.write().unwrap_or_else(|e| e.into_inner()) = config;
        Ok(())
    }

    pub fn load_from_str(&self, contents: &str) -> Result<(), KolandscapeError> {
        let config: AppConfig = toml::from_str(contents)
            .map_err(|e| KolandscapeError::Configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        *self.config.write().unwrap_or_else(|e| e.into_inner()) = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), KolandscapeError> {
        let config = self.get();
        let toml_str = toml::to_string_pretty(&config)?;

        std::fs::write(path, toml_str)
            .map_err(|e| KolandscapeError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn update<F>(&self, f: F) -> Result<(), KolandscapeError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write().unwrap_or_else(|e| e.into_inner());
        let mut candidate = config.clone();
        f(&mut candidate);
        candidate.validate()?;
        *config = candidate;
        Ok(())
    }
}
