use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KolandscapeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing file: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Incomplete knockout table: {0}")]
    Completeness(String),

    #[error("External process error: {0}")]
    ExternalProcess(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Config source error: {0}")]
    ConfigSource(#[from] config::ConfigError),
}

impl KolandscapeError {
    pub fn missing_file<P: Into<PathBuf>>(path: P) -> Self {
        Self::MissingFile { path: path.into() }
    }

    /// Runs that fail with a skippable error are recorded as incomplete
    /// instead of aborting the batch.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::MissingFile { .. })
    }
}

pub type Result<T> = std::result::Result<T, KolandscapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_missing_files_are_skippable() {
        assert!(KolandscapeError::missing_file("data/knockouts.csv").is_skippable());
        assert!(!KolandscapeError::SchemaMismatch("header".into()).is_skippable());
        assert!(!KolandscapeError::Completeness("pair (0, 1)".into()).is_skippable());
    }

    #[test]
    fn test_missing_file_message_names_path() {
        let err = KolandscapeError::missing_file("RUN_1/cmd.log");
        assert_eq!(err.to_string(), "Missing file: RUN_1/cmd.log");
    }
}
