use crate::error::KolandscapeError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), KolandscapeError>;
}

/// Shorthand for section validation failures.
pub(crate) fn invalid(section: &str, message: impl std::fmt::Display) -> KolandscapeError {
    KolandscapeError::Configuration(format!("[{}] {}", section, message))
}
