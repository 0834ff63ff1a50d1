use super::config::ConfigError;
use crate::core::registry::RegistryError;
use crate::core::scattering::ScatteringError;
use thiserror::Error;

/// Errors surfaced by an evaluation.
#[derive(Debug, Error)]
pub enum CalculatorError {
    #[error("Invalid calculator configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Strategy lookup failed: {source}")]
    Registry {
        #[from]
        source: RegistryError,
    },

    #[error("Scattering factor lookup failed: {source}")]
    Scattering {
        #[from]
        source: ScatteringError,
    },
}
