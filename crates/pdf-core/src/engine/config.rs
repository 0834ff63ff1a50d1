use crate::core::attributes::AttributeError;
use crate::core::bonds::SummationConvention;
use crate::core::registry::RegistryError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading, validating or applying a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid {name} range [{lo}, {hi}]: {reason}")]
    InvalidRange {
        name: &'static str,
        lo: f64,
        hi: f64,
        reason: &'static str,
    },

    #[error("Invalid value {value} for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("Strategy lookup failed: {source}")]
    Registry {
        #[from]
        source: RegistryError,
    },

    #[error("Parameter update failed: {source}")]
    Attribute {
        #[from]
        source: AttributeError,
    },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

pub const DEFAULT_RMIN: f64 = 0.0;
pub const DEFAULT_RMAX: f64 = 10.0;
pub const DEFAULT_RSTEP: f64 = 0.01;
pub const DEFAULT_QMIN: f64 = 0.0;
pub const DEFAULT_QMAX: f64 = f64::INFINITY;
pub const DEFAULT_MAX_EXTENSION: f64 = 10.0;

/// Full description of a PDF calculation, loadable from TOML.
///
/// Omitted keys take their defaults; unknown keys are rejected. `qmax = inf`
/// is valid TOML and disables the band-pass filter's upper cut.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PdfConfig {
    pub rmin: f64,
    pub rmax: f64,
    pub rstep: f64,
    pub qmin: f64,
    pub qmax: f64,
    pub max_extension: f64,
    pub peak_width_model: String,
    pub peak_profile: String,
    pub baseline: String,
    pub envelopes: Vec<String>,
    pub scattering_table: String,
    pub summation: SummationConvention,
    /// Named parameters routed to whichever component owns them.
    pub parameters: BTreeMap<String, f64>,
    /// Scattering power overrides keyed by species label.
    pub custom_scattering: BTreeMap<String, f64>,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            rmin: DEFAULT_RMIN,
            rmax: DEFAULT_RMAX,
            rstep: DEFAULT_RSTEP,
            qmin: DEFAULT_QMIN,
            qmax: DEFAULT_QMAX,
            max_extension: DEFAULT_MAX_EXTENSION,
            peak_width_model: "jeong".to_string(),
            peak_profile: "gaussian".to_string(),
            baseline: "linear".to_string(),
            envelopes: vec!["qresolution".to_string(), "scale".to_string()],
            scattering_table: "xray".to_string(),
            summation: SummationConvention::default(),
            parameters: BTreeMap::new(),
            custom_scattering: BTreeMap::new(),
        }
    }
}

impl PdfConfig {
    /// Reads and validates a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::parse(&content, &path.to_string_lossy())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, "<string>")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: PdfConfig = toml::from_str(content).map_err(|e| ConfigError::Toml {
            path: origin.to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks range invariants without resolving strategy tags.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_r_range(self.rmin, self.rmax)?;
        validate_rstep(self.rstep)?;
        validate_q_range(self.qmin, self.qmax)?;
        validate_max_extension(self.max_extension)?;
        Ok(())
    }
}

pub(crate) fn validate_r_range(rmin: f64, rmax: f64) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidRange {
        name: "r",
        lo: rmin,
        hi: rmax,
        reason,
    };
    if !rmin.is_finite() || !rmax.is_finite() {
        return Err(invalid("bounds must be finite"));
    }
    if rmin < 0.0 {
        return Err(invalid("rmin must not be negative"));
    }
    if rmax <= rmin {
        return Err(invalid("rmax must exceed rmin"));
    }
    Ok(())
}

pub(crate) fn validate_q_range(qmin: f64, qmax: f64) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidRange {
        name: "Q",
        lo: qmin,
        hi: qmax,
        reason,
    };
    if !qmin.is_finite() || qmax.is_nan() {
        return Err(invalid("qmin must be finite and qmax a number"));
    }
    if qmin < 0.0 {
        return Err(invalid("qmin must not be negative"));
    }
    if qmax <= qmin {
        return Err(invalid("qmax must exceed qmin"));
    }
    Ok(())
}

pub(crate) fn validate_rstep(rstep: f64) -> Result<(), ConfigError> {
    if rstep.is_finite() && rstep > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            name: "rstep",
            value: rstep,
            reason: "must be positive and finite",
        })
    }
}

pub(crate) fn validate_max_extension(max_extension: f64) -> Result<(), ConfigError> {
    if max_extension.is_finite() && max_extension >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            name: "max_extension",
            value: max_extension,
            reason: "must be finite and not negative",
        })
    }
}

/// Builder for [`PdfConfig`]; `rmax` is the only required value.
#[derive(Default)]
pub struct PdfConfigBuilder {
    rmin: Option<f64>,
    rmax: Option<f64>,
    rstep: Option<f64>,
    qmin: Option<f64>,
    qmax: Option<f64>,
    max_extension: Option<f64>,
    peak_width_model: Option<String>,
    peak_profile: Option<String>,
    baseline: Option<String>,
    envelopes: Option<Vec<String>>,
    scattering_table: Option<String>,
    summation: Option<SummationConvention>,
    parameters: BTreeMap<String, f64>,
    custom_scattering: BTreeMap<String, f64>,
}

impl PdfConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rmin(mut self, rmin: f64) -> Self {
        self.rmin = Some(rmin);
        self
    }
    pub fn rmax(mut self, rmax: f64) -> Self {
        self.rmax = Some(rmax);
        self
    }
    pub fn rstep(mut self, rstep: f64) -> Self {
        self.rstep = Some(rstep);
        self
    }
    pub fn qmin(mut self, qmin: f64) -> Self {
        self.qmin = Some(qmin);
        self
    }
    pub fn qmax(mut self, qmax: f64) -> Self {
        self.qmax = Some(qmax);
        self
    }
    pub fn max_extension(mut self, max_extension: f64) -> Self {
        self.max_extension = Some(max_extension);
        self
    }
    pub fn peak_width_model(mut self, tag: &str) -> Self {
        self.peak_width_model = Some(tag.to_string());
        self
    }
    pub fn peak_profile(mut self, tag: &str) -> Self {
        self.peak_profile = Some(tag.to_string());
        self
    }
    pub fn baseline(mut self, tag: &str) -> Self {
        self.baseline = Some(tag.to_string());
        self
    }
    pub fn envelopes(mut self, tags: &[&str]) -> Self {
        self.envelopes = Some(tags.iter().map(|t| t.to_string()).collect());
        self
    }
    pub fn scattering_table(mut self, tag: &str) -> Self {
        self.scattering_table = Some(tag.to_string());
        self
    }
    pub fn summation(mut self, summation: SummationConvention) -> Self {
        self.summation = Some(summation);
        self
    }
    /// Adds a named strategy parameter, applied after the strategies are chosen.
    pub fn parameter(mut self, name: &str, value: f64) -> Self {
        self.parameters.insert(name.to_string(), value);
        self
    }
    pub fn custom_scattering(mut self, species: &str, value: f64) -> Self {
        self.custom_scattering.insert(species.to_string(), value);
        self
    }

    /// Only `rmax` is required; everything else falls back to [`PdfConfig::default`].
    pub fn build(self) -> Result<PdfConfig, ConfigError> {
        let defaults = PdfConfig::default();
        let config = PdfConfig {
            rmin: self.rmin.unwrap_or(defaults.rmin),
            rmax: self.rmax.ok_or(ConfigError::MissingParameter("rmax"))?,
            rstep: self.rstep.unwrap_or(defaults.rstep),
            qmin: self.qmin.unwrap_or(defaults.qmin),
            qmax: self.qmax.unwrap_or(defaults.qmax),
            max_extension: self.max_extension.unwrap_or(defaults.max_extension),
            peak_width_model: self.peak_width_model.unwrap_or(defaults.peak_width_model),
            peak_profile: self.peak_profile.unwrap_or(defaults.peak_profile),
            baseline: self.baseline.unwrap_or(defaults.baseline),
            envelopes: self.envelopes.unwrap_or(defaults.envelopes),
            scattering_table: self.scattering_table.unwrap_or(defaults.scattering_table),
            summation: self.summation.unwrap_or(defaults.summation),
            parameters: self.parameters,
            custom_scattering: self.custom_scattering,
        };
        config.validate()?;
        Ok(config)
    }
}
