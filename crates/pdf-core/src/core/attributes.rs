use thiserror::Error;

/// Errors raised when reading or writing a named double parameter.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AttributeError {
    #[error("'{owner}' has no parameter named '{name}'")]
    Unknown { owner: String, name: String },
    #[error("Invalid value {value} for parameter '{name}': {reason}")]
    InvalidValue {
        name: String,
        value: f64,
        reason: &'static str,
    },
}

impl AttributeError {
    pub fn unknown(owner: &str, name: &str) -> Self {
        Self::Unknown {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }

    pub fn invalid(name: &str, value: f64, reason: &'static str) -> Self {
        Self::InvalidValue {
            name: name.to_string(),
            value,
            reason,
        }
    }
}

/// Named double-valued parameters exposed by a configurable strategy.
///
/// Every strategy family (peak widths, profiles, baselines, envelopes) carries
/// its tunable numbers behind this interface so that a calculator can route
/// a parameter such as `"qdamp"` to whichever component owns it.
pub trait Attributes {
    fn attribute_names(&self) -> &'static [&'static str] {
        &[]
    }

    fn attribute(&self, _name: &str) -> Option<f64> {
        None
    }

    fn set_attribute(&mut self, name: &str, value: f64) -> Result<(), AttributeError>;

    fn has_attribute(&self, name: &str) -> bool {
        self.attribute_names().contains(&name)
    }
}

pub(crate) fn require_finite(name: &str, value: f64) -> Result<f64, AttributeError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AttributeError::invalid(name, value, "must be finite"))
    }
}

pub(crate) fn require_non_negative(name: &str, value: f64) -> Result<f64, AttributeError> {
    if value.is_nan() || value < 0.0 {
        Err(AttributeError::invalid(name, value, "must not be negative"))
    } else {
        Ok(value)
    }
}
