use crate::core::bonds::SummationConvention;
use std::collections::BTreeMap;

/// Settings a structure asks the evaluating calculator to adopt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuantityHints {
    pub summation: Option<SummationConvention>,
    pub baseline_slope: Option<f64>,
    /// Named parameters routed through the calculator's parameter interface.
    pub parameters: BTreeMap<String, f64>,
}

impl QuantityHints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.summation.is_none() && self.baseline_slope.is_none() && self.parameters.is_empty()
    }
}
