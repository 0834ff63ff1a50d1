use crate::core::structure::StructureAdapter;
use crate::engine::calculator::PdfCalculator;
use crate::engine::config::PdfConfig;
use crate::engine::error::CalculatorError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

/// Arrays produced by one PDF evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfResult {
    pub r: Vec<f64>,
    pub pdf: Vec<f64>,
    pub rdf: Vec<f64>,
    pub rdf_per_r: Vec<f64>,
    /// Ripple-extended grid and its untrimmed arrays.
    pub extended_r: Vec<f64>,
    pub extended_pdf: Vec<f64>,
    pub extended_rdf: Vec<f64>,
    pub number_density: f64,
}

impl PdfResult {
    fn collect(calculator: &PdfCalculator) -> Self {
        Self {
            r: calculator.rgrid(),
            pdf: calculator.pdf(),
            rdf: calculator.rdf(),
            rdf_per_r: calculator.rdf_per_r(),
            extended_r: calculator.extended_rgrid(),
            extended_pdf: calculator.extended_pdf(),
            extended_rdf: calculator.extended_rdf(),
            number_density: calculator
                .structure_cache()
                .map_or(0.0, |cache| cache.number_density),
        }
    }

    /// Grid point with the largest PDF value, if any.
    pub fn strongest_peak(&self) -> Option<(f64, f64)> {
        self.r
            .iter()
            .copied()
            .zip(self.pdf.iter().copied())
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// Builds a calculator from `config`, evaluates `structure` and returns its
/// trimmed and extended arrays.
///
/// # Errors
///
/// Returns [`CalculatorError::Config`] for invalid configurations, before any
/// pair summation runs.
#[instrument(skip_all, name = "pdf_workflow")]
pub fn run(
    structure: &dyn StructureAdapter,
    config: &PdfConfig,
    reporter: &ProgressReporter,
) -> Result<PdfResult, CalculatorError> {
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    info!(
        rmin = config.rmin,
        rmax = config.rmax,
        rstep = config.rstep,
        peak_width_model = %config.peak_width_model,
        "Configuring PDF calculator."
    );
    let mut calculator = PdfCalculator::from_config(config)?;
    reporter.report(Progress::PhaseFinish);

    calculator.eval_with_progress(structure, reporter)?;

    let result = PdfResult::collect(&calculator);
    info!(
        points = result.r.len(),
        extended_points = result.extended_r.len(),
        number_density = result.number_density,
        "PDF workflow finished."
    );
    reporter.message(format!("Computed PDF on {} points.", result.r.len()));
    Ok(result)
}
