use super::cache::StructureCache;
use super::config::{
    ConfigError, DEFAULT_MAX_EXTENSION, DEFAULT_QMAX, DEFAULT_QMIN, DEFAULT_RMAX, DEFAULT_RMIN,
    DEFAULT_RSTEP, PdfConfig, validate_max_extension, validate_q_range, validate_r_range,
    validate_rstep,
};
use super::error::CalculatorError;
use super::grid::RLimits;
use super::histogram::PdfHistogram;
use super::progress::{Progress, ProgressReporter};
use super::quantity::evaluate;
use crate::core::attributes::Attributes;
use crate::core::bonds::SummationConvention;
use crate::core::corrections::baseline::{LinearBaseline, PdfBaseline, create_baseline};
use crate::core::corrections::envelope::{
    PdfEnvelope, QResolutionEnvelope, ScaleEnvelope, create_envelope,
};
use crate::core::peaks::profile::{GaussianProfile, PeakProfile, create_peak_profile};
use crate::core::peaks::width::{JeongPeakWidth, PeakWidthModel, create_peak_width_model};
use crate::core::scattering::{
    ScatteringFactorTable, XrayScatteringTable, create_scattering_table,
};
use crate::core::structure::{QuantityHints, StructureAdapter};
use crate::core::utils::fourier::band_pass_filter;
use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::PI;
use tracing::{debug, info, instrument, warn};

/// Names of the parameters owned by the calculator itself.
const OWN_PARAMETERS: [&str; 6] = ["rmin", "rmax", "rstep", "qmin", "qmax", "maxextension"];

/// Arrays on the ripple-extended grid from the last evaluation.
#[derive(Debug, Clone, Default)]
struct ExtendedResults {
    rdf: Vec<f64>,
    rdf_per_r: Vec<f64>,
    pdf: Vec<f64>,
}

/// Computes PDF, RDF and RDF/r of a structure on a uniform r-grid.
///
/// Configuration setters validate eagerly and discard results of the last
/// evaluation; accessors return zeros until [`PdfCalculator::eval`] runs.
#[derive(Debug, Clone)]
pub struct PdfCalculator {
    rmin: f64,
    rmax: f64,
    rstep: f64,
    qmin: f64,
    qmax: f64,
    max_extension: f64,
    summation: SummationConvention,
    peak_width: Box<dyn PeakWidthModel>,
    profile: Box<dyn PeakProfile>,
    baseline: Box<dyn PdfBaseline>,
    envelopes: BTreeMap<String, Box<dyn PdfEnvelope>>,
    scattering: Box<dyn ScatteringFactorTable>,
    /// Baseline slope was written by an evaluation rather than by the caller.
    density_slope: bool,
    rlimits: Option<RLimits>,
    cache: Option<StructureCache>,
    results: Option<ExtendedResults>,
}

impl Default for PdfCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfCalculator {
    /// Calculator with default grid and strategies: `jeong` width, `gaussian`
    /// profile, `linear` baseline, `qresolution` and `scale` envelopes, `xray`
    /// scattering.
    pub fn new() -> Self {
        let mut envelopes: BTreeMap<String, Box<dyn PdfEnvelope>> = BTreeMap::new();
        envelopes.insert("qresolution".into(), Box::new(QResolutionEnvelope::default()));
        envelopes.insert("scale".into(), Box::new(ScaleEnvelope::default()));
        Self {
            rmin: DEFAULT_RMIN,
            rmax: DEFAULT_RMAX,
            rstep: DEFAULT_RSTEP,
            qmin: DEFAULT_QMIN,
            qmax: DEFAULT_QMAX,
            max_extension: DEFAULT_MAX_EXTENSION,
            summation: SummationConvention::default(),
            peak_width: Box::new(JeongPeakWidth::default()),
            profile: Box::new(GaussianProfile::default()),
            baseline: Box::new(LinearBaseline::default()),
            envelopes,
            scattering: Box::new(XrayScatteringTable::default()),
            density_slope: false,
            rlimits: None,
            cache: None,
            results: None,
        }
    }

    /// Builds a calculator from a validated [`PdfConfig`].
    pub fn from_config(config: &PdfConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut calculator = Self::new();
        calculator.set_r_range(config.rmin, config.rmax)?;
        calculator.set_rstep(config.rstep)?;
        calculator.set_q_range(config.qmin, config.qmax)?;
        calculator.set_max_extension(config.max_extension)?;
        calculator.set_summation(config.summation);
        calculator.set_peak_width_model_by_type(&config.peak_width_model)?;
        calculator.set_peak_profile_by_type(&config.peak_profile)?;
        calculator.set_baseline_by_type(&config.baseline)?;
        calculator.clear_envelopes();
        for tag in &config.envelopes {
            calculator.add_envelope_by_type(tag)?;
        }
        calculator.set_scattering_table_by_type(&config.scattering_table)?;
        for (species, value) in &config.custom_scattering {
            calculator.scattering.set_custom(species, *value);
        }
        for (name, value) in &config.parameters {
            calculator.set_parameter(name, *value)?;
        }
        Ok(calculator)
    }

    fn invalidate(&mut self) {
        self.rlimits = None;
        self.results = None;
    }

    pub fn rmin(&self) -> f64 {
        self.rmin
    }

    pub fn rmax(&self) -> f64 {
        self.rmax
    }

    pub fn rstep(&self) -> f64 {
        self.rstep
    }

    pub fn qmin(&self) -> f64 {
        self.qmin
    }

    pub fn qmax(&self) -> f64 {
        self.qmax
    }

    pub fn max_extension(&self) -> f64 {
        self.max_extension
    }

    pub fn summation(&self) -> SummationConvention {
        self.summation
    }

    pub fn set_rmin(&mut self, rmin: f64) -> Result<(), ConfigError> {
        self.set_r_range(rmin, self.rmax)
    }

    pub fn set_rmax(&mut self, rmax: f64) -> Result<(), ConfigError> {
        self.set_r_range(self.rmin, rmax)
    }

    /// Sets both bounds of the requested grid. Requires `0 <= rmin < rmax`.
    pub fn set_r_range(&mut self, rmin: f64, rmax: f64) -> Result<(), ConfigError> {
        validate_r_range(rmin, rmax)?;
        self.rmin = rmin;
        self.rmax = rmax;
        self.invalidate();
        Ok(())
    }

    /// Sets the grid spacing. Requires a positive finite step.
    pub fn set_rstep(&mut self, rstep: f64) -> Result<(), ConfigError> {
        validate_rstep(rstep)?;
        self.rstep = rstep;
        self.invalidate();
        Ok(())
    }

    pub fn set_qmin(&mut self, qmin: f64) -> Result<(), ConfigError> {
        self.set_q_range(qmin, self.qmax)
    }

    pub fn set_qmax(&mut self, qmax: f64) -> Result<(), ConfigError> {
        self.set_q_range(self.qmin, qmax)
    }

    /// Sets the band-pass window. Requires `0 <= qmin < qmax`; an infinite
    /// `qmax` disables ripple margins and the upper cutoff.
    pub fn set_q_range(&mut self, qmin: f64, qmax: f64) -> Result<(), ConfigError> {
        validate_q_range(qmin, qmax)?;
        self.qmin = qmin;
        self.qmax = qmax;
        self.invalidate();
        Ok(())
    }

    /// Caps the combined ripple and peak-tail margin on each side.
    pub fn set_max_extension(&mut self, max_extension: f64) -> Result<(), ConfigError> {
        validate_max_extension(max_extension)?;
        self.max_extension = max_extension;
        self.invalidate();
        Ok(())
    }

    /// Default pair-loop convention; adapters may override it per evaluation.
    pub fn set_summation(&mut self, summation: SummationConvention) {
        self.summation = summation;
        self.invalidate();
    }

    pub fn peak_width_model(&self) -> &dyn PeakWidthModel {
        self.peak_width.as_ref()
    }

    pub fn set_peak_width_model(&mut self, model: Box<dyn PeakWidthModel>) {
        self.peak_width = model;
        self.invalidate();
    }

    /// Replaces the width model by registry tag. Keeps the current model and
    /// its parameters when the tag already matches.
    pub fn set_peak_width_model_by_type(&mut self, tag: &str) -> Result<(), ConfigError> {
        if self.peak_width.type_tag() != tag {
            self.set_peak_width_model(create_peak_width_model(tag)?);
        }
        Ok(())
    }

    pub fn peak_profile(&self) -> &dyn PeakProfile {
        self.profile.as_ref()
    }

    pub fn set_peak_profile(&mut self, profile: Box<dyn PeakProfile>) {
        self.profile = profile;
        self.invalidate();
    }

    pub fn set_peak_profile_by_type(&mut self, tag: &str) -> Result<(), ConfigError> {
        if self.profile.type_tag() != tag {
            self.set_peak_profile(create_peak_profile(tag)?);
        }
        Ok(())
    }

    pub fn baseline(&self) -> &dyn PdfBaseline {
        self.baseline.as_ref()
    }

    /// Replaces the baseline. A slope set by the caller is kept across later
    /// evaluations of aperiodic structures.
    pub fn set_baseline(&mut self, baseline: Box<dyn PdfBaseline>) {
        self.baseline = baseline;
        self.density_slope = false;
        self.invalidate();
    }

    pub fn set_baseline_by_type(&mut self, tag: &str) -> Result<(), ConfigError> {
        if self.baseline.type_tag() != tag {
            self.set_baseline(create_baseline(tag)?);
        }
        Ok(())
    }

    pub fn scattering_table(&self) -> &dyn ScatteringFactorTable {
        self.scattering.as_ref()
    }

    /// Mutable access for custom scattering overrides. Takes effect at the
    /// next evaluation.
    pub fn scattering_table_mut(&mut self) -> &mut dyn ScatteringFactorTable {
        self.invalidate();
        self.scattering.as_mut()
    }

    /// Replaces the scattering factor table and drops the structure cache.
    pub fn set_scattering_table(&mut self, table: Box<dyn ScatteringFactorTable>) {
        self.scattering = table;
        self.cache = None;
        self.invalidate();
    }

    pub fn set_scattering_table_by_type(&mut self, tag: &str) -> Result<(), ConfigError> {
        if self.scattering.type_tag() != tag {
            self.set_scattering_table(create_scattering_table(tag)?);
        }
        Ok(())
    }

    /// Adds `envelope`, replacing any envelope with the same tag.
    pub fn add_envelope(&mut self, envelope: Box<dyn PdfEnvelope>) {
        self.envelopes
            .insert(envelope.type_tag().to_string(), envelope);
        self.invalidate();
    }

    pub fn add_envelope_by_type(&mut self, tag: &str) -> Result<(), ConfigError> {
        self.add_envelope(create_envelope(tag)?);
        Ok(())
    }

    /// Removes and returns the envelope with `tag`, if present.
    pub fn pop_envelope(&mut self, tag: &str) -> Option<Box<dyn PdfEnvelope>> {
        let removed = self.envelopes.remove(tag);
        if removed.is_some() {
            self.invalidate();
        }
        removed
    }

    pub fn envelope(&self, tag: &str) -> Option<&dyn PdfEnvelope> {
        self.envelopes.get(tag).map(|e| e.as_ref())
    }

    pub fn envelope_mut(&mut self, tag: &str) -> Option<&mut Box<dyn PdfEnvelope>> {
        self.invalidate();
        self.envelopes.get_mut(tag)
    }

    /// Sorted tags of the active envelopes.
    pub fn used_envelope_types(&self) -> Vec<&str> {
        self.envelopes.keys().map(String::as_str).collect()
    }

    pub fn clear_envelopes(&mut self) {
        self.envelopes.clear();
        self.invalidate();
    }

    /// Sets a named parameter on the calculator or the first strategy that
    /// owns it: width model, profile, baseline, then envelopes.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), ConfigError> {
        match name {
            "rmin" => return self.set_rmin(value),
            "rmax" => return self.set_rmax(value),
            "rstep" => return self.set_rstep(value),
            "qmin" => return self.set_qmin(value),
            "qmax" => return self.set_qmax(value),
            "maxextension" => return self.set_max_extension(value),
            _ => {}
        }

        if self.peak_width.has_attribute(name) {
            self.peak_width.set_attribute(name, value)?;
        } else if self.profile.has_attribute(name) {
            self.profile.set_attribute(name, value)?;
        } else if self.baseline.has_attribute(name) {
            self.baseline.set_attribute(name, value)?;
            self.density_slope = false;
        } else if let Some(envelope) = self
            .envelopes
            .values_mut()
            .find(|e| e.has_attribute(name))
        {
            envelope.set_attribute(name, value)?;
        } else {
            return Err(ConfigError::UnknownParameter(name.to_string()));
        }
        self.invalidate();
        Ok(())
    }

    /// Reads a named parameter using the same lookup order as
    /// [`PdfCalculator::set_parameter`].
    pub fn parameter(&self, name: &str) -> Result<f64, ConfigError> {
        let own = match name {
            "rmin" => Some(self.rmin),
            "rmax" => Some(self.rmax),
            "rstep" => Some(self.rstep),
            "qmin" => Some(self.qmin),
            "qmax" => Some(self.qmax),
            "maxextension" => Some(self.max_extension),
            _ => None,
        };
        own.or_else(|| self.peak_width.attribute(name))
            .or_else(|| self.profile.attribute(name))
            .or_else(|| self.baseline.attribute(name))
            .or_else(|| self.envelopes.values().find_map(|e| e.attribute(name)))
            .ok_or_else(|| ConfigError::UnknownParameter(name.to_string()))
    }

    /// Every parameter name accepted by [`PdfCalculator::set_parameter`].
    pub fn parameter_names(&self) -> BTreeSet<String> {
        let strategies = [
            self.peak_width.attribute_names(),
            self.profile.attribute_names(),
            self.baseline.attribute_names(),
        ];
        OWN_PARAMETERS
            .iter()
            .chain(strategies.iter().flat_map(|names| names.iter()))
            .chain(self.envelopes.values().flat_map(|e| e.attribute_names().iter()))
            .map(|name| name.to_string())
            .collect()
    }

    /// Limits without any tail extension, used before the first evaluation.
    fn nominal_rlimits(&self) -> RLimits {
        RLimits::compute(
            self.rmin,
            self.rmax,
            self.rstep,
            self.qmax,
            self.max_extension,
            0.0,
        )
    }

    fn limits(&self) -> RLimits {
        self.rlimits.unwrap_or_else(|| self.nominal_rlimits())
    }

    /// Requested grid `rmin + k·rstep` for all points below `rmax`.
    pub fn rgrid(&self) -> Vec<f64> {
        self.limits().rgrid().values()
    }

    /// Requested grid plus the ripple margins of the last evaluation.
    pub fn extended_rgrid(&self) -> Vec<f64> {
        self.limits().ripple_grid().values()
    }

    pub fn extended_rmin(&self) -> f64 {
        self.limits().ripple_grid().first()
    }

    pub fn extended_rmax(&self) -> f64 {
        let grid = self.limits().ripple_grid();
        grid.r(grid.len())
    }

    /// Point counts trimmed below and above the requested grid.
    pub fn extension_points(&self) -> (usize, usize) {
        let limits = self.limits();
        (limits.ripple_lo_points, limits.ripple_hi_points)
    }

    pub fn rlimits(&self) -> RLimits {
        self.limits()
    }

    pub fn structure_cache(&self) -> Option<&StructureCache> {
        self.cache.as_ref()
    }

    fn extended(&self, pick: impl Fn(&ExtendedResults) -> &Vec<f64>) -> Vec<f64> {
        match &self.results {
            Some(results) => pick(results).clone(),
            None => vec![0.0; self.limits().ripple_grid().len()],
        }
    }

    fn trimmed(&self, pick: impl Fn(&ExtendedResults) -> &Vec<f64>) -> Vec<f64> {
        let limits = self.limits();
        match &self.results {
            Some(results) => pick(results)[limits.rgrid_in_ripple()].to_vec(),
            None => vec![0.0; limits.rgrid_points],
        }
    }

    /// G(r) on [`PdfCalculator::rgrid`], zeros before the first evaluation.
    pub fn pdf(&self) -> Vec<f64> {
        self.trimmed(|r| &r.pdf)
    }

    /// R(r) on [`PdfCalculator::rgrid`].
    pub fn rdf(&self) -> Vec<f64> {
        self.trimmed(|r| &r.rdf)
    }

    pub fn rdf_per_r(&self) -> Vec<f64> {
        self.trimmed(|r| &r.rdf_per_r)
    }

    pub fn extended_pdf(&self) -> Vec<f64> {
        self.extended(|r| &r.pdf)
    }

    pub fn extended_rdf(&self) -> Vec<f64> {
        self.extended(|r| &r.rdf)
    }

    pub fn extended_rdf_per_r(&self) -> Vec<f64> {
        self.extended(|r| &r.rdf_per_r)
    }

    /// Removes Fourier components outside `[qmin, qmax)` from `values`
    /// sampled at the calculator's `rstep`.
    pub fn apply_band_pass_filter(&self, values: &mut [f64]) {
        band_pass_filter(values, self.rstep, self.qmin, self.qmax);
    }

    /// Adds the baseline evaluated at each `r`.
    pub fn apply_baseline(&self, values: &mut [f64], r: &[f64]) {
        for (value, &ri) in values.iter_mut().zip(r) {
            *value += self.baseline.value(ri);
        }
    }

    /// Multiplies by the product of all envelopes at each `r`.
    pub fn apply_envelopes(&self, values: &mut [f64], r: &[f64]) {
        for (value, &ri) in values.iter_mut().zip(r) {
            *value *= self
                .envelopes
                .values()
                .map(|envelope| envelope.value(ri))
                .product::<f64>();
        }
    }

    /// Evaluates `structure` without progress reporting.
    pub fn eval(&mut self, structure: &dyn StructureAdapter) -> Result<(), CalculatorError> {
        self.eval_with_progress(structure, &ProgressReporter::new())
    }

    /// Evaluates `structure` and stores PDF, RDF and RDF/r.
    ///
    /// Periodic structures set a linear baseline slope of `-4πρ`. That slope
    /// is reset to zero when a later structure has no number density.
    #[instrument(skip_all, name = "pdf_calculation")]
    pub fn eval_with_progress(
        &mut self,
        structure: &dyn StructureAdapter,
        reporter: &ProgressReporter,
    ) -> Result<(), CalculatorError> {
        let (summation, slope_hinted) = self.apply_hints(structure);

        reporter.report(Progress::PhaseStart {
            name: "Structure Cache",
        });
        let cache = StructureCache::build(structure, self.scattering.as_ref())?;
        if self.baseline.has_attribute("slope") {
            if cache.number_density > 0.0 {
                self.baseline
                    .set_attribute("slope", -4.0 * PI * cache.number_density)
                    .map_err(ConfigError::from)?;
                self.density_slope = true;
            } else if self.density_slope && !slope_hinted {
                // Aperiodic structure after a periodic one.
                self.baseline
                    .set_attribute("slope", 0.0)
                    .map_err(ConfigError::from)?;
                self.density_slope = false;
            }
        }
        reporter.report(Progress::PhaseFinish);

        let limits = self.compute_rlimits(structure);
        let calc_grid = limits.calc_grid();
        info!(
            sites = structure.count_sites(),
            points = limits.rgrid_points,
            calc_points = calc_grid.len(),
            ripple_extension = limits.ripple_extension,
            tail_extension = limits.tail_extension,
            "Evaluating PDF."
        );

        reporter.report(Progress::PhaseStart {
            name: "Pair Summation",
        });
        let histogram = {
            let mut histogram = PdfHistogram::new(
                calc_grid,
                self.peak_width.as_ref(),
                self.profile.as_ref(),
                &cache,
            );
            evaluate(&mut histogram, structure, summation, reporter);
            histogram.into_values()
        };
        reporter.report(Progress::PhaseFinish);

        reporter.report(Progress::PhaseStart {
            name: "Signal Processing",
        });
        let results = self.process_histogram(&histogram, &limits, &cache);
        reporter.report(Progress::PhaseFinish);

        self.rlimits = Some(limits);
        self.cache = Some(cache);
        self.results = Some(results);
        Ok(())
    }

    /// Applies the adapter's hints and returns the summation convention for
    /// this pass, and whether a baseline slope hint was applied. Unknown hint
    /// parameters are skipped.
    fn apply_hints(&mut self, structure: &dyn StructureAdapter) -> (SummationConvention, bool) {
        let mut hints = QuantityHints::new();
        structure.custom_pq_config(&mut hints);
        if hints.is_empty() {
            return (self.summation, false);
        }

        let mut slope_hinted = false;
        if let Some(slope) = hints.baseline_slope {
            if self.baseline.has_attribute("slope") {
                match self.baseline.set_attribute("slope", slope) {
                    Ok(()) => {
                        self.density_slope = true;
                        slope_hinted = true;
                    }
                    Err(e) => warn!(error = %e, "Ignoring baseline slope hint."),
                }
            }
        }
        for (name, value) in &hints.parameters {
            if let Err(e) = self.set_parameter(name, *value) {
                warn!(parameter = %name, error = %e, "Ignoring structure parameter hint.");
            }
        }
        (hints.summation.unwrap_or(self.summation), slope_hinted)
    }

    fn compute_rlimits(&self, structure: &dyn StructureAdapter) -> RLimits {
        let max_width = self.peak_width.max_width(
            structure,
            self.rmin,
            self.rmax + self.max_extension,
        );
        let tail = self
            .profile
            .xboundhi(max_width)
            .max(-self.profile.xboundlo(max_width));
        debug!(max_width, tail, "Computed peak tail extension.");
        RLimits::compute(
            self.rmin,
            self.rmax,
            self.rstep,
            self.qmax,
            self.max_extension,
            tail,
        )
    }

    fn process_histogram(
        &self,
        histogram: &[f64],
        limits: &RLimits,
        cache: &StructureCache,
    ) -> ExtendedResults {
        let ripple = limits.ripple_in_calc();
        let r = limits.ripple_grid().values();
        let scale = cache.rdf_scale();

        let rdf: Vec<f64> = histogram[ripple].iter().map(|h| h * scale).collect();
        let rdf_per_r: Vec<f64> = rdf
            .iter()
            .zip(&r)
            .map(|(g, &ri)| if ri > 0.0 { g / ri } else { 0.0 })
            .collect();

        let mut pdf = rdf_per_r.clone();
        self.apply_band_pass_filter(&mut pdf);
        self.apply_baseline(&mut pdf, &r);
        self.apply_envelopes(&mut pdf, &r);

        ExtendedResults {
            rdf,
            rdf_per_r,
            pdf,
        }
    }
}

/// Trims `extended` to the requested part of a ripple-extended grid.
pub fn trim_to_rgrid(extended: &[f64], limits: &RLimits) -> Vec<f64> {
    extended[limits.rgrid_in_ripple()].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::corrections::envelope::StepCutEnvelope;
    use crate::engine::config::PdfConfigBuilder;
    use crate::core::models::lattice::Lattice;
    use crate::core::models::source::{AtomRecord, Molecule, PeriodicStructure};
    use crate::core::peaks::width::DebyeWallerPeakWidth;
    use crate::core::structure::molecule::MoleculeAdapter;
    use crate::core::structure::periodic::PeriodicStructureAdapter;
    use nalgebra::Vector3;

    fn simple_cubic(a: f64, uiso: f64) -> PeriodicStructure {
        PeriodicStructure::new(Lattice::cubic(a).unwrap())
            .with_atom(AtomRecord::new("Ni", Vector3::zeros()).with_uiso(uiso))
    }

    fn small_molecule() -> MoleculeAdapter {
        let molecule = Molecule::new()
            .with_atom(AtomRecord::new("C", Vector3::zeros()).with_uiso(0.004))
            .with_atom(AtomRecord::new("O", Vector3::new(1.2, 0.0, 0.0)).with_uiso(0.006))
            .with_atom(AtomRecord::new("H", Vector3::new(-0.6, 0.9, 0.3)).with_uiso(0.01));
        MoleculeAdapter::new(&molecule).unwrap()
    }

    fn assert_close(a: &[f64], b: &[f64], tolerance: f64) {
        assert_eq!(a.len(), b.len());
        for (k, (x, y)) in a.iter().zip(b).enumerate() {
            assert!((x - y).abs() <= tolerance, "index {k}: {x} vs {y}");
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let calculator = PdfCalculator::new();
        assert_eq!(calculator.rmin(), 0.0);
        assert_eq!(calculator.rmax(), 10.0);
        assert_eq!(calculator.rstep(), 0.01);
        assert_eq!(calculator.qmax(), f64::INFINITY);
        assert_eq!(calculator.peak_width_model().type_tag(), "jeong");
        assert_eq!(calculator.peak_profile().type_tag(), "gaussian");
        assert_eq!(calculator.baseline().type_tag(), "linear");
        assert_eq!(calculator.used_envelope_types(), vec!["qresolution", "scale"]);
        assert_eq!(calculator.rgrid().len(), 1000);
    }

    #[test]
    fn results_are_zero_before_evaluation() {
        let calculator = PdfCalculator::new();
        assert_eq!(calculator.pdf(), vec![0.0; 1000]);
        assert_eq!(calculator.extended_rdf().len(), calculator.extended_rgrid().len());
    }

    #[test]
    fn setters_reject_invalid_ranges() {
        let mut calculator = PdfCalculator::new();
        assert!(calculator.set_rmin(-1.0).is_err());
        assert!(calculator.set_rmax(0.0).is_err());
        assert!(calculator.set_rstep(0.0).is_err());
        assert!(calculator.set_qmin(-0.5).is_err());
        assert!(calculator.set_q_range(20.0, 10.0).is_err());
        assert!(calculator.set_max_extension(-1.0).is_err());
        assert!(calculator.set_peak_profile_by_type("lorentzian").is_err());
        assert_eq!(calculator.rmax(), 10.0);

        calculator.set_r_range(12.0, 20.0).unwrap();
        assert_eq!((calculator.rmin(), calculator.rmax()), (12.0, 20.0));
    }

    #[test]
    fn single_site_molecule_has_zero_rdf() {
        let molecule = Molecule::new().with_atom(AtomRecord::new("Fe", Vector3::zeros()));
        let adapter = MoleculeAdapter::new(&molecule).unwrap();
        let mut calculator = PdfCalculator::new();
        calculator.set_rmax(5.0).unwrap();
        calculator.eval(&adapter).unwrap();
        assert!(calculator.rdf().iter().all(|v| *v == 0.0));
        assert!(calculator.pdf().iter().all(|v| *v == 0.0));
        assert_eq!(calculator.structure_cache().unwrap().number_density, 0.0);
    }

    #[test]
    fn summation_conventions_give_identical_pdfs() {
        let adapter = small_molecule();
        let mut unique = PdfCalculator::new();
        unique.set_rmax(4.0).unwrap();
        unique.set_qmax(25.0).unwrap();
        let mut ordered = unique.clone();
        ordered.set_summation(SummationConvention::OrderedPairs);

        unique.eval(&adapter).unwrap();
        ordered.eval(&adapter).unwrap();
        assert_close(&unique.pdf(), &ordered.pdf(), 1e-9);
        assert_close(&unique.extended_rdf(), &ordered.extended_rdf(), 1e-9);
    }

    #[test]
    fn trimmed_extended_grid_matches_rgrid() {
        let mut calculator = PdfCalculator::new();
        calculator.set_r_range(1.0, 6.0).unwrap();
        calculator.set_qmax(20.0).unwrap();
        calculator.eval(&small_molecule()).unwrap();

        let (lo, hi) = calculator.extension_points();
        assert!(lo > 0 && hi > 0);
        let extended = calculator.extended_rgrid();
        assert_eq!(extended.len(), calculator.rgrid().len() + lo + hi);
        assert_eq!(&extended[lo..extended.len() - hi], calculator.rgrid().as_slice());
        assert_eq!(
            trim_to_rgrid(&calculator.extended_pdf(), &calculator.rlimits()),
            calculator.pdf()
        );
        assert_eq!(calculator.extended_rmin(), extended[0]);
    }

    #[test]
    fn rdf_of_simple_cubic_integrates_to_coordination() {
        let source = simple_cubic(2.5, 0.003);
        let adapter = PeriodicStructureAdapter::new(&source).unwrap();
        let mut calculator = PdfCalculator::new();
        calculator.set_peak_width_model(Box::new(DebyeWallerPeakWidth));
        calculator.set_r_range(0.0, 3.0).unwrap();
        calculator.eval(&adapter).unwrap();

        let area: f64 = calculator
            .rdf()
            .iter()
            .zip(calculator.rgrid())
            .filter(|(_, r)| (2.0..3.0).contains(r))
            .map(|(g, _)| g)
            .sum::<f64>()
            * calculator.rstep();
        assert!((area - 6.0).abs() < 1e-3, "coordination {area}");
    }

    #[test]
    fn periodic_structure_sets_density_baseline() {
        let source = simple_cubic(3.0, 0.003);
        let adapter = PeriodicStructureAdapter::new(&source).unwrap();
        let mut calculator = PdfCalculator::new();
        calculator.set_rmax(4.0).unwrap();
        calculator.eval(&adapter).unwrap();

        let rho = 1.0 / 27.0;
        let slope = calculator.parameter("slope").unwrap();
        assert!((slope + 4.0 * PI * rho).abs() < 1e-12);

        let r = calculator.rgrid();
        let pdf = calculator.pdf();
        let k = r.iter().position(|x| (*x - 1.0).abs() < 1e-9).unwrap();
        assert!((pdf[k] - slope * r[k]).abs() < 1e-9);
    }

    #[test]
    fn molecule_after_periodic_structure_drops_density_slope() {
        let source = simple_cubic(3.0, 0.003);
        let crystal = PeriodicStructureAdapter::new(&source).unwrap();
        let molecule = Molecule::new().with_atom(AtomRecord::new("Fe", Vector3::zeros()));
        let single = MoleculeAdapter::new(&molecule).unwrap();

        let mut calculator = PdfCalculator::new();
        calculator.set_rmax(5.0).unwrap();
        calculator.eval(&crystal).unwrap();
        assert!(calculator.parameter("slope").unwrap() < 0.0);

        calculator.eval(&single).unwrap();
        assert_eq!(calculator.parameter("slope").unwrap(), 0.0);
        assert!(calculator.pdf().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn caller_slope_survives_molecule_evaluation() {
        let mut calculator = PdfCalculator::new();
        calculator.set_rmax(4.0).unwrap();
        calculator.set_parameter("slope", -0.25).unwrap();
        calculator.eval(&small_molecule()).unwrap();
        assert_eq!(calculator.parameter("slope").unwrap(), -0.25);
    }

    #[test]
    fn zero_extension_matches_when_tails_are_negligible() {
        let adapter = small_molecule();
        let mut extended = PdfCalculator::new();
        extended.set_r_range(0.0, 5.0).unwrap();
        let mut direct = extended.clone();
        direct.set_max_extension(0.0).unwrap();

        extended.eval(&adapter).unwrap();
        direct.eval(&adapter).unwrap();
        assert_eq!(direct.extension_points(), (0, 0));
        assert_close(&extended.pdf(), &direct.pdf(), 1e-12);
    }

    #[test]
    fn envelopes_are_keyed_by_tag() {
        let mut calculator = PdfCalculator::new();
        calculator.add_envelope(Box::new(ScaleEnvelope { scale: 2.0 }));
        calculator.add_envelope(Box::new(ScaleEnvelope { scale: 3.0 }));
        assert_eq!(calculator.used_envelope_types(), vec!["qresolution", "scale"]);
        assert_eq!(calculator.parameter("scale").unwrap(), 3.0);

        calculator.add_envelope_by_type("stepcut").unwrap();
        assert!(calculator.add_envelope_by_type("nonsense").is_err());
        assert_eq!(
            calculator.used_envelope_types(),
            vec!["qresolution", "scale", "stepcut"]
        );
        assert!(calculator.pop_envelope("qresolution").is_some());
        assert!(calculator.pop_envelope("qresolution").is_none());
        assert!(calculator.envelope("stepcut").is_some());
    }

    #[test]
    fn envelopes_multiply_processed_signal() {
        let adapter = small_molecule();
        let mut plain = PdfCalculator::new();
        plain.set_rmax(4.0).unwrap();
        let mut cut = plain.clone();
        cut.set_parameter("scale", 0.5).unwrap();
        cut.add_envelope(Box::new(StepCutEnvelope { stepcut: 1.5 }));

        plain.eval(&adapter).unwrap();
        cut.eval(&adapter).unwrap();
        for ((r, a), b) in plain.rgrid().iter().zip(plain.pdf()).zip(cut.pdf()) {
            let expected = if *r > 1.5 { 0.0 } else { 0.5 * a };
            assert!((b - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn parameters_route_to_owning_strategy() {
        let mut calculator = PdfCalculator::new();
        calculator.set_parameter("qdamp", 0.04).unwrap();
        calculator.set_parameter("delta2", 1.5).unwrap();
        calculator.set_parameter("peakprecision", 1e-5).unwrap();
        calculator.set_parameter("rmax", 12.0).unwrap();
        assert_eq!(calculator.parameter("qdamp").unwrap(), 0.04);
        assert_eq!(calculator.parameter("delta2").unwrap(), 1.5);
        assert_eq!(calculator.parameter("peakprecision").unwrap(), 1e-5);
        assert_eq!(calculator.rmax(), 12.0);
        assert!(matches!(
            calculator.set_parameter("spdiameter", 10.0),
            Err(ConfigError::UnknownParameter(_))
        ));
        assert!(calculator.parameter("nothing").is_err());

        let names = calculator.parameter_names();
        for name in ["rmin", "qdamp", "scale", "slope", "delta1", "peakprecision"] {
            assert!(names.contains(name), "missing {name}");
        }
    }

    #[test]
    fn from_config_applies_every_setting() {
        let config = PdfConfigBuilder::new()
            .rmax(8.0)
            .qmax(30.0)
            .peak_width_model("debye-waller")
            .envelopes(&["scale", "sphericalshape"])
            .scattering_table("neutron")
            .parameter("spdiameter", 25.0)
            .custom_scattering("Ni", 10.0)
            .build()
            .unwrap();
        let calculator = PdfCalculator::from_config(&config).unwrap();
        assert_eq!(calculator.rmax(), 8.0);
        assert_eq!(calculator.qmax(), 30.0);
        assert_eq!(calculator.peak_width_model().type_tag(), "debye-waller");
        assert_eq!(calculator.used_envelope_types(), vec!["scale", "sphericalshape"]);
        assert_eq!(calculator.parameter("spdiameter").unwrap(), 25.0);
        assert_eq!(calculator.scattering_table().radiation_type(), "N");
        assert_eq!(calculator.scattering_table().lookup("Ni").unwrap(), 10.0);
    }

    #[test]
    fn unknown_species_is_reported() {
        let molecule = Molecule::new()
            .with_atom(AtomRecord::new("Xx", Vector3::zeros()))
            .with_atom(AtomRecord::new("C", Vector3::new(1.0, 0.0, 0.0)));
        let adapter = MoleculeAdapter::new(&molecule).unwrap();
        let mut calculator = PdfCalculator::new();
        assert!(matches!(
            calculator.eval(&adapter),
            Err(CalculatorError::Scattering { .. })
        ));
    }
}
