use crate::core::attributes::{AttributeError, Attributes};
use crate::core::registry::{RegistryError, TypeRegistry};
use crate::core::utils::numeric::erf;
use std::collections::BTreeSet;
use std::f64::consts::{LN_2, PI};
use std::fmt;
use std::sync::LazyLock;

pub const DEFAULT_PEAK_PRECISION: f64 = 3.33e-6;

/// Unit-area lineshape centered at zero, parameterized by its FWHM.
pub trait PeakProfile: Attributes + Send + Sync + fmt::Debug {
    fn type_tag(&self) -> &'static str;

    /// Profile value at offset `x` from the peak center.
    fn y(&self, x: f64, fwhm: f64) -> f64;

    /// Lowest offset where the profile is still above the precision cutoff.
    fn xboundlo(&self, fwhm: f64) -> f64;

    fn xboundhi(&self, fwhm: f64) -> f64;

    fn precision(&self) -> f64;

    fn create(&self) -> Box<dyn PeakProfile>;

    fn clone_box(&self) -> Box<dyn PeakProfile>;
}

impl crate::core::registry::Prototype for dyn PeakProfile {
    fn type_tag(&self) -> &str {
        PeakProfile::type_tag(self)
    }

    fn create(&self) -> Box<Self> {
        PeakProfile::create(self)
    }
}

impl Clone for Box<dyn PeakProfile> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

static PEAK_PROFILES: LazyLock<TypeRegistry<dyn PeakProfile>> = LazyLock::new(|| {
    TypeRegistry::with_builtins(
        "peak profile",
        vec![
            Box::new(GaussianProfile::default()) as Box<dyn PeakProfile>,
            Box::new(CroppedGaussianProfile::default()),
        ],
    )
});

pub fn create_peak_profile(tag: &str) -> Result<Box<dyn PeakProfile>, RegistryError> {
    PEAK_PROFILES.create(tag)
}

pub fn register_peak_profile(prototype: Box<dyn PeakProfile>) -> Result<(), RegistryError> {
    PEAK_PROFILES.register(prototype)
}

pub fn peak_profile_types() -> BTreeSet<String> {
    PEAK_PROFILES.tags()
}

fn gaussian(x: f64, fwhm: f64) -> f64 {
    if fwhm <= 0.0 {
        return 0.0;
    }
    let xrel = x / fwhm;
    2.0 / fwhm * (LN_2 / PI).sqrt() * (-4.0 * LN_2 * xrel * xrel).exp()
}

/// Offset at which a gaussian drops to `precision` times its maximum.
fn gaussian_half_bound(precision: f64, fwhm: f64) -> f64 {
    fwhm.max(0.0) * (-precision.ln() / (4.0 * LN_2)).sqrt()
}

fn set_precision(
    owner: &str,
    target: &mut f64,
    name: &str,
    value: f64,
) -> Result<(), AttributeError> {
    if name != "peakprecision" {
        return Err(AttributeError::unknown(owner, name));
    }
    if !(value > 0.0 && value < 1.0) {
        return Err(AttributeError::invalid(name, value, "must lie in (0, 1)"));
    }
    *target = value;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianProfile {
    precision: f64,
}

impl Default for GaussianProfile {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PEAK_PRECISION,
        }
    }
}

impl Attributes for GaussianProfile {
    fn attribute_names(&self) -> &'static [&'static str] {
        &["peakprecision"]
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        (name == "peakprecision").then_some(self.precision)
    }

    fn set_attribute(&mut self, name: &str, value: f64) -> Result<(), AttributeError> {
        set_precision(self.type_tag(), &mut self.precision, name, value)
    }
}

impl PeakProfile for GaussianProfile {
    fn type_tag(&self) -> &'static str {
        "gaussian"
    }

    fn y(&self, x: f64, fwhm: f64) -> f64 {
        gaussian(x, fwhm)
    }

    fn xboundlo(&self, fwhm: f64) -> f64 {
        -self.xboundhi(fwhm)
    }

    fn xboundhi(&self, fwhm: f64) -> f64 {
        gaussian_half_bound(self.precision, fwhm)
    }

    fn precision(&self) -> f64 {
        self.precision
    }

    fn create(&self) -> Box<dyn PeakProfile> {
        Box::new(GaussianProfile::default())
    }

    fn clone_box(&self) -> Box<dyn PeakProfile> {
        Box::new(*self)
    }
}

/// Gaussian shifted down by its value at the precision bound and rescaled so
/// that it reaches exactly zero at the bounds and keeps unit area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CroppedGaussianProfile {
    precision: f64,
    scale: f64,
}

impl CroppedGaussianProfile {
    fn area_scale(precision: f64) -> f64 {
        let ub = (-precision.ln()).sqrt();
        1.0 / (erf(ub) - 2.0 * precision * ub / PI.sqrt())
    }
}

impl Default for CroppedGaussianProfile {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PEAK_PRECISION,
            scale: Self::area_scale(DEFAULT_PEAK_PRECISION),
        }
    }
}

impl Attributes for CroppedGaussianProfile {
    fn attribute_names(&self) -> &'static [&'static str] {
        &["peakprecision"]
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        (name == "peakprecision").then_some(self.precision)
    }

    fn set_attribute(&mut self, name: &str, value: f64) -> Result<(), AttributeError> {
        set_precision(self.type_tag(), &mut self.precision, name, value)?;
        self.scale = Self::area_scale(self.precision);
        Ok(())
    }
}

impl PeakProfile for CroppedGaussianProfile {
    fn type_tag(&self) -> &'static str {
        "croppedgaussian"
    }

    fn y(&self, x: f64, fwhm: f64) -> f64 {
        let bound = self.xboundhi(fwhm);
        if fwhm <= 0.0 || x.abs() >= bound {
            return 0.0;
        }
        self.scale * (gaussian(x, fwhm) - gaussian(bound, fwhm))
    }

    fn xboundlo(&self, fwhm: f64) -> f64 {
        -self.xboundhi(fwhm)
    }

    fn xboundhi(&self, fwhm: f64) -> f64 {
        gaussian_half_bound(self.precision, fwhm)
    }

    fn precision(&self) -> f64 {
        self.precision
    }

    fn create(&self) -> Box<dyn PeakProfile> {
        Box::new(CroppedGaussianProfile::default())
    }

    fn clone_box(&self) -> Box<dyn PeakProfile> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::peaks::width::{DebyeWallerPeakWidth, PeakWidthModel};

    fn integrate(profile: &dyn PeakProfile, center: f64, fwhm: f64, dr: f64, rmax: f64) -> f64 {
        let n = (rmax / dr).round() as usize;
        (0..n)
            .map(|k| profile.y(k as f64 * dr - center, fwhm) * dr)
            .sum()
    }

    #[test]
    fn gaussian_has_unit_area_on_fine_grid() {
        let fwhm = DebyeWallerPeakWidth.calculate_from_msd(0.01);
        assert!((fwhm - 0.2355).abs() < 1e-4);
        let area = integrate(&GaussianProfile::default(), 2.5, fwhm, 0.01, 5.0);
        assert!((area - 1.0).abs() < 1e-6, "area {area}");
    }

    #[test]
    fn gaussian_half_maximum_is_at_half_fwhm() {
        let profile = GaussianProfile::default();
        let peak = profile.y(0.0, 0.4);
        assert!((profile.y(0.2, 0.4) / peak - 0.5).abs() < 1e-12);
        assert!((profile.y(-0.2, 0.4) / peak - 0.5).abs() < 1e-12);
    }

    #[test]
    fn bounds_scale_with_precision() {
        let mut profile = GaussianProfile::default();
        let fwhm = 0.3;
        let bound = profile.xboundhi(fwhm);
        assert!((profile.y(bound, fwhm) / profile.y(0.0, fwhm) - DEFAULT_PEAK_PRECISION).abs() < 1e-12);
        assert_eq!(profile.xboundlo(fwhm), -bound);

        profile.set_attribute("peakprecision", 1e-3).unwrap();
        assert!(profile.xboundhi(fwhm) < bound);
        assert!(profile.set_attribute("peakprecision", 0.0).is_err());
        assert!(profile.set_attribute("peakprecision", 1.0).is_err());
    }

    #[test]
    fn zero_width_gives_zero_profile_and_bounds() {
        let profile = GaussianProfile::default();
        assert_eq!(profile.y(0.0, 0.0), 0.0);
        assert_eq!(profile.xboundhi(0.0), 0.0);
    }

    #[test]
    fn cropped_gaussian_vanishes_at_bounds_and_keeps_unit_area() {
        let mut profile = CroppedGaussianProfile::default();
        profile.set_attribute("peakprecision", 0.01).unwrap();
        let fwhm = 0.5;
        let bound = profile.xboundhi(fwhm);
        assert_eq!(profile.y(bound, fwhm), 0.0);
        assert_eq!(profile.y(-bound - 0.1, fwhm), 0.0);
        let area = integrate(&profile, 3.0, fwhm, 0.001, 6.0);
        assert!((area - 1.0).abs() < 1e-5, "area {area}");
    }

    #[test]
    fn registry_lists_builtin_profiles() {
        let types = peak_profile_types();
        assert!(types.contains("gaussian"));
        assert!(types.contains("croppedgaussian"));
        let profile = create_peak_profile("croppedgaussian").unwrap();
        assert_eq!(profile.precision(), DEFAULT_PEAK_PRECISION);
        assert!(create_peak_profile("voigt").is_err());
    }
}
