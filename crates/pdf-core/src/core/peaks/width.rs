use crate::core::attributes::{AttributeError, Attributes, require_finite, require_non_negative};
use crate::core::bonds::Bond;
use crate::core::models::site::Displacement;
use crate::core::registry::{RegistryError, TypeRegistry};
use crate::core::structure::StructureAdapter;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

/// `2·sqrt(2·ln 2)`, the FWHM of a unit-variance gaussian.
pub const TO_FWHM: f64 = 2.354_820_045_030_949_3;

/// Maps bond displacement statistics to a peak full width at half maximum.
pub trait PeakWidthModel: Attributes + Send + Sync + fmt::Debug {
    fn type_tag(&self) -> &'static str;

    fn calculate(&self, bond: &Bond) -> f64;

    /// # Panics
    ///
    /// Panics if `msd` is negative.
    fn calculate_from_msd(&self, msd: f64) -> f64;

    /// Upper bound of the width over all bonds of `structure` with distances
    /// in `[rmin, rmax]`.
    fn max_width(&self, structure: &dyn StructureAdapter, rmin: f64, rmax: f64) -> f64;

    fn create(&self) -> Box<dyn PeakWidthModel>;

    fn clone_box(&self) -> Box<dyn PeakWidthModel>;
}

impl crate::core::registry::Prototype for dyn PeakWidthModel {
    fn type_tag(&self) -> &str {
        PeakWidthModel::type_tag(self)
    }

    fn create(&self) -> Box<Self> {
        PeakWidthModel::create(self)
    }
}

impl Clone for Box<dyn PeakWidthModel> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

static PEAK_WIDTH_MODELS: LazyLock<TypeRegistry<dyn PeakWidthModel>> = LazyLock::new(|| {
    TypeRegistry::with_builtins(
        "peak width model",
        vec![
            Box::new(DebyeWallerPeakWidth) as Box<dyn PeakWidthModel>,
            Box::new(JeongPeakWidth::default()),
            Box::new(ConstantPeakWidth::default()),
        ],
    )
});

pub fn create_peak_width_model(tag: &str) -> Result<Box<dyn PeakWidthModel>, RegistryError> {
    PEAK_WIDTH_MODELS.create(tag)
}

pub fn register_peak_width_model(prototype: Box<dyn PeakWidthModel>) -> Result<(), RegistryError> {
    PEAK_WIDTH_MODELS.register(prototype)
}

pub fn peak_width_model_types() -> BTreeSet<String> {
    PEAK_WIDTH_MODELS.tags()
}

/// Largest bond msd the structure can produce: twice the largest Uij
/// eigenvalue over all sites.
pub fn max_structure_msd(structure: &dyn StructureAdapter) -> f64 {
    let max_eigenvalue = (0..structure.count_sites())
        .map(|i| Displacement::Anisotropic(structure.site_cartesian_uij(i)).max_eigenvalue())
        .fold(0.0, f64::max);
    2.0 * max_eigenvalue
}

fn debye_waller_fwhm(msd: f64) -> f64 {
    assert!(msd >= 0.0, "mean-square displacement must not be negative, got {msd}");
    TO_FWHM * msd.sqrt()
}

/// Gaussian width from thermal displacement alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DebyeWallerPeakWidth;

impl Attributes for DebyeWallerPeakWidth {
    fn set_attribute(&mut self, name: &str, _value: f64) -> Result<(), AttributeError> {
        Err(AttributeError::unknown(self.type_tag(), name))
    }
}

impl PeakWidthModel for DebyeWallerPeakWidth {
    fn type_tag(&self) -> &'static str {
        "debye-waller"
    }

    fn calculate(&self, bond: &Bond) -> f64 {
        self.calculate_from_msd(bond.msd)
    }

    fn calculate_from_msd(&self, msd: f64) -> f64 {
        debye_waller_fwhm(msd)
    }

    fn max_width(&self, structure: &dyn StructureAdapter, _rmin: f64, _rmax: f64) -> f64 {
        self.calculate_from_msd(max_structure_msd(structure))
    }

    fn create(&self) -> Box<dyn PeakWidthModel> {
        Box::new(DebyeWallerPeakWidth)
    }

    fn clone_box(&self) -> Box<dyn PeakWidthModel> {
        Box::new(*self)
    }
}

/// Debye-Waller width with correlated-motion sharpening (`delta1`, `delta2`)
/// and resolution broadening (`qbroad`).
///
/// The sharpening terms are non-negative, so the width grows with `r` and
/// [`PeakWidthModel::max_width`] is attained at a window end.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JeongPeakWidth {
    pub delta1: f64,
    pub delta2: f64,
    pub qbroad: f64,
}

impl JeongPeakWidth {
    /// Squared scaling applied to the Debye-Waller width at distance `r`.
    fn width_factor_squared(&self, r: f64) -> f64 {
        if r <= 0.0 {
            return 1.0;
        }
        1.0 - self.delta1 / r - self.delta2 / (r * r) + (self.qbroad * r).powi(2)
    }

    pub fn calculate_at(&self, msd: f64, r: f64) -> f64 {
        let factor = self.width_factor_squared(r);
        if factor <= 0.0 {
            return 0.0;
        }
        debye_waller_fwhm(msd) * factor.sqrt()
    }
}

impl Attributes for JeongPeakWidth {
    fn attribute_names(&self) -> &'static [&'static str] {
        &["delta1", "delta2", "qbroad"]
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        match name {
            "delta1" => Some(self.delta1),
            "delta2" => Some(self.delta2),
            "qbroad" => Some(self.qbroad),
            _ => None,
        }
    }

    fn set_attribute(&mut self, name: &str, value: f64) -> Result<(), AttributeError> {
        match name {
            "delta1" => self.delta1 = require_non_negative(name, require_finite(name, value)?)?,
            "delta2" => self.delta2 = require_non_negative(name, require_finite(name, value)?)?,
            "qbroad" => self.qbroad = require_finite(name, value)?,
            _ => return Err(AttributeError::unknown(self.type_tag(), name)),
        }
        Ok(())
    }
}

impl PeakWidthModel for JeongPeakWidth {
    fn type_tag(&self) -> &'static str {
        "jeong"
    }

    fn calculate(&self, bond: &Bond) -> f64 {
        self.calculate_at(bond.msd, bond.distance)
    }

    fn calculate_from_msd(&self, msd: f64) -> f64 {
        debye_waller_fwhm(msd)
    }

    fn max_width(&self, structure: &dyn StructureAdapter, rmin: f64, rmax: f64) -> f64 {
        let msd = max_structure_msd(structure);
        self.calculate_at(msd, rmin)
            .max(self.calculate_at(msd, rmax))
    }

    fn create(&self) -> Box<dyn PeakWidthModel> {
        Box::new(JeongPeakWidth::default())
    }

    fn clone_box(&self) -> Box<dyn PeakWidthModel> {
        Box::new(*self)
    }
}

/// The same width for every bond.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConstantPeakWidth {
    pub width: f64,
}

impl Attributes for ConstantPeakWidth {
    fn attribute_names(&self) -> &'static [&'static str] {
        &["width"]
    }

    fn attribute(&self, name: &str) -> Option<f64> {
        (name == "width").then_some(self.width)
    }

    fn set_attribute(&mut self, name: &str, value: f64) -> Result<(), AttributeError> {
        match name {
            "width" => {
                self.width = require_non_negative(name, require_finite(name, value)?)?;
                Ok(())
            }
            _ => Err(AttributeError::unknown(self.type_tag(), name)),
        }
    }
}

impl PeakWidthModel for ConstantPeakWidth {
    fn type_tag(&self) -> &'static str {
        "constant"
    }

    fn calculate(&self, _bond: &Bond) -> f64 {
        self.width
    }

    fn calculate_from_msd(&self, msd: f64) -> f64 {
        assert!(msd >= 0.0, "mean-square displacement must not be negative, got {msd}");
        self.width
    }

    fn max_width(&self, _structure: &dyn StructureAdapter, _rmin: f64, _rmax: f64) -> f64 {
        self.width
    }

    fn create(&self) -> Box<dyn PeakWidthModel> {
        Box::new(ConstantPeakWidth::default())
    }

    fn clone_box(&self) -> Box<dyn PeakWidthModel> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::source::{AtomRecord, Molecule};
    use crate::core::structure::molecule::MoleculeAdapter;
    use nalgebra::{Matrix3, Point3, Vector3};

    fn bond(msd: f64, distance: f64) -> Bond {
        Bond {
            site0: 0,
            site1: 1,
            r0: Point3::origin(),
            r1: Point3::new(distance, 0.0, 0.0),
            distance,
            msd,
        }
    }

    #[test]
    fn debye_waller_width_matches_gaussian_fwhm() {
        let model = DebyeWallerPeakWidth;
        assert!((model.calculate_from_msd(0.01) - 0.235_482_004_5).abs() < 1e-9);
        assert_eq!(model.calculate_from_msd(0.0), 0.0);
        assert_eq!(model.calculate(&bond(0.01, 2.0)), model.calculate_from_msd(0.01));
    }

    #[test]
    #[should_panic]
    fn negative_msd_panics() {
        DebyeWallerPeakWidth.calculate_from_msd(-1e-6);
    }

    #[test]
    fn jeong_without_corrections_equals_debye_waller() {
        let jeong = JeongPeakWidth::default();
        let b = bond(0.008, 3.0);
        assert!((jeong.calculate(&b) - DebyeWallerPeakWidth.calculate(&b)).abs() < 1e-15);
    }

    #[test]
    fn jeong_sharpens_short_bonds() {
        let mut jeong = JeongPeakWidth::default();
        jeong.set_attribute("delta2", 2.0).unwrap();
        let dw = DebyeWallerPeakWidth.calculate(&bond(0.01, 2.0));
        let expected = dw * (1.0f64 - 2.0 / 4.0).sqrt();
        assert!((jeong.calculate(&bond(0.01, 2.0)) - expected).abs() < 1e-12);
    }

    #[test]
    fn jeong_width_is_zero_when_correction_collapses() {
        let mut jeong = JeongPeakWidth::default();
        jeong.set_attribute("delta1", 5.0).unwrap();
        assert_eq!(jeong.calculate(&bond(0.01, 2.0)), 0.0);
    }

    #[test]
    fn jeong_rejects_negative_sharpening() {
        let mut jeong = JeongPeakWidth::default();
        for name in ["delta1", "delta2"] {
            assert!(matches!(
                jeong.set_attribute(name, -0.5),
                Err(AttributeError::InvalidValue { .. })
            ));
        }
        assert_eq!(jeong, JeongPeakWidth::default());
        jeong.set_attribute("qbroad", -0.01).unwrap();
    }

    #[test]
    fn jeong_max_width_bounds_every_distance_in_window() {
        let molecule = Molecule::new()
            .with_atom(AtomRecord::new("C", Vector3::zeros()).with_uiso(0.004))
            .with_atom(AtomRecord::new("O", Vector3::new(1.2, 0.0, 0.0)).with_uiso(0.009));
        let adapter = MoleculeAdapter::new(&molecule).unwrap();
        let jeong = JeongPeakWidth {
            delta1: 0.4,
            delta2: 1.5,
            qbroad: 0.03,
        };
        let msd = max_structure_msd(&adapter);
        for (rmin, rmax) in [(0.0, 10.0), (0.5, 3.0), (2.0, 20.0)] {
            let bound = jeong.max_width(&adapter, rmin, rmax);
            for k in 0..=200 {
                let r = rmin + (rmax - rmin) * k as f64 / 200.0;
                assert!(jeong.calculate_at(msd, r) <= bound + 1e-12, "r = {r}");
            }
        }
    }

    #[test]
    fn width_increases_strictly_with_msd() {
        let jeong = JeongPeakWidth {
            delta1: 0.2,
            delta2: 0.5,
            qbroad: 0.01,
        };
        let models: [&dyn PeakWidthModel; 2] = [&DebyeWallerPeakWidth, &jeong];
        let msds = [0.0, 1e-4, 0.002, 0.005, 0.01, 0.05, 0.2];
        for model in models {
            let widths: Vec<f64> = msds.iter().map(|&m| model.calculate_from_msd(m)).collect();
            assert!(
                widths.windows(2).all(|w| w[0] < w[1]),
                "{}: {widths:?}",
                model.type_tag()
            );
        }
    }

    #[test]
    fn jeong_attributes_round_trip_and_reject_unknown_names() {
        let mut jeong = JeongPeakWidth::default();
        jeong.set_attribute("qbroad", 0.02).unwrap();
        assert_eq!(jeong.attribute("qbroad"), Some(0.02));
        assert!(jeong.has_attribute("delta1"));
        assert!(matches!(
            jeong.set_attribute("width", 1.0),
            Err(AttributeError::Unknown { .. })
        ));
    }

    #[test]
    fn max_width_uses_twice_the_largest_eigenvalue() {
        let uij = Matrix3::from_diagonal(&Vector3::new(0.002, 0.008, 0.004));
        let molecule = Molecule::new()
            .with_atom(AtomRecord::new("C", Vector3::zeros()).with_uiso(0.003))
            .with_atom(AtomRecord::new("O", Vector3::new(1.2, 0.0, 0.0)).with_uij(uij));
        let adapter = MoleculeAdapter::new(&molecule).unwrap();
        assert!((max_structure_msd(&adapter) - 0.016).abs() < 1e-12);
        let expected = DebyeWallerPeakWidth.calculate_from_msd(0.016);
        assert!((DebyeWallerPeakWidth.max_width(&adapter, 0.0, 10.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn registry_creates_builtin_models() {
        let types = peak_width_model_types();
        for tag in ["constant", "debye-waller", "jeong"] {
            assert!(types.contains(tag));
            assert_eq!(create_peak_width_model(tag).unwrap().type_tag(), tag);
        }
        assert!(matches!(
            create_peak_width_model("lorentzian"),
            Err(RegistryError::UnknownType { .. })
        ));
    }

    #[test]
    fn clone_box_keeps_parameters_while_create_resets_them() {
        let mut model = create_peak_width_model("constant").unwrap();
        model.set_attribute("width", 0.3).unwrap();
        let cloned = model.clone();
        assert_eq!(cloned.attribute("width"), Some(0.3));
        assert_eq!(PeakWidthModel::create(cloned.as_ref()).attribute("width"), Some(0.0));
    }

    #[test]
    fn duplicate_builtin_registration_is_rejected() {
        let err = register_peak_width_model(Box::new(DebyeWallerPeakWidth)).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateType { .. }));
    }
}
