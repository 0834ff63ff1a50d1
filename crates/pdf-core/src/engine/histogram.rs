use super::cache::StructureCache;
use super::grid::RGrid;
use super::quantity::PairQuantity;
use crate::core::bonds::{Bond, BondGenerator};
use crate::core::peaks::profile::PeakProfile;
use crate::core::peaks::width::PeakWidthModel;
use crate::core::structure::StructureAdapter;

/// Scattering-weighted peak histogram on the calculation grid.
///
/// Each bond contributes a unit-area peak centered at its distance, weighted
/// by `scale/2 · f_i · f_j · mult_i`. Bonds are accepted only when their
/// center falls on the grid span.
#[derive(Debug, Clone)]
pub struct PdfHistogram<'c> {
    grid: RGrid,
    width: &'c dyn PeakWidthModel,
    profile: &'c dyn PeakProfile,
    cache: &'c StructureCache,
    values: Vec<f64>,
}

impl<'c> PdfHistogram<'c> {
    pub fn new(
        grid: RGrid,
        width: &'c dyn PeakWidthModel,
        profile: &'c dyn PeakProfile,
        cache: &'c StructureCache,
    ) -> Self {
        Self {
            grid,
            width,
            profile,
            cache,
            values: vec![0.0; grid.len()],
        }
    }

    pub fn grid(&self) -> &RGrid {
        &self.grid
    }

    /// Consumes the histogram and returns its values on the calculation grid.
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    fn add_peak(&mut self, center: f64, fwhm: f64, weight: f64) {
        if self.grid.is_empty() {
            return;
        }
        if fwhm <= 0.0 {
            if let Some(k) = self.grid.nearest_index(center) {
                self.values[k] += weight / self.grid.rstep;
            }
            return;
        }

        let first = self.grid.first();
        let dr = self.grid.rstep;
        let lo = ((center + self.profile.xboundlo(fwhm) - first) / dr).ceil().max(0.0);
        let hi = ((center + self.profile.xboundhi(fwhm) - first) / dr).floor();
        if hi < lo {
            return;
        }
        let lo = lo as usize;
        let hi = (hi as usize).min(self.grid.len() - 1);

        for k in lo..=hi {
            let x = self.grid.r(k) - center;
            self.values[k] += weight * self.profile.y(x, fwhm);
        }
    }
}

impl PairQuantity for PdfHistogram<'_> {
    fn reset_value(&mut self, _structure: &dyn StructureAdapter) {
        self.values.clear();
        self.values.resize(self.grid.len(), 0.0);
    }

    fn configure_bond_generator(&self, generator: &mut BondGenerator<'_>) {
        generator.set_rmin(self.grid.first().max(0.0));
        generator.set_rmax(self.grid.last());
    }

    fn add_pair_contribution(&mut self, bond: &Bond, summation_scale: f64) {
        let weight = summation_scale / 2.0
            * self.cache.sf_site[bond.site0]
            * self.cache.sf_site[bond.site1]
            * self.cache.multiplicity[bond.site0];
        if weight == 0.0 {
            return;
        }
        let fwhm = self.width.calculate(bond);
        self.add_peak(bond.distance, fwhm, weight);
    }

    fn value(&self) -> &[f64] {
        &self.values
    }

    fn value_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bonds::SummationConvention;
    use crate::core::models::source::{AtomRecord, Molecule};
    use crate::core::peaks::profile::GaussianProfile;
    use crate::core::peaks::width::{ConstantPeakWidth, DebyeWallerPeakWidth};
    use crate::core::scattering::XrayScatteringTable;
    use crate::core::structure::molecule::MoleculeAdapter;
    use crate::engine::progress::ProgressReporter;
    use crate::engine::quantity::evaluate;
    use nalgebra::Vector3;

    fn grid(count: usize) -> RGrid {
        RGrid {
            rmin: 0.0,
            rstep: 0.01,
            lo_points: 0,
            count,
        }
    }

    fn dimer(distance: f64, uiso: f64) -> MoleculeAdapter {
        let molecule = Molecule::new()
            .with_atom(AtomRecord::new("C", Vector3::zeros()).with_uiso(uiso))
            .with_atom(AtomRecord::new("C", Vector3::new(distance, 0.0, 0.0)).with_uiso(uiso));
        MoleculeAdapter::new(&molecule).unwrap()
    }

    fn histogram_of(
        adapter: &MoleculeAdapter,
        width: &dyn PeakWidthModel,
        convention: SummationConvention,
    ) -> (Vec<f64>, StructureCache) {
        let cache = StructureCache::build(adapter, &XrayScatteringTable::default()).unwrap();
        let profile = GaussianProfile::default();
        let values = {
            let mut histogram = PdfHistogram::new(grid(500), width, &profile, &cache);
            evaluate(&mut histogram, adapter, convention, &ProgressReporter::new());
            histogram.into_values()
        };
        (values, cache)
    }

    #[test]
    fn dimer_peak_integrates_to_pair_weight() {
        let adapter = dimer(2.0, 0.005);
        let (values, cache) = histogram_of(
            &adapter,
            &DebyeWallerPeakWidth,
            SummationConvention::UniquePairs,
        );
        let area: f64 = values.iter().sum::<f64>() * 0.01;
        assert!((area - 36.0).abs() < 1e-4, "area = {area}");
        assert!((area * cache.rdf_scale() - 1.0).abs() < 1e-5);

        let peak = values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k)
            .unwrap();
        assert_eq!(peak, 200);
    }

    #[test]
    fn conventions_give_identical_histograms() {
        let adapter = dimer(1.5, 0.003);
        let (unique, _) = histogram_of(
            &adapter,
            &DebyeWallerPeakWidth,
            SummationConvention::UniquePairs,
        );
        let (ordered, _) = histogram_of(
            &adapter,
            &DebyeWallerPeakWidth,
            SummationConvention::OrderedPairs,
        );
        for (a, b) in unique.iter().zip(&ordered) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_width_peak_lands_on_nearest_point() {
        let adapter = dimer(2.003, 0.0);
        let (values, _) = histogram_of(
            &adapter,
            &ConstantPeakWidth { width: 0.0 },
            SummationConvention::UniquePairs,
        );
        assert!((values[200] - 3600.0).abs() < 1e-9);
        assert_eq!(values.iter().filter(|v| **v != 0.0).count(), 1);
    }

    #[test]
    fn bonds_beyond_the_grid_are_ignored() {
        let adapter = dimer(7.0, 0.005);
        let (values, _) = histogram_of(
            &adapter,
            &DebyeWallerPeakWidth,
            SummationConvention::UniquePairs,
        );
        assert!(values.iter().all(|v| *v == 0.0));
    }
}
