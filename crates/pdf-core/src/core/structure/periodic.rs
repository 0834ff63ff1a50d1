use super::{QuantityHints, StructureAdapter, StructureError, baseline_slope_for_density};
use crate::core::bonds::generator::BondGenerator;
use crate::core::models::lattice::Lattice;
use crate::core::models::site::{Displacement, Site};
use crate::core::models::source::PeriodicStructure;
use nalgebra::{Matrix3, Point3};

/// Adapter over a borrowed [`PeriodicStructure`].
///
/// Only the cartesian form of each atom is cached; periodic images come from
/// the bond generator's lattice sphere.
#[derive(Debug, Clone)]
pub struct PeriodicStructureAdapter<'s> {
    source: &'s PeriodicStructure,
    sites: Vec<Site>,
    number_density: f64,
}

impl<'s> PeriodicStructureAdapter<'s> {
    pub fn new(source: &'s PeriodicStructure) -> Result<Self, StructureError> {
        let lattice = &source.lattice;
        let sites = source
            .atoms
            .iter()
            .enumerate()
            .map(|(index, atom)| {
                let displacement = match atom.displacement(index)? {
                    Displacement::Anisotropic(uij) => {
                        Displacement::Anisotropic(lattice.cartesian_uij(&uij))
                    }
                    isotropic => isotropic,
                };
                Site::new(
                    index,
                    atom.atom_type.as_str(),
                    lattice.cartesian(&atom.xyz),
                    atom.occupancy,
                    displacement,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let total_occupancy: f64 = sites.iter().map(|s| s.occupancy).sum();
        Ok(Self {
            source,
            sites,
            number_density: total_occupancy / lattice.volume(),
        })
    }

    pub fn source(&self) -> &'s PeriodicStructure {
        self.source
    }
}

impl StructureAdapter for PeriodicStructureAdapter<'_> {
    fn count_sites(&self) -> usize {
        self.sites.len()
    }

    fn site_cartesian_position(&self, index: usize) -> Point3<f64> {
        self.sites[index].position
    }

    fn site_occupancy(&self, index: usize) -> f64 {
        self.sites[index].occupancy
    }

    fn site_anisotropy(&self, index: usize) -> bool {
        self.sites[index].displacement.is_anisotropic()
    }

    fn site_cartesian_uij(&self, index: usize) -> Matrix3<f64> {
        self.sites[index].uij()
    }

    fn site_atom_type(&self, index: usize) -> &str {
        &self.sites[index].atom_type
    }

    fn number_density(&self) -> f64 {
        self.number_density
    }

    fn lattice(&self) -> Option<&Lattice> {
        Some(&self.source.lattice)
    }

    fn custom_pq_config(&self, hints: &mut QuantityHints) {
        if self.number_density > 0.0 {
            hints.baseline_slope = Some(baseline_slope_for_density(self.number_density));
        }
        hints.parameters.extend(
            self.source
                .pdf_parameters
                .iter()
                .map(|(name, value)| (name.clone(), *value)),
        );
    }

    fn create_bond_generator(&self) -> BondGenerator<'_> {
        BondGenerator::new(self)
    }
}
