use super::{StructureAdapter, StructureError};
use crate::core::bonds::generator::BondGenerator;
use crate::core::models::site::Site;
use crate::core::models::source::Molecule;
use nalgebra::{Matrix3, Point3};

/// Owning adapter over a [`Molecule`]. Always aperiodic; coordinates and Uij
/// are taken as cartesian.
#[derive(Debug, Clone)]
pub struct MoleculeAdapter {
    sites: Vec<Site>,
}

impl MoleculeAdapter {
    pub fn new(molecule: &Molecule) -> Result<Self, StructureError> {
        let sites = molecule
            .atoms
            .iter()
            .enumerate()
            .map(|(index, atom)| {
                Site::new(
                    index,
                    atom.atom_type.as_str(),
                    Point3::from(atom.xyz),
                    atom.occupancy,
                    atom.displacement(index)?,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { sites })
    }
}

impl StructureAdapter for MoleculeAdapter {
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

    fn create_bond_generator(&self) -> BondGenerator<'_> {
        BondGenerator::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::source::AtomRecord;
    use crate::core::structure::QuantityHints;
    use nalgebra::Vector3;

    #[test]
    fn molecule_is_aperiodic_with_zero_density() {
        let molecule = Molecule::new()
            .with_atom(AtomRecord::new("C", Vector3::zeros()).with_uiso(0.004))
            .with_atom(AtomRecord::new("O", Vector3::new(0.0, 0.0, 1.13)));
        let adapter = MoleculeAdapter::new(&molecule).unwrap();
        assert_eq!(adapter.count_sites(), 2);
        assert_eq!(adapter.number_density(), 0.0);
        assert!(adapter.lattice().is_none());
        assert_eq!(adapter.site_multiplicity(1), 1);
        assert_eq!(adapter.symmetry_image_count(0), 1);
        assert_eq!(
            adapter.symmetry_image_position(1, 0),
            Point3::new(0.0, 0.0, 1.13)
        );
        assert_eq!(adapter.site_cartesian_uij(0), Matrix3::identity() * 0.004);
    }

    #[test]
    fn default_hook_leaves_hints_untouched() {
        let molecule = Molecule::new().with_atom(AtomRecord::new("C", Vector3::zeros()));
        let adapter = MoleculeAdapter::new(&molecule).unwrap();
        let mut hints = QuantityHints::new();
        adapter.custom_pq_config(&mut hints);
        assert!(hints.is_empty());
    }

    #[test]
    #[should_panic]
    fn second_symmetry_image_of_molecule_site_panics() {
        let molecule = Molecule::new().with_atom(AtomRecord::new("C", Vector3::zeros()));
        let adapter = MoleculeAdapter::new(&molecule).unwrap();
        adapter.symmetry_image_position(0, 1);
    }
}
