use super::{QuantityHints, StructureAdapter, StructureError, baseline_slope_for_density};
use crate::core::bonds::generator::BondGenerator;
use crate::core::models::lattice::Lattice;
use crate::core::models::site::{Displacement, Site};
use crate::core::models::source::Crystal;
use nalgebra::{Matrix3, Point3, Vector3};
use tracing::debug;

/// Fractional distance below which two wrapped images are the same position.
pub const DUPLICATE_IMAGE_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
struct ExpandedImage {
    fractional: Vector3<f64>,
    position: Point3<f64>,
    uij: Matrix3<f64>,
}

/// Owning adapter over a [`Crystal`] whose asymmetric sites are expanded into
/// their unique symmetry images at construction.
///
/// Each asymmetric site is one anchor; its multiplicity is the number of
/// distinct images inside the unit cell.
#[derive(Debug, Clone)]
pub struct CrystalStructureAdapter {
    lattice: Lattice,
    sites: Vec<Site>,
    images: Vec<Vec<ExpandedImage>>,
    number_density: f64,
}

impl CrystalStructureAdapter {
    /// Expands the symmetry images of `crystal` and validates every site.
    pub fn new(crystal: &Crystal) -> Result<Self, StructureError> {
        let lattice = crystal.lattice.clone();
        let mut sites = Vec::with_capacity(crystal.sites.len());
        let mut images = Vec::with_capacity(crystal.sites.len());

        for (index, asymmetric) in crystal.sites.iter().enumerate() {
            if asymmetric.images.is_empty() {
                return Err(StructureError::EmptySymmetryImages { index });
            }
            let displacement = asymmetric.atom.displacement(index)?;
            let cartesian_uij = match displacement {
                Displacement::Anisotropic(uij) => lattice.cartesian_uij(&uij),
                Displacement::Isotropic(uiso) => Matrix3::identity() * uiso,
            };

            let mut unique: Vec<ExpandedImage> = Vec::with_capacity(asymmetric.images.len());
            for image in &asymmetric.images {
                let fractional = Lattice::wrap_fractional(&image.position);
                if unique
                    .iter()
                    .any(|seen| same_fractional_position(&seen.fractional, &fractional))
                {
                    continue;
                }
                let rotation = lattice.cartesian_rotation(&image.rotation);
                unique.push(ExpandedImage {
                    fractional,
                    position: lattice.cartesian(&fractional),
                    uij: rotation * cartesian_uij * rotation.transpose(),
                });
            }

            let anchor = &unique[0];
            let anchor_displacement = if displacement.is_anisotropic() {
                Displacement::Anisotropic(anchor.uij)
            } else {
                displacement
            };
            let mut site = Site::new(
                index,
                asymmetric.atom.atom_type.as_str(),
                anchor.position,
                asymmetric.atom.occupancy,
                anchor_displacement,
            )?;
            site.multiplicity = unique.len();
            debug!(
                site = index,
                images = asymmetric.images.len(),
                unique = unique.len(),
                "Expanded asymmetric site."
            );
            sites.push(site);
            images.push(unique);
        }

        let total_occupancy: f64 = sites
            .iter()
            .map(|s| s.occupancy * s.multiplicity as f64)
            .sum();
        let number_density = total_occupancy / lattice.volume();
        Ok(Self {
            lattice,
            sites,
            images,
            number_density,
        })
    }
}

fn same_fractional_position(a: &Vector3<f64>, b: &Vector3<f64>) -> bool {
    (a - b).iter().all(|d| {
        let d = d - d.round();
        d.abs() < DUPLICATE_IMAGE_TOLERANCE
    })
}

impl StructureAdapter for CrystalStructureAdapter {
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

    fn site_multiplicity(&self, index: usize) -> usize {
        self.sites[index].multiplicity
    }

    fn number_density(&self) -> f64 {
        self.number_density
    }

    fn lattice(&self) -> Option<&Lattice> {
        Some(&self.lattice)
    }

    fn symmetry_image_count(&self, index: usize) -> usize {
        self.images[index].len()
    }

    fn symmetry_image_position(&self, index: usize, image: usize) -> Point3<f64> {
        self.images[index][image].position
    }

    fn symmetry_image_uij(&self, index: usize, image: usize) -> Matrix3<f64> {
        self.images[index][image].uij
    }

    fn custom_pq_config(&self, hints: &mut QuantityHints) {
        if self.number_density > 0.0 {
            hints.baseline_slope = Some(baseline_slope_for_density(self.number_density));
        }
    }

    fn create_bond_generator(&self) -> BondGenerator<'_> {
        BondGenerator::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::source::{AsymmetricSite, AtomRecord};

    fn mirror_z() -> Matrix3<f64> {
        Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, -1.0))
    }

    #[test]
    fn coincident_images_are_merged_after_wrapping() {
        let crystal = Crystal::new(Lattice::cubic(3.0).unwrap()).with_site(
            AsymmetricSite::new(AtomRecord::new("Si", Vector3::new(0.0, 0.0, 0.0)))
                .with_image(Vector3::new(1.0, 0.0, -1.0), Matrix3::identity())
                .with_image(Vector3::new(0.99999, 0.0, 0.0), Matrix3::identity())
                .with_image(Vector3::new(0.5, 0.5, 0.0), Matrix3::identity()),
        );
        let adapter = CrystalStructureAdapter::new(&crystal).unwrap();
        assert_eq!(adapter.symmetry_image_count(0), 2);
        assert_eq!(adapter.site_multiplicity(0), 2);
        assert!((adapter.total_occupancy() - 2.0).abs() < 1e-12);
        assert!((adapter.number_density() - 2.0 / 27.0).abs() < 1e-12);
    }

    #[test]
    fn images_are_wrapped_into_the_cell() {
        let crystal = Crystal::new(Lattice::cubic(2.0).unwrap()).with_site(
            AsymmetricSite::new(AtomRecord::new("O", Vector3::new(0.25, 0.0, 0.0)))
                .with_image(Vector3::new(-0.25, 0.0, 0.0), Matrix3::identity()),
        );
        let adapter = CrystalStructureAdapter::new(&crystal).unwrap();
        let position = adapter.symmetry_image_position(0, 1);
        assert!((position - Point3::new(1.5, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn anisotropic_tensor_is_rotated_per_image() {
        let uij = Matrix3::new(0.01, 0.0, 0.003, 0.0, 0.01, 0.0, 0.003, 0.0, 0.02);
        let crystal = Crystal::new(Lattice::cubic(5.0).unwrap()).with_site(
            AsymmetricSite::new(AtomRecord::new("Ti", Vector3::new(0.1, 0.1, 0.1)).with_uij(uij))
                .with_image(Vector3::new(0.1, 0.1, 0.9), mirror_z()),
        );
        let adapter = CrystalStructureAdapter::new(&crystal).unwrap();
        let rotated = adapter.symmetry_image_uij(0, 1);
        assert!((rotated[(0, 2)] + 0.003).abs() < 1e-12);
        assert!((rotated[(2, 2)] - 0.02).abs() < 1e-12);
        assert!((adapter.symmetry_image_uij(0, 0) - uij).norm() < 1e-12);
    }

    #[test]
    fn empty_image_list_is_rejected() {
        let mut site = AsymmetricSite::new(AtomRecord::new("Si", Vector3::zeros()));
        site.images.clear();
        let crystal = Crystal::new(Lattice::cubic(3.0).unwrap()).with_site(site);
        assert_eq!(
            CrystalStructureAdapter::new(&crystal).unwrap_err(),
            StructureError::EmptySymmetryImages { index: 0 }
        );
    }

    #[test]
    fn custom_pq_config_sets_negative_slope() {
        let crystal = Crystal::new(Lattice::cubic(2.0).unwrap())
            .with_site(AsymmetricSite::new(AtomRecord::new("Cu", Vector3::zeros())));
        let adapter = CrystalStructureAdapter::new(&crystal).unwrap();
        let mut hints = QuantityHints::new();
        adapter.custom_pq_config(&mut hints);
        assert!(hints.baseline_slope.unwrap() < 0.0);
    }
}
