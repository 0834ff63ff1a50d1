//! # Structure Module
//!
//! The fixed query interface through which the calculators read a structure.
//!
//! ## Overview
//!
//! A [`StructureAdapter`] answers per-site questions (position, occupancy,
//! displacement tensor, species, multiplicity, symmetry images) and builds the
//! [`BondGenerator`] that enumerates pairs for it. Three variants ship with the
//! crate:
//!
//! - [`periodic::PeriodicStructureAdapter`] - Borrows a lattice structure; periodic
//!   images are produced lazily by the bond generator.
//! - [`crystal::CrystalStructureAdapter`] - Owns an asymmetric unit expanded eagerly
//!   through its symmetry images.
//! - [`molecule::MoleculeAdapter`] - Owns a finite, aperiodic set of atoms.

pub mod crystal;
pub mod hints;
pub mod molecule;
pub mod periodic;

pub use crate::core::models::StructureError;
pub use hints::QuantityHints;

use crate::core::bonds::generator::BondGenerator;
use crate::core::models::lattice::Lattice;
use nalgebra::{Matrix3, Point3};

/// Read-only view of a structure used by pair quantities.
///
/// Site indices run over `0..count_sites()`. Passing an index outside that
/// range is a caller bug and panics.
pub trait StructureAdapter: Send + Sync {
    fn count_sites(&self) -> usize;

    fn site_cartesian_position(&self, index: usize) -> Point3<f64>;

    fn site_occupancy(&self, index: usize) -> f64;

    fn site_anisotropy(&self, index: usize) -> bool;

    /// Displacement tensor of the site in the cartesian frame. Isotropic sites
    /// return `Uiso·I`.
    fn site_cartesian_uij(&self, index: usize) -> Matrix3<f64>;

    fn site_atom_type(&self, index: usize) -> &str;

    fn site_multiplicity(&self, _index: usize) -> usize {
        1
    }

    /// Atoms per unit volume, or 0 for aperiodic structures.
    fn number_density(&self) -> f64 {
        0.0
    }

    fn lattice(&self) -> Option<&Lattice> {
        None
    }

    fn symmetry_image_count(&self, _index: usize) -> usize {
        1
    }

    /// Cartesian position of symmetry image `image` of site `index`.
    ///
    /// # Panics
    ///
    /// Panics if `image >= symmetry_image_count(index)`.
    fn symmetry_image_position(&self, index: usize, image: usize) -> Point3<f64> {
        assert_eq!(image, 0, "site {index} has a single symmetry image");
        self.site_cartesian_position(index)
    }

    fn symmetry_image_uij(&self, index: usize, image: usize) -> Matrix3<f64> {
        assert_eq!(image, 0, "site {index} has a single symmetry image");
        self.site_cartesian_uij(index)
    }

    /// Sum of `occupancy · multiplicity` over all sites.
    fn total_occupancy(&self) -> f64 {
        (0..self.count_sites())
            .map(|i| self.site_occupancy(i) * self.site_multiplicity(i) as f64)
            .sum()
    }

    /// Lets the structure pass calculator settings along with itself.
    ///
    /// # Arguments
    ///
    /// * `hints` - Collected before every evaluation and applied by the
    ///   calculator to its own configuration.
    fn custom_pq_config(&self, _hints: &mut QuantityHints) {}

    fn create_bond_generator(&self) -> BondGenerator<'_>;
}

/// Baseline slope implied by a number density, `-4πρ`.
pub(crate) fn baseline_slope_for_density(density: f64) -> f64 {
    -4.0 * std::f64::consts::PI * density
}
