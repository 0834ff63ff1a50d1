//! # Models Module
//!
//! Immutable data records describing the structures a PDF is computed from.
//!
//! ## Overview
//!
//! - [`lattice`] - Unit cell geometry and coordinate transforms.
//! - [`site`] - Validated, cartesian-frame atom sites as seen by the bond generator.
//! - [`source`] - Plain in-memory records (periodic structure, crystal, molecule)
//!   that the structure adapters consume.

pub mod lattice;
pub mod site;
pub mod source;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StructureError {
    #[error("Occupancy {value} of site {index} is outside [0, 1]")]
    InvalidOccupancy { index: usize, value: f64 },

    #[error("Site {index} has an invalid displacement tensor: {reason}")]
    InvalidDisplacement { index: usize, reason: String },

    #[error("Site {index} is anisotropic but carries no Uij tensor")]
    MissingDisplacementTensor { index: usize },

    #[error("Site {index} has no symmetry images")]
    EmptySymmetryImages { index: usize },

    #[error("Degenerate lattice: {0}")]
    DegenerateLattice(String),
}
