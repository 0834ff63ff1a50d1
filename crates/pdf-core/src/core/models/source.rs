use super::StructureError;
use super::lattice::Lattice;
use super::site::Displacement;
use nalgebra::{Matrix3, Vector3};
use std::collections::BTreeMap;

/// One atom as stored in a source structure. `xyz` is fractional for
/// periodic sources and cartesian for molecules; `uij` follows the same frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    pub atom_type: String,
    pub xyz: Vector3<f64>,
    pub occupancy: f64,
    pub anisotropic: bool,
    pub uiso: f64,
    pub uij: Option<Matrix3<f64>>,
}

impl AtomRecord {
    pub fn new(atom_type: impl Into<String>, xyz: Vector3<f64>) -> Self {
        Self {
            atom_type: atom_type.into(),
            xyz,
            occupancy: 1.0,
            anisotropic: false,
            uiso: 0.0,
            uij: None,
        }
    }

    pub fn with_occupancy(mut self, occupancy: f64) -> Self {
        self.occupancy = occupancy;
        self
    }

    pub fn with_uiso(mut self, uiso: f64) -> Self {
        self.anisotropic = false;
        self.uiso = uiso;
        self.uij = None;
        self
    }

    pub fn with_uij(mut self, uij: Matrix3<f64>) -> Self {
        self.anisotropic = true;
        self.uij = Some(uij);
        self
    }

    /// Displacement in the record's own frame.
    pub fn displacement(&self, index: usize) -> Result<Displacement, StructureError> {
        let displacement = if self.anisotropic {
            Displacement::Anisotropic(
                self.uij
                    .ok_or(StructureError::MissingDisplacementTensor { index })?,
            )
        } else {
            Displacement::Isotropic(self.uiso)
        };
        displacement.validate(index)?;
        Ok(displacement)
    }
}

/// A lattice with atoms in fractional coordinates and crystal-frame Uij.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicStructure {
    pub lattice: Lattice,
    pub atoms: Vec<AtomRecord>,
    /// Stored calculator parameters (for example `scale`, `qdamp`, `delta2`)
    /// forwarded to a PDF calculator evaluating this structure.
    pub pdf_parameters: BTreeMap<String, f64>,
}

impl PeriodicStructure {
    pub fn new(lattice: Lattice) -> Self {
        Self {
            lattice,
            atoms: Vec::new(),
            pdf_parameters: BTreeMap::new(),
        }
    }

    pub fn with_atom(mut self, atom: AtomRecord) -> Self {
        self.atoms.push(atom);
        self
    }

    pub fn with_pdf_parameter(mut self, name: impl Into<String>, value: f64) -> Self {
        self.pdf_parameters.insert(name.into(), value);
        self
    }
}

/// Atoms in cartesian coordinates with no periodicity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    pub atoms: Vec<AtomRecord>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_atom(mut self, atom: AtomRecord) -> Self {
        self.atoms.push(atom);
        self
    }
}

/// A symmetry-equivalent copy of an asymmetric site: its fractional position
/// and the rotation part of the generating operation, in fractional coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymmetryImage {
    pub position: Vector3<f64>,
    pub rotation: Matrix3<f64>,
}

/// One site of the asymmetric unit with its symmetry images.
#[derive(Debug, Clone, PartialEq)]
pub struct AsymmetricSite {
    pub atom: AtomRecord,
    pub images: Vec<SymmetryImage>,
}

impl AsymmetricSite {
    /// Seeds the image list with the identity operation.
    pub fn new(atom: AtomRecord) -> Self {
        let identity = SymmetryImage {
            position: atom.xyz,
            rotation: Matrix3::identity(),
        };
        Self {
            atom,
            images: vec![identity],
        }
    }

    /// Adds a fractional image position with its fractional rotation.
    pub fn with_image(mut self, position: Vector3<f64>, rotation: Matrix3<f64>) -> Self {
        self.images.push(SymmetryImage { position, rotation });
        self
    }
}

/// A lattice plus an asymmetric unit whose symmetry images are already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Crystal {
    pub lattice: Lattice,
    pub sites: Vec<AsymmetricSite>,
}

impl Crystal {
    pub fn new(lattice: Lattice) -> Self {
        Self {
            lattice,
            sites: Vec::new(),
        }
    }

    pub fn with_site(mut self, site: AsymmetricSite) -> Self {
        self.sites.push(site);
        self
    }
}
