use super::StructureError;
use nalgebra::{Matrix3, Point3, SymmetricEigen};

const SYMMETRY_TOLERANCE: f64 = 1e-10;
const EIGENVALUE_TOLERANCE: f64 = 1e-12;

/// Atomic displacement parameters of a site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Displacement {
    Isotropic(f64),
    Anisotropic(Matrix3<f64>),
}

impl Default for Displacement {
    fn default() -> Self {
        Displacement::Isotropic(0.0)
    }
}

impl Displacement {
    pub fn is_anisotropic(&self) -> bool {
        matches!(self, Displacement::Anisotropic(_))
    }

    /// Full Uij tensor; isotropic values are expanded to `Uiso·I`.
    pub fn tensor(&self) -> Matrix3<f64> {
        match self {
            Displacement::Isotropic(uiso) => Matrix3::identity() * *uiso,
            Displacement::Anisotropic(uij) => *uij,
        }
    }

    /// Largest principal mean-square displacement.
    pub fn max_eigenvalue(&self) -> f64 {
        match self {
            Displacement::Isotropic(uiso) => *uiso,
            Displacement::Anisotropic(uij) => SymmetricEigen::new(*uij)
                .eigenvalues
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max),
        }
    }

    pub fn validate(&self, index: usize) -> Result<(), StructureError> {
        let invalid = |reason: String| StructureError::InvalidDisplacement { index, reason };
        match self {
            Displacement::Isotropic(uiso) => {
                if !uiso.is_finite() || *uiso < 0.0 {
                    return Err(invalid(format!("Uiso {uiso} must be finite and >= 0")));
                }
            }
            Displacement::Anisotropic(uij) => {
                if uij.iter().any(|v| !v.is_finite()) {
                    return Err(invalid("tensor has non-finite components".to_string()));
                }
                let scale = uij.amax().max(1.0);
                if (uij - uij.transpose()).amax() > SYMMETRY_TOLERANCE * scale {
                    return Err(invalid("tensor is not symmetric".to_string()));
                }
                let min_eigenvalue = SymmetricEigen::new(*uij)
                    .eigenvalues
                    .iter()
                    .copied()
                    .fold(f64::INFINITY, f64::min);
                if min_eigenvalue < -EIGENVALUE_TOLERANCE * scale {
                    return Err(invalid(format!(
                        "tensor is not positive semi-definite (eigenvalue {min_eigenvalue})"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A validated atom site in the cartesian frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub position: Point3<f64>,
    pub occupancy: f64,
    pub displacement: Displacement,
    pub atom_type: String,
    pub multiplicity: usize,
}

impl Site {
    pub fn new(
        index: usize,
        atom_type: impl Into<String>,
        position: Point3<f64>,
        occupancy: f64,
        displacement: Displacement,
    ) -> Result<Self, StructureError> {
        if !(0.0..=1.0).contains(&occupancy) {
            return Err(StructureError::InvalidOccupancy {
                index,
                value: occupancy,
            });
        }
        displacement.validate(index)?;
        Ok(Self {
            position,
            occupancy,
            displacement,
            atom_type: atom_type.into(),
            multiplicity: 1,
        })
    }

    pub fn uij(&self) -> Matrix3<f64> {
        self.displacement.tensor()
    }
}
