use super::StructureError;
use nalgebra::{Matrix3, Point3, Vector3};

const DEGENERATE_VOLUME: f64 = 1e-12;

/// Unit cell with basis vectors stored as matrix columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    basis: Matrix3<f64>,
    inverse: Matrix3<f64>,
    reciprocal_lengths: Vector3<f64>,
}

impl Lattice {
    /// Builds a lattice from cartesian cell vectors.
    pub fn from_vectors(
        a: Vector3<f64>,
        b: Vector3<f64>,
        c: Vector3<f64>,
    ) -> Result<Self, StructureError> {
        let basis = Matrix3::from_columns(&[a, b, c]);
        if basis.iter().any(|v| !v.is_finite()) {
            return Err(StructureError::DegenerateLattice(
                "basis vectors must be finite".to_string(),
            ));
        }
        if basis.determinant().abs() < DEGENERATE_VOLUME {
            return Err(StructureError::DegenerateLattice(
                "basis vectors are coplanar".to_string(),
            ));
        }
        let inverse = basis.try_inverse().ok_or_else(|| {
            StructureError::DegenerateLattice("basis matrix is singular".to_string())
        })?;
        // Rows of the inverse are the reciprocal vectors a*, b*, c* (without 2π).
        let reciprocal_lengths = Vector3::new(
            inverse.row(0).norm(),
            inverse.row(1).norm(),
            inverse.row(2).norm(),
        );
        Ok(Self {
            basis,
            inverse,
            reciprocal_lengths,
        })
    }

    /// Builds a cell from lengths and angles in degrees, with `a` along x and
    /// `b` in the xy plane.
    pub fn from_parameters(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self, StructureError> {
        if !(a > 0.0 && b > 0.0 && c > 0.0) {
            return Err(StructureError::DegenerateLattice(format!(
                "cell lengths must be positive, got ({a}, {b}, {c})"
            )));
        }
        let (cos_alpha, cos_beta) = (alpha.to_radians().cos(), beta.to_radians().cos());
        let (sin_gamma, cos_gamma) = gamma.to_radians().sin_cos();
        if sin_gamma.abs() < DEGENERATE_VOLUME {
            return Err(StructureError::DegenerateLattice(format!(
                "gamma of {gamma} degrees collapses the ab plane"
            )));
        }

        let c1 = cos_beta;
        let c2 = (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let c3_squared = 1.0 - c1 * c1 - c2 * c2;
        if c3_squared <= 0.0 {
            return Err(StructureError::DegenerateLattice(format!(
                "angles ({alpha}, {beta}, {gamma}) do not describe a cell"
            )));
        }

        Self::from_vectors(
            Vector3::new(a, 0.0, 0.0),
            Vector3::new(b * cos_gamma, b * sin_gamma, 0.0),
            Vector3::new(c * c1, c * c2, c * c3_squared.sqrt()),
        )
    }

    pub fn cubic(a: f64) -> Result<Self, StructureError> {
        Self::from_parameters(a, a, a, 90.0, 90.0, 90.0)
    }

    pub fn basis(&self) -> &Matrix3<f64> {
        &self.basis
    }

    pub fn inverse(&self) -> &Matrix3<f64> {
        &self.inverse
    }

    pub fn reciprocal_lengths(&self) -> &Vector3<f64> {
        &self.reciprocal_lengths
    }

    /// Cell volume in cubic angstroms.
    pub fn volume(&self) -> f64 {
        self.basis.determinant().abs()
    }

    /// Converts fractional coordinates to a cartesian point.
    pub fn cartesian(&self, fractional: &Vector3<f64>) -> Point3<f64> {
        Point3::from(self.basis * fractional)
    }

    pub fn fractional(&self, cartesian: &Point3<f64>) -> Vector3<f64> {
        self.inverse * cartesian.coords
    }

    /// Maps fractional coordinates into `[0, 1)`.
    pub fn wrap_fractional(fractional: &Vector3<f64>) -> Vector3<f64> {
        fractional.map(|x| {
            let wrapped = x - x.floor();
            if wrapped >= 1.0 { 0.0 } else { wrapped }
        })
    }

    /// Length of the longest body diagonal, an upper bound on the distance
    /// between two points inside one cell.
    pub fn max_cell_diagonal(&self) -> f64 {
        let (a, b, c) = (
            self.basis.column(0).into_owned(),
            self.basis.column(1).into_owned(),
            self.basis.column(2).into_owned(),
        );
        [a + b + c, a + b - c, a - b + c, -a + b + c]
            .iter()
            .map(|d| d.norm())
            .fold(0.0, f64::max)
    }

    /// Converts a Uij tensor expressed in the crystal (fractional, reciprocal
    /// length normalized) frame into the cartesian frame.
    pub fn cartesian_uij(&self, uij: &Matrix3<f64>) -> Matrix3<f64> {
        let m = self.basis * Matrix3::from_diagonal(&self.reciprocal_lengths);
        m * uij * m.transpose()
    }

    /// Cartesian form of a rotation given in fractional coordinates.
    pub fn cartesian_rotation(&self, fractional_rotation: &Matrix3<f64>) -> Matrix3<f64> {
        self.basis * fractional_rotation * self.inverse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    #[test]
    fn cubic_lattice_has_expected_volume_and_reciprocal_lengths() {
        let lattice = Lattice::cubic(4.0).unwrap();
        assert!((lattice.volume() - 64.0).abs() < TOL);
        for length in lattice.reciprocal_lengths().iter() {
            assert!((length - 0.25).abs() < TOL);
        }
    }

    #[test]
    fn fractional_and_cartesian_are_inverse_transforms() {
        let lattice = Lattice::from_parameters(3.0, 4.0, 5.0, 80.0, 95.0, 110.0).unwrap();
        let frac = Vector3::new(0.1, -0.7, 1.3);
        let back = lattice.fractional(&lattice.cartesian(&frac));
        assert!((back - frac).norm() < TOL);
    }

    #[test]
    fn from_parameters_reproduces_cell_lengths_and_angles() {
        let lattice = Lattice::from_parameters(3.0, 4.0, 5.0, 80.0, 95.0, 110.0).unwrap();
        let basis = lattice.basis();
        let (a, b, c) = (basis.column(0), basis.column(1), basis.column(2));
        assert!((a.norm() - 3.0).abs() < TOL);
        assert!((b.norm() - 4.0).abs() < TOL);
        assert!((c.norm() - 5.0).abs() < TOL);
        let gamma = (a.dot(&b) / (a.norm() * b.norm())).acos().to_degrees();
        assert!((gamma - 110.0).abs() < 1e-8);
    }

    #[test]
    fn coplanar_vectors_are_rejected() {
        let result = Lattice::from_vectors(
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
        );
        assert!(matches!(result, Err(StructureError::DegenerateLattice(_))));
    }

    #[test]
    fn impossible_angles_are_rejected() {
        let result = Lattice::from_parameters(1.0, 1.0, 1.0, 10.0, 10.0, 120.0);
        assert!(matches!(result, Err(StructureError::DegenerateLattice(_))));
    }

    #[test]
    fn wrap_fractional_maps_into_unit_interval() {
        let wrapped = Lattice::wrap_fractional(&Vector3::new(-0.25, 1.0, 2.75));
        assert!((wrapped - Vector3::new(0.75, 0.0, 0.75)).norm() < TOL);
        let tiny = Lattice::wrap_fractional(&Vector3::new(-1e-18, 0.0, 0.0));
        assert!(tiny.x >= 0.0 && tiny.x < 1.0);
    }

    #[test]
    fn max_cell_diagonal_of_cube_is_body_diagonal() {
        let lattice = Lattice::cubic(2.0).unwrap();
        assert!((lattice.max_cell_diagonal() - 2.0 * 3f64.sqrt()).abs() < TOL);
    }

    #[test]
    fn cartesian_uij_is_identity_transform_for_cubic_cell() {
        let lattice = Lattice::cubic(5.0).unwrap();
        let uij = Matrix3::new(0.01, 0.002, 0.0, 0.002, 0.02, 0.0, 0.0, 0.0, 0.03);
        assert!((lattice.cartesian_uij(&uij) - uij).norm() < TOL);
    }

    #[test]
    fn cartesian_rotation_of_identity_is_identity() {
        let lattice = Lattice::from_parameters(3.0, 4.0, 5.0, 90.0, 90.0, 120.0).unwrap();
        let rotation = lattice.cartesian_rotation(&Matrix3::identity());
        assert!((rotation - Matrix3::identity()).norm() < TOL);
    }
}
