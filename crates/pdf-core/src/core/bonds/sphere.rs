use itertools::iproduct;
use nalgebra::{Matrix3, Vector3};
use std::cmp::Ordering;

/// One lattice translation `m·a + n·b + o·c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticePoint {
    pub mno: [i64; 3],
    pub cartesian: Vector3<f64>,
    pub norm: f64,
}

/// Lattice translations with length in `[rmin, rmax]`, sorted by length.
///
/// The point list is rebuilt whenever the shell changes; iteration restarts
/// with [`rewind`](Self::rewind).
#[derive(Debug, Clone)]
pub struct LatticePointsInSphere {
    basis: Matrix3<f64>,
    reciprocal_lengths: Vector3<f64>,
    rmin: f64,
    rmax: f64,
    points: Vec<LatticePoint>,
    cursor: usize,
}

impl LatticePointsInSphere {
    /// # Panics
    ///
    /// Panics if `rmax` is not finite or the basis is singular.
    pub fn new(basis: Matrix3<f64>, rmin: f64, rmax: f64) -> Self {
        let inverse = basis
            .try_inverse()
            .unwrap_or_else(|| panic!("lattice basis must be invertible"));
        let reciprocal_lengths = Vector3::new(
            inverse.row(0).norm(),
            inverse.row(1).norm(),
            inverse.row(2).norm(),
        );
        let mut sphere = Self {
            basis,
            reciprocal_lengths,
            rmin,
            rmax,
            points: Vec::new(),
            cursor: 0,
        };
        sphere.rebuild();
        sphere
    }

    pub fn rmin(&self) -> f64 {
        self.rmin
    }

    pub fn rmax(&self) -> f64 {
        self.rmax
    }

    /// Updates the lower bound and rebuilds the point list.
    pub fn set_rmin(&mut self, rmin: f64) {
        if rmin != self.rmin {
            self.rmin = rmin;
            self.rebuild();
        }
    }

    pub fn set_rmax(&mut self, rmax: f64) {
        if rmax != self.rmax {
            self.rmax = rmax;
            self.rebuild();
        }
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Lattice points in the shell, ordered by distance from the origin.
    pub fn points(&self) -> &[LatticePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn rebuild(&mut self) {
        assert!(
            self.rmax.is_finite(),
            "lattice sphere needs a finite rmax, got {}",
            self.rmax
        );
        self.cursor = 0;
        self.points.clear();
        if self.rmax < 0.0 || self.rmin > self.rmax {
            return;
        }

        // |m| = |a*·t| <= |a*|·|t| bounds each index for |t| <= rmax.
        let bound = |k: usize| (self.rmax * self.reciprocal_lengths[k]).ceil() as i64;
        let (bm, bn, bo) = (bound(0), bound(1), bound(2));

        self.points = iproduct!(-bm..=bm, -bn..=bn, -bo..=bo)
            .filter_map(|(m, n, o)| {
                let cartesian = self.basis * Vector3::new(m as f64, n as f64, o as f64);
                let norm = cartesian.norm();
                (norm >= self.rmin && norm <= self.rmax).then_some(LatticePoint {
                    mno: [m, n, o],
                    cartesian,
                    norm,
                })
            })
            .collect();
        self.points.sort_by(|a, b| {
            a.norm
                .partial_cmp(&b.norm)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.mno.cmp(&b.mno))
        });
    }
}

impl Iterator for LatticePointsInSphere {
    type Item = LatticePoint;

    fn next(&mut self) -> Option<Self::Item> {
        let point = self.points.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(point)
    }
}
