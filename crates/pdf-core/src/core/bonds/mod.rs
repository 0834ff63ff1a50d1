//! # Bonds Module
//!
//! Enumeration of interatomic pairs within a distance window.
//!
//! ## Overview
//!
//! - [`sphere`] - Lattice translations inside a spherical shell, ordered by length.
//! - [`generator`] - The bond generator state machine walking anchor sites,
//!   partner sites, symmetry images and lattice translations.
//!
//! A [`SummationConvention`] fixes which partners an anchor visits and the
//! weight each visited pair carries, so that either convention produces the
//! same totals.

pub mod generator;
pub mod sphere;

pub use generator::{Bond, BondGenerator, GeneratorState};

use serde::Deserialize;
use std::ops::Range;

/// How the pair loop visits partners of each anchor site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummationConvention {
    /// Partners `j >= i`; pairs with `i != j` count twice.
    #[default]
    UniquePairs,
    /// Every partner `j`; each pair counts once per direction.
    OrderedPairs,
}

impl SummationConvention {
    /// Partner indices visited for `anchor` among `count` sites.
    pub fn partners(&self, anchor: usize, count: usize) -> Range<usize> {
        match self {
            SummationConvention::UniquePairs => anchor..count,
            SummationConvention::OrderedPairs => 0..count,
        }
    }

    /// Weight of one reported bond, so both conventions give the same sums.
    pub fn scale(&self, site0: usize, site1: usize) -> f64 {
        match self {
            SummationConvention::UniquePairs if site0 != site1 => 2.0,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_pairs_visit_upper_triangle_with_double_weight() {
        let convention = SummationConvention::UniquePairs;
        assert_eq!(convention.partners(2, 5), 2..5);
        assert_eq!(convention.scale(2, 2), 1.0);
        assert_eq!(convention.scale(2, 3), 2.0);
    }

    #[test]
    fn ordered_pairs_visit_all_partners_with_unit_weight() {
        let convention = SummationConvention::OrderedPairs;
        assert_eq!(convention.partners(2, 5), 0..5);
        assert_eq!(convention.scale(2, 3), 1.0);
    }

    #[test]
    fn total_weight_is_convention_independent() {
        let n = 4;
        let total = |c: SummationConvention| -> f64 {
            (0..n)
                .flat_map(|i| c.partners(i, n).map(move |j| c.scale(i, j)))
                .sum()
        };
        assert_eq!(
            total(SummationConvention::UniquePairs),
            total(SummationConvention::OrderedPairs)
        );
    }
}
