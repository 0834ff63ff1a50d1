use super::progress::{Progress, ProgressReporter};
use crate::core::bonds::{Bond, BondGenerator, SummationConvention};
use crate::core::structure::StructureAdapter;
use std::ops::Range;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Upper bound on the number of anchor partitions summed independently.
///
/// Partitions depend only on the site count, so results are identical for
/// any number of worker threads.
const MAX_ANCHOR_PARTITIONS: usize = 64;

/// An accumulator of per-pair contributions over a structure.
pub trait PairQuantity: Send + Sync {
    /// Sizes and zeroes the value for `structure`.
    fn reset_value(&mut self, structure: &dyn StructureAdapter);

    /// Narrows the generator to the pairs this quantity needs.
    fn configure_bond_generator(&self, generator: &mut BondGenerator<'_>);

    fn add_pair_contribution(&mut self, bond: &Bond, summation_scale: f64);

    fn value(&self) -> &[f64];

    fn value_mut(&mut self) -> &mut [f64];

    /// Adds another partial result of the same shape to this one.
    fn merge_value(&mut self, other: &[f64]) {
        for (total, partial) in self.value_mut().iter_mut().zip(other) {
            *total += partial;
        }
    }
}

/// Sums `quantity` over every pair of `structure`.
///
/// Anchor sites are split into contiguous partitions, each summed into a
/// private copy of the quantity (in parallel with the `parallel` feature) and
/// merged back in partition order.
#[instrument(skip_all, name = "pair_summation")]
pub fn evaluate<Q>(
    quantity: &mut Q,
    structure: &dyn StructureAdapter,
    convention: SummationConvention,
    reporter: &ProgressReporter,
) where
    Q: PairQuantity + Clone,
{
    quantity.reset_value(structure);
    let n = structure.count_sites();
    reporter.report(Progress::PairsStart {
        total_anchors: n as u64,
    });

    let partitions = anchor_partitions(n);
    debug!(sites = n, partitions = partitions.len(), "Summing pair contributions.");

    #[cfg(not(feature = "parallel"))]
    let iterator = partitions.into_iter();

    #[cfg(feature = "parallel")]
    let iterator = partitions.into_par_iter();

    let partials: Vec<Q> = iterator
        .map(|anchors| {
            let mut local = quantity.clone();
            accumulate(&mut local, structure, convention, anchors, reporter);
            local
        })
        .collect();

    for partial in &partials {
        quantity.merge_value(partial.value());
    }
    reporter.report(Progress::PairsFinish);
}

fn accumulate<Q: PairQuantity>(
    local: &mut Q,
    structure: &dyn StructureAdapter,
    convention: SummationConvention,
    anchors: Range<usize>,
    reporter: &ProgressReporter,
) {
    let mut generator = structure.create_bond_generator();
    generator.set_summation(convention);
    local.configure_bond_generator(&mut generator);
    generator.select_anchor_range(anchors.clone());

    generator.rewind();
    while let Some(bond) = generator.bond().copied() {
        local.add_pair_contribution(&bond, convention.scale(bond.site0, bond.site1));
        generator.advance();
    }
    reporter.report(Progress::PairsAdvance {
        anchors: anchors.len() as u64,
    });
}

fn anchor_partitions(count: usize) -> Vec<Range<usize>> {
    if count == 0 {
        return Vec::new();
    }
    let size = count.div_ceil(MAX_ANCHOR_PARTITIONS);
    (0..count)
        .step_by(size)
        .map(|start| start..(start + size).min(count))
        .collect()
}

/// Counts pairs within `[rmin, rmax]`; each unordered pair counts once.
#[derive(Debug, Clone, PartialEq)]
pub struct PairCounter {
    rmin: f64,
    rmax: f64,
    value: Vec<f64>,
}

impl PairCounter {
    pub fn new(rmin: f64, rmax: f64) -> Self {
        Self {
            rmin,
            rmax,
            value: vec![0.0],
        }
    }

    /// Number of distinct pairs counted so far.
    pub fn count(&self) -> f64 {
        self.value[0]
    }

    /// Convenience wrapper around [`evaluate`] returning the pair count.
    pub fn count_pairs(
        &mut self,
        structure: &dyn StructureAdapter,
        convention: SummationConvention,
    ) -> f64 {
        evaluate(self, structure, convention, &ProgressReporter::new());
        self.count()
    }
}

impl PairQuantity for PairCounter {
    fn reset_value(&mut self, _structure: &dyn StructureAdapter) {
        self.value = vec![0.0];
    }

    fn configure_bond_generator(&self, generator: &mut BondGenerator<'_>) {
        generator.set_rmin(self.rmin);
        generator.set_rmax(self.rmax);
    }

    fn add_pair_contribution(&mut self, _bond: &Bond, summation_scale: f64) {
        self.value[0] += summation_scale / 2.0;
    }

    fn value(&self) -> &[f64] {
        &self.value
    }

    fn value_mut(&mut self) -> &mut [f64] {
        &mut self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::lattice::Lattice;
    use crate::core::models::source::{AtomRecord, Molecule, PeriodicStructure};
    use crate::core::structure::molecule::MoleculeAdapter;
    use crate::core::structure::periodic::PeriodicStructureAdapter;
    use nalgebra::Vector3;
    use std::sync::Mutex;

    fn chain(n: usize, spacing: f64) -> MoleculeAdapter {
        let molecule = (0..n).fold(Molecule::new(), |m, i| {
            m.with_atom(AtomRecord::new("C", Vector3::new(i as f64 * spacing, 0.0, 0.0)))
        });
        MoleculeAdapter::new(&molecule).unwrap()
    }

    #[test]
    fn anchor_partitions_cover_all_sites_once() {
        for count in [1, 7, 64, 65, 1000] {
            let partitions = anchor_partitions(count);
            assert!(partitions.len() <= MAX_ANCHOR_PARTITIONS);
            assert_eq!(partitions.first().unwrap().start, 0);
            assert_eq!(partitions.last().unwrap().end, count);
            assert!(partitions.windows(2).all(|w| w[0].end == w[1].start));
        }
        assert!(anchor_partitions(0).is_empty());
    }

    #[test]
    fn pair_counter_counts_each_pair_once_for_both_conventions() {
        let adapter = chain(5, 1.0);
        for convention in [
            SummationConvention::UniquePairs,
            SummationConvention::OrderedPairs,
        ] {
            let mut counter = PairCounter::new(0.5, 1.5);
            assert_eq!(counter.count_pairs(&adapter, convention), 4.0);
            let mut counter = PairCounter::new(0.0, 100.0);
            assert_eq!(counter.count_pairs(&adapter, convention), 10.0);
        }
    }

    #[test]
    fn single_site_has_no_pairs() {
        let adapter = chain(1, 1.0);
        let mut counter = PairCounter::new(0.0, 10.0);
        assert_eq!(
            counter.count_pairs(&adapter, SummationConvention::UniquePairs),
            0.0
        );
    }

    #[test]
    fn simple_cubic_counts_three_neighbour_pairs_per_atom() {
        let source = PeriodicStructure::new(Lattice::cubic(2.5).unwrap())
            .with_atom(AtomRecord::new("Po", Vector3::zeros()));
        let adapter = PeriodicStructureAdapter::new(&source).unwrap();
        let mut counter = PairCounter::new(2.4, 2.6);
        assert_eq!(
            counter.count_pairs(&adapter, SummationConvention::UniquePairs),
            3.0
        );
    }

    #[test]
    fn evaluate_reports_every_anchor() {
        let adapter = chain(100, 0.8);
        let anchors = Mutex::new(0u64);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::PairsAdvance { anchors: n } = event {
                *anchors.lock().unwrap() += n;
            }
        }));
        let mut counter = PairCounter::new(0.0, 1.0);
        evaluate(
            &mut counter,
            &adapter,
            SummationConvention::UniquePairs,
            &reporter,
        );
        assert_eq!(counter.count(), 99.0);
        drop(reporter);
        assert_eq!(anchors.into_inner().unwrap(), 100);
    }
}
