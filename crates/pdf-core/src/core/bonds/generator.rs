use super::SummationConvention;
use super::sphere::LatticePointsInSphere;
use crate::core::models::lattice::Lattice;
use crate::core::structure::StructureAdapter;
use nalgebra::{Matrix3, Point3, Vector3};
use std::ops::Range;

/// Upper distance bound of a freshly created generator.
pub const DEFAULT_BOND_RMAX: f64 = 10.0;

/// Bonds shorter than this between a site and its own image are skipped.
const SELF_DISTANCE_EPS: f64 = 1e-8;

/// One interatomic pair reported by a [`BondGenerator`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bond {
    pub site0: usize,
    pub site1: usize,
    pub r0: Point3<f64>,
    pub r1: Point3<f64>,
    pub distance: f64,
    /// Mean-square displacement along the bond, summed over both ends.
    pub msd: f64,
}

impl Bond {
    pub fn displacement(&self) -> Vector3<f64> {
        self.r1 - self.r0
    }

    /// Unit vector from `r0` to `r1`, or zero for a zero-length bond.
    pub fn direction(&self) -> Vector3<f64> {
        if self.distance > 0.0 {
            self.displacement() / self.distance
        } else {
            Vector3::zeros()
        }
    }
}

/// Position of a [`BondGenerator`] in its bond sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Rewound,
    Advancing,
    Exhausted,
}

#[derive(Debug, Clone, Copy)]
struct SiteImage {
    position: Point3<f64>,
    uij: Matrix3<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    site0: usize,
    site1: usize,
    image: usize,
    translation: usize,
}

/// Walks all pairs of a structure whose distance lies in `[rmin, rmax]`.
///
/// The outer loop runs over anchor sites and their partners as chosen by the
/// summation convention; the inner loop runs over the partner's symmetry
/// images and, for periodic structures, lattice translations. Configuration
/// changes take effect on the next [`rewind`](Self::rewind); a fresh
/// generator reports [`GeneratorState::Exhausted`] until rewound.
pub struct BondGenerator<'a> {
    structure: &'a dyn StructureAdapter,
    rmin: f64,
    rmax: f64,
    summation: SummationConvention,
    anchors: Range<usize>,
    state: GeneratorState,
    sphere: Option<LatticePointsInSphere>,
    anchor_cache: Vec<SiteImage>,
    partner_cache: Vec<Vec<SiteImage>>,
    cursor: Cursor,
    current: Option<Bond>,
}

impl<'a> BondGenerator<'a> {
    /// Creates an exhausted generator over all sites of `structure`; call
    /// [`BondGenerator::rewind`] before reading bonds.
    pub fn new(structure: &'a dyn StructureAdapter) -> Self {
        Self {
            structure,
            rmin: 0.0,
            rmax: DEFAULT_BOND_RMAX,
            summation: SummationConvention::default(),
            anchors: 0..structure.count_sites(),
            state: GeneratorState::Exhausted,
            sphere: None,
            anchor_cache: Vec::new(),
            partner_cache: Vec::new(),
            cursor: Cursor::default(),
            current: None,
        }
    }

    pub fn structure(&self) -> &'a dyn StructureAdapter {
        self.structure
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    pub fn rmin(&self) -> f64 {
        self.rmin
    }

    pub fn rmax(&self) -> f64 {
        self.rmax
    }

    pub fn summation(&self) -> SummationConvention {
        self.summation
    }

    /// Sets the lower distance bound. Takes effect at the next rewind.
    pub fn set_rmin(&mut self, rmin: f64) {
        self.rmin = rmin;
    }

    /// # Panics
    ///
    /// For periodic structures the next `rewind` panics if `rmax` is not finite.
    pub fn set_rmax(&mut self, rmax: f64) {
        self.rmax = rmax;
    }

    pub fn set_summation(&mut self, summation: SummationConvention) {
        self.summation = summation;
    }

    /// Restricts the outer loop to anchors in `range`, clamped to the site count.
    pub fn select_anchor_range(&mut self, range: Range<usize>) {
        let n = self.structure.count_sites();
        let start = range.start.min(n);
        self.anchors = start..range.end.clamp(start, n);
    }

    /// Anchor sites the generator currently iterates.
    pub fn anchors(&self) -> Range<usize> {
        self.anchors.clone()
    }

    /// Moves to the first bond within the window, or to `Exhausted` if none.
    pub fn rewind(&mut self) {
        self.refresh_caches();
        self.cursor = Cursor {
            site0: self.anchors.start,
            site1: self
                .summation
                .partners(self.anchors.start, self.structure.count_sites())
                .start,
            image: 0,
            translation: 0,
        };
        self.state = GeneratorState::Rewound;
        self.get_next_bond();
    }

    /// Steps to the next bond. Does nothing once exhausted.
    pub fn advance(&mut self) {
        if self.state == GeneratorState::Exhausted {
            return;
        }
        self.state = GeneratorState::Advancing;
        self.step_cursor();
        self.get_next_bond();
    }

    pub fn finished(&self) -> bool {
        self.state == GeneratorState::Exhausted
    }

    /// Current bond, if the generator is not exhausted.
    pub fn bond(&self) -> Option<&Bond> {
        self.current.as_ref()
    }

    pub fn site0(&self) -> usize {
        self.current_bond().site0
    }

    pub fn site1(&self) -> usize {
        self.current_bond().site1
    }

    pub fn r0(&self) -> Point3<f64> {
        self.current_bond().r0
    }

    pub fn r1(&self) -> Point3<f64> {
        self.current_bond().r1
    }

    pub fn distance(&self) -> f64 {
        self.current_bond().distance
    }

    /// Mean-square displacement of the current bond along its direction.
    ///
    /// # Panics
    ///
    /// Panics if there is no current bond.
    pub fn msd(&self) -> f64 {
        self.current_bond().msd
    }

    /// Rewinds and iterates over every bond in the window.
    pub fn bonds(&mut self) -> Bonds<'_, 'a> {
        self.rewind();
        Bonds {
            generator: self,
            started: false,
        }
    }

    fn current_bond(&self) -> &Bond {
        match &self.current {
            Some(bond) => bond,
            None => panic!("bond generator has no current bond; call rewind and check finished"),
        }
    }

    fn refresh_caches(&mut self) {
        let structure = self.structure;
        let n = structure.count_sites();
        let lattice = structure.lattice();

        if self.partner_cache.len() != n {
            let place = |p: Point3<f64>| match lattice {
                Some(lattice) => wrap_into_cell(lattice, &p),
                None => p,
            };
            self.anchor_cache = (0..n)
                .map(|i| SiteImage {
                    position: place(structure.site_cartesian_position(i)),
                    uij: structure.site_cartesian_uij(i),
                })
                .collect();
            self.partner_cache = (0..n)
                .map(|j| {
                    (0..structure.symmetry_image_count(j))
                        .map(|k| SiteImage {
                            position: place(structure.symmetry_image_position(j, k)),
                            uij: structure.symmetry_image_uij(j, k),
                        })
                        .collect()
                })
                .collect();
        }

        match lattice {
            Some(lattice) => {
                let d_cell = lattice.max_cell_diagonal();
                let (lo, hi) = ((self.rmin - d_cell).max(0.0), self.rmax + d_cell);
                match self.sphere.as_mut() {
                    Some(sphere) => {
                        sphere.set_rmin(lo);
                        sphere.set_rmax(hi);
                    }
                    None => {
                        self.sphere = Some(LatticePointsInSphere::new(*lattice.basis(), lo, hi));
                    }
                }
            }
            None => self.sphere = None,
        }
    }

    fn translation_count(&self) -> usize {
        self.sphere.as_ref().map_or(1, |sphere| sphere.len())
    }

    fn translation(&self, index: usize) -> Option<Vector3<f64>> {
        match &self.sphere {
            Some(sphere) => sphere.points().get(index).map(|p| p.cartesian),
            None => (index == 0).then(Vector3::zeros),
        }
    }

    /// Moves the cursor forward until it rests on a bond inside the window.
    fn get_next_bond(&mut self) {
        while self.cursor.site0 < self.anchors.end {
            if let Some(bond) = self.bond_at_cursor() {
                self.current = Some(bond);
                return;
            }
            self.step_cursor();
        }
        self.current = None;
        self.state = GeneratorState::Exhausted;
    }

    fn step_cursor(&mut self) {
        if !self.iterate_symmetry() {
            self.advance_site_pair();
        }
    }

    /// Steps the inner translation/image loop; false once the pair is done.
    fn iterate_symmetry(&mut self) -> bool {
        self.cursor.translation += 1;
        if self.cursor.translation < self.translation_count() {
            return true;
        }
        self.cursor.translation = 0;
        self.cursor.image += 1;
        let images = self
            .partner_cache
            .get(self.cursor.site1)
            .map_or(0, |images| images.len());
        self.cursor.image < images
    }

    fn advance_site_pair(&mut self) {
        let n = self.structure.count_sites();
        self.cursor.image = 0;
        self.cursor.translation = 0;
        self.cursor.site1 += 1;
        if self.cursor.site1 < n {
            return;
        }
        self.cursor.site0 += 1;
        self.cursor.site1 = self.summation.partners(self.cursor.site0, n).start;
    }

    fn bond_at_cursor(&self) -> Option<Bond> {
        let Cursor {
            site0,
            site1,
            image,
            translation,
        } = self.cursor;
        let anchor = self.anchor_cache.get(site0)?;
        let partner = self.partner_cache.get(site1)?.get(image)?;
        let r1 = partner.position + self.translation(translation)?;
        let displacement = r1 - anchor.position;
        let distance = displacement.norm();

        if distance < self.rmin || distance > self.rmax {
            return None;
        }
        if site0 == site1 && distance < SELF_DISTANCE_EPS {
            return None;
        }

        let msd = if distance > 0.0 {
            let s = displacement / distance;
            (s.dot(&(anchor.uij * s)) + s.dot(&(partner.uij * s))).max(0.0)
        } else {
            ((anchor.uij.trace() + partner.uij.trace()) / 3.0).max(0.0)
        };

        Some(Bond {
            site0,
            site1,
            r0: anchor.position,
            r1,
            distance,
            msd,
        })
    }
}

fn wrap_into_cell(lattice: &Lattice, position: &Point3<f64>) -> Point3<f64> {
    lattice.cartesian(&Lattice::wrap_fractional(&lattice.fractional(position)))
}

/// Iterator over the bonds of a rewound generator.
pub struct Bonds<'g, 'a> {
    generator: &'g mut BondGenerator<'a>,
    started: bool,
}

impl Iterator for Bonds<'_, '_> {
    type Item = Bond;

    fn next(&mut self) -> Option<Bond> {
        if self.started {
            self.generator.advance();
        }
        self.started = true;
        self.generator.current
    }
}
