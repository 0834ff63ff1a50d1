use std::f64::consts::PI;

/// Slack for floating-point noise when converting lengths to point counts.
const POINT_EPS: f64 = 1e-9;

/// Fourier ripples from termination at `qmax` are tracked over this many periods.
const RIPPLE_PERIODS: f64 = 6.0;

/// Uniform grid `r(k) = rmin + (k - lo_points)·rstep` for `k` in `0..count`.
///
/// `lo_points` counts grid points below `rmin`, so index `lo_points` sits on
/// the first requested point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RGrid {
    pub rmin: f64,
    pub rstep: f64,
    pub lo_points: usize,
    pub count: usize,
}

impl RGrid {
    /// Distance of grid point `index`.
    pub fn r(&self, index: usize) -> f64 {
        self.rmin + (index as f64 - self.lo_points as f64) * self.rstep
    }

    pub fn first(&self) -> f64 {
        self.r(0)
    }

    /// Last grid point, or `first()` for an empty grid.
    pub fn last(&self) -> f64 {
        self.r(self.count.saturating_sub(1))
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// All grid distances in order.
    pub fn values(&self) -> Vec<f64> {
        (0..self.count).map(|k| self.r(k)).collect()
    }

    /// Index of the grid point closest to `r`, if it falls on the grid.
    pub fn nearest_index(&self, r: f64) -> Option<usize> {
        let offset = ((r - self.first()) / self.rstep).round();
        (offset >= 0.0 && offset < self.count as f64).then_some(offset as usize)
    }
}

/// Point counts of the requested, ripple-extended and calculation grids.
///
/// The ripple extension keeps band-pass artefacts away from the requested
/// range; the tail extension adds room for peaks centered outside it. Both
/// are capped together by `max_extension` and never reach below `r = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RLimits {
    pub rmin: f64,
    pub rmax: f64,
    pub rstep: f64,
    pub ripple_extension: f64,
    pub tail_extension: f64,
    pub rgrid_points: usize,
    pub ripple_lo_points: usize,
    pub ripple_hi_points: usize,
    pub calc_lo_points: usize,
    pub calc_hi_points: usize,
}

fn points_for(length: f64, rstep: f64) -> usize {
    (length / rstep - POINT_EPS).ceil().max(0.0) as usize
}

/// Margin covering six termination-ripple periods at `qmax`, zero when
/// `qmax` is infinite.
pub fn ripple_extension_for(qmax: f64) -> f64 {
    if qmax.is_finite() && qmax > 0.0 {
        RIPPLE_PERIODS * 2.0 * PI / qmax
    } else {
        0.0
    }
}

impl RLimits {
    /// # Arguments
    ///
    /// * `tail_extension` - Half-support of the widest peak the structure can
    ///   produce, `max(xboundhi, -xboundlo)` at the maximum peak width.
    pub fn compute(
        rmin: f64,
        rmax: f64,
        rstep: f64,
        qmax: f64,
        max_extension: f64,
        tail_extension: f64,
    ) -> Self {
        let mut ripple = ripple_extension_for(qmax);
        let mut tail = tail_extension.max(0.0);
        let total = ripple + tail;
        if total > max_extension {
            let shrink = if total > 0.0 { max_extension / total } else { 0.0 };
            ripple *= shrink;
            tail *= shrink;
        }

        let below_rmin = (rmin / rstep + POINT_EPS).floor().max(0.0) as usize;
        let ripple_points = points_for(ripple, rstep);
        let calc_points = points_for(ripple + tail, rstep);

        Self {
            rmin,
            rmax,
            rstep,
            ripple_extension: ripple,
            tail_extension: tail,
            rgrid_points: points_for(rmax - rmin, rstep),
            ripple_lo_points: ripple_points.min(below_rmin),
            ripple_hi_points: ripple_points,
            calc_lo_points: calc_points.min(below_rmin),
            calc_hi_points: calc_points,
        }
    }

    /// Grid reported to callers.
    pub fn rgrid(&self) -> RGrid {
        RGrid {
            rmin: self.rmin,
            rstep: self.rstep,
            lo_points: 0,
            count: self.rgrid_points,
        }
    }

    /// Requested grid plus the ripple margins; signal processing runs here.
    pub fn ripple_grid(&self) -> RGrid {
        RGrid {
            rmin: self.rmin,
            rstep: self.rstep,
            lo_points: self.ripple_lo_points,
            count: self.ripple_lo_points + self.rgrid_points + self.ripple_hi_points,
        }
    }

    /// Ripple grid plus the peak-tail margins; the histogram is built here.
    pub fn calc_grid(&self) -> RGrid {
        RGrid {
            rmin: self.rmin,
            rstep: self.rstep,
            lo_points: self.calc_lo_points,
            count: self.calc_lo_points + self.rgrid_points + self.calc_hi_points,
        }
    }

    /// Index range of the ripple grid inside the calculation grid.
    pub fn ripple_in_calc(&self) -> std::ops::Range<usize> {
        let start = self.calc_lo_points - self.ripple_lo_points;
        start..start + self.ripple_grid().count
    }

    /// Index range of the requested grid inside the ripple grid.
    pub fn rgrid_in_ripple(&self) -> std::ops::Range<usize> {
        self.ripple_lo_points..self.ripple_lo_points + self.rgrid_points
    }
}
