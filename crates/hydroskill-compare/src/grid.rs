//! Regular x/y grids for spatially binned skill.

use hydroskill_match::Position;

use crate::error::CompareError;

/// How the grid cells are laid out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridLayout {
    /// `nx` by `ny` equal-width bins spanning the data extent. The upper
    /// edge belongs to the last bin.
    Bins {
        /// Number of bins along x.
        nx: usize,
        /// Number of bins along y.
        ny: usize,
    },
    /// Square cells of side `size`, anchored at multiples of `size`.
    BinSize {
        /// Cell side length.
        size: f64,
    },
}

/// A spatial grid specification.
///
/// # Defaults
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `n_min`   | 1       |
///
/// Cells with fewer than `n_min` paired values are omitted from skill
/// tables; empty cells never appear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    layout: GridLayout,
    n_min: usize,
}

impl GridSpec {
    /// Create an `nx` by `ny` grid over the data extent.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::InvalidGrid`] if `nx` or `ny` is zero.
    pub fn bins(nx: usize, ny: usize) -> Result<Self, CompareError> {
        if nx == 0 || ny == 0 {
            return Err(CompareError::InvalidGrid {
                reason: "bin counts must be positive",
            });
        }
        Ok(Self {
            layout: GridLayout::Bins { nx, ny },
            n_min: 1,
        })
    }

    /// Create a grid of square cells with side `size`.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::InvalidGrid`] if `size` is not a positive finite number.
    pub fn bin_size(size: f64) -> Result<Self, CompareError> {
        if !size.is_finite() || size <= 0.0 {
            return Err(CompareError::InvalidGrid {
                reason: "bin size must be positive and finite",
            });
        }
        Ok(Self {
            layout: GridLayout::BinSize { size },
            n_min: 1,
        })
    }

    /// Omit cells with fewer than `n_min` paired values.
    #[must_use]
    pub fn with_n_min(mut self, n_min: usize) -> Self {
        self.n_min = n_min;
        self
    }

    /// Return the cell layout.
    #[must_use]
    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    /// Return the minimum cell count.
    #[must_use]
    pub fn n_min(&self) -> usize {
        self.n_min
    }

    /// Fix the cell geometry for data spanning `extent` (`[xmin, ymin, xmax, ymax]`).
    pub(crate) fn resolve(&self, extent: Option<[f64; 4]>) -> ResolvedGrid {
        match self.layout {
            GridLayout::BinSize { size } => ResolvedGrid {
                x0: 0.0,
                y0: 0.0,
                dx: size,
                dy: size,
                limit: None,
            },
            GridLayout::Bins { nx, ny } => {
                let [xmin, ymin, xmax, ymax] = extent.unwrap_or([0.0, 0.0, 1.0, 1.0]);
                let width = |lo: f64, hi: f64, n: usize| {
                    if hi > lo { (hi - lo) / n as f64 } else { 1.0 }
                };
                ResolvedGrid {
                    x0: xmin,
                    y0: ymin,
                    dx: width(xmin, xmax, nx),
                    dy: width(ymin, ymax, ny),
                    limit: Some((nx as i64 - 1, ny as i64 - 1)),
                }
            }
        }
    }
}

/// A grid with concrete origin and cell size.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedGrid {
    x0: f64,
    y0: f64,
    dx: f64,
    dy: f64,
    limit: Option<(i64, i64)>,
}

impl ResolvedGrid {
    /// Cell indices `(ix, iy)` of position `p`.
    pub(crate) fn cell(&self, p: Position) -> (i64, i64) {
        let ix = ((p.x - self.x0) / self.dx).floor() as i64;
        let iy = ((p.y - self.y0) / self.dy).floor() as i64;
        match self.limit {
            Some((max_x, max_y)) => (ix.clamp(0, max_x), iy.clamp(0, max_y)),
            None => (ix, iy),
        }
    }

    /// Centre coordinates of cell `(ix, iy)`.
    pub(crate) fn centre(&self, ix: i64, iy: i64) -> (f64, f64) {
        (
            self.x0 + (ix as f64 + 0.5) * self.dx,
            self.y0 + (iy as f64 + 0.5) * self.dy,
        )
    }
}
