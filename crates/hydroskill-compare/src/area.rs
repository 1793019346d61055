//! Spatial selection areas for track comparers.

use hydroskill_match::Position;

use crate::error::CompareError;

/// A region used to select track rows by position.
#[derive(Debug, Clone, PartialEq)]
pub enum Area {
    /// Axis-aligned box; a position is inside when strictly between both bounds.
    BBox {
        /// Lower x bound.
        x0: f64,
        /// Lower y bound.
        y0: f64,
        /// Upper x bound.
        x1: f64,
        /// Upper y bound.
        y1: f64,
    },
    /// Simple polygon, tested with the even-odd rule. Closing the ring is optional.
    Polygon(Vec<Position>),
}

impl Area {
    /// Create a bounding box from `[x0, y0, x1, y1]`.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::InvalidArea`] if a bound is non-finite or the
    /// box has zero or negative extent.
    pub fn bbox(x0: f64, y0: f64, x1: f64, y1: f64) -> Result<Self, CompareError> {
        if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
            return Err(CompareError::InvalidArea {
                reason: "bounds must be finite",
            });
        }
        if x1 <= x0 || y1 <= y0 {
            return Err(CompareError::InvalidArea {
                reason: "upper bounds must exceed lower bounds",
            });
        }
        Ok(Area::BBox { x0, y0, x1, y1 })
    }

    /// Create a polygon from its vertices.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::InvalidArea`] if fewer than three distinct
    /// vertices are given or a vertex is non-finite.
    pub fn polygon(mut vertices: Vec<Position>) -> Result<Self, CompareError> {
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        if vertices.len() < 3 {
            return Err(CompareError::InvalidArea {
                reason: "polygon needs at least three vertices",
            });
        }
        if !vertices.iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
            return Err(CompareError::InvalidArea {
                reason: "vertices must be finite",
            });
        }
        Ok(Area::Polygon(vertices))
    }

    /// Return whether `p` lies inside the area.
    #[must_use]
    pub fn contains(&self, p: Position) -> bool {
        match self {
            Area::BBox { x0, y0, x1, y1 } => p.x > *x0 && p.x < *x1 && p.y > *y0 && p.y < *y1,
            Area::Polygon(vertices) if vertices.len() < 3 => false,
            Area::Polygon(vertices) => {
                let mut inside = false;
                let mut j = vertices.len() - 1;
                for (i, vi) in vertices.iter().enumerate() {
                    let vj = vertices[j];
                    if (vi.y > p.y) != (vj.y > p.y)
                        && p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x
                    {
                        inside = !inside;
                    }
                    j = i;
                }
                inside
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_is_strict() {
        let area = Area::bbox(0.0, 0.0, 10.0, 10.0).unwrap();
        assert!(area.contains(Position::new(5.0, 5.0)));
        assert!(!area.contains(Position::new(0.0, 5.0)));
        assert!(!area.contains(Position::new(5.0, 10.0)));
    }

    #[test]
    fn bbox_rejects_inverted_bounds() {
        let err = Area::bbox(10.0, 0.0, 0.0, 10.0).unwrap_err();
        assert!(matches!(err, CompareError::InvalidArea { .. }));
    }

    #[test]
    fn triangle_contains_interior_point() {
        let area = Area::polygon(vec![
            Position::new(0.0, 0.0),
            Position::new(4.0, 0.0),
            Position::new(0.0, 4.0),
        ])
        .unwrap();
        assert!(area.contains(Position::new(1.0, 1.0)));
        assert!(!area.contains(Position::new(3.0, 3.0)));
    }

    #[test]
    fn closed_ring_accepted() {
        let square = vec![
            Position::new(0.0, 0.0),
            Position::new(2.0, 0.0),
            Position::new(2.0, 2.0),
            Position::new(0.0, 2.0),
            Position::new(0.0, 0.0),
        ];
        let area = Area::polygon(square).unwrap();
        assert!(matches!(&area, Area::Polygon(v) if v.len() == 4));
        assert!(area.contains(Position::new(1.0, 1.0)));
    }

    #[test]
    fn degenerate_polygon_contains_nothing() {
        let p = Position::new(0.0, 0.0);
        assert!(!Area::Polygon(vec![]).contains(p));
        assert!(!Area::Polygon(vec![p]).contains(p));
        assert!(!Area::Polygon(vec![p, Position::new(1.0, 1.0)]).contains(p));
    }

    #[test]
    fn polygon_needs_three_vertices() {
        let err = Area::polygon(vec![Position::new(0.0, 0.0), Position::new(1.0, 1.0)]).unwrap_err();
        assert!(matches!(err, CompareError::InvalidArea { .. }));
    }
}
