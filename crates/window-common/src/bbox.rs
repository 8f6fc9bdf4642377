//! Axis-aligned extents in lon/lat or projected units.

use serde::{Deserialize, Serialize};

/// Extent of a grid or polygon; `x` is longitude and `y` latitude for
/// EPSG:4326. All comparisons treat the edges as inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.intersection(other).is_some()
    }

    /// Overlapping extent; a shared edge yields a degenerate box.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let overlap = BoundingBox::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        );
        (overlap.min_x <= overlap.max_x && overlap.min_y <= overlap.max_y).then_some(overlap)
    }
}
