//! Page geometry.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in top-down page coordinates.
///
/// `y0` is the top edge and `y1` the bottom edge; y grows downward the way
/// readers lay out text.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    /// Create a bounding box, normalizing swapped corners.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Vertical centre.
    pub fn center_y(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Union of an iterator of boxes, `None` when empty.
    pub fn union_all<'a>(boxes: impl IntoIterator<Item = &'a BBox>) -> Option<BBox> {
        boxes.into_iter().fold(None, |acc, b| match acc {
            None => Some(*b),
            Some(a) => Some(a.union(b)),
        })
    }

    /// Whether the horizontal extents overlap.
    pub fn overlaps_horizontally(&self, other: &BBox) -> bool {
        self.x0 < other.x1 && self.x1 > other.x0
    }

    /// Whether the two boxes share any area.
    pub fn intersects(&self, other: &BBox) -> bool {
        self.overlaps_horizontally(other) && self.y0 < other.y1 && self.y1 > other.y0
    }

    /// Whether `self` lies entirely inside `outer`, allowing `tolerance` points of slack.
    pub fn is_inside(&self, outer: &BBox, tolerance: f32) -> bool {
        self.x0 >= outer.x0 - tolerance
            && self.y0 >= outer.y0 - tolerance
            && self.x1 <= outer.x1 + tolerance
            && self.y1 <= outer.y1 + tolerance
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_corners() {
        let b = BBox::new(100.0, 50.0, 10.0, 20.0);
        assert_eq!(b, BBox { x0: 10.0, y0: 20.0, x1: 100.0, y1: 50.0 });
        assert_eq!(b.width(), 90.0);
        assert_eq!(b.height(), 30.0);
    }

    #[test]
    fn test_union_all() {
        let boxes = [BBox::new(0.0, 0.0, 10.0, 10.0), BBox::new(5.0, 20.0, 30.0, 25.0)];
        let u = BBox::union_all(boxes.iter()).unwrap();
        assert_eq!(u, BBox::new(0.0, 0.0, 30.0, 25.0));
        assert!(BBox::union_all(std::iter::empty()).is_none());
    }

    #[test]
    fn test_containment_and_overlap() {
        let outer = BBox::new(0.0, 0.0, 100.0, 100.0);
        let inner = BBox::new(10.0, 10.0, 100.5, 50.0);
        assert!(inner.is_inside(&outer, 1.0));
        assert!(!inner.is_inside(&outer, 0.0));

        let right = BBox::new(100.0, 0.0, 200.0, 10.0);
        assert!(!outer.overlaps_horizontally(&right));
        assert!(outer.intersects(&inner));
    }
}
