//! Integer bounding boxes in XYXY pixel space.

use serde::{Deserialize, Serialize};

/// An axis-aligned plate box as drawn by the upstream detector.
///
/// The constructor does not enforce `xmin < xmax`; [`BoundingBox::is_ordered`]
/// reports malformed boxes instead of refusing to represent them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
}

impl BoundingBox {
    #[inline]
    pub fn from_xyxy(xmin: i64, ymin: i64, xmax: i64, ymax: i64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// May be negative if the box is malformed.
    #[inline]
    pub fn width(&self) -> i64 {
        self.xmax - self.xmin
    }

    /// May be negative if the box is malformed.
    #[inline]
    pub fn height(&self) -> i64 {
        self.ymax - self.ymin
    }

    /// Returns true if min is strictly less than max on both axes.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.xmin < self.xmax && self.ymin < self.ymax
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.xmin, self.ymin, self.xmax, self.ymax
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_and_ordering() {
        let bbox = BoundingBox::from_xyxy(10, 20, 110, 60);
        assert_eq!(bbox.width(), 100);
        assert_eq!(bbox.height(), 40);
        assert!(bbox.is_ordered());

        let flat = BoundingBox::from_xyxy(10, 20, 10, 60);
        assert!(!flat.is_ordered());
    }

    #[test]
    fn display_lists_corners() {
        let bbox = BoundingBox::from_xyxy(1, 2, 3, 4);
        assert_eq!(bbox.to_string(), "[1, 2, 3, 4]");
    }
}
