//! Neighborhood definitions for window filters and region growing

/// Defines a neighborhood pattern around a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighborhood {
    /// 4-connected neighbors (plus center)
    Rook,
    /// 8-connected neighbors (plus center)
    Queen,
    /// Rectangular window of `rows x cols` cells.
    ///
    /// Odd sizes are centered. Even sizes lean towards the upper-left, so a
    /// 2x2 window covers the cell, its left, upper and upper-left neighbors.
    Rect { rows: usize, cols: usize },
}

impl Neighborhood {
    /// Square window of edge `size`
    pub fn square(size: usize) -> Self {
        Neighborhood::Rect { rows: size, cols: size }
    }

    /// Inclusive offset range along one axis of an `n`-cell window
    fn axis_range(n: usize) -> (isize, isize) {
        let before = (n / 2) as isize;
        let after = n as isize - before - 1;
        (-before, after)
    }

    /// Check if a relative position is within this neighborhood
    pub fn contains(&self, dr: isize, dc: isize) -> bool {
        match *self {
            Neighborhood::Rook => dr.abs() + dc.abs() <= 1,
            Neighborhood::Queen => dr.abs() <= 1 && dc.abs() <= 1,
            Neighborhood::Rect { rows, cols } => {
                let (r0, r1) = Self::axis_range(rows);
                let (c0, c1) = Self::axis_range(cols);
                (r0..=r1).contains(&dr) && (c0..=c1).contains(&dc)
            }
        }
    }

    /// Inclusive `((row_min, row_max), (col_min, col_max))` offset bounds
    pub fn extent(&self) -> ((isize, isize), (isize, isize)) {
        match *self {
            Neighborhood::Rook | Neighborhood::Queen => ((-1, 1), (-1, 1)),
            Neighborhood::Rect { rows, cols } => (Self::axis_range(rows), Self::axis_range(cols)),
        }
    }

    /// Relative positions in this neighborhood, center included
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        let ((r0, r1), (c0, c1)) = self.extent();

        let mut offsets = Vec::new();
        for dr in r0..=r1 {
            for dc in c0..=c1 {
                if self.contains(dr, dc) {
                    offsets.push((dr, dc));
                }
            }
        }
        offsets
    }

    /// Get offsets excluding the center cell
    pub fn offsets_no_center(&self) -> Vec<(isize, isize)> {
        self.offsets()
            .into_iter()
            .filter(|&(dr, dc)| dr != 0 || dc != 0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_offsets() {
        assert_eq!(Neighborhood::Rook.offsets().len(), 5);
        assert_eq!(Neighborhood::Queen.offsets().len(), 9);
        assert_eq!(Neighborhood::Queen.offsets_no_center().len(), 8);
    }

    #[test]
    fn test_even_window_leans_up_left() {
        let offsets = Neighborhood::square(2).offsets();
        assert_eq!(offsets, vec![(-1, -1), (-1, 0), (0, -1), (0, 0)]);
    }

    #[test]
    fn test_odd_window_centered() {
        let window = Neighborhood::square(3);
        assert_eq!(window.offsets().len(), 9);
        assert!(window.contains(1, 1));
        assert!(!window.contains(2, 0));

        let tall = Neighborhood::Rect { rows: 5, cols: 1 };
        assert_eq!(tall.offsets(), vec![(-2, 0), (-1, 0), (0, 0), (1, 0), (2, 0)]);
    }

    #[test]
    fn test_extent_bounds() {
        assert_eq!(Neighborhood::Queen.extent(), ((-1, 1), (-1, 1)));
        assert_eq!(Neighborhood::square(4).extent(), ((-2, 1), (-2, 1)));
        assert_eq!(Neighborhood::Rect { rows: 1, cols: 5 }.extent(), ((0, 0), (-2, 2)));
    }
}
