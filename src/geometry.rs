//! Orientation checks for fitting a single item into a container.
//!
//! Only the bounding boxes are compared; items already loaded are not
//! taken into account.

use crate::types::Dimensions;

/// The 6 axis-aligned orientations of a box, as index permutations of
/// (length, width, height).
const ORIENTATIONS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

/// Returns the item dimensions for each of the 6 axis-aligned orientations.
pub fn orientations(item: &Dimensions) -> impl Iterator<Item = Dimensions> {
    let axes = item.as_array();
    ORIENTATIONS
        .iter()
        .map(move |perm| Dimensions::new(axes[perm[0]], axes[perm[1]], axes[perm[2]]))
}

/// Checks whether the item can be rotated to fit into the box.
///
/// # Parameters
/// * `item` - Item bounding box
/// * `bounds` - Container bounding box
///
/// # Returns
/// `true` if at least one orientation satisfies `item[i] <= bounds[i]` on all axes
pub fn fits(item: &Dimensions, bounds: &Dimensions) -> bool {
    let limits = bounds.as_array();
    orientations(item).any(|oriented| {
        oriented
            .as_array()
            .iter()
            .zip(limits.iter())
            .all(|(axis, limit)| axis <= limit)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_dimensions_fit() {
        let dims = Dimensions::new(120.0, 80.0, 60.0);
        assert!(fits(&dims, &dims));
    }

    #[test]
    fn rotated_item_fits() {
        let item = Dimensions::new(250.0, 40.0, 30.0);
        let bounds = Dimensions::new(100.0, 100.0, 260.0);
        assert!(fits(&item, &bounds));
    }

    #[test]
    fn oversized_item_does_not_fit() {
        let item = Dimensions::new(5000.0, 5000.0, 5000.0);
        let bounds = Dimensions::new(1200.0, 240.0, 260.0);
        assert!(!fits(&item, &bounds));
    }

    #[test]
    fn one_axis_too_long_in_every_orientation() {
        let item = Dimensions::new(300.0, 300.0, 10.0);
        let bounds = Dimensions::new(400.0, 200.0, 250.0);
        assert!(!fits(&item, &bounds));
    }

    #[test]
    fn enumerates_six_orientations() {
        let item = Dimensions::new(1.0, 2.0, 3.0);
        let all: Vec<_> = orientations(&item).collect();
        assert_eq!(all.len(), 6);
        assert!(all.contains(&Dimensions::new(3.0, 2.0, 1.0)));
        assert!(all.contains(&Dimensions::new(2.0, 3.0, 1.0)));
    }
}
