//! Quantity expansion and load ordering.
//!
//! Every place that sequences items goes through [`prepare`], so the
//! evaluator and the packer always see the same order.

use std::cmp::Ordering;

use crate::model::{Item, UnitItem};

/// Replaces each row of quantity `q` with `q` unit items of quantity 1.
pub fn expand(items: &[Item]) -> Vec<UnitItem> {
    let total = items.iter().map(|item| item.quantity as usize).sum();
    let mut units = Vec::with_capacity(total);
    for (row, item) in items.iter().enumerate() {
        for copy in 0..item.quantity {
            units.push(UnitItem {
                row,
                copy,
                item: Item {
                    quantity: 1,
                    ..item.clone()
                },
            });
        }
    }
    units
}

/// Load order: sturdy before fragile, non-stackable before stackable, then
/// larger raw volume first.
pub fn load_order(a: &UnitItem, b: &UnitItem) -> Ordering {
    a.is_fragile()
        .cmp(&b.is_fragile())
        .then_with(|| a.is_stackable().cmp(&b.is_stackable()))
        .then_with(|| {
            b.item
                .dimensions
                .raw_volume()
                .partial_cmp(&a.item.dimensions.raw_volume())
                .unwrap_or(Ordering::Equal)
        })
}

/// Sorts unit items into load order. The sort is stable, so equal items keep
/// their input order.
pub fn sort(units: &mut [UnitItem]) {
    units.sort_by(load_order);
}

/// Expands and sorts in one step.
pub fn prepare(items: &[Item]) -> Vec<UnitItem> {
    let mut units = expand(items);
    sort(&mut units);
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Dimensions;

    fn cube(side: f64) -> Item {
        Item::new(Dimensions::new(side, side, side), 1.0)
    }

    fn keys(units: &[UnitItem]) -> Vec<(usize, u32)> {
        units.iter().map(|u| (u.row, u.copy)).collect()
    }

    #[test]
    fn expands_quantities_into_unit_items() {
        let items = vec![cube(10.0).with_quantity(3), cube(20.0)];
        let units = expand(&items);
        assert_eq!(units.len(), 4);
        assert!(units.iter().all(|u| u.item.quantity == 1));
        assert_eq!(keys(&units), vec![(0, 0), (0, 1), (0, 2), (1, 0)]);
    }

    #[test]
    fn fragile_items_come_last() {
        let items = vec![cube(100.0).fragile(), cube(10.0)];
        let units = prepare(&items);
        assert_eq!(units[0].row, 1);
        assert!(units[1].is_fragile());
    }

    #[test]
    fn non_stackable_before_stackable() {
        let items = vec![cube(100.0), cube(10.0).non_stackable()];
        let units = prepare(&items);
        assert_eq!(units[0].row, 1);
        assert_eq!(units[1].row, 0);
    }

    #[test]
    fn larger_volume_first_within_group() {
        let items = vec![cube(10.0), cube(30.0), cube(20.0)];
        let units = prepare(&items);
        assert_eq!(keys(&units), vec![(1, 0), (2, 0), (0, 0)]);
    }

    #[test]
    fn fragility_outranks_stackability() {
        let items = vec![
            cube(10.0).fragile().non_stackable(),
            cube(10.0),
            cube(10.0).non_stackable(),
        ];
        let units = prepare(&items);
        assert_eq!(keys(&units), vec![(2, 0), (1, 0), (0, 0)]);
    }

    #[test]
    fn ties_keep_input_order() {
        let items = vec![cube(10.0).with_reference("a"), cube(10.0).with_reference("b")];
        let units = prepare(&items);
        assert_eq!(keys(&units), vec![(0, 0), (1, 0)]);
    }

    #[test]
    fn sorting_is_deterministic() {
        let items = vec![
            cube(15.0).fragile(),
            cube(40.0).with_quantity(2),
            cube(25.0).non_stackable(),
            cube(40.0),
        ];
        assert_eq!(keys(&prepare(&items)), keys(&prepare(&items)));
    }
}
