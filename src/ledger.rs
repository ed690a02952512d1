//! Per-container capacity ledger.
//!
//! An `OpenContainer` tracks aggregate volume, weight and floor usage of one
//! container during a single packing run. No spatial positions are kept.

use crate::geometry::fits;
use crate::model::{Container, UnitItem};
use crate::optimizer::PackingConfig;
use crate::types::{Dimensional, Weighted};

/// Working state of a container while items are being loaded.
#[derive(Clone, Debug)]
pub struct OpenContainer {
    pub container: Container,
    pub capacity_volume: f64,
    pub capacity_weight: f64,
    pub remaining_volume: f64,
    pub remaining_weight: f64,
    pub used_volume: f64,
    pub used_weight: f64,
    /// Container footprint in m².
    pub floor_space_total: f64,
    /// Footprint taken by non-stackable items, in m².
    pub floor_space_used: f64,
    pub has_fragile_items: bool,
    pub has_non_stackable_items: bool,
    /// Set by the first fragile placement; blocks any further fragile item.
    pub has_items_above: bool,
    pub items: Vec<UnitItem>,
}

impl OpenContainer {
    /// Opens an empty ledger for the container.
    pub fn open(container: &Container) -> Self {
        Self {
            container: container.clone(),
            capacity_volume: container.capacity_volume,
            capacity_weight: container.capacity_weight,
            remaining_volume: container.capacity_volume,
            remaining_weight: container.capacity_weight,
            used_volume: 0.0,
            used_weight: 0.0,
            floor_space_total: container.floor_space(),
            floor_space_used: 0.0,
            has_fragile_items: false,
            has_non_stackable_items: false,
            has_items_above: false,
            items: Vec::new(),
        }
    }

    /// Whether the item's bounding box fits the container in some orientation.
    #[inline]
    pub fn fits_geometry(&self, unit: &UnitItem) -> bool {
        fits(&unit.dimensions(), &self.container.dimensions)
    }

    #[inline]
    pub fn has_weight_for(&self, unit: &UnitItem) -> bool {
        self.remaining_weight >= unit.weight()
    }

    #[inline]
    pub fn has_volume_for(&self, unit: &UnitItem, config: &PackingConfig) -> bool {
        self.remaining_volume + config.volume_epsilon >= unit.volume_m3()
    }

    /// A fragile item is refused once any fragile item has been loaded.
    #[inline]
    pub fn blocks_fragile(&self, unit: &UnitItem) -> bool {
        unit.is_fragile() && self.has_items_above
    }

    /// A non-stackable item is refused once the floor usage reaches the ceiling.
    #[inline]
    pub fn blocks_non_stackable(&self, unit: &UnitItem, config: &PackingConfig) -> bool {
        !unit.is_stackable()
            && self.floor_space_used >= config.floor_space_ratio * self.floor_space_total
    }

    /// Placement gate: geometry, weight, volume, fragility and floor space.
    pub fn can_place(&self, unit: &UnitItem, config: &PackingConfig) -> bool {
        self.fits_geometry(unit)
            && self.has_weight_for(unit)
            && self.has_volume_for(unit, config)
            && !self.blocks_fragile(unit)
            && !self.blocks_non_stackable(unit, config)
    }

    /// Books an item approved by [`can_place`](Self::can_place).
    pub fn apply(&mut self, unit: UnitItem) {
        let volume = unit.volume_m3();
        let weight = unit.weight();

        self.remaining_volume -= volume;
        self.remaining_weight -= weight;
        self.used_volume += volume;
        self.used_weight += weight;

        if !unit.is_stackable() {
            self.floor_space_used += unit.footprint_m2();
            self.has_non_stackable_items = true;
        }
        if unit.is_fragile() {
            self.has_fragile_items = true;
            self.has_items_above = true;
        }

        self.items.push(unit);
    }

    /// Runs the gate and books the item if it passes. Returns the item back on
    /// rejection.
    pub fn try_place(&mut self, unit: UnitItem, config: &PackingConfig) -> Result<(), UnitItem> {
        if self.can_place(&unit, config) {
            self.apply(unit);
            Ok(())
        } else {
            Err(unit)
        }
    }

    pub fn placed_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `used_volume / capacity_volume`, 0 for a zero capacity.
    pub fn volume_utilization(&self) -> f64 {
        ratio(self.used_volume, self.capacity_volume)
    }

    /// `used_weight / capacity_weight`, 0 for a zero capacity.
    pub fn weight_utilization(&self) -> f64 {
        ratio(self.used_weight, self.capacity_weight)
    }
}

fn ratio(used: f64, capacity: f64) -> f64 {
    if capacity > 0.0 { used / capacity } else { 0.0 }
}
