//! Reasons why an item could not be loaded.

use serde::Serialize;
use utoipa::ToSchema;

use crate::ledger::OpenContainer;
use crate::model::UnitItem;
use crate::optimizer::PackingConfig;

/// Closed set of rejection reasons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnplacedReason {
    DimensionsTooLarge,
    WeightExceeded,
    VolumeExceeded,
    FragileConstraint,
    NonStackableConstraint,
    PlacementImpossible,
}

impl UnplacedReason {
    pub fn code(&self) -> &'static str {
        match self {
            UnplacedReason::DimensionsTooLarge => "DIMENSIONS_TOO_LARGE",
            UnplacedReason::WeightExceeded => "WEIGHT_EXCEEDED",
            UnplacedReason::VolumeExceeded => "VOLUME_EXCEEDED",
            UnplacedReason::FragileConstraint => "FRAGILE_CONSTRAINT",
            UnplacedReason::NonStackableConstraint => "NON_STACKABLE_CONSTRAINT",
            UnplacedReason::PlacementImpossible => "PLACEMENT_IMPOSSIBLE",
        }
    }
}

impl std::fmt::Display for UnplacedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnplacedReason::DimensionsTooLarge => {
                write!(f, "Item does not fit the container in any orientation")
            }
            UnplacedReason::WeightExceeded => {
                write!(f, "Item is heavier than the remaining payload")
            }
            UnplacedReason::VolumeExceeded => {
                write!(f, "Item is larger than the remaining volume")
            }
            UnplacedReason::FragileConstraint => {
                write!(f, "Container already carries a fragile item")
            }
            UnplacedReason::NonStackableConstraint => {
                write!(f, "No floor space left for non-stackable cargo")
            }
            UnplacedReason::PlacementImpossible => write!(f, "Item could not be placed"),
        }
    }
}

/// Diagnoses why `unit` was not loaded, against the final state of the
/// reference container. The first matching check wins.
pub fn diagnose(
    unit: &UnitItem,
    reference: Option<&OpenContainer>,
    config: &PackingConfig,
) -> UnplacedReason {
    let Some(ledger) = reference else {
        return UnplacedReason::PlacementImpossible;
    };

    if !ledger.fits_geometry(unit) {
        UnplacedReason::DimensionsTooLarge
    } else if !ledger.has_weight_for(unit) {
        UnplacedReason::WeightExceeded
    } else if !ledger.has_volume_for(unit, config) {
        UnplacedReason::VolumeExceeded
    } else if ledger.blocks_fragile(unit) {
        UnplacedReason::FragileConstraint
    } else if ledger.blocks_non_stackable(unit, config) {
        UnplacedReason::NonStackableConstraint
    } else {
        UnplacedReason::PlacementImpossible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Container, ContainerCategory, Item};
    use crate::types::Dimensions;

    fn ledger(volume: f64, weight: f64) -> OpenContainer {
        OpenContainer::open(&Container::new(
            "C1",
            ContainerCategory::ShippingContainer,
            Dimensions::new(590.0, 235.0, 239.0),
            volume,
            weight,
        ))
    }

    fn unit(item: Item) -> UnitItem {
        UnitItem {
            row: 0,
            copy: 0,
            item,
        }
    }

    #[test]
    fn no_reference_container_is_generic() {
        let item = unit(Item::new(Dimensions::new(10.0, 10.0, 10.0), 1.0));
        assert_eq!(
            diagnose(&item, None, &PackingConfig::default()),
            UnplacedReason::PlacementImpossible
        );
    }

    #[test]
    fn dimensions_checked_first() {
        // Also too heavy, but geometry wins.
        let item = unit(Item::new(Dimensions::new(700.0, 300.0, 300.0), 99_999.0));
        assert_eq!(
            diagnose(&item, Some(&ledger(33.0, 28_000.0)), &PackingConfig::default()),
            UnplacedReason::DimensionsTooLarge
        );
    }

    #[test]
    fn weight_before_volume() {
        let item = unit(Item::new(Dimensions::new(100.0, 100.0, 100.0), 500.0));
        assert_eq!(
            diagnose(&item, Some(&ledger(0.5, 100.0)), &PackingConfig::default()),
            UnplacedReason::WeightExceeded
        );
    }

    #[test]
    fn volume_exceeded() {
        let item = unit(Item::new(Dimensions::new(100.0, 100.0, 100.0), 5.0));
        assert_eq!(
            diagnose(&item, Some(&ledger(0.5, 100.0)), &PackingConfig::default()),
            UnplacedReason::VolumeExceeded
        );
    }

    #[test]
    fn fragile_constraint_after_first_fragile() {
        let config = PackingConfig::default();
        let mut reference = ledger(33.0, 28_000.0);
        let fragile = unit(Item::new(Dimensions::new(40.0, 40.0, 40.0), 3.0).fragile());
        reference.apply(fragile.clone());
        assert_eq!(
            diagnose(&fragile, Some(&reference), &config),
            UnplacedReason::FragileConstraint
        );
    }

    #[test]
    fn non_stackable_constraint_when_floor_is_full() {
        let config = PackingConfig::default();
        let mut reference = ledger(33.0, 28_000.0);
        reference.floor_space_used = reference.floor_space_total;
        let pallet = unit(Item::new(Dimensions::new(120.0, 80.0, 100.0), 200.0).non_stackable());
        assert_eq!(
            diagnose(&pallet, Some(&reference), &config),
            UnplacedReason::NonStackableConstraint
        );
    }

    #[test]
    fn catch_all_when_every_check_passes() {
        let item = unit(Item::new(Dimensions::new(10.0, 10.0, 10.0), 1.0));
        assert_eq!(
            diagnose(&item, Some(&ledger(33.0, 28_000.0)), &PackingConfig::default()),
            UnplacedReason::PlacementImpossible
        );
    }

    #[test]
    fn codes_match_serialization() {
        for reason in [
            UnplacedReason::DimensionsTooLarge,
            UnplacedReason::WeightExceeded,
            UnplacedReason::VolumeExceeded,
            UnplacedReason::FragileConstraint,
            UnplacedReason::NonStackableConstraint,
            UnplacedReason::PlacementImpossible,
        ] {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason.code()));
        }
    }
}
