//! Data models for the load planner.
//!
//! - `Item`: a package row as supplied by the caller, possibly with a quantity
//! - `UnitItem`: one physical package after quantity expansion
//! - `Container`: a truck or shipping container from the fleet
//!
//! All structures implement the traits from the `types` module.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{Dimensional, Dimensions, Weighted, validation};

/// Validation error for item and container data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid quantity: must be at least 1")]
    InvalidQuantity,
    #[error("Invalid capacity: {0}")]
    InvalidCapacity(String),
}

fn default_quantity() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// A package row to be loaded.
///
/// `quantity` identical packages are described by one row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "reference": "PAL-001",
    "dimensions": { "length": 50.0, "width": 40.0, "height": 30.0 },
    "weight": 10.0,
    "quantity": 2,
    "fragile": false,
    "stackable": true
}))]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub dimensions: Dimensions,
    /// Weight of one package in kg.
    pub weight: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub fragile: bool,
    /// Whether the package may be stacked ("gerbable").
    #[serde(default = "default_true")]
    pub stackable: bool,
}

impl Item {
    /// Creates a single, sturdy, stackable package.
    pub fn new(dimensions: Dimensions, weight: f64) -> Self {
        Self {
            reference: None,
            dimensions,
            weight,
            quantity: 1,
            fragile: false,
            stackable: true,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn fragile(mut self) -> Self {
        self.fragile = true;
        self
    }

    pub fn non_stackable(mut self) -> Self {
        self.stackable = false;
        self
    }

    /// Checks dimensions, weight and quantity.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_dimensions_3d(self.dimensions.as_array())
            .map_err(ValidationError::InvalidDimension)?;
        validation::validate_weight(self.weight).map_err(ValidationError::InvalidWeight)?;
        if self.quantity == 0 {
            return Err(ValidationError::InvalidQuantity);
        }
        Ok(())
    }
}

impl Dimensional for Item {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }
}

impl Weighted for Item {
    fn weight(&self) -> f64 {
        self.weight
    }
}

/// One physical package produced by expanding an `Item` row.
///
/// `row` is the index of the source row, `copy` the 0-based index within
/// its quantity. The wrapped item always has `quantity == 1`.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct UnitItem {
    pub row: usize,
    pub copy: u32,
    pub item: Item,
}

impl UnitItem {
    #[inline]
    pub fn is_fragile(&self) -> bool {
        self.item.fragile
    }

    #[inline]
    pub fn is_stackable(&self) -> bool {
        self.item.stackable
    }
}

impl Dimensional for UnitItem {
    fn dimensions(&self) -> Dimensions {
        self.item.dimensions
    }
}

impl Weighted for UnitItem {
    fn weight(&self) -> f64 {
        self.item.weight
    }
}

/// Kind of transport container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum ContainerCategory {
    Truck,
    ShippingContainer,
}

impl std::fmt::Display for ContainerCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerCategory::Truck => write!(f, "truck"),
            ContainerCategory::ShippingContainer => write!(f, "shippingContainer"),
        }
    }
}

/// A truck or shipping container of the fleet.
///
/// # Fields
/// * `dimensions` - Inner dimensions in cm
/// * `capacity_volume` - Usable volume in m³
/// * `capacity_weight` - Maximum payload in kg
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "TRK-01",
    "name": "Semi-trailer",
    "dimensions": { "length": 1360.0, "width": 245.0, "height": 270.0 },
    "capacity_volume": 90.0,
    "capacity_weight": 24000.0,
    "category": "truck",
    "available": true
}))]
pub struct Container {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub dimensions: Dimensions,
    pub capacity_volume: f64,
    pub capacity_weight: f64,
    pub category: ContainerCategory,
    #[serde(default = "default_true")]
    pub available: bool,
}

impl Container {
    /// Creates an available container.
    pub fn new(
        id: impl Into<String>,
        category: ContainerCategory,
        dimensions: Dimensions,
        capacity_volume: f64,
        capacity_weight: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            dimensions,
            capacity_volume,
            capacity_weight,
            category,
            available: true,
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Floor area (`length × width`) in m².
    #[inline]
    pub fn floor_space(&self) -> f64 {
        self.dimensions.footprint_m2()
    }

    /// Checks dimensions and both capacities.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_dimensions_3d(self.dimensions.as_array())
            .map_err(ValidationError::InvalidDimension)?;
        validation::validate_dimension(self.capacity_volume, "Capacity volume")
            .map_err(ValidationError::InvalidCapacity)?;
        validation::validate_dimension(self.capacity_weight, "Capacity weight")
            .map_err(ValidationError::InvalidCapacity)?;
        Ok(())
    }
}

impl Dimensional for Container {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_defaults_from_json() {
        let json = r#"{
            "dimensions": {"length": 50.0, "width": 40.0, "height": 30.0},
            "weight": 10.0
        }"#;
        let item: Item = serde_json::from_str(json).expect("valid item JSON");
        assert_eq!(item.quantity, 1);
        assert!(!item.fragile);
        assert!(item.stackable);
        assert!(item.reference.is_none());
    }

    #[test]
    fn item_validation_rejects_bad_values() {
        let ok = Item::new(Dimensions::new(10.0, 10.0, 10.0), 1.0);
        assert!(ok.validate().is_ok());

        let zero_qty = ok.clone().with_quantity(0);
        assert_eq!(zero_qty.validate(), Err(ValidationError::InvalidQuantity));

        let bad_dim = Item::new(Dimensions::new(-10.0, 10.0, 10.0), 1.0);
        assert!(matches!(
            bad_dim.validate(),
            Err(ValidationError::InvalidDimension(_))
        ));

        let bad_weight = Item::new(Dimensions::new(10.0, 10.0, 10.0), f64::NAN);
        assert!(matches!(
            bad_weight.validate(),
            Err(ValidationError::InvalidWeight(_))
        ));
    }

    #[test]
    fn container_category_uses_camel_case() {
        let json = serde_json::to_string(&ContainerCategory::ShippingContainer).unwrap();
        assert_eq!(json, "\"shippingContainer\"");
        let parsed: ContainerCategory = serde_json::from_str("\"truck\"").unwrap();
        assert_eq!(parsed, ContainerCategory::Truck);
    }

    #[test]
    fn container_floor_space_in_square_meters() {
        let container = Container::new(
            "C1",
            ContainerCategory::Truck,
            Dimensions::new(400.0, 200.0, 250.0),
            20.0,
            3500.0,
        );
        assert!((container.floor_space() - 8.0).abs() < 1e-12);
        assert!(container.validate().is_ok());
    }

    #[test]
    fn container_validation_rejects_zero_capacity() {
        let container = Container::new(
            "C1",
            ContainerCategory::Truck,
            Dimensions::new(400.0, 200.0, 250.0),
            0.0,
            3500.0,
        );
        assert!(matches!(
            container.validate(),
            Err(ValidationError::InvalidCapacity(_))
        ));
    }
}
