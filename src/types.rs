//! Common types and traits for cargo geometry.
//!
//! Dimensions are always given in centimeters, volumes in cubic meters,
//! floor areas in square meters and weights in kilograms.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Cubic centimeters per cubic meter.
pub const CM3_PER_M3: f64 = 1_000_000.0;

/// Square centimeters per square meter.
pub const CM2_PER_M2: f64 = 10_000.0;

/// Slack applied when comparing an item volume against the remaining volume.
///
/// Absorbs the rounding error accumulated by repeated subtraction of m³ values.
pub const EPSILON_VOLUME: f64 = 1e-9;

/// Bounding box of an item or a container, in centimeters.
///
/// # Examples
/// ```ignore
/// use load_planner::types::Dimensions;
///
/// let dims = Dimensions::new(50.0, 40.0, 30.0);
/// assert!((dims.volume_m3() - 0.06).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    /// Creates a new set of dimensions.
    #[inline]
    pub const fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
        }
    }

    /// Returns the three axes as an array (length, width, height).
    #[inline]
    pub const fn as_array(&self) -> [f64; 3] {
        [self.length, self.width, self.height]
    }

    /// Raw volume in cm³ (`length × width × height`).
    #[inline]
    pub fn raw_volume(&self) -> f64 {
        self.length * self.width * self.height
    }

    /// Volume in m³.
    #[inline]
    pub fn volume_m3(&self) -> f64 {
        self.raw_volume() / CM3_PER_M3
    }

    /// Footprint (`length × width`) in m².
    #[inline]
    pub fn footprint_m2(&self) -> f64 {
        self.length * self.width / CM2_PER_M2
    }
}

/// Trait for objects with a bounding box.
pub trait Dimensional {
    /// Returns the dimensions of the object in centimeters.
    fn dimensions(&self) -> Dimensions;

    /// Volume in m³.
    fn volume_m3(&self) -> f64 {
        self.dimensions().volume_m3()
    }

    /// Footprint in m².
    fn footprint_m2(&self) -> f64 {
        self.dimensions().footprint_m2()
    }
}

/// Trait for objects with weight.
pub trait Weighted {
    /// Returns the weight in kg.
    fn weight(&self) -> f64;
}

/// Validation functions shared by items and containers.
pub mod validation {
    /// Validates a single dimension.
    ///
    /// # Returns
    /// `Ok(())` for valid values, otherwise error text
    pub fn validate_dimension(value: f64, name: &str) -> Result<(), String> {
        if value.is_nan() {
            return Err(format!("{} must not be NaN", name));
        }
        if value.is_infinite() {
            return Err(format!("{} must not be infinite", name));
        }
        if value <= 0.0 {
            return Err(format!("{} must be positive, got: {}", name, value));
        }
        Ok(())
    }

    /// Validates a weight.
    pub fn validate_weight(value: f64) -> Result<(), String> {
        if value.is_nan() {
            return Err("Weight must not be NaN".to_string());
        }
        if value.is_infinite() {
            return Err("Weight must not be infinite".to_string());
        }
        if value <= 0.0 {
            return Err(format!("Weight must be positive, got: {}", value));
        }
        Ok(())
    }

    /// Validates all three dimensions of a bounding box.
    pub fn validate_dimensions_3d(dims: [f64; 3]) -> Result<(), String> {
        validate_dimension(dims[0], "Length")?;
        validate_dimension(dims[1], "Width")?;
        validate_dimension(dims[2], "Height")?;
        Ok(())
    }
}
