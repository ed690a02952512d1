//! Container pool providers.
//!
//! The engine reads the fleet once per call through [`ContainerPool`] and
//! treats the returned list as a point-in-time snapshot. Nothing is reserved.

use std::collections::HashSet;
use std::path::PathBuf;

use rust_embed::RustEmbed;
use thiserror::Error;
use tracing::warn;

use crate::model::{Container, ContainerCategory};

/// Default fleet compiled into the binary.
#[derive(RustEmbed)]
#[folder = "fleet/"]
struct FleetAssets;

const FLEET_ASSET: &str = "containers.json";

/// Errors raised while reading the container pool.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("could not read container pool {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse container pool {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("embedded asset '{0}' is missing")]
    MissingAsset(String),
}

/// Selection applied when listing the pool.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PoolFilter {
    #[default]
    All,
    Category(ContainerCategory),
    /// Explicit containers, in the given order.
    Ids(Vec<String>),
}

/// Source of available containers.
pub trait ContainerPool: Send + Sync {
    /// Returns the available containers matching the filter.
    fn list_available(&self, filter: &PoolFilter) -> Result<Vec<Container>, PoolError>;
}

/// Keeps available, valid containers that match the filter.
///
/// For [`PoolFilter::Ids`] the result follows the id order; unknown,
/// unavailable and repeated ids are skipped.
pub fn apply_filter(containers: Vec<Container>, filter: &PoolFilter) -> Vec<Container> {
    let available = containers.into_iter().filter(|c| c.available);
    match filter {
        PoolFilter::All => available.collect(),
        PoolFilter::Category(category) => available.filter(|c| c.category == *category).collect(),
        PoolFilter::Ids(ids) => {
            let available: Vec<Container> = available.collect();
            let mut seen = HashSet::new();
            let mut selected = Vec::with_capacity(ids.len());
            for id in ids {
                if !seen.insert(id.as_str()) {
                    continue;
                }
                match available.iter().find(|c| &c.id == id) {
                    Some(container) => selected.push(container.clone()),
                    None => warn!(container = %id, "requested container is unknown or unavailable"),
                }
            }
            selected
        }
    }
}

fn parse_fleet(bytes: &[u8], origin: &str) -> Result<Vec<Container>, PoolError> {
    let containers: Vec<Container> =
        serde_json::from_slice(bytes).map_err(|source| PoolError::Parse {
            origin: origin.to_string(),
            source,
        })?;

    Ok(containers
        .into_iter()
        .filter(|container| match container.validate() {
            Ok(()) => true,
            Err(err) => {
                warn!(container = %container.id, %origin, "skipping invalid container: {err}");
                false
            }
        })
        .collect())
}

/// In-memory pool.
#[derive(Clone, Debug, Default)]
pub struct StaticPool {
    containers: Vec<Container>,
}

impl StaticPool {
    pub fn new(containers: Vec<Container>) -> Self {
        Self { containers }
    }

    /// Loads the fleet embedded in the binary.
    pub fn embedded() -> Result<Self, PoolError> {
        let asset = FleetAssets::get(FLEET_ASSET)
            .ok_or_else(|| PoolError::MissingAsset(FLEET_ASSET.to_string()))?;
        let containers = parse_fleet(&asset.data, FLEET_ASSET)?;
        Ok(Self { containers })
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

impl ContainerPool for StaticPool {
    fn list_available(&self, filter: &PoolFilter) -> Result<Vec<Container>, PoolError> {
        Ok(apply_filter(self.containers.clone(), filter))
    }
}

/// Pool backed by a JSON file, re-read on every call.
#[derive(Clone, Debug)]
pub struct JsonFilePool {
    path: PathBuf,
}

impl JsonFilePool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ContainerPool for JsonFilePool {
    fn list_available(&self, filter: &PoolFilter) -> Result<Vec<Container>, PoolError> {
        let bytes = std::fs::read(&self.path).map_err(|source| PoolError::Io {
            path: self.path.clone(),
            source,
        })?;
        let containers = parse_fleet(&bytes, &self.path.display().to_string())?;
        Ok(apply_filter(containers, filter))
    }
}
