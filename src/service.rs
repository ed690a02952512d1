//! Entry points offered to callers.
//!
//! Each call reads the container pool once, then runs the pipeline
//! expand → sort → evaluate/pack → diagnose on state it owns. Nothing is
//! persisted or reserved.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::ledger::OpenContainer;
use crate::model::{Container, ContainerCategory, Item, ValidationError};
use crate::optimizer::{
    EvaluationResult, PackEvent, PackStats, PackingConfig, Placement, UnplacedItem,
    pack_units_with_progress, select_best,
};
use crate::ordering;
use crate::pool::{ContainerPool, PoolError, PoolFilter};
use crate::types::{Dimensional, Weighted};

pub const NO_CONTAINERS_MESSAGE: &str = "no containers available";

/// Errors that abort a whole call.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no items to place")]
    NoItems,
    #[error("item #{row} is invalid: {source}")]
    InvalidItem {
        row: usize,
        #[source]
        source: ValidationError,
    },
    #[error("{requested} unit items requested, at most {limit} per call")]
    TooManyUnits { requested: usize, limit: usize },
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Which containers a simulation may use.
///
/// Explicit ids take precedence over the category. Without either, the best
/// single container of the whole pool is used.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, ToSchema)]
#[schema(example = json!({ "category": "truck" }))]
pub struct PlacementOptions {
    #[serde(default)]
    #[schema(nullable = true)]
    pub container_ids: Option<Vec<String>>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub category: Option<ContainerCategory>,
}

/// Final state of one loaded container.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct ContainerLoad {
    pub index: usize,
    pub container: Container,
    pub placed_items: usize,
    pub used_volume: f64,
    pub used_weight: f64,
    pub remaining_volume: f64,
    pub remaining_weight: f64,
    pub volume_utilization: f64,
    pub weight_utilization: f64,
    pub floor_space_used: f64,
    pub floor_space_total: f64,
    pub has_fragile_items: bool,
}

impl ContainerLoad {
    fn from_ledger(index: usize, ledger: &OpenContainer) -> Self {
        Self {
            index,
            container: ledger.container.clone(),
            placed_items: ledger.placed_count(),
            used_volume: ledger.used_volume,
            used_weight: ledger.used_weight,
            remaining_volume: ledger.remaining_volume,
            remaining_weight: ledger.remaining_weight,
            volume_utilization: ledger.volume_utilization(),
            weight_utilization: ledger.weight_utilization(),
            floor_space_used: ledger.floor_space_used,
            floor_space_total: ledger.floor_space_total,
            has_fragile_items: ledger.has_fragile_items,
        }
    }
}

/// Result of [`simulate_placement`].
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct SimulationReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub containers: Vec<ContainerLoad>,
    pub placements: Vec<Placement>,
    pub unplaced_items: Vec<UnplacedItem>,
    pub stats: PackStats,
}

impl SimulationReport {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            containers: Vec::new(),
            placements: Vec::new(),
            unplaced_items: Vec::new(),
            stats: PackStats::default(),
        }
    }
}

fn validate_items(items: &[Item]) -> Result<(), EngineError> {
    if items.is_empty() {
        return Err(EngineError::NoItems);
    }
    for (row, item) in items.iter().enumerate() {
        item.validate()
            .map_err(|source| EngineError::InvalidItem { row, source })?;
    }
    Ok(())
}

/// Rejects requests whose expanded unit count exceeds `limit`.
fn check_unit_count(items: &[Item], limit: usize) -> Result<(), EngineError> {
    let requested = items
        .iter()
        .try_fold(0usize, |total, item| total.checked_add(item.quantity as usize))
        .unwrap_or(usize::MAX);
    if requested > limit {
        warn!(requested, limit, "request rejected: too many unit items");
        return Err(EngineError::TooManyUnits { requested, limit });
    }
    Ok(())
}

/// Coarse pre-filter: containers whose raw capacity covers the total volume
/// and weight of the request, smallest first. No placement is simulated.
#[instrument(skip_all, fields(rows = items.len()))]
pub fn suggest_containers(
    pool: &dyn ContainerPool,
    items: &[Item],
) -> Result<Vec<Container>, EngineError> {
    validate_items(items)?;

    let (volume, weight) = items.iter().fold((0.0, 0.0), |(v, w), item| {
        let quantity = f64::from(item.quantity);
        (v + item.volume_m3() * quantity, w + item.weight() * quantity)
    });

    let mut candidates: Vec<Container> = pool
        .list_available(&PoolFilter::All)?
        .into_iter()
        .filter(|c| c.capacity_volume >= volume && c.capacity_weight >= weight)
        .collect();
    candidates.sort_by(|a, b| {
        a.capacity_volume
            .total_cmp(&b.capacity_volume)
            .then_with(|| a.capacity_weight.total_cmp(&b.capacity_weight))
    });

    info!(
        required_volume = volume,
        required_weight = weight,
        suggestions = candidates.len(),
        "containers suggested"
    );
    Ok(candidates)
}

/// Best single container for the whole item list, `None` for an empty pool.
#[instrument(skip_all, fields(rows = items.len()))]
pub fn find_optimal_container(
    pool: &dyn ContainerPool,
    items: &[Item],
    config: &PackingConfig,
) -> Result<Option<EvaluationResult>, EngineError> {
    validate_items(items)?;
    check_unit_count(items, config.max_units)?;
    let containers = pool.list_available(&PoolFilter::All)?;
    let units = ordering::prepare(items);
    let best = select_best(&units, &containers, config);

    match &best {
        Some(result) => info!(
            container = %result.container_id,
            placed = result.placed_items,
            total = result.total_items,
            score = result.optimality_score,
            "optimal container found"
        ),
        None => info!("no container available"),
    }
    Ok(best)
}

/// Distributes the items over the containers selected by `options`.
pub fn simulate_placement(
    pool: &dyn ContainerPool,
    items: &[Item],
    options: &PlacementOptions,
    config: &PackingConfig,
) -> Result<SimulationReport, EngineError> {
    simulate_placement_with_progress(pool, items, options, config, |_| {})
}

/// Like [`simulate_placement`], reporting each packing step.
#[instrument(skip_all, fields(rows = items.len()))]
pub fn simulate_placement_with_progress(
    pool: &dyn ContainerPool,
    items: &[Item],
    options: &PlacementOptions,
    config: &PackingConfig,
    on_event: impl FnMut(&PackEvent),
) -> Result<SimulationReport, EngineError> {
    match validate_items(items) {
        Err(err @ EngineError::NoItems) => return Ok(SimulationReport::failed(err.to_string())),
        other => other?,
    }
    check_unit_count(items, config.max_units)?;

    let units = ordering::prepare(items);
    let containers = match (&options.container_ids, options.category) {
        (Some(ids), _) => pool.list_available(&PoolFilter::Ids(ids.clone()))?,
        (None, Some(category)) => pool.list_available(&PoolFilter::Category(category))?,
        (None, None) => {
            let all = pool.list_available(&PoolFilter::All)?;
            let best = select_best(&units, &all, config);
            all.into_iter()
                .filter(|c| best.as_ref().is_some_and(|b| b.container_id == c.id))
                .take(1)
                .collect()
        }
    };

    if containers.is_empty() {
        info!("simulation aborted: {}", NO_CONTAINERS_MESSAGE);
        return Ok(SimulationReport::failed(NO_CONTAINERS_MESSAGE));
    }
    debug!(candidates = containers.len(), units = units.len(), "packing");

    let outcome = pack_units_with_progress(units, &containers, config, on_event);
    let placements = outcome.placements();
    let success = outcome.is_success();

    info!(
        success,
        containers = outcome.stats.containers_count,
        placed = outcome.stats.placed_count,
        unplaced = outcome.stats.unplaced_count,
        "simulation finished"
    );

    Ok(SimulationReport {
        success,
        error: None,
        containers: outcome
            .containers
            .iter()
            .enumerate()
            .map(|(index, ledger)| ContainerLoad::from_ledger(index, ledger))
            .collect(),
        placements,
        unplaced_items: outcome.unplaced,
        stats: outcome.stats,
    })
}
