//! Load planning heuristics.
//!
//! Containers are only tracked through aggregate counters (see `ledger`);
//! there is no spatial placement. This module implements:
//! - the single-container evaluator and its optimality score
//! - the selection of the best single container of a pool
//! - the greedy first-fit distribution of items over several containers

use serde::Serialize;
use tracing::{debug, trace};
use utoipa::ToSchema;

use crate::diagnosis::{UnplacedReason, diagnose};
use crate::ledger::OpenContainer;
use crate::model::{Container, ContainerCategory, Item, UnitItem};
use crate::ordering;

/// Configuration for the placement heuristics.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PackingConfig {
    /// Share of the floor area non-stackable cargo may occupy (0.0 to 1.0)
    pub floor_space_ratio: f64,
    /// Weight of the volume utilization in the optimality score
    pub volume_score_weight: f64,
    /// Weight of the payload utilization in the optimality score
    pub weight_score_weight: f64,
    /// Slack in m³ when comparing volumes
    pub volume_epsilon: f64,
    /// Upper bound on unit items per call after quantity expansion
    pub max_units: usize,
}

impl PackingConfig {
    pub const DEFAULT_FLOOR_SPACE_RATIO: f64 = 0.85;
    pub const DEFAULT_VOLUME_SCORE_WEIGHT: f64 = 0.7;
    pub const DEFAULT_WEIGHT_SCORE_WEIGHT: f64 = 0.3;
    pub const DEFAULT_VOLUME_EPSILON: f64 = crate::types::EPSILON_VOLUME;
    pub const DEFAULT_MAX_UNITS: usize = 100_000;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            floor_space_ratio: Self::DEFAULT_FLOOR_SPACE_RATIO,
            volume_score_weight: Self::DEFAULT_VOLUME_SCORE_WEIGHT,
            weight_score_weight: Self::DEFAULT_WEIGHT_SCORE_WEIGHT,
            volume_epsilon: Self::DEFAULT_VOLUME_EPSILON,
            max_units: Self::DEFAULT_MAX_UNITS,
        }
    }
}

/// Builder for PackingConfig.
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    pub fn floor_space_ratio(mut self, ratio: f64) -> Self {
        self.config.floor_space_ratio = ratio;
        self
    }

    pub fn volume_score_weight(mut self, weight: f64) -> Self {
        self.config.volume_score_weight = weight;
        self
    }

    pub fn weight_score_weight(mut self, weight: f64) -> Self {
        self.config.weight_score_weight = weight;
        self
    }

    pub fn volume_epsilon(mut self, epsilon: f64) -> Self {
        self.config.volume_epsilon = epsilon;
        self
    }

    pub fn max_units(mut self, limit: usize) -> Self {
        self.config.max_units = limit;
        self
    }

    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Outcome of simulating a whole item list in one container.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct EvaluationResult {
    pub container_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    pub category: ContainerCategory,
    pub placed_items: usize,
    pub total_items: usize,
    pub volume_utilization: f64,
    pub weight_utilization: f64,
    pub optimality_score: f64,
}

impl EvaluationResult {
    /// Whether every item found room.
    pub fn is_complete(&self) -> bool {
        self.placed_items == self.total_items
    }
}

/// Blends utilizations and completeness into a score in [0, 1].
///
/// `(v × volume_utilization + w × weight_utilization) × placement_score`
pub fn optimality_score(
    volume_utilization: f64,
    weight_utilization: f64,
    placement_score: f64,
    config: &PackingConfig,
) -> f64 {
    let blended = config.volume_score_weight * volume_utilization
        + config.weight_score_weight * weight_utilization;
    (blended * placement_score).clamp(0.0, 1.0)
}

/// Loads the ordered units greedily into a fresh ledger; rejected units are
/// skipped and never retried.
pub fn evaluate(
    container: &Container,
    units: &[UnitItem],
    config: &PackingConfig,
) -> EvaluationResult {
    let mut ledger = OpenContainer::open(container);
    for unit in units {
        if ledger.can_place(unit, config) {
            ledger.apply(unit.clone());
        }
    }

    let total_items = units.len();
    let placed_items = ledger.placed_count();
    let placement_score = if total_items == 0 {
        0.0
    } else {
        placed_items as f64 / total_items as f64
    };
    let volume_utilization = ledger.volume_utilization();
    let weight_utilization = ledger.weight_utilization();

    EvaluationResult {
        container_id: container.id.clone(),
        container_name: container.name.clone(),
        category: container.category,
        placed_items,
        total_items,
        volume_utilization,
        weight_utilization,
        optimality_score: optimality_score(
            volume_utilization,
            weight_utilization,
            placement_score,
            config,
        ),
    }
}

/// Compares two evaluations.
///
/// Priority: complete load > more placed items > higher score. Equal
/// candidates do not replace the current best.
fn is_better_evaluation(new: &EvaluationResult, current: &EvaluationResult) -> bool {
    match (new.is_complete(), current.is_complete()) {
        (true, false) => true,
        (false, true) => false,
        (true, true) => new.optimality_score > current.optimality_score,
        (false, false) => {
            new.placed_items > current.placed_items
                || (new.placed_items == current.placed_items
                    && new.optimality_score > current.optimality_score)
        }
    }
}

/// Evaluates every available container of the pool against already ordered
/// units and returns the best one, or `None` for an empty pool.
pub fn select_best(
    units: &[UnitItem],
    pool: &[Container],
    config: &PackingConfig,
) -> Option<EvaluationResult> {
    let mut best: Option<EvaluationResult> = None;
    for container in pool.iter().filter(|c| c.available) {
        let candidate = evaluate(container, units, config);
        debug!(
            container = %candidate.container_id,
            placed = candidate.placed_items,
            total = candidate.total_items,
            score = candidate.optimality_score,
            "container evaluated"
        );
        let replace = match &best {
            None => true,
            Some(current) => is_better_evaluation(&candidate, current),
        };
        if replace {
            best = Some(candidate);
        }
    }
    best
}

/// Expands and orders the items, then picks the best single container.
pub fn find_optimal(
    items: &[Item],
    pool: &[Container],
    config: &PackingConfig,
) -> Option<EvaluationResult> {
    let units = ordering::prepare(items);
    select_best(&units, pool, config)
}

/// Unit item that found no container, with the diagnosed reason.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct UnplacedItem {
    pub unit: UnitItem,
    pub reason: UnplacedReason,
}

/// Assignment of one unit item to a container.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct Placement {
    pub container_id: String,
    /// Position of the container in the output list (0-based).
    pub container_index: usize,
    pub unit: UnitItem,
}

/// Aggregate statistics of a packing run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct PackStats {
    /// Loaded volume in m³.
    pub total_volume: f64,
    /// Loaded weight in kg.
    pub total_weight: f64,
    /// Requested unit items.
    pub colis_count: usize,
    pub containers_count: usize,
    pub avg_volume_utilization: f64,
    pub avg_weight_utilization: f64,
    /// Loaded fragile unit items.
    pub fragiles_count: usize,
    /// Loaded non-stackable unit items.
    pub non_gerbables_count: usize,
    pub placed_count: usize,
    pub unplaced_count: usize,
}

impl PackStats {
    fn from_ledgers(containers: &[OpenContainer], requested: usize, unplaced: usize) -> Self {
        let count = containers.len();
        let average = |f: fn(&OpenContainer) -> f64| {
            if count == 0 {
                0.0
            } else {
                containers.iter().map(f).sum::<f64>() / count as f64
            }
        };
        let loaded = || containers.iter().flat_map(|c| c.items.iter());

        Self {
            total_volume: containers.iter().map(|c| c.used_volume).sum(),
            total_weight: containers.iter().map(|c| c.used_weight).sum(),
            colis_count: requested,
            containers_count: count,
            avg_volume_utilization: average(OpenContainer::volume_utilization),
            avg_weight_utilization: average(OpenContainer::weight_utilization),
            fragiles_count: loaded().filter(|u| u.is_fragile()).count(),
            non_gerbables_count: loaded().filter(|u| !u.is_stackable()).count(),
            placed_count: containers.iter().map(OpenContainer::placed_count).sum(),
            unplaced_count: unplaced,
        }
    }
}

/// Result of distributing items over a container sequence.
#[derive(Clone, Debug)]
pub struct PackOutcome {
    /// Containers that received at least one item, in opening order.
    pub containers: Vec<OpenContainer>,
    pub unplaced: Vec<UnplacedItem>,
    pub stats: PackStats,
}

impl PackOutcome {
    /// True if every unit item was loaded.
    pub fn is_success(&self) -> bool {
        self.unplaced.is_empty()
    }

    /// Flattens the containers into (container, unit) assignments.
    pub fn placements(&self) -> Vec<Placement> {
        self.containers
            .iter()
            .enumerate()
            .flat_map(|(index, ledger)| {
                ledger.items.iter().map(move |unit| Placement {
                    container_id: ledger.container.id.clone(),
                    container_index: index,
                    unit: unit.clone(),
                })
            })
            .collect()
    }
}

/// Events emitted while packing, for live visualization.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// A container ledger was opened.
    ContainerOpened {
        index: usize,
        container_id: String,
        category: ContainerCategory,
        capacity_volume: f64,
        capacity_weight: f64,
    },
    /// A unit item was loaded.
    ItemPlaced {
        container_id: String,
        row: usize,
        copy: u32,
        remaining_volume: f64,
        remaining_weight: f64,
    },
    /// A container ended empty and is left out of the result.
    ContainerDropped { container_id: String },
    /// A unit item found no container.
    ItemRejected {
        row: usize,
        copy: u32,
        reason_code: String,
        reason_text: String,
    },
    /// Packing finished.
    Finished { containers: usize, unplaced: usize },
}

/// Distributes ordered units over the containers in pool order.
pub fn pack_units(
    units: Vec<UnitItem>,
    pool: &[Container],
    config: &PackingConfig,
) -> PackOutcome {
    pack_units_with_progress(units, pool, config, |_| {})
}

/// Like [`pack_units`], reporting each step through a callback.
///
/// Every container is offered all units still unassigned, in order; a
/// container is only opened while units remain.
pub fn pack_units_with_progress(
    units: Vec<UnitItem>,
    pool: &[Container],
    config: &PackingConfig,
    mut on_event: impl FnMut(&PackEvent),
) -> PackOutcome {
    let requested = units.len();
    let mut pending: Vec<Option<UnitItem>> = units.into_iter().map(Some).collect();
    let mut remaining = requested;

    let mut containers: Vec<OpenContainer> = Vec::new();
    // Last opened ledger when it was dropped for being empty.
    let mut dropped_last: Option<OpenContainer> = None;

    for (index, container) in pool.iter().enumerate() {
        if remaining == 0 {
            break;
        }

        let mut ledger = OpenContainer::open(container);
        on_event(&PackEvent::ContainerOpened {
            index,
            container_id: container.id.clone(),
            category: container.category,
            capacity_volume: container.capacity_volume,
            capacity_weight: container.capacity_weight,
        });

        for slot in pending.iter_mut() {
            let fits = matches!(slot, Some(unit) if ledger.can_place(unit, config));
            if !fits {
                continue;
            }
            if let Some(unit) = slot.take() {
                let (row, copy) = (unit.row, unit.copy);
                ledger.apply(unit);
                remaining -= 1;
                trace!(container = %container.id, row, copy, "item placed");
                on_event(&PackEvent::ItemPlaced {
                    container_id: container.id.clone(),
                    row,
                    copy,
                    remaining_volume: ledger.remaining_volume,
                    remaining_weight: ledger.remaining_weight,
                });
            }
        }

        debug!(
            container = %container.id,
            placed = ledger.placed_count(),
            remaining,
            "container closed"
        );

        if ledger.is_empty() {
            on_event(&PackEvent::ContainerDropped {
                container_id: container.id.clone(),
            });
            dropped_last = Some(ledger);
        } else {
            dropped_last = None;
            containers.push(ledger);
        }
    }

    let reference = dropped_last.as_ref().or(containers.last());
    let unplaced: Vec<UnplacedItem> = pending
        .into_iter()
        .flatten()
        .map(|unit| {
            let reason = diagnose(&unit, reference, config);
            on_event(&PackEvent::ItemRejected {
                row: unit.row,
                copy: unit.copy,
                reason_code: reason.code().to_string(),
                reason_text: reason.to_string(),
            });
            UnplacedItem { unit, reason }
        })
        .collect();

    on_event(&PackEvent::Finished {
        containers: containers.len(),
        unplaced: unplaced.len(),
    });

    let stats = PackStats::from_ledgers(&containers, requested, unplaced.len());
    PackOutcome {
        containers,
        unplaced,
        stats,
    }
}
