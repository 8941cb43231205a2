//! Mandatory waypoint system for region crossings.
//!
//! A planned step between locations in different regions is never valid as a
//! direct edge; it must pass through a major waypoint in the current region.
//! A successful traversal pays the normal edge cost to the waypoint, applies
//! a one-time energy bonus and stock doubling, then jumps instantaneously to
//! the chosen destination in the target region.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::starmap::{Location, LocationId, Position, RegionId, Starmap};
use crate::traveler::{PlannerConfig, Traveler};

/// Crossing classification for a candidate step. A pure function of the two
/// locations' region ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingMode {
    /// Source and destination share a region; the direct edge applies.
    Direct,
    /// Regions differ; a major waypoint must mediate the step.
    WaypointRequired,
}

/// Classify a step between two locations.
pub fn crossing_mode(from: &Location, to: &Location) -> CrossingMode {
    if from.region == to.region {
        CrossingMode::Direct
    } else {
        CrossingMode::WaypointRequired
    }
}

/// A resolved region crossing: travel to the waypoint, then jump.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaypointTraversal {
    pub waypoint: LocationId,
    pub destination: LocationId,
    /// Distance of the single edge from the current location to the waypoint.
    /// The jump itself adds no distance.
    pub distance: f64,
    pub energy_cost: f64,
    pub lifespan_cost: f64,
}

/// Outcome of an executed waypoint jump, recording state before and after.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JumpOutcome {
    pub waypoint: LocationId,
    pub destination: LocationId,
    pub distance: f64,
    pub energy_before: f64,
    pub energy_after: f64,
    pub stock_before: f64,
    pub stock_after: f64,
}

/// Major waypoints in the same region as `from`, reachable by a single
/// non-blocked edge, ranked by ascending distance.
pub fn accessible_waypoints(map: &Starmap, from: LocationId) -> Result<Vec<(LocationId, f64)>> {
    let origin = map.get_location(from)?;
    let mut accessible: Vec<(LocationId, f64)> = map
        .neighbors(from)
        .into_iter()
        .filter_map(|(other, edge)| {
            let candidate = map.get_location(other).ok()?;
            (candidate.major_waypoint && candidate.region == origin.region)
                .then_some((other, edge.distance))
        })
        .collect();
    accessible.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    Ok(accessible)
}

/// All locations within the target region, as jump destination candidates.
/// Destination selection itself is left to the caller.
pub fn destination_candidates(map: &Starmap, region: RegionId) -> Vec<&Location> {
    let mut candidates: Vec<&Location> = map
        .locations()
        .filter(|location| location.region == region)
        .collect();
    candidates.sort_by_key(|location| location.id);
    candidates
}

/// Resolve a crossing into a compound traversal under raw budgets.
///
/// Waypoints in `excluded` (already visited by the calling search) are
/// skipped. Returns `None` when no single-edge major waypoint fits both
/// budgets; the searches treat that as an infeasible edge and prune.
pub(crate) fn find_feasible_traversal(
    map: &Starmap,
    from: LocationId,
    destination: LocationId,
    energy_budget: f64,
    lifespan_budget: f64,
    age_factor: f64,
    warp_factor: f64,
    excluded: &std::collections::HashSet<LocationId>,
) -> Option<WaypointTraversal> {
    let accessible = accessible_waypoints(map, from).ok()?;
    for (waypoint, distance) in accessible {
        if waypoint == destination || excluded.contains(&waypoint) {
            continue;
        }
        let energy_cost = (distance * 0.1 * age_factor).floor();
        let lifespan_cost = distance / warp_factor;
        if energy_cost <= energy_budget && lifespan_cost <= lifespan_budget {
            return Some(WaypointTraversal {
                waypoint,
                destination,
                distance,
                energy_cost,
                lifespan_cost,
            });
        }
        debug!(
            waypoint,
            distance, "major waypoint too expensive for remaining budgets"
        );
    }
    None
}

/// Plan a region crossing for a traveler.
///
/// Fails with `WaypointUnreachable` when no major waypoint is a single
/// non-blocked edge away, and with `InfeasibleBudget` when waypoints exist
/// but none fits the remaining budgets.
pub fn plan_crossing(
    map: &Starmap,
    traveler: &Traveler,
    from: LocationId,
    destination: LocationId,
    config: &PlannerConfig,
) -> Result<WaypointTraversal> {
    let origin = map.get_location(from)?;
    let target = map.get_location(destination)?;
    if crossing_mode(origin, target) == CrossingMode::Direct {
        return Err(Error::ConfigInvalid {
            message: format!(
                "locations {} and {} share region {}; no crossing to plan",
                origin.label, target.label, origin.region
            ),
        });
    }
    if !traveler.is_functional() {
        return Err(Error::AlreadyNonFunctional {
            name: traveler.name.clone(),
        });
    }

    let candidates = accessible_waypoints(map, from)?
        .iter()
        .any(|&(waypoint, _)| waypoint != destination);
    if !candidates {
        return Err(Error::WaypointUnreachable {
            from: origin.label.clone(),
        });
    }

    find_feasible_traversal(
        map,
        from,
        destination,
        traveler.energy,
        traveler.remaining_lifespan(),
        traveler.age_factor(),
        config.warp_factor,
        &std::collections::HashSet::new(),
    )
    .ok_or_else(|| Error::InfeasibleBudget {
        location: origin.label.clone(),
    })
}

/// One-time jump bonus: half the current energy back (capped at 100) and a
/// doubled stock.
pub fn apply_jump_bonus(traveler: &mut Traveler) {
    traveler.energy = (traveler.energy + traveler.energy * 0.5).min(100.0);
    traveler.stock *= 2.0;
}

/// Execute a resolved traversal: pay the edge cost, apply the bonus, jump.
pub fn perform_jump(
    traveler: &mut Traveler,
    traversal: &WaypointTraversal,
    config: &PlannerConfig,
) -> JumpOutcome {
    let energy_before = traveler.energy;
    let stock_before = traveler.stock;

    traveler.apply_travel(traversal.distance, config.warp_factor);
    apply_jump_bonus(traveler);

    JumpOutcome {
        waypoint: traversal.waypoint,
        destination: traversal.destination,
        distance: traversal.distance,
        energy_before,
        energy_after: traveler.energy,
        stock_before,
        stock_after: traveler.stock,
    }
}

/// Detail record for one major waypoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaypointDetail {
    pub id: LocationId,
    pub label: String,
    pub region: RegionId,
    pub region_name: Option<String>,
    pub position: Position,
    pub size: f64,
    pub energy_yield: f64,
}

/// Inventory of major waypoints grouped by region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaypointInventory {
    pub total: usize,
    pub by_region: BTreeMap<String, usize>,
    pub details: Vec<WaypointDetail>,
}

/// Enumerate all major waypoints with per-region counts.
pub fn waypoint_inventory(map: &Starmap) -> WaypointInventory {
    let mut details: Vec<WaypointDetail> = map
        .locations()
        .filter(|location| location.major_waypoint)
        .map(|location| WaypointDetail {
            id: location.id,
            label: location.label.clone(),
            region: location.region,
            region_name: map.region_name(location.region).map(str::to_string),
            position: location.position,
            size: location.size,
            energy_yield: location.energy_yield,
        })
        .collect();
    details.sort_by_key(|detail| detail.id);

    let mut by_region = BTreeMap::new();
    for detail in &details {
        let key = detail
            .region_name
            .clone()
            .unwrap_or_else(|| detail.region.to_string());
        *by_region.entry(key).or_insert(0) += 1;
    }

    WaypointInventory {
        total: details.len(),
        by_region,
        details,
    }
}
