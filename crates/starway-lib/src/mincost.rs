//! Sequential greedy planner: minimize total expenditure while visiting as
//! many locations as the budgets allow.
//!
//! At each step the planner ranks unvisited neighbors by a single-hop
//! lookahead cost, applies the per-visit action policy at every stop, and
//! emits a ledger from which every figure can be re-derived.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::output::PlannedStop;
use crate::starmap::{LocationId, Starmap};
use crate::traveler::{apply_visit_policy, PlannerConfig, Traveler, VisitAction};
use crate::waypoint::{self, CrossingMode, JumpOutcome, WaypointTraversal};

/// Size penalty weight: small locations are less efficient stops.
const SIZE_PENALTY_WEIGHT: f64 = 10.0;
/// Discount per yield unit when the traveler will arrive hungry.
const HUNGRY_YIELD_DISCOUNT: f64 = 5.0;
/// Lookahead cost floor, keeping ranking strictly positive.
const MIN_LOOKAHEAD_COST: f64 = 0.1;

/// Result of a min-cost plan, with the full per-visit action ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinCostPlan {
    pub sequence: Vec<PlannedStop>,
    pub actions: Vec<VisitAction>,
    /// Region-crossing jumps performed along the way, in order.
    pub jumps: Vec<JumpOutcome>,
    pub total_stock_consumed: f64,
    pub final_energy: f64,
    pub remaining_lifespan: f64,
    pub total_distance: f64,
    pub lifespan_consumed: f64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl MinCostPlan {
    fn empty(reason: impl Into<String>) -> Self {
        Self {
            sequence: Vec::new(),
            actions: Vec::new(),
            jumps: Vec::new(),
            total_stock_consumed: 0.0,
            final_energy: 0.0,
            remaining_lifespan: 0.0,
            total_distance: 0.0,
            lifespan_consumed: 0.0,
            success: false,
            reason: Some(reason.into()),
        }
    }
}

enum NextHop {
    Direct { target: LocationId, distance: f64 },
    Crossing(WaypointTraversal),
}

/// Plan a minimum-expenditure traversal starting at `start`.
///
/// The supplied traveler is cloned for simulation; the caller's value is not
/// mutated. Recoverable failures return an empty plan with a reason.
pub fn plan_min_cost(
    map: &Starmap,
    start: LocationId,
    traveler: &Traveler,
    config: &PlannerConfig,
) -> Result<MinCostPlan> {
    config.validate()?;

    if !traveler.can_start() {
        return Ok(MinCostPlan::empty(format!(
            "traveler {} cannot start: energy, stock, or lifespan exhausted",
            traveler.name
        )));
    }
    if map.get_location(start).is_err() {
        return Ok(MinCostPlan::empty(format!(
            "start location {start} not found"
        )));
    }

    let mut sim = traveler.clone();
    let mut visited: HashSet<LocationId> = HashSet::new();
    let mut sequence: Vec<PlannedStop> = Vec::new();
    let mut actions: Vec<VisitAction> = Vec::new();
    let mut jumps: Vec<JumpOutcome> = Vec::new();
    let mut total_distance = 0.0;
    let mut current = start;

    loop {
        if !visited.contains(&current) {
            visited.insert(current);
            sequence.push(PlannedStop::resolve(map, current));

            let location = map.get_location(current)?;
            let action = apply_visit_policy(location, sim.energy, sim.stock, config);
            sim.apply_visit(&action);
            actions.push(action);

            if sim.energy <= 0.0 || sim.stock <= 0.0 {
                debug!(location = current, "traveler exhausted after visit");
                break;
            }
        }

        let Some(hop) = next_hop(map, current, &visited, &sim, config) else {
            break;
        };

        match hop {
            NextHop::Direct { target, distance } => {
                sim.apply_travel(distance, config.warp_factor);
                total_distance += distance;
                current = target;
            }
            NextHop::Crossing(traversal) => {
                let outcome = waypoint::perform_jump(&mut sim, &traversal, config);
                visited.insert(traversal.waypoint);
                sequence.push(PlannedStop::resolve(map, traversal.waypoint));
                total_distance += traversal.distance;
                current = traversal.destination;
                jumps.push(outcome);
            }
        }

        if !sim.is_functional() {
            break;
        }
    }

    let total_stock_consumed: f64 = actions.iter().map(|action| action.consumed).sum();

    Ok(MinCostPlan {
        success: !sequence.is_empty(),
        total_stock_consumed,
        final_energy: sim.energy,
        remaining_lifespan: sim.remaining_lifespan(),
        total_distance,
        lifespan_consumed: total_distance / config.warp_factor,
        sequence,
        actions,
        jumps,
        reason: None,
    })
}

/// Pick the cheapest feasible unvisited neighbor by single-hop lookahead.
fn next_hop(
    map: &Starmap,
    current: LocationId,
    visited: &HashSet<LocationId>,
    sim: &Traveler,
    config: &PlannerConfig,
) -> Option<NextHop> {
    let origin = map.get_location(current).ok()?;
    let mut best: Option<(f64, NextHop)> = None;

    for (neighbor, edge) in map.neighbors(current) {
        if visited.contains(&neighbor) {
            continue;
        }
        let Ok(target) = map.get_location(neighbor) else {
            continue;
        };

        let (hop, distance, energy_cost) = match waypoint::crossing_mode(origin, target) {
            CrossingMode::Direct => {
                let energy_cost = sim.travel_energy_cost(edge.distance);
                let lifespan_cost = sim.travel_lifespan_cost(edge.distance, config.warp_factor);
                if energy_cost > sim.energy || lifespan_cost > sim.remaining_lifespan() {
                    continue;
                }
                (
                    NextHop::Direct {
                        target: neighbor,
                        distance: edge.distance,
                    },
                    edge.distance,
                    energy_cost,
                )
            }
            CrossingMode::WaypointRequired => {
                let Some(traversal) = waypoint::find_feasible_traversal(
                    map,
                    current,
                    neighbor,
                    sim.energy,
                    sim.remaining_lifespan(),
                    sim.age_factor(),
                    config.warp_factor,
                    visited,
                ) else {
                    continue;
                };
                let (distance, energy_cost) = (traversal.distance, traversal.energy_cost);
                (NextHop::Crossing(traversal), distance, energy_cost)
            }
        };

        let cost = lookahead_cost(
            distance,
            energy_cost,
            sim.energy - energy_cost,
            target.energy_yield,
            target.size,
            config,
        );

        if best.as_ref().map_or(true, |(best_cost, _)| cost < *best_cost) {
            best = Some((cost, hop));
        }
    }

    best.map(|(_, hop)| hop)
}

/// Single-hop lookahead cost: distance plus double-weighted energy, minus an
/// estimated eating gain when arriving hungry, plus a small-size penalty.
fn lookahead_cost(
    distance: f64,
    energy_cost: f64,
    energy_after_travel: f64,
    target_yield: f64,
    target_size: f64,
    config: &PlannerConfig,
) -> f64 {
    let mut cost = distance + energy_cost * 2.0;
    if energy_after_travel < config.eating_threshold {
        cost -= target_yield * HUNGRY_YIELD_DISCOUNT;
    }
    cost += (1.0 - target_size).max(0.0) * SIZE_PENALTY_WEIGHT;
    cost.max(MIN_LOOKAHEAD_COST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookahead_discounts_hungry_arrivals() {
        let config = PlannerConfig::default();
        let full = lookahead_cost(10.0, 1.0, 80.0, 4.0, 1.0, &config);
        let hungry = lookahead_cost(10.0, 1.0, 30.0, 4.0, 1.0, &config);
        assert!(hungry < full);
        assert_eq!(full - hungry, 20.0);
    }

    #[test]
    fn lookahead_penalizes_small_targets() {
        let config = PlannerConfig::default();
        let big = lookahead_cost(10.0, 1.0, 80.0, 1.0, 1.5, &config);
        let small = lookahead_cost(10.0, 1.0, 80.0, 1.0, 0.3, &config);
        assert!(small > big);
    }

    #[test]
    fn lookahead_never_drops_below_floor() {
        let config = PlannerConfig::default();
        let cost = lookahead_cost(1.0, 0.0, 10.0, 50.0, 1.0, &config);
        assert_eq!(cost, MIN_LOOKAHEAD_COST);
    }
}
