//! Bounded exploration search: maximize distinct locations visited from a
//! start under immutable energy and lifespan budgets.
//!
//! Depth-first, best-first-ordered, anytime. The best path so far updates on
//! every call entry, not only at leaves, so an interrupted-depth search still
//! reports its longest prefix.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::output::PlannedStop;
use crate::starmap::{LocationId, Starmap};
use crate::traveler::{PlannerConfig, Traveler};
use crate::waypoint::{self, CrossingMode};

/// Empirical search constants. Kept configurable; no derivation is claimed
/// for the default weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchTuning {
    /// Heuristic weight per location already on the path.
    pub visit_weight: f64,
    /// Heuristic weight per remaining energy point.
    pub energy_weight: f64,
    /// Heuristic weight per remaining lifespan year, capped below.
    pub lifespan_weight: f64,
    /// Remaining lifespan is clamped to this value before weighting.
    pub lifespan_weight_cap: f64,
    /// Only this many top-scored candidates expand per node.
    pub branch_cap: usize,
    /// Maximum recursion depth.
    pub depth_cap: usize,
    /// Optimistic extra-visit allowance used by the capacity prune.
    pub capacity_lookahead: usize,
}

impl Default for SearchTuning {
    fn default() -> Self {
        Self {
            visit_weight: 1000.0,
            energy_weight: 2.0,
            lifespan_weight: 5.0,
            lifespan_weight_cap: 100.0,
            branch_cap: 8,
            depth_cap: 15,
            capacity_lookahead: 10,
        }
    }
}

/// Result of a bounded exploration search. When the search could not start,
/// `sequence` is empty and `reason` says why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplorationResult {
    pub sequence: Vec<PlannedStop>,
    pub total_distance: f64,
    pub lifespan_consumed: f64,
    pub visited_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ExplorationResult {
    fn empty(reason: impl Into<String>) -> Self {
        Self {
            sequence: Vec::new(),
            total_distance: 0.0,
            lifespan_consumed: 0.0,
            visited_count: 0,
            reason: Some(reason.into()),
        }
    }
}

struct SearchContext<'a> {
    map: &'a Starmap,
    tuning: SearchTuning,
    age_factor: f64,
    warp_factor: f64,
    location_count: usize,
}

/// Longest simple path found so far, tie-broken by lower total distance.
struct Best {
    sequence: Vec<LocationId>,
    distance: f64,
}

struct Candidate {
    score: f64,
    target: LocationId,
    via: Option<LocationId>,
    distance: f64,
    energy_after: f64,
    lifespan_after: f64,
}

/// Compute the path visiting the most distinct locations from `start`.
///
/// The traveler's budgets are treated as immutable during the search; only a
/// waypoint traversal's compound effect (energy bonus after paying the edge
/// cost) adjusts the tracked energy budget. Recoverable failures return an
/// empty result with a reason instead of an error.
pub fn explore_max_visits(
    map: &Starmap,
    start: LocationId,
    traveler: &Traveler,
    config: &PlannerConfig,
) -> Result<ExplorationResult> {
    config.validate()?;

    if !traveler.can_start() {
        return Ok(ExplorationResult::empty(format!(
            "traveler {} cannot start: energy, stock, or lifespan exhausted",
            traveler.name
        )));
    }
    if map.get_location(start).is_err() {
        return Ok(ExplorationResult::empty(format!(
            "start location {start} not found"
        )));
    }

    let ctx = SearchContext {
        map,
        tuning: config.tuning,
        age_factor: traveler.age_factor(),
        warp_factor: config.warp_factor,
        location_count: map.location_count(),
    };

    let mut best = Best {
        sequence: vec![start],
        distance: 0.0,
    };
    let mut path = vec![start];
    let mut visited: HashSet<LocationId> = HashSet::from([start]);

    dfs(
        &ctx,
        start,
        &mut path,
        &mut visited,
        0.0,
        traveler.energy,
        traveler.remaining_lifespan(),
        0,
        &mut best,
    );

    debug!(
        visited = best.sequence.len(),
        distance = best.distance,
        "exploration search finished"
    );

    let sequence: Vec<PlannedStop> = best
        .sequence
        .iter()
        .map(|&id| PlannedStop::resolve(map, id))
        .collect();

    Ok(ExplorationResult {
        visited_count: sequence.len(),
        total_distance: best.distance,
        lifespan_consumed: best.distance / config.warp_factor,
        sequence,
        reason: None,
    })
}

#[allow(clippy::too_many_arguments)]
fn dfs(
    ctx: &SearchContext<'_>,
    current: LocationId,
    path: &mut Vec<LocationId>,
    visited: &mut HashSet<LocationId>,
    distance: f64,
    energy_left: f64,
    lifespan_left: f64,
    depth: usize,
    best: &mut Best,
) {
    if depth > ctx.tuning.depth_cap {
        return;
    }

    // Anytime update: record the best path on entry, not only at leaves.
    if path.len() > best.sequence.len()
        || (path.len() == best.sequence.len() && distance < best.distance)
    {
        best.sequence = path.clone();
        best.distance = distance;
    }

    // Capacity prune: even the optimistic extension cannot beat the best.
    let max_additional = ctx
        .tuning
        .capacity_lookahead
        .min(ctx.location_count.saturating_sub(path.len()));
    if path.len() + max_additional <= best.sequence.len() {
        return;
    }

    let mut candidates = collect_candidates(ctx, current, path.len(), visited, energy_left, lifespan_left);
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    candidates.truncate(ctx.tuning.branch_cap);

    for candidate in candidates {
        if let Some(via) = candidate.via {
            path.push(via);
            visited.insert(via);
        }
        path.push(candidate.target);
        visited.insert(candidate.target);

        dfs(
            ctx,
            candidate.target,
            path,
            visited,
            distance + candidate.distance,
            candidate.energy_after,
            candidate.lifespan_after,
            depth + 1,
            best,
        );

        visited.remove(&candidate.target);
        path.pop();
        if let Some(via) = candidate.via {
            visited.remove(&via);
            path.pop();
        }
    }
}

fn collect_candidates(
    ctx: &SearchContext<'_>,
    current: LocationId,
    path_len: usize,
    visited: &HashSet<LocationId>,
    energy_left: f64,
    lifespan_left: f64,
) -> Vec<Candidate> {
    let Ok(origin) = ctx.map.get_location(current) else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    for (neighbor, edge) in ctx.map.neighbors(current) {
        if visited.contains(&neighbor) {
            continue;
        }
        let Ok(target) = ctx.map.get_location(neighbor) else {
            continue;
        };

        let candidate = match waypoint::crossing_mode(origin, target) {
            CrossingMode::Direct => {
                let energy_cost = (edge.distance * 0.1 * ctx.age_factor).floor();
                let lifespan_cost = edge.distance / ctx.warp_factor;
                if energy_cost > energy_left || lifespan_cost > lifespan_left {
                    continue;
                }
                Candidate {
                    score: 0.0,
                    target: neighbor,
                    via: None,
                    distance: edge.distance,
                    energy_after: energy_left - energy_cost,
                    lifespan_after: lifespan_left - lifespan_cost,
                }
            }
            CrossingMode::WaypointRequired => {
                let Some(traversal) = waypoint::find_feasible_traversal(
                    ctx.map,
                    current,
                    neighbor,
                    energy_left,
                    lifespan_left,
                    ctx.age_factor,
                    ctx.warp_factor,
                    visited,
                ) else {
                    // No feasible major waypoint: the crossing edge is pruned.
                    continue;
                };
                let energy_after =
                    ((energy_left - traversal.energy_cost) * 1.5).min(100.0);
                Candidate {
                    score: 0.0,
                    target: neighbor,
                    via: Some(traversal.waypoint),
                    distance: traversal.distance,
                    energy_after,
                    lifespan_after: lifespan_left - traversal.lifespan_cost,
                }
            }
        };

        let added = if candidate.via.is_some() { 2 } else { 1 };
        let score = heuristic_score(
            &ctx.tuning,
            path_len + added,
            candidate.energy_after,
            candidate.lifespan_after,
        );
        candidates.push(Candidate { score, ..candidate });
    }
    candidates
}

fn heuristic_score(tuning: &SearchTuning, visit_count: usize, energy: f64, lifespan: f64) -> f64 {
    tuning.visit_weight * visit_count as f64
        + tuning.energy_weight * energy
        + tuning.lifespan_weight * lifespan.min(tuning.lifespan_weight_cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuning_defaults_match_documented_constants() {
        let tuning = SearchTuning::default();
        assert_eq!(tuning.visit_weight, 1000.0);
        assert_eq!(tuning.energy_weight, 2.0);
        assert_eq!(tuning.lifespan_weight, 5.0);
        assert_eq!(tuning.branch_cap, 8);
        assert_eq!(tuning.depth_cap, 15);
    }

    #[test]
    fn heuristic_prefers_more_visits_over_budget_slack() {
        let tuning = SearchTuning::default();
        let longer = heuristic_score(&tuning, 4, 0.0, 0.0);
        let shorter_rich = heuristic_score(&tuning, 3, 100.0, 100.0);
        assert!(longer > shorter_rich);
    }
}
