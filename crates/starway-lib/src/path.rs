use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::starmap::{LocationId, RouteEdge, Starmap};

/// Weight applied to an edge's danger level when computing composite cost.
///
/// Composite cost = distance + danger_level x this constant. Ten matches the
/// health-decay penalty the original cost model charged per danger unit.
pub const DEFAULT_DANGER_WEIGHT: f64 = 10.0;

/// Composite traversal cost of a single edge.
pub fn composite_cost(edge: &RouteEdge, danger_weight: f64) -> f64 {
    edge.distance + f64::from(edge.danger_level) * danger_weight
}

/// Lowest-composite-cost path between two locations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePath {
    pub steps: Vec<LocationId>,
    pub total_cost: f64,
    pub total_distance: f64,
}

impl RoutePath {
    /// Number of edges traversed.
    pub fn hop_count(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }
}

/// Aggregate figures for an already-chosen path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathStats {
    pub total_distance: f64,
    pub total_danger: u32,
    pub total_cost: f64,
    pub hop_count: usize,
}

/// Run Dijkstra over non-blocked edges using the composite cost model.
///
/// Ties between equal-cost frontier entries break by discovery order via the
/// heap's id ordering; this is policy, not a guaranteed optimal tie-break.
pub fn shortest_path(
    map: &Starmap,
    start: LocationId,
    goal: LocationId,
    danger_weight: f64,
) -> Result<RoutePath> {
    map.get_location(start)?;
    map.get_location(goal)?;

    dijkstra(map, start, goal, danger_weight).ok_or_else(|| Error::Unreachable {
        start: label_or_id(map, start),
        goal: label_or_id(map, goal),
    })
}

/// Dijkstra core shared with the obstacle impact engine. Returns `None` when
/// no non-blocked chain connects the endpoints.
pub(crate) fn dijkstra(
    map: &Starmap,
    start: LocationId,
    goal: LocationId,
    danger_weight: f64,
) -> Option<RoutePath> {
    if start == goal {
        return Some(RoutePath {
            steps: vec![start],
            total_cost: 0.0,
            total_distance: 0.0,
        });
    }

    let mut costs: HashMap<LocationId, f64> = HashMap::new();
    let mut parents: HashMap<LocationId, Option<LocationId>> = HashMap::new();
    let mut queue = BinaryHeap::new();

    costs.insert(start, 0.0);
    parents.insert(start, None);
    queue.push(QueueEntry::new(start, 0.0));

    while let Some(entry) = queue.pop() {
        let current_cost = match costs.get(&entry.node) {
            Some(cost) if *cost < entry.cost.0 => continue,
            Some(cost) => *cost,
            None => continue,
        };

        if entry.node == goal {
            let steps = reconstruct_path(&parents, start, goal);
            let total_distance = path_distance(map, &steps);
            return Some(RoutePath {
                steps,
                total_cost: current_cost,
                total_distance,
            });
        }

        for (next, edge) in map.neighbors(entry.node) {
            let next_cost = current_cost + composite_cost(edge, danger_weight);
            if next_cost < *costs.get(&next).unwrap_or(&f64::INFINITY) {
                costs.insert(next, next_cost);
                parents.insert(next, Some(entry.node));
                queue.push(QueueEntry::new(next, next_cost));
            }
        }
    }

    None
}

/// Aggregate distance/danger/cost totals along a path of location ids.
pub fn path_stats(map: &Starmap, steps: &[LocationId], danger_weight: f64) -> Result<PathStats> {
    let mut total_distance = 0.0;
    let mut total_danger = 0u32;
    let mut total_cost = 0.0;

    for pair in steps.windows(2) {
        let edge = map
            .route_between(pair[0], pair[1])
            .ok_or_else(|| Error::Unreachable {
                start: label_or_id(map, pair[0]),
                goal: label_or_id(map, pair[1]),
            })?;
        total_distance += edge.distance;
        total_danger += edge.danger_level;
        total_cost += composite_cost(edge, danger_weight);
    }

    Ok(PathStats {
        total_distance,
        total_danger,
        total_cost,
        hop_count: steps.len().saturating_sub(1),
    })
}

/// All locations reachable from `start` within a composite-cost budget,
/// sorted by ascending cost.
pub fn reachable_within(
    map: &Starmap,
    start: LocationId,
    max_cost: f64,
    danger_weight: f64,
) -> Result<Vec<(LocationId, f64)>> {
    map.get_location(start)?;

    let mut reachable = Vec::new();
    for location in map.locations() {
        if location.id == start {
            continue;
        }
        if let Some(path) = dijkstra(map, start, location.id, danger_weight) {
            if path.total_cost <= max_cost {
                reachable.push((location.id, path.total_cost));
            }
        }
    }
    reachable.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    Ok(reachable)
}

fn path_distance(map: &Starmap, steps: &[LocationId]) -> f64 {
    steps
        .windows(2)
        .filter_map(|pair| map.route_between(pair[0], pair[1]))
        .map(|edge| edge.distance)
        .sum()
}

fn label_or_id(map: &Starmap, id: LocationId) -> String {
    map.location_label(id)
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string())
}

fn reconstruct_path(
    parents: &HashMap<LocationId, Option<LocationId>>,
    start: LocationId,
    goal: LocationId,
) -> Vec<LocationId> {
    let mut path = Vec::new();
    let mut current = Some(goal);
    while let Some(node) = current {
        path.push(node);
        if node == start {
            break;
        }
        current = parents.get(&node).copied().flatten();
    }
    path.reverse();
    path
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: LocationId,
    cost: FloatOrd,
}

impl QueueEntry {
    fn new(node: LocationId, cost: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
