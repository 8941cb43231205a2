use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Numeric identifier for a location.
pub type LocationId = i64;

/// Numeric identifier for a region.
pub type RegionId = i64;

/// Cartesian coordinates for a location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Calculate the Euclidean distance to another position.
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Graph node with the attributes that feed resource costs and gains.
/// Immutable after load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub id: LocationId,
    pub label: String,
    pub position: Position,
    /// Base energy yield consumed during a visit, in yield units.
    pub energy_yield: f64,
    /// Time a full visit occupies, in time units.
    pub time_to_consume: f64,
    /// Physical size; larger locations grant a bigger visit bonus.
    pub size: f64,
    pub region: RegionId,
    /// Whether this location can host a region-crossing jump.
    pub major_waypoint: bool,
}

/// Weighted, blockable, symmetric connection between two locations.
/// Only the blocked/cause fields mutate after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteEdge {
    pub a: LocationId,
    pub b: LocationId,
    pub distance: f64,
    pub danger_level: u32,
    pub blocked: bool,
    pub blocked_by: Option<String>,
}

impl RouteEdge {
    /// Whether this edge connects the given pair, in either direction.
    pub fn connects(&self, a: LocationId, b: LocationId) -> bool {
        (self.a == a && self.b == b) || (self.a == b && self.b == a)
    }

    /// The opposite endpoint, if `id` is one of the endpoints.
    pub fn other(&self, id: LocationId) -> Option<LocationId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Named, removable set of blocked endpoint pairs. Blocking is symmetric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Obstacle {
    pub name: String,
    pub blocked_pairs: Vec<(LocationId, LocationId)>,
}

impl Obstacle {
    pub fn new(name: impl Into<String>, blocked_pairs: Vec<(LocationId, LocationId)>) -> Self {
        Self {
            name: name.into(),
            blocked_pairs,
        }
    }

    /// Whether this obstacle blocks the given pair, in either direction.
    pub fn blocks(&self, a: LocationId, b: LocationId) -> bool {
        self.blocked_pairs
            .iter()
            .any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
    }
}

/// Minimum similarity for a label to count as a fuzzy suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.7;

/// In-memory store of locations, routes, and obstacle-driven block state.
#[derive(Debug, Clone, Default)]
pub struct Starmap {
    locations: HashMap<LocationId, Location>,
    label_to_id: HashMap<String, LocationId>,
    regions: BTreeMap<RegionId, String>,
    routes: Vec<RouteEdge>,
    adjacency: HashMap<LocationId, Vec<usize>>,
    obstacles: Vec<Obstacle>,
}

impl Starmap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a region name. Re-registering an id overwrites the name.
    pub fn add_region(&mut self, id: RegionId, name: impl Into<String>) {
        self.regions.insert(id, name.into());
    }

    /// Insert a location. Duplicate identifiers or labels are a load-time
    /// hard failure; labels back the resolver and must stay unambiguous.
    pub fn add_location(&mut self, location: Location) -> Result<()> {
        if self.locations.contains_key(&location.id) {
            return Err(Error::MapDataInvalid {
                message: format!("duplicate location id {}", location.id),
            });
        }
        if self.label_to_id.contains_key(&location.label) {
            return Err(Error::MapDataInvalid {
                message: format!("duplicate location label '{}'", location.label),
            });
        }
        self.label_to_id.insert(location.label.clone(), location.id);
        self.adjacency.entry(location.id).or_default();
        self.locations.insert(location.id, location);
        Ok(())
    }

    /// Insert a route between two known locations.
    ///
    /// Self-loops are rejected. A duplicate edge between the same pair keeps
    /// the smaller distance (and that edge's danger level).
    pub fn add_route(
        &mut self,
        a: LocationId,
        b: LocationId,
        distance: f64,
        danger_level: Option<u32>,
    ) -> Result<()> {
        if a == b {
            return Err(Error::SelfLoopRoute { id: a });
        }
        if !self.locations.contains_key(&a) {
            return Err(Error::LocationNotFound { id: a });
        }
        if !self.locations.contains_key(&b) {
            return Err(Error::LocationNotFound { id: b });
        }
        if !distance.is_finite() || distance <= 0.0 {
            return Err(Error::MapDataInvalid {
                message: format!("route {a}-{b} has non-positive distance {distance}"),
            });
        }

        let danger_level = danger_level.unwrap_or_else(|| danger_level_for(distance));

        if let Some(index) = self.route_index_between(a, b) {
            let existing = &mut self.routes[index];
            if distance < existing.distance {
                existing.distance = distance;
                existing.danger_level = danger_level;
            }
            return Ok(());
        }

        let index = self.routes.len();
        self.routes.push(RouteEdge {
            a,
            b,
            distance,
            danger_level,
            blocked: false,
            blocked_by: None,
        });
        self.adjacency.entry(a).or_default().push(index);
        self.adjacency.entry(b).or_default().push(index);
        Ok(())
    }

    /// Look up a location by identifier.
    pub fn get_location(&self, id: LocationId) -> Result<&Location> {
        self.locations
            .get(&id)
            .ok_or(Error::LocationNotFound { id })
    }

    /// Lookup a location identifier by its case-sensitive label.
    pub fn location_id_by_label(&self, label: &str) -> Option<LocationId> {
        self.label_to_id.get(label).copied()
    }

    /// Lookup a location label by identifier.
    pub fn location_label(&self, id: LocationId) -> Option<&str> {
        self.locations.get(&id).map(|loc| loc.label.as_str())
    }

    /// Resolve a label to an identifier, attaching fuzzy suggestions on failure.
    pub fn resolve_label(&self, label: &str) -> Result<LocationId> {
        self.location_id_by_label(label)
            .ok_or_else(|| Error::UnknownLabel {
                label: label.to_string(),
                suggestions: self.fuzzy_label_matches(label, 3),
            })
    }

    /// Closest known labels by Jaro-Winkler similarity, best first.
    pub fn fuzzy_label_matches(&self, label: &str, limit: usize) -> Vec<String> {
        let mut scored: Vec<(f64, &str)> = self
            .label_to_id
            .keys()
            .map(|candidate| (strsim::jaro_winkler(label, candidate), candidate.as_str()))
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, name)| name.to_string())
            .collect()
    }

    /// All locations, in arbitrary order.
    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    /// Region names keyed by region id, in id order.
    pub fn regions(&self) -> &BTreeMap<RegionId, String> {
        &self.regions
    }

    pub fn region_name(&self, id: RegionId) -> Option<&str> {
        self.regions.get(&id).map(String::as_str)
    }

    /// All routes, including blocked ones.
    pub fn routes(&self) -> &[RouteEdge] {
        &self.routes
    }

    /// Non-blocked routes incident to `id`, paired with the opposite endpoint.
    pub fn neighbors(&self, id: LocationId) -> Vec<(LocationId, &RouteEdge)> {
        self.neighbor_edges(id, false)
    }

    /// Routes incident to `id` regardless of block state. Used internally by
    /// the obstacle impact engine.
    pub fn neighbors_ignoring_blocks(&self, id: LocationId) -> Vec<(LocationId, &RouteEdge)> {
        self.neighbor_edges(id, true)
    }

    fn neighbor_edges(&self, id: LocationId, include_blocked: bool) -> Vec<(LocationId, &RouteEdge)> {
        let Some(indices) = self.adjacency.get(&id) else {
            return Vec::new();
        };
        indices
            .iter()
            .map(|&index| &self.routes[index])
            .filter(|edge| include_blocked || !edge.blocked)
            .filter_map(|edge| edge.other(id).map(|other| (other, edge)))
            .collect()
    }

    /// The route between two locations, in either direction, ignoring blocks.
    pub fn route_between(&self, a: LocationId, b: LocationId) -> Option<&RouteEdge> {
        self.route_index_between(a, b).map(|index| &self.routes[index])
    }

    pub(crate) fn route_index_between(&self, a: LocationId, b: LocationId) -> Option<usize> {
        self.adjacency
            .get(&a)?
            .iter()
            .copied()
            .find(|&index| self.routes[index].connects(a, b))
    }

    pub(crate) fn route_blocked_state(&self, index: usize) -> (bool, Option<String>) {
        let edge = &self.routes[index];
        (edge.blocked, edge.blocked_by.clone())
    }

    pub(crate) fn set_route_blocked(
        &mut self,
        index: usize,
        blocked: bool,
        blocked_by: Option<String>,
    ) {
        let edge = &mut self.routes[index];
        edge.blocked = blocked;
        edge.blocked_by = blocked_by;
    }

    /// Apply an obstacle, blocking every matching non-blocked edge.
    ///
    /// Pairs that name no existing route are a no-op, not an error. Edges
    /// already blocked keep their original cause so removal stays idempotent.
    /// Re-adding a name merges its pairs into the existing obstacle, keeping
    /// the registry one entry per name.
    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        for route in &mut self.routes {
            if route.blocked {
                continue;
            }
            if obstacle.blocks(route.a, route.b) {
                route.blocked = true;
                route.blocked_by = Some(obstacle.name.clone());
            }
        }
        for &(a, b) in &obstacle.blocked_pairs {
            if self.route_index_between(a, b).is_none() {
                debug!(a, b, obstacle = %obstacle.name, "obstacle names a non-existent route pair");
            }
        }
        if let Some(existing) = self
            .obstacles
            .iter_mut()
            .find(|existing| existing.name == obstacle.name)
        {
            debug!(obstacle = %obstacle.name, "merging pairs into existing obstacle");
            for (a, b) in obstacle.blocked_pairs {
                if !existing.blocks(a, b) {
                    existing.blocked_pairs.push((a, b));
                }
            }
        } else {
            self.obstacles.push(obstacle);
        }
    }

    /// Remove an obstacle by name, unblocking the edges it blocked.
    /// Removing an unknown name is a no-op.
    pub fn remove_obstacle(&mut self, name: &str) {
        let Some(index) = self.obstacles.iter().position(|o| o.name == name) else {
            debug!(obstacle = name, "remove requested for unknown obstacle");
            return;
        };
        self.obstacles.remove(index);
        for route in &mut self.routes {
            if route.blocked_by.as_deref() == Some(name) {
                route.blocked = false;
                route.blocked_by = None;
            }
        }
    }

    /// Currently registered obstacles.
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }
}

/// Danger level inferred from distance when the map data carries none.
pub fn danger_level_for(distance: f64) -> u32 {
    if distance < 50.0 {
        1
    } else if distance < 100.0 {
        2
    } else if distance < 150.0 {
        3
    } else {
        4
    }
}
