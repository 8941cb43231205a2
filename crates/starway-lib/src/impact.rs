//! Obstacle impact analysis and rerouting.
//!
//! The engine instance owns the active-journey registry and the listener
//! list; there is no ambient singleton. Alternative-route discovery mutates
//! the shared edge-block state temporarily and restores it through a scoped
//! guard on every exit path, so callers in a multi-threaded host must
//! serialize planning and analysis calls.

use serde::Serialize;
use tracing::{debug, warn};

use crate::path::{self, DEFAULT_DANGER_WEIGHT};
use crate::starmap::{LocationId, Obstacle, Starmap};

/// Alternative routes computed per invalidated journey.
pub const DEFAULT_MAX_ALTERNATIVES: usize = 3;

/// Pluggable point-to-point path finder used for alternative discovery.
pub trait PathFinder {
    fn find_path(
        &self,
        map: &Starmap,
        start: LocationId,
        goal: LocationId,
        danger_weight: f64,
    ) -> Option<Vec<LocationId>>;
}

/// Pluggable validator deciding whether a path is currently traversable.
pub trait PathValidator {
    fn is_traversable(&self, map: &Starmap, path: &[LocationId]) -> bool;

    fn blocked_segments(&self, map: &Starmap, path: &[LocationId])
        -> Vec<(LocationId, LocationId)>;
}

/// Built-in finder backed by the shortest path engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct DijkstraPathFinder;

impl PathFinder for DijkstraPathFinder {
    fn find_path(
        &self,
        map: &Starmap,
        start: LocationId,
        goal: LocationId,
        danger_weight: f64,
    ) -> Option<Vec<LocationId>> {
        path::dijkstra(map, start, goal, danger_weight).map(|route| route.steps)
    }
}

/// Built-in validator that consults current edge-block state.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeStateValidator;

impl PathValidator for EdgeStateValidator {
    fn is_traversable(&self, map: &Starmap, path: &[LocationId]) -> bool {
        if path.len() < 2 {
            return true;
        }
        path.windows(2).all(|pair| {
            map.route_between(pair[0], pair[1])
                .map(|edge| !edge.blocked)
                .unwrap_or(false)
        })
    }

    fn blocked_segments(
        &self,
        map: &Starmap,
        path: &[LocationId],
    ) -> Vec<(LocationId, LocationId)> {
        path.windows(2)
            .filter(|pair| {
                map.route_between(pair[0], pair[1])
                    .map(|edge| edge.blocked)
                    .unwrap_or(false)
            })
            .map(|pair| (pair[0], pair[1]))
            .collect()
    }
}

/// Why a journey was planned. Carried through for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyPurpose {
    Shortest,
    MaxVisit,
    MinCost,
    Other,
}

/// An adopted planned sequence, subject to invalidation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveJourney {
    pub path: Vec<LocationId>,
    pub current_index: usize,
    pub purpose: JourneyPurpose,
}

impl ActiveJourney {
    pub fn origin(&self) -> LocationId {
        self.path[0]
    }

    pub fn destination(&self) -> LocationId {
        self.path[self.path.len() - 1]
    }
}

/// Analysis outcome, produced fresh per obstacle and never mutated after
/// return.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteImpactResult {
    pub invalidated: bool,
    pub affected_segments: Vec<(LocationId, LocationId)>,
    pub alternatives: Vec<Vec<LocationId>>,
    pub recalculation_needed: bool,
    pub summary: String,
}

impl RouteImpactResult {
    fn empty() -> Self {
        Self {
            invalidated: false,
            affected_segments: Vec::new(),
            alternatives: Vec::new(),
            recalculation_needed: false,
            summary: String::new(),
        }
    }
}

/// Listener outcome. Failures are logged and never abort remaining listeners.
pub type ListenerResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

type ImpactListener = Box<dyn Fn(&RouteImpactResult) -> ListenerResult>;

/// Engine owning the journey registry, listeners, and reroute strategy.
pub struct ImpactEngine {
    finder: Box<dyn PathFinder>,
    validator: Box<dyn PathValidator>,
    journeys: Vec<ActiveJourney>,
    listeners: Vec<ImpactListener>,
    max_alternatives: usize,
    danger_weight: f64,
}

impl Default for ImpactEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ImpactEngine {
    /// Engine with the built-in Dijkstra finder and edge-state validator.
    pub fn new() -> Self {
        Self::with_parts(Box::new(DijkstraPathFinder), Box::new(EdgeStateValidator))
    }

    /// Engine with caller-supplied finder and validator strategies.
    pub fn with_parts(finder: Box<dyn PathFinder>, validator: Box<dyn PathValidator>) -> Self {
        Self {
            finder,
            validator,
            journeys: Vec::new(),
            listeners: Vec::new(),
            max_alternatives: DEFAULT_MAX_ALTERNATIVES,
            danger_weight: DEFAULT_DANGER_WEIGHT,
        }
    }

    pub fn with_max_alternatives(mut self, max_alternatives: usize) -> Self {
        self.max_alternatives = max_alternatives;
        self
    }

    pub fn with_danger_weight(mut self, danger_weight: f64) -> Self {
        self.danger_weight = danger_weight;
        self
    }

    /// Register an adopted plan. Sequences shorter than two locations cannot
    /// be invalidated and are ignored.
    pub fn register_journey(
        &mut self,
        path: Vec<LocationId>,
        current_index: usize,
        purpose: JourneyPurpose,
    ) {
        if path.len() < 2 {
            debug!("ignoring journey registration with fewer than two locations");
            return;
        }
        self.journeys.push(ActiveJourney {
            path,
            current_index,
            purpose,
        });
    }

    pub fn journeys(&self) -> &[ActiveJourney] {
        &self.journeys
    }

    pub fn clear_journeys(&mut self) {
        self.journeys.clear();
    }

    /// Register a listener invoked synchronously after each analysis.
    pub fn add_listener<F>(&mut self, listener: F)
    where
        F: Fn(&RouteImpactResult) -> ListenerResult + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Analyze how an obstacle affects every registered journey.
    ///
    /// With zero active journeys the result is non-invalidated and empty.
    /// Alternative discovery temporarily blocks edges and restores them
    /// unconditionally before returning.
    pub fn analyze_impact(&self, map: &mut Starmap, obstacle: &Obstacle) -> RouteImpactResult {
        let mut result = RouteImpactResult::empty();

        for journey in &self.journeys {
            let matching = matching_segments(journey, obstacle);
            if matching.is_empty() {
                continue;
            }
            result.invalidated = true;
            result.recalculation_needed = true;
            result.affected_segments.extend(matching);

            let alternatives =
                self.compute_alternatives(map, journey.origin(), journey.destination());
            result.alternatives.extend(
                alternatives
                    .into_iter()
                    .filter(|alt| self.validator.is_traversable(map, alt)),
            );
        }

        result.summary = summarize(obstacle, &result);

        for listener in &self.listeners {
            if let Err(error) = listener(&result) {
                warn!(%error, "impact listener failed; continuing");
            }
        }

        result
    }

    /// Alternative routes currently available between two endpoints.
    pub fn current_alternatives(
        &self,
        map: &mut Starmap,
        origin: LocationId,
        destination: LocationId,
    ) -> Vec<Vec<LocationId>> {
        if map.get_location(origin).is_err() || map.get_location(destination).is_err() {
            return Vec::new();
        }
        let alternatives = self.compute_alternatives(map, origin, destination);
        alternatives
            .into_iter()
            .filter(|alt| self.validator.is_traversable(map, alt))
            .collect()
    }

    /// Discover up to `max_alternatives` disjoint-ish routes by repeatedly
    /// finding a path and temporarily blocking the edges it used. The guard
    /// restores every temporarily-blocked edge on all exit paths.
    fn compute_alternatives(
        &self,
        map: &mut Starmap,
        start: LocationId,
        goal: LocationId,
    ) -> Vec<Vec<LocationId>> {
        let mut guard = BlockGuard::new(map);
        let mut alternatives = Vec::new();

        for _ in 0..self.max_alternatives {
            let Some(route) = self
                .finder
                .find_path(guard.map(), start, goal, self.danger_weight)
            else {
                break;
            };
            if route.len() < 2 {
                break;
            }
            for pair in route.windows(2) {
                guard.block_pair(pair[0], pair[1]);
            }
            alternatives.push(route);
        }

        alternatives
    }
}

fn matching_segments(journey: &ActiveJourney, obstacle: &Obstacle) -> Vec<(LocationId, LocationId)> {
    journey
        .path
        .windows(2)
        .filter(|pair| obstacle.blocks(pair[0], pair[1]))
        .map(|pair| (pair[0], pair[1]))
        .collect()
}

fn summarize(obstacle: &Obstacle, result: &RouteImpactResult) -> String {
    if !result.invalidated {
        return format!("obstacle '{}' has no impact on active journeys", obstacle.name);
    }

    let segments = result
        .affected_segments
        .iter()
        .take(3)
        .map(|(a, b)| format!("{a}-{b}"))
        .collect::<Vec<_>>()
        .join(", ");

    let alternatives = if result.alternatives.is_empty() {
        "no alternative routes found".to_string()
    } else {
        format!("{} alternative routes found", result.alternatives.len())
    };

    format!(
        "journey invalidated by obstacle '{}'; affected segments: {}; {}",
        obstacle.name, segments, alternatives
    )
}

/// Scoped guard recording prior blocked state and restoring it on drop.
struct BlockGuard<'a> {
    map: &'a mut Starmap,
    saved: Vec<(usize, bool, Option<String>)>,
}

impl<'a> BlockGuard<'a> {
    fn new(map: &'a mut Starmap) -> Self {
        Self {
            map,
            saved: Vec::new(),
        }
    }

    fn map(&self) -> &Starmap {
        self.map
    }

    /// Temporarily block the route between a pair. Already-blocked edges are
    /// left untouched so real obstacles survive restoration.
    fn block_pair(&mut self, a: LocationId, b: LocationId) {
        let Some(index) = self.map.route_index_between(a, b) else {
            return;
        };
        let (blocked, cause) = self.map.route_blocked_state(index);
        if blocked {
            return;
        }
        self.saved.push((index, blocked, cause));
        self.map.set_route_blocked(index, true, None);
    }
}

impl Drop for BlockGuard<'_> {
    fn drop(&mut self) {
        for (index, blocked, cause) in self.saved.drain(..).rev() {
            self.map.set_route_blocked(index, blocked, cause);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::starmap::{Location, Position};

    fn location(id: LocationId) -> Location {
        Location {
            id,
            label: format!("L{id}"),
            position: Position { x: 0.0, y: 0.0 },
            energy_yield: 1.0,
            time_to_consume: 1.0,
            size: 0.5,
            region: 1,
            major_waypoint: false,
        }
    }

    fn line_map() -> Starmap {
        let mut map = Starmap::new();
        map.add_region(1, "Lyra");
        for id in 1..=3 {
            map.add_location(location(id)).unwrap();
        }
        map.add_route(1, 2, 10.0, Some(1)).unwrap();
        map.add_route(2, 3, 10.0, Some(1)).unwrap();
        map
    }

    #[test]
    fn zero_journeys_yield_empty_result() {
        let mut map = line_map();
        let engine = ImpactEngine::new();
        let obstacle = Obstacle::new("Halley", vec![(1, 2)]);
        let result = engine.analyze_impact(&mut map, &obstacle);
        assert!(!result.invalidated);
        assert!(!result.recalculation_needed);
        assert!(result.affected_segments.is_empty());
    }

    #[test]
    fn short_journeys_are_not_registered() {
        let mut engine = ImpactEngine::new();
        engine.register_journey(vec![1], 0, JourneyPurpose::Other);
        assert!(engine.journeys().is_empty());
    }

    #[test]
    fn block_guard_restores_on_drop() {
        let mut map = line_map();
        {
            let mut guard = BlockGuard::new(&mut map);
            guard.block_pair(1, 2);
            assert!(guard.map().route_between(1, 2).unwrap().blocked);
        }
        assert!(!map.route_between(1, 2).unwrap().blocked);
    }

    #[test]
    fn block_guard_leaves_real_obstacles_alone() {
        let mut map = line_map();
        map.add_obstacle(Obstacle::new("Halley", vec![(1, 2)]));
        {
            let mut guard = BlockGuard::new(&mut map);
            guard.block_pair(1, 2);
            guard.block_pair(2, 3);
        }
        let edge = map.route_between(1, 2).unwrap();
        assert!(edge.blocked);
        assert_eq!(edge.blocked_by.as_deref(), Some("Halley"));
        assert!(!map.route_between(2, 3).unwrap().blocked);
    }

    #[test]
    fn failing_listener_does_not_abort_others() {
        use std::cell::Cell;
        use std::rc::Rc;

        let mut map = line_map();
        let mut engine = ImpactEngine::new();
        engine.register_journey(vec![1, 2, 3], 0, JourneyPurpose::Shortest);
        engine.add_listener(|_| Err("listener exploded".into()));
        let called = Rc::new(Cell::new(false));
        let called_clone = Rc::clone(&called);
        engine.add_listener(move |_| {
            called_clone.set(true);
            Ok(())
        });

        let obstacle = Obstacle::new("Halley", vec![(1, 2)]);
        map.add_obstacle(obstacle.clone());
        let result = engine.analyze_impact(&mut map, &obstacle);

        assert!(result.invalidated);
        assert!(called.get(), "second listener still ran");
    }
}
