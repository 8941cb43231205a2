//! Starway library entry points.
//!
//! This crate loads a starmap dataset into memory, runs composite-cost
//! shortest paths over it, and plans resource-bounded traversals for a
//! traveler: exploration that maximizes distinct visits, greedy min-cost
//! journeys with a reconstructable visit ledger, mandatory-waypoint region
//! crossings, and obstacle impact analysis with alternative-route discovery.
//! Higher-level consumers (the CLI) should only depend on the functions
//! exported here instead of reimplementing behavior.

#![deny(warnings)]

pub mod dataset;
pub mod error;
pub mod explore;
pub mod impact;
pub mod mincost;
pub mod output;
pub mod path;
pub mod starmap;
pub mod traveler;
pub mod waypoint;

pub use dataset::{load_dataset, LoadedDataset};
pub use error::{Error, Result};
pub use explore::{explore_max_visits, ExplorationResult, SearchTuning};
pub use impact::{ImpactEngine, JourneyPurpose, RouteImpactResult};
pub use mincost::{plan_min_cost, MinCostPlan};
pub use output::{PathSummary, PlanKind, PlannedStop};
pub use path::{
    path_stats, reachable_within, shortest_path, PathStats, RoutePath, DEFAULT_DANGER_WEIGHT,
};
pub use starmap::{Location, LocationId, Obstacle, Position, RegionId, RouteEdge, Starmap};
pub use traveler::{apply_visit_policy, HealthTier, PlannerConfig, Traveler, VisitAction};
pub use waypoint::{
    accessible_waypoints, crossing_mode, destination_candidates, plan_crossing,
    waypoint_inventory, CrossingMode, JumpOutcome, WaypointInventory, WaypointTraversal,
};
