use std::fmt::Write;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::explore::ExplorationResult;
use crate::mincost::MinCostPlan;
use crate::path::{PathStats, RoutePath};
use crate::starmap::{LocationId, Starmap};

/// Classifies the high-level operation that produced a summary.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    Shortest,
    Explore,
    MinCost,
}

impl PlanKind {
    /// Human-readable label shown in textual renderings.
    pub fn label(self) -> &'static str {
        match self {
            PlanKind::Shortest => "Shortest path",
            PlanKind::Explore => "Exploration",
            PlanKind::MinCost => "Min-cost plan",
        }
    }
}

/// One stop in a planned sequence, with its label resolved for display.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlannedStop {
    pub id: LocationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl PlannedStop {
    /// Resolve a location id into a stop, tolerating unknown ids.
    pub fn resolve(map: &Starmap, id: LocationId) -> Self {
        Self {
            id,
            label: map.location_label(id).map(str::to_string),
        }
    }

    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or("<unknown>")
    }
}

/// Structured representation of a shortest-path result that higher-level
/// consumers can serialise.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PathSummary {
    pub kind: PlanKind,
    pub hops: usize,
    pub start: PlannedStop,
    pub goal: PlannedStop,
    pub steps: Vec<PlannedStop>,
    pub stats: PathStats,
}

impl PathSummary {
    /// Convert a [`RoutePath`] into a summary with resolved labels.
    pub fn from_path(map: &Starmap, path: &RoutePath, stats: PathStats) -> Result<Self> {
        let steps: Vec<PlannedStop> = path
            .steps
            .iter()
            .map(|&id| PlannedStop::resolve(map, id))
            .collect();

        let (Some(start), Some(goal)) = (steps.first().cloned(), steps.last().cloned()) else {
            return Err(Error::MapDataInvalid {
                message: "route path has no steps".to_string(),
            });
        };

        Ok(Self {
            kind: PlanKind::Shortest,
            hops: path.hop_count(),
            start,
            goal,
            steps,
            stats,
        })
    }

    /// Render the summary as plain text.
    pub fn render_plain(&self) -> String {
        let mut buffer = String::new();
        let _ = writeln!(
            buffer,
            "{}: {} -> {} ({} hops, cost {:.1}, distance {:.1})",
            self.kind.label(),
            self.start.display_name(),
            self.goal.display_name(),
            self.hops,
            self.stats.total_cost,
            self.stats.total_distance,
        );
        let joined = self
            .steps
            .iter()
            .map(|step| format!("{} ({})", step.display_name(), step.id))
            .collect::<Vec<_>>()
            .join(" -> ");
        let _ = writeln!(buffer, "{joined}");
        buffer
    }
}

/// Render an exploration result as plain text.
pub fn render_exploration(result: &ExplorationResult) -> String {
    let mut buffer = String::new();
    if let Some(reason) = &result.reason {
        let _ = writeln!(buffer, "{}: no plan ({reason})", PlanKind::Explore.label());
        return buffer;
    }

    let _ = writeln!(
        buffer,
        "{}: {} locations, distance {:.1}, lifespan {:.1}",
        PlanKind::Explore.label(),
        result.visited_count,
        result.total_distance,
        result.lifespan_consumed,
    );
    for (index, stop) in result.sequence.iter().enumerate() {
        let _ = writeln!(buffer, "{:>3}: {} ({})", index, stop.display_name(), stop.id);
    }
    buffer
}

/// Render a min-cost plan as plain text, visit ledger included.
pub fn render_min_cost(plan: &MinCostPlan) -> String {
    let mut buffer = String::new();
    if let Some(reason) = &plan.reason {
        let _ = writeln!(buffer, "{}: no plan ({reason})", PlanKind::MinCost.label());
        return buffer;
    }

    let _ = writeln!(
        buffer,
        "{}: {} stops, distance {:.1}, stock consumed {:.1}, final energy {:.1}, lifespan left {:.1}",
        PlanKind::MinCost.label(),
        plan.sequence.len(),
        plan.total_distance,
        plan.total_stock_consumed,
        plan.final_energy,
        plan.remaining_lifespan,
    );
    for action in &plan.actions {
        let eating = if action.ate {
            format!("ate {:.1} (+{:.1})", action.consumed, action.total_gain)
        } else {
            "no eating".to_string()
        };
        let _ = writeln!(
            buffer,
            "{:>12}: energy {:>5.1} -> {:>5.1}, {}, research -{:.1}",
            action.location_label,
            action.arrived_energy,
            action.final_energy,
            eating,
            action.research_cost,
        );
    }
    for jump in &plan.jumps {
        let _ = writeln!(
            buffer,
            "jump via {} -> {}: energy {:.1} -> {:.1}, stock {:.1} -> {:.1}",
            jump.waypoint,
            jump.destination,
            jump.energy_before,
            jump.energy_after,
            jump.stock_before,
            jump.stock_after,
        );
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::starmap::{Location, Position};

    fn sample_map() -> Starmap {
        let mut map = Starmap::new();
        map.add_region(1, "Lyra");
        for (id, label) in [(1, "Vega"), (2, "Altair")] {
            map.add_location(Location {
                id,
                label: label.to_string(),
                position: Position { x: 0.0, y: 0.0 },
                energy_yield: 1.0,
                time_to_consume: 1.0,
                size: 0.5,
                region: 1,
                major_waypoint: false,
            })
            .unwrap();
        }
        map
    }

    #[test]
    fn resolve_fills_label_when_known() {
        let map = sample_map();
        let stop = PlannedStop::resolve(&map, 1);
        assert_eq!(stop.label.as_deref(), Some("Vega"));
        let unknown = PlannedStop::resolve(&map, 99);
        assert_eq!(unknown.display_name(), "<unknown>");
    }

    #[test]
    fn path_summary_renders_endpoints_and_chain() {
        let map = sample_map();
        let path = RoutePath {
            steps: vec![1, 2],
            total_cost: 20.0,
            total_distance: 10.0,
        };
        let stats = PathStats {
            total_distance: 10.0,
            total_danger: 1,
            total_cost: 20.0,
            hop_count: 1,
        };
        let summary = PathSummary::from_path(&map, &path, stats).unwrap();
        let text = summary.render_plain();
        assert!(text.contains("Vega -> Altair"));
        assert!(text.contains("1 hops"));
        assert!(text.contains("Vega (1) -> Altair (2)"));
    }

    #[test]
    fn empty_path_is_rejected() {
        let map = sample_map();
        let path = RoutePath {
            steps: Vec::new(),
            total_cost: 0.0,
            total_distance: 0.0,
        };
        let stats = PathStats {
            total_distance: 0.0,
            total_danger: 0,
            total_cost: 0.0,
            hop_count: 0,
        };
        assert!(PathSummary::from_path(&map, &path, stats).is_err());
    }
}
