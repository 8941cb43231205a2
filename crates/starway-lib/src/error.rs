use thiserror::Error;

use crate::starmap::LocationId;

/// Convenient result alias for the Starway library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a location identifier is not present in the starmap.
    #[error("unknown location id: {id}")]
    LocationNotFound { id: LocationId },

    /// Raised when a location label could not be resolved.
    #[error("unknown location label: {label}{}", format_suggestions(.suggestions))]
    UnknownLabel {
        label: String,
        suggestions: Vec<String>,
    },

    /// Raised when no non-blocked chain of routes connects two locations.
    #[error("no traversable route between {start} and {goal}")]
    Unreachable { start: String, goal: String },

    /// Raised when no outgoing route fits the remaining budgets.
    #[error("no route affordable within remaining budgets at {location}")]
    InfeasibleBudget { location: String },

    /// Raised when a region crossing has no feasible major waypoint.
    #[error("no feasible major waypoint reachable from {from}")]
    WaypointUnreachable { from: String },

    /// Raised when the traveler cannot start or continue a plan.
    #[error("traveler {name} is no longer functional")]
    AlreadyNonFunctional { name: String },

    /// Raised when a route would connect a location to itself.
    #[error("self-loop route rejected for location {id}")]
    SelfLoopRoute { id: LocationId },

    /// Raised when the map document fails validation at load time.
    #[error("invalid map data: {message}")]
    MapDataInvalid { message: String },

    /// Raised when planner configuration fails validation.
    #[error("invalid planner configuration: {message}")]
    ConfigInvalid { message: String },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON parsing errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
