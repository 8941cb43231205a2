//! Traveler state and the per-visit action policy.
//!
//! Energy is a percentage (0-100), consumable stock a non-negative quantity,
//! and lifespan a shrinking budget expressed as `death_age - age`. Every
//! formula here is deterministic so a recorded [`VisitAction`] can be
//! re-derived from its inputs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::explore::SearchTuning;
use crate::path::DEFAULT_DANGER_WEIGHT;
use crate::starmap::{Location, LocationId};

/// Health tier derived from current energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthTier {
    Excellent,
    Good,
    Poor,
    Critical,
    Expired,
}

impl HealthTier {
    /// Tier for a given energy level.
    pub fn from_energy(energy: f64) -> Self {
        if energy <= 0.0 {
            HealthTier::Expired
        } else if energy <= 25.0 {
            HealthTier::Critical
        } else if energy <= 50.0 {
            HealthTier::Poor
        } else if energy <= 75.0 {
            HealthTier::Good
        } else {
            HealthTier::Excellent
        }
    }

    /// Energy bonus rate per unit of consumed stock.
    pub fn stock_bonus_rate(self) -> f64 {
        match self {
            HealthTier::Excellent => 0.05,
            HealthTier::Good => 0.03,
            HealthTier::Poor | HealthTier::Critical => 0.02,
            HealthTier::Expired => 0.0,
        }
    }
}

/// Per-location overrides for the visit policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocationOverride {
    /// Replaces the global research consumption rate at this location.
    pub research_rate: Option<f64>,
    /// Flat energy bonus added to the eating gain at this location.
    pub energy_bonus: Option<f64>,
}

/// Tunable planner parameters with documented defaults. The core is runnable
/// without overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlannerConfig {
    /// Energy consumed per research time unit.
    pub consumption_rate: f64,
    /// Fraction of visit time spent researching; the remainder is eating time.
    pub time_split: f64,
    /// Eating happens only when arrival energy is below this threshold.
    pub eating_threshold: f64,
    /// Weight applied to danger level in the composite edge cost.
    pub danger_weight: f64,
    /// Sole conversion authority from distance to lifespan cost.
    pub warp_factor: f64,
    /// Per-location policy overrides keyed by location id.
    pub location_overrides: HashMap<LocationId, LocationOverride>,
    /// Exploration search tuning constants.
    pub tuning: SearchTuning,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            consumption_rate: 2.0,
            time_split: 0.5,
            eating_threshold: 50.0,
            danger_weight: DEFAULT_DANGER_WEIGHT,
            warp_factor: 1.0,
            location_overrides: HashMap::new(),
            tuning: SearchTuning::default(),
        }
    }
}

impl PlannerConfig {
    /// Validate the configuration before planning with it.
    pub fn validate(&self) -> Result<()> {
        if !self.time_split.is_finite() || !(0.0..=1.0).contains(&self.time_split) {
            return Err(Error::ConfigInvalid {
                message: format!("time_split must be within 0..=1, got {}", self.time_split),
            });
        }
        if !self.warp_factor.is_finite() || self.warp_factor <= 0.0 {
            return Err(Error::ConfigInvalid {
                message: format!("warp_factor must be positive, got {}", self.warp_factor),
            });
        }
        if !self.consumption_rate.is_finite() || self.consumption_rate < 0.0 {
            return Err(Error::ConfigInvalid {
                message: format!(
                    "consumption_rate must be non-negative, got {}",
                    self.consumption_rate
                ),
            });
        }
        if !self.danger_weight.is_finite() || self.danger_weight < 0.0 {
            return Err(Error::ConfigInvalid {
                message: format!(
                    "danger_weight must be non-negative, got {}",
                    self.danger_weight
                ),
            });
        }
        if !self.eating_threshold.is_finite() {
            return Err(Error::ConfigInvalid {
                message: "eating_threshold must be finite".to_string(),
            });
        }
        Ok(())
    }

    /// Research rate effective at a location, honoring overrides.
    pub fn research_rate_at(&self, id: LocationId) -> f64 {
        self.location_overrides
            .get(&id)
            .and_then(|o| o.research_rate)
            .unwrap_or(self.consumption_rate)
    }

    /// Flat eating bonus effective at a location.
    pub fn energy_bonus_at(&self, id: LocationId) -> f64 {
        self.location_overrides
            .get(&id)
            .and_then(|o| o.energy_bonus)
            .unwrap_or(0.0)
    }
}

/// Stateful entity whose energy, stock, and lifespan are tracked through a
/// plan. Mutated step by step during planning; reset between independent runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Traveler {
    pub name: String,
    pub energy: f64,
    pub stock: f64,
    pub age: f64,
    pub death_age: f64,
    initial_energy: f64,
    initial_stock: f64,
    initial_age: f64,
}

impl Traveler {
    pub fn new(name: impl Into<String>, energy: f64, stock: f64, age: f64, death_age: f64) -> Self {
        Self {
            name: name.into(),
            energy,
            stock,
            age,
            death_age,
            initial_energy: energy,
            initial_stock: stock,
            initial_age: age,
        }
    }

    /// Current health tier derived from energy.
    pub fn health_tier(&self) -> HealthTier {
        HealthTier::from_energy(self.energy)
    }

    /// Lifespan budget remaining, in years.
    pub fn remaining_lifespan(&self) -> f64 {
        (self.death_age - self.age).max(0.0)
    }

    /// Age factor applied to travel energy costs. Older travelers pay more.
    pub fn age_factor(&self) -> f64 {
        ((self.age - 5.0) / 10.0).max(1.0)
    }

    /// Energy cost of traveling a distance: floor(distance x 0.1 x age factor).
    pub fn travel_energy_cost(&self, distance: f64) -> f64 {
        (distance * 0.1 * self.age_factor()).floor()
    }

    /// Lifespan cost of traveling a distance, in years.
    pub fn travel_lifespan_cost(&self, distance: f64, warp_factor: f64) -> f64 {
        distance / warp_factor
    }

    /// Whether the traveler is past the terminal non-functional floor.
    pub fn is_functional(&self) -> bool {
        self.energy > 0.0 && self.remaining_lifespan() > 0.0
    }

    /// Whether a plan may start at all: functional with stock on board.
    pub fn can_start(&self) -> bool {
        self.is_functional() && self.stock > 0.0
    }

    /// Whether a single hop of the given distance fits the remaining budgets.
    pub fn can_travel(&self, distance: f64, warp_factor: f64) -> bool {
        self.is_functional()
            && self.travel_energy_cost(distance) <= self.energy
            && self.travel_lifespan_cost(distance, warp_factor) <= self.remaining_lifespan()
    }

    /// Pay the cost of one hop. Energy floors at zero; age always advances.
    pub fn apply_travel(&mut self, distance: f64, warp_factor: f64) {
        let energy_cost = self.travel_energy_cost(distance);
        self.energy = (self.energy - energy_cost).max(0.0);
        self.age += self.travel_lifespan_cost(distance, warp_factor);
    }

    /// Apply the recorded outcome of a visit.
    pub fn apply_visit(&mut self, action: &VisitAction) {
        self.energy = action.final_energy;
        self.stock = action.remaining_stock;
    }

    /// Restore energy, stock, and age to their initial values.
    pub fn reset(&mut self) {
        self.energy = self.initial_energy;
        self.stock = self.initial_stock;
        self.age = self.initial_age;
    }
}

/// Fully reconstructable ledger entry for one visit. Every figure is
/// re-derivable from the recorded inputs and the documented formulas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitAction {
    pub location_id: LocationId,
    pub location_label: String,

    // Arrival state.
    pub arrived_energy: f64,
    pub available_stock: f64,
    pub health_tier: HealthTier,

    // Time distribution.
    pub total_time: f64,
    pub eating_time: f64,
    pub research_time: f64,

    // Eating decision and gain breakdown.
    pub ate: bool,
    pub max_intake: f64,
    pub consumed: f64,
    pub base_gain: f64,
    pub tier_bonus_rate: f64,
    pub intake_bonus: f64,
    pub size_bonus: f64,
    pub override_bonus: f64,
    pub total_gain: f64,
    pub energy_after_eating: f64,

    // Research, which always occurs.
    pub research_rate: f64,
    pub research_cost: f64,

    // Resulting state.
    pub final_energy: f64,
    pub remaining_stock: f64,
}

/// Apply the deterministic per-visit action policy.
///
/// Eating occurs only when arrival energy is below the configured threshold
/// and consumes `min(stock, eating_time)` units. Gained energy is
/// `yield x 10 + consumed x tier bonus x 100 + size x 5` plus any per-location
/// override bonus, capped at 100. Research always occurs and always subtracts
/// `research_time x consumption rate`.
pub fn apply_visit_policy(
    location: &Location,
    energy: f64,
    stock: f64,
    config: &PlannerConfig,
) -> VisitAction {
    let tier = HealthTier::from_energy(energy);
    let total_time = location.time_to_consume;
    let research_time = total_time * config.time_split;
    let max_intake = total_time * (1.0 - config.time_split);

    let can_eat = energy < config.eating_threshold;
    let consumed = if can_eat { stock.min(max_intake) } else { 0.0 };
    let ate = consumed > 0.0;

    let tier_bonus_rate = tier.stock_bonus_rate();
    let base_gain = location.energy_yield * 10.0;
    let size_bonus = location.size * 5.0;
    let override_bonus = config.energy_bonus_at(location.id);

    let (eating_time, intake_bonus, total_gain) = if ate {
        let intake_bonus = consumed * tier_bonus_rate * 100.0;
        (
            total_time * (1.0 - config.time_split),
            intake_bonus,
            base_gain + intake_bonus + size_bonus + override_bonus,
        )
    } else {
        (0.0, 0.0, 0.0)
    };

    let energy_after_eating = if ate {
        (energy + total_gain).min(100.0)
    } else {
        energy
    };

    let research_rate = config.research_rate_at(location.id);
    let research_cost = research_time * research_rate;
    let final_energy = (energy_after_eating - research_cost).max(0.0);

    VisitAction {
        location_id: location.id,
        location_label: location.label.clone(),
        arrived_energy: energy,
        available_stock: stock,
        health_tier: tier,
        total_time,
        eating_time,
        research_time,
        ate,
        max_intake,
        consumed,
        base_gain,
        tier_bonus_rate,
        intake_bonus,
        size_bonus,
        override_bonus,
        total_gain,
        energy_after_eating,
        research_rate,
        research_cost,
        final_energy,
        remaining_stock: stock - consumed,
    }
}
