//! Common test utilities and fixture helpers.
//!
//! Provides a map builder with sensible location defaults plus canned
//! travelers, shared by the integration tests.

#![allow(dead_code)]

use starway_lib::{Location, LocationId, Position, RegionId, Starmap, Traveler};

/// Builder assembling small starmaps for tests.
pub struct MapBuilder {
    map: Starmap,
}

impl MapBuilder {
    #[must_use]
    pub fn new() -> Self {
        let mut map = Starmap::new();
        map.add_region(1, "Lyra");
        Self { map }
    }

    pub fn region(mut self, id: RegionId, name: &str) -> Self {
        self.map.add_region(id, name);
        self
    }

    /// Location with default attributes: yield 1, visit time 4, size 1.
    pub fn location(self, id: LocationId, region: RegionId) -> Self {
        self.location_with(id, region, 1.0, 4.0, 1.0, false)
    }

    pub fn waypoint(self, id: LocationId, region: RegionId) -> Self {
        self.location_with(id, region, 1.0, 4.0, 1.0, true)
    }

    pub fn location_with(
        mut self,
        id: LocationId,
        region: RegionId,
        energy_yield: f64,
        time_to_consume: f64,
        size: f64,
        major_waypoint: bool,
    ) -> Self {
        self.map
            .add_location(Location {
                id,
                label: format!("L{id}"),
                position: Position { x: 0.0, y: 0.0 },
                energy_yield,
                time_to_consume,
                size,
                region,
                major_waypoint,
            })
            .expect("add location");
        self
    }

    pub fn route(mut self, a: LocationId, b: LocationId, distance: f64) -> Self {
        self.map.add_route(a, b, distance, None).expect("add route");
        self
    }

    pub fn route_danger(
        mut self,
        a: LocationId,
        b: LocationId,
        distance: f64,
        danger: u32,
    ) -> Self {
        self.map
            .add_route(a, b, distance, Some(danger))
            .expect("add route");
        self
    }

    pub fn build(self) -> Starmap {
        self.map
    }
}

impl Default for MapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Traveler at age 12 (age factor 1) with a long lifespan ahead.
pub fn young_traveler(energy: f64, stock: f64) -> Traveler {
    Traveler::new("Paloma", energy, stock, 12.0, 3567.0)
}

/// A chain 1-2-...-n with uniform spacing, all in region 1.
pub fn line_map(n: usize, spacing: f64) -> Starmap {
    let mut builder = MapBuilder::new();
    for id in 1..=n as LocationId {
        builder = builder.location(id, 1);
    }
    for id in 1..n as LocationId {
        builder = builder.route(id, id + 1, spacing);
    }
    builder.build()
}
