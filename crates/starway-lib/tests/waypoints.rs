mod common;

use common::{young_traveler, MapBuilder};
use starway_lib::{
    explore_max_visits, plan_crossing, plan_min_cost, waypoint_inventory, Error, PlannerConfig,
    Starmap, Traveler,
};

/// Two regions: location 1 and major waypoint 2 in Lyra, location 3 in
/// Aquila, with a declared cross-region link 1-3.
fn two_region_map() -> Starmap {
    MapBuilder::new()
        .region(2, "Aquila")
        .location(1, 1)
        .waypoint(2, 1)
        .location(3, 2)
        .route(1, 2, 10.0)
        .route(1, 3, 10.0)
        .build()
}

#[test]
fn exploration_routes_crossings_through_a_waypoint() {
    let map = two_region_map();
    let traveler = young_traveler(100.0, 10.0);
    let config = PlannerConfig::default();

    let result = explore_max_visits(&map, 1, &traveler, &config).unwrap();
    let ids: Vec<_> = result.sequence.iter().map(|stop| stop.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    // Any consecutive region change departs from a major waypoint.
    for pair in ids.windows(2) {
        let from = map.get_location(pair[0]).unwrap();
        let to = map.get_location(pair[1]).unwrap();
        if from.region != to.region {
            assert!(from.major_waypoint, "crossing departed from {}", from.label);
        }
    }
}

#[test]
fn crossing_is_pruned_when_no_waypoint_fits_the_budget() {
    let map = two_region_map();
    // One energy: enough for nothing at distance 10 after the first hop.
    let traveler = young_traveler(0.5, 10.0);
    let config = PlannerConfig::default();

    let result = explore_max_visits(&map, 1, &traveler, &config).unwrap();
    let ids: Vec<_> = result.sequence.iter().map(|stop| stop.id).collect();
    assert_eq!(ids, vec![1], "no hop is affordable at half an energy point");
}

#[test]
fn jump_pays_the_edge_then_applies_the_bonus() {
    let map = two_region_map();
    let traveler = young_traveler(40.0, 10.0);
    let config = PlannerConfig::default();

    let traversal = plan_crossing(&map, &traveler, 1, 3, &config).unwrap();
    assert_eq!(traversal.waypoint, 2);
    assert_eq!(traversal.distance, 10.0);
    assert_eq!(traversal.energy_cost, 1.0);

    let mut sim = traveler.clone();
    let outcome = starway_lib::waypoint::perform_jump(&mut sim, &traversal, &config);
    // 40 - 1 travel, then +50% bonus: 58.5. Stock doubles.
    assert_eq!(outcome.energy_before, 40.0);
    assert_eq!(outcome.energy_after, 58.5);
    assert_eq!(outcome.stock_before, 10.0);
    assert_eq!(outcome.stock_after, 20.0);
    assert_eq!(sim.energy, 58.5);
}

#[test]
fn jump_bonus_caps_at_full_energy() {
    let map = two_region_map();
    let traveler = young_traveler(95.0, 10.0);
    let config = PlannerConfig::default();

    let traversal = plan_crossing(&map, &traveler, 1, 3, &config).unwrap();
    let mut sim = traveler.clone();
    let outcome = starway_lib::waypoint::perform_jump(&mut sim, &traversal, &config);
    assert_eq!(outcome.energy_after, 100.0);
}

#[test]
fn expired_travelers_cannot_plan_a_crossing() {
    let map = two_region_map();
    let expired = Traveler::new("Paloma", 0.0, 10.0, 12.0, 3567.0);
    let config = PlannerConfig::default();

    let error = plan_crossing(&map, &expired, 1, 3, &config).unwrap_err();
    assert!(matches!(error, Error::AlreadyNonFunctional { .. }));
}

#[test]
fn same_region_crossing_requests_are_rejected() {
    let map = two_region_map();
    let traveler = young_traveler(100.0, 10.0);
    let config = PlannerConfig::default();

    let error = plan_crossing(&map, &traveler, 1, 2, &config).unwrap_err();
    assert!(matches!(error, Error::ConfigInvalid { .. }));
}

#[test]
fn min_cost_records_jumps_in_its_ledger() {
    // Make the direct in-region neighbor unattractive (tiny size) so the
    // crossing wins the lookahead.
    let map = MapBuilder::new()
        .region(2, "Aquila")
        .location(1, 1)
        .location_with(2, 1, 1.0, 4.0, 0.2, true)
        .location(3, 2)
        .route(1, 2, 10.0)
        .route(1, 3, 10.0)
        .build();
    let traveler = young_traveler(100.0, 50.0);
    let config = PlannerConfig::default();

    let plan = plan_min_cost(&map, 1, &traveler, &config).unwrap();
    let ids: Vec<_> = plan.sequence.iter().map(|stop| stop.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    assert_eq!(plan.jumps.len(), 1);
    let jump = &plan.jumps[0];
    assert_eq!(jump.waypoint, 2);
    assert_eq!(jump.destination, 3);
    assert_eq!(jump.stock_after, 100.0);
    assert_eq!(jump.energy_after, 100.0);

    // The waypoint is passed through, not visited: two ledger entries.
    assert_eq!(plan.actions.len(), 2);
    assert_eq!(plan.actions[0].location_id, 1);
    assert_eq!(plan.actions[1].location_id, 3);
}

#[test]
fn inventory_counts_majors_per_region() {
    let map = two_region_map();
    let inventory = waypoint_inventory(&map);
    assert_eq!(inventory.total, 1);
    assert_eq!(inventory.by_region.get("Lyra"), Some(&1));
    assert_eq!(inventory.details[0].id, 2);
}
