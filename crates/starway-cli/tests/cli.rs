use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

const DATASET: &str = r#"{
    "traveler": {"name": "Paloma", "energy": 100, "stock": 50},
    "regions": [
        {
            "id": 1,
            "name": "Lyra",
            "locations": [
                {
                    "id": 1,
                    "label": "Vega",
                    "energyYield": 3,
                    "timeToConsume": 4,
                    "size": 1,
                    "links": [{"to": 2, "distance": 10, "dangerLevel": 1}]
                },
                {
                    "id": 2,
                    "label": "Sheliak",
                    "majorWaypoint": true,
                    "links": [
                        {"to": 1, "distance": 10, "dangerLevel": 1},
                        {"to": 3, "distance": 10, "dangerLevel": 1}
                    ]
                },
                {
                    "id": 3,
                    "label": "Sulafat",
                    "links": [{"to": 2, "distance": 10, "dangerLevel": 1}]
                }
            ]
        },
        {
            "id": 2,
            "name": "Cygnus",
            "locations": [
                {"id": 4, "label": "Albireo"}
            ]
        }
    ]
}"#;

fn dataset_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp dataset");
    file.write_all(DATASET.as_bytes()).expect("write dataset");
    file
}

fn starway() -> Command {
    Command::cargo_bin("starway").expect("binary built")
}

#[test]
fn shortest_prints_the_chain() {
    let data = dataset_file();
    starway()
        .args(["--data"])
        .arg(data.path())
        .args(["shortest", "--from", "Vega", "--to", "Sulafat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Vega -> Sulafat"))
        .stdout(predicate::str::contains("2 hops"));
}

#[test]
fn shortest_emits_json_when_asked() {
    let data = dataset_file();
    starway()
        .args(["--data"])
        .arg(data.path())
        .args(["--json", "shortest", "--from", "Vega", "--to", "Sulafat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"hops\": 2"))
        .stdout(predicate::str::contains("\"label\": \"Sheliak\""));
}

#[test]
fn unknown_label_fails_with_suggestions() {
    let data = dataset_file();
    starway()
        .args(["--data"])
        .arg(data.path())
        .args(["shortest", "--from", "Vegaa", "--to", "Sulafat"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Vega"));
}

#[test]
fn explore_reports_visits() {
    let data = dataset_file();
    starway()
        .args(["--data"])
        .arg(data.path())
        .args(["explore", "--from", "Vega"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 locations"));
}

#[test]
fn min_cost_prints_the_ledger() {
    let data = dataset_file();
    starway()
        .args(["--data"])
        .arg(data.path())
        .args(["min-cost", "--from", "Vega"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Min-cost plan"))
        .stdout(predicate::str::contains("Vega"));
}

#[test]
fn waypoints_lists_majors() {
    let data = dataset_file();
    starway()
        .args(["--data"])
        .arg(data.path())
        .args(["waypoints"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Major waypoints: 1"))
        .stdout(predicate::str::contains("Sheliak"));
}

#[test]
fn reachable_respects_the_cost_budget() {
    let data = dataset_file();
    starway()
        .args(["--data"])
        .arg(data.path())
        .args(["reachable", "--from", "Vega", "--max-cost", "20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sheliak"))
        .stdout(predicate::str::contains("Reachable within cost 20.0: 1"));
}

#[test]
fn crossing_lists_destination_candidates() {
    let data = dataset_file();
    starway()
        .args(["--data"])
        .arg(data.path())
        .args(["crossing", "--from", "Vega", "--region", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Crossing via Sheliak"))
        .stdout(predicate::str::contains("jump to Albireo"))
        .stdout(predicate::str::contains("- Albireo (4)"));
}

#[test]
fn impact_reports_invalidation() {
    let data = dataset_file();
    starway()
        .args(["--data"])
        .arg(data.path())
        .args([
            "impact",
            "--journey",
            "Vega,Sheliak,Sulafat",
            "--name",
            "Halley",
            "--block",
            "Vega:Sheliak",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("invalidated by obstacle 'Halley'"))
        .stdout(predicate::str::contains("no alternative routes found"));
}

#[test]
fn missing_dataset_is_a_clean_failure() {
    starway()
        .args(["--data", "/nonexistent/map.json", "waypoints"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load dataset"));
}
