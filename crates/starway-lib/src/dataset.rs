//! Map dataset loading.
//!
//! Datasets are JSON documents holding regions of locations with their
//! outgoing links, plus an optional traveler profile. Loading is two-pass:
//! every location first, then every link, so link order in the file never
//! matters. Structural problems (duplicate ids, bad distances, malformed
//! JSON) are hard failures; links naming unknown targets are skipped with a
//! warning, matching how sparse survey data usually arrives.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::starmap::{Location, LocationId, Position, RegionId, Starmap};
use crate::traveler::Traveler;

/// Traveler defaults applied when the document carries no profile.
const DEFAULT_TRAVELER_NAME: &str = "Traveler";
const DEFAULT_ENERGY: f64 = 100.0;
const DEFAULT_STOCK: f64 = 300.0;
const DEFAULT_START_AGE: f64 = 12.0;
const DEFAULT_DEATH_AGE: f64 = 3567.0;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapDocument {
    #[serde(default)]
    regions: Vec<RegionDocument>,
    #[serde(default)]
    traveler: Option<TravelerDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegionDocument {
    id: RegionId,
    name: String,
    #[serde(default)]
    locations: Vec<LocationDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationDocument {
    id: LocationId,
    label: Option<String>,
    #[serde(default)]
    position: PositionDocument,
    #[serde(default = "default_yield")]
    energy_yield: f64,
    #[serde(default = "default_time")]
    time_to_consume: f64,
    #[serde(default = "default_size")]
    size: f64,
    #[serde(default)]
    major_waypoint: bool,
    #[serde(default)]
    links: Vec<LinkDocument>,
}

#[derive(Debug, Default, Deserialize)]
struct PositionDocument {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkDocument {
    to: LocationId,
    distance: f64,
    danger_level: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TravelerDocument {
    name: Option<String>,
    energy: Option<f64>,
    stock: Option<f64>,
    start_age: Option<f64>,
    death_age: Option<f64>,
}

fn default_yield() -> f64 {
    1.0
}

fn default_time() -> f64 {
    1.0
}

fn default_size() -> f64 {
    0.5
}

/// A loaded dataset: the map plus the traveler profile it describes.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub map: Starmap,
    pub traveler: Traveler,
    /// Link pairs declared in one direction only.
    pub one_way_links: Vec<(LocationId, LocationId)>,
}

/// Load a dataset from a JSON file.
pub fn load_dataset(path: &Path) -> Result<LoadedDataset> {
    let raw = fs::read_to_string(path)?;
    let document: MapDocument = serde_json::from_str(&raw)?;
    build_dataset(document)
}

fn build_dataset(document: MapDocument) -> Result<LoadedDataset> {
    let mut map = Starmap::new();

    for region in &document.regions {
        map.add_region(region.id, region.name.clone());
        for location in &region.locations {
            map.add_location(Location {
                id: location.id,
                label: location
                    .label
                    .clone()
                    .unwrap_or_else(|| location.id.to_string()),
                position: Position {
                    x: location.position.x,
                    y: location.position.y,
                },
                energy_yield: location.energy_yield,
                time_to_consume: location.time_to_consume,
                size: location.size,
                region: region.id,
                major_waypoint: location.major_waypoint,
            })?;
        }
    }

    for region in &document.regions {
        for location in &region.locations {
            for link in &location.links {
                if map.get_location(link.to).is_err() {
                    warn!(
                        from = location.id,
                        to = link.to,
                        "link names an unknown location; skipping"
                    );
                    continue;
                }
                map.add_route(location.id, link.to, link.distance, link.danger_level)?;
            }
        }
    }

    let one_way_links = audit_bidirectional_links(&document);
    for &(a, b) in &one_way_links {
        warn!(a, b, "link declared in one direction only");
    }

    let traveler = traveler_from_document(document.traveler.as_ref());

    info!(
        locations = map.location_count(),
        routes = map.routes().len(),
        regions = map.regions().len(),
        "dataset loaded"
    );

    Ok(LoadedDataset {
        map,
        traveler,
        one_way_links,
    })
}

fn traveler_from_document(document: Option<&TravelerDocument>) -> Traveler {
    let name = document
        .and_then(|d| d.name.clone())
        .unwrap_or_else(|| DEFAULT_TRAVELER_NAME.to_string());
    Traveler::new(
        name,
        document.and_then(|d| d.energy).unwrap_or(DEFAULT_ENERGY),
        document.and_then(|d| d.stock).unwrap_or(DEFAULT_STOCK),
        document.and_then(|d| d.start_age).unwrap_or(DEFAULT_START_AGE),
        document.and_then(|d| d.death_age).unwrap_or(DEFAULT_DEATH_AGE),
    )
}

/// Pairs linked in one direction but not the other. The store itself treats
/// every route as symmetric; this audit reports on the raw document.
fn audit_bidirectional_links(document: &MapDocument) -> Vec<(LocationId, LocationId)> {
    use std::collections::HashSet;

    let mut declared: HashSet<(LocationId, LocationId)> = HashSet::new();
    for region in &document.regions {
        for location in &region.locations {
            for link in &location.links {
                declared.insert((location.id, link.to));
            }
        }
    }

    let mut one_way: Vec<(LocationId, LocationId)> = declared
        .iter()
        .filter(|&&(a, b)| !declared.contains(&(b, a)))
        .copied()
        .collect();
    one_way.sort_unstable();
    one_way
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_dataset(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(json.as_bytes()).expect("write dataset");
        file
    }

    const SAMPLE: &str = r#"{
        "traveler": {"name": "Paloma", "energy": 90, "stock": 200},
        "regions": [
            {
                "id": 1,
                "name": "Lyra",
                "locations": [
                    {
                        "id": 1,
                        "label": "Vega",
                        "position": {"x": 0, "y": 0},
                        "energyYield": 3,
                        "timeToConsume": 4,
                        "size": 2,
                        "links": [{"to": 2, "distance": 10, "dangerLevel": 1}]
                    },
                    {
                        "id": 2,
                        "label": "Sheliak",
                        "majorWaypoint": true,
                        "links": [{"to": 1, "distance": 10}, {"to": 9, "distance": 5}]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn loads_locations_routes_and_traveler() {
        let file = write_dataset(SAMPLE);
        let dataset = load_dataset(file.path()).unwrap();

        assert_eq!(dataset.map.location_count(), 2);
        assert_eq!(dataset.map.routes().len(), 1);
        assert_eq!(dataset.map.region_name(1), Some("Lyra"));
        assert!(dataset.map.get_location(2).unwrap().major_waypoint);

        assert_eq!(dataset.traveler.name, "Paloma");
        assert_eq!(dataset.traveler.energy, 90.0);
        assert_eq!(dataset.traveler.stock, 200.0);
        assert_eq!(dataset.traveler.death_age, 3567.0);
    }

    #[test]
    fn defaults_fill_missing_traveler_and_fields() {
        let file = write_dataset(r#"{"regions": [{"id": 1, "name": "Lyra", "locations": [{"id": 7}]}]}"#);
        let dataset = load_dataset(file.path()).unwrap();

        let location = dataset.map.get_location(7).unwrap();
        assert_eq!(location.label, "7");
        assert_eq!(location.size, 0.5);
        assert_eq!(dataset.traveler.name, "Traveler");
        assert_eq!(dataset.traveler.energy, 100.0);
    }

    #[test]
    fn malformed_json_is_a_hard_failure() {
        let file = write_dataset("{not json");
        assert!(load_dataset(file.path()).is_err());
    }

    #[test]
    fn one_way_links_are_reported_not_fatal() {
        let file = write_dataset(SAMPLE);
        let dataset = load_dataset(file.path()).unwrap();
        // 2 -> 9 has no reverse declaration (and no target at all).
        assert_eq!(dataset.one_way_links, vec![(2, 9)]);
    }

    #[test]
    fn duplicate_location_id_is_rejected() {
        let file = write_dataset(
            r#"{"regions": [{"id": 1, "name": "Lyra", "locations": [{"id": 1}, {"id": 1}]}]}"#,
        );
        assert!(load_dataset(file.path()).is_err());
    }
}
