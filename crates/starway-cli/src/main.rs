use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use starway_lib::{
    destination_candidates, explore_max_visits, load_dataset, output, path_stats, plan_crossing,
    plan_min_cost, reachable_within, shortest_path, waypoint_inventory, ImpactEngine,
    JourneyPurpose, LoadedDataset, LocationId, Obstacle, PathSummary, PlannerConfig, RegionId,
    Starmap,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Starway traversal planning utilities")]
struct Cli {
    /// Path to the JSON map dataset.
    #[arg(long)]
    data: PathBuf,

    /// Optional planner configuration file (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit machine-readable JSON instead of text.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the lowest composite-cost path between two locations.
    Shortest {
        /// Starting location label or id.
        #[arg(long = "from")]
        from: String,
        /// Destination location label or id.
        #[arg(long = "to")]
        to: String,
        /// Override the danger weight in the composite cost.
        #[arg(long)]
        danger_weight: Option<f64>,
    },
    /// Visit as many distinct locations as the traveler's budgets allow.
    Explore {
        #[arg(long = "from")]
        from: String,
    },
    /// Plan a greedy minimum-expenditure journey with its visit ledger.
    MinCost {
        #[arg(long = "from")]
        from: String,
    },
    /// Plan a region crossing and list jump destination candidates.
    Crossing {
        /// Current location label or id.
        #[arg(long = "from")]
        from: String,
        /// Target region id.
        #[arg(long)]
        region: RegionId,
        /// Destination label or id; defaults to the first candidate.
        #[arg(long = "to")]
        to: Option<String>,
    },
    /// Analyze how an obstacle affects a planned journey.
    Impact {
        /// Planned journey as comma-separated location labels or ids.
        #[arg(long)]
        journey: String,
        /// Obstacle name used as the blocking cause.
        #[arg(long, default_value = "obstacle")]
        name: String,
        /// Blocked pair, written as FROM:TO. Repeatable.
        #[arg(long = "block", required = true)]
        blocks: Vec<String>,
    },
    /// List major waypoints grouped by region.
    Waypoints,
    /// List locations reachable within a composite-cost budget.
    Reachable {
        #[arg(long = "from")]
        from: String,
        #[arg(long)]
        max_cost: f64,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let dataset = load_dataset(&cli.data)
        .with_context(|| format!("failed to load dataset from {}", cli.data.display()))?;
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Command::Shortest {
            from,
            to,
            danger_weight,
        } => handle_shortest(&dataset, &config, from, to, *danger_weight, cli.json),
        Command::Explore { from } => handle_explore(&dataset, &config, from, cli.json),
        Command::MinCost { from } => handle_min_cost(&dataset, &config, from, cli.json),
        Command::Crossing { from, region, to } => {
            handle_crossing(&dataset, &config, from, *region, to.as_deref(), cli.json)
        }
        Command::Impact {
            journey,
            name,
            blocks,
        } => handle_impact(&dataset, journey, name, blocks, cli.json),
        Command::Waypoints => handle_waypoints(&dataset, cli.json),
        Command::Reachable { from, max_cost } => {
            handle_reachable(&dataset, &config, from, *max_cost, cli.json)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PlannerConfig> {
    let Some(path) = path else {
        return Ok(PlannerConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config from {}", path.display()))?;
    let config: PlannerConfig = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config from {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Resolve a location argument given either as a numeric id or a label.
fn resolve(map: &Starmap, argument: &str) -> Result<LocationId> {
    if let Ok(id) = argument.parse::<LocationId>() {
        if map.get_location(id).is_ok() {
            return Ok(id);
        }
    }
    Ok(map.resolve_label(argument)?)
}

fn handle_shortest(
    dataset: &LoadedDataset,
    config: &PlannerConfig,
    from: &str,
    to: &str,
    danger_weight: Option<f64>,
    json: bool,
) -> Result<()> {
    let start = resolve(&dataset.map, from)?;
    let goal = resolve(&dataset.map, to)?;
    let weight = danger_weight.unwrap_or(config.danger_weight);

    let path = shortest_path(&dataset.map, start, goal, weight)?;
    let stats = path_stats(&dataset.map, &path.steps, weight)?;
    let summary = PathSummary::from_path(&dataset.map, &path, stats)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.render_plain());
    }
    Ok(())
}

fn handle_explore(
    dataset: &LoadedDataset,
    config: &PlannerConfig,
    from: &str,
    json: bool,
) -> Result<()> {
    let start = resolve(&dataset.map, from)?;
    let result = explore_max_visits(&dataset.map, start, &dataset.traveler, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", output::render_exploration(&result));
    }
    Ok(())
}

fn handle_min_cost(
    dataset: &LoadedDataset,
    config: &PlannerConfig,
    from: &str,
    json: bool,
) -> Result<()> {
    let start = resolve(&dataset.map, from)?;
    let plan = plan_min_cost(&dataset.map, start, &dataset.traveler, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", output::render_min_cost(&plan));
    }
    Ok(())
}

fn handle_crossing(
    dataset: &LoadedDataset,
    config: &PlannerConfig,
    from: &str,
    region: RegionId,
    to: Option<&str>,
    json: bool,
) -> Result<()> {
    let start = resolve(&dataset.map, from)?;
    let candidates = destination_candidates(&dataset.map, region);
    if candidates.is_empty() {
        anyhow::bail!("region {region} has no locations");
    }

    let destination = match to {
        Some(to) => resolve(&dataset.map, to)?,
        None => candidates[0].id,
    };
    let traversal = plan_crossing(&dataset.map, &dataset.traveler, start, destination, config)?;

    if json {
        let payload = serde_json::json!({
            "traversal": traversal,
            "candidates": candidates.iter().map(|c| c.id).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let waypoint = dataset
        .map
        .location_label(traversal.waypoint)
        .unwrap_or("<unknown>");
    let target = dataset
        .map
        .location_label(traversal.destination)
        .unwrap_or("<unknown>");
    println!(
        "Crossing via {waypoint}: distance {:.1}, energy {:.1}, lifespan {:.1}, jump to {target}",
        traversal.distance, traversal.energy_cost, traversal.lifespan_cost
    );
    println!("Destination candidates in region {region}:");
    for candidate in &candidates {
        println!("- {} ({})", candidate.label, candidate.id);
    }
    Ok(())
}

fn handle_impact(
    dataset: &LoadedDataset,
    journey: &str,
    name: &str,
    blocks: &[String],
    json: bool,
) -> Result<()> {
    let path = journey
        .split(',')
        .map(|stop| resolve(&dataset.map, stop.trim()))
        .collect::<Result<Vec<_>>>()?;

    let mut blocked_pairs = Vec::new();
    for block in blocks {
        let (from, to) = block
            .split_once(':')
            .with_context(|| format!("blocked pair '{block}' is not FROM:TO"))?;
        blocked_pairs.push((
            resolve(&dataset.map, from.trim())?,
            resolve(&dataset.map, to.trim())?,
        ));
    }

    let obstacle = Obstacle::new(name, blocked_pairs);
    let mut map = dataset.map.clone();
    map.add_obstacle(obstacle.clone());

    let mut engine = ImpactEngine::new();
    engine.register_journey(path, 0, JourneyPurpose::Shortest);
    let result = engine.analyze_impact(&mut map, &obstacle);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", result.summary);
    for alternative in &result.alternatives {
        let chain = alternative
            .iter()
            .map(|&id| dataset.map.location_label(id).unwrap_or("<unknown>").to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        println!("- {chain}");
    }
    Ok(())
}

fn handle_waypoints(dataset: &LoadedDataset, json: bool) -> Result<()> {
    let inventory = waypoint_inventory(&dataset.map);

    if json {
        println!("{}", serde_json::to_string_pretty(&inventory)?);
        return Ok(());
    }

    println!("Major waypoints: {}", inventory.total);
    for (region, count) in &inventory.by_region {
        println!("{region}: {count}");
    }
    for detail in &inventory.details {
        println!("- {} ({})", detail.label, detail.id);
    }
    Ok(())
}

fn handle_reachable(
    dataset: &LoadedDataset,
    config: &PlannerConfig,
    from: &str,
    max_cost: f64,
    json: bool,
) -> Result<()> {
    let start = resolve(&dataset.map, from)?;
    let reachable = reachable_within(&dataset.map, start, max_cost, config.danger_weight)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reachable)?);
        return Ok(());
    }

    println!("Reachable within cost {max_cost:.1}: {}", reachable.len());
    for (id, cost) in &reachable {
        let label = dataset.map.location_label(*id).unwrap_or("<unknown>");
        println!("- {label} ({id}) at cost {cost:.1}");
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
