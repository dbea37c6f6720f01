//! Embodied Simulator CLI
//!
//! Run seeded smoke scenarios against the built-in demo scenes, or a random
//! walk against a scene file on disk.

use clap::Parser;
use embodied_sim::scenarios::ScenarioId;
use embodied_sim::{Backend, ScenarioResult, ScenarioRunner, SimSettings};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Embodied simulator smoke-test CLI
#[derive(Parser, Debug)]
#[command(name = "embodied-sim")]
#[command(about = "Run seeded session scenarios for the embodied simulator", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (no_navmesh_smoke, empty_scene, sim_reset, keep_agent, construct_destroy, random_walk, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of random seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Agent steps per episode
    #[arg(short = 'n', long, default_value = "100")]
    steps: usize,

    /// Scene file on disk (runs a random walk with the filesystem backend)
    #[arg(long)]
    scene: Option<String>,

    /// JSON settings file (scene and seed)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export the episode trajectory of a single scenario to a JSON file
    #[arg(long)]
    export: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    if !args.json {
        info!("Embodied Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let settings = match &args.settings {
        Some(path) => Some(SimSettings::from_json_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        })),
        None => None,
    };
    let scene = args
        .scene
        .clone()
        .or_else(|| settings.as_ref().map(|s| s.scene.clone()));

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if scene.is_some() {
        vec![ScenarioId::RandomWalk]
    } else if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            let names: Vec<_> = ScenarioId::all().iter().map(|s| s.name()).collect();
            eprintln!("Available scenarios: {}, all", names.join(", "));
            std::process::exit(1);
        })]
    };

    if args.export.is_some() && (scenarios.len() > 1 || args.seeds > 1) {
        eprintln!("Error: --export only supports a single scenario and seed");
        std::process::exit(1);
    }

    // Determine base seed
    let base_seed = match (&settings, args.seed) {
        (Some(s), _) => s.seed,
        (None, 0) => std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1),
        (None, seed) => seed,
    };

    // Track results
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);

        let mut runner = match ScenarioRunner::new(seed) {
            Ok(runner) => runner.with_steps(args.steps),
            Err(e) => {
                error!("Failed to build demo scenes: {}", e);
                std::process::exit(1);
            }
        };
        if let Some(scene) = &scene {
            runner = runner
                .with_backend(Backend::filesystem())
                .with_scene(scene.clone());
        }

        for scenario in &scenarios {
            let result = runner.run(*scenario);

            if !args.json {
                if result.passed {
                    info!(
                        "✓ {} (seed={}) PASSED: {} steps, {} collisions",
                        scenario.name(),
                        seed,
                        result.total_steps,
                        result.collisions
                    );
                } else {
                    error!(
                        "✗ {} (seed={}) FAILED: {}",
                        scenario.name(),
                        seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }

            if !result.passed {
                failed_count += 1;
            }

            all_results.push(result);
        }
    }

    if let Some(path) = &args.export {
        match all_results.first().and_then(|r| r.episode.as_ref()) {
            Some(episode) => match episode.write_to_file(path) {
                Ok(()) => info!("Exported {} frames to {}", episode.frames.len(), path.display()),
                Err(e) => {
                    error!("Failed to write export: {:?}", e);
                    std::process::exit(1);
                }
            },
            None => error!("Scenario records no trajectory, nothing exported"),
        }
    }

    // Summary
    let total = all_results.len();
    let passed = total - failed_count;

    if args.json {
        // JSON output for CI parsing
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "steps": r.total_steps,
                    "collisions": r.collisions,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize summary: {}", e),
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);

            // List failed seeds
            for result in &all_results {
                if !result.passed {
                    error!(
                        "  - {} seed={}: {}",
                        result.scenario.name(),
                        result.seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}
