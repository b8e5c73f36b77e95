use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use coevolve::{
    engine::{Engine, EngineSettings},
    scenario::ScenarioLoader,
    web,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Coupled land-model / agent-population runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/wellfield.yaml")]
    scenario: PathBuf,

    /// Override step count (uses scenario default when omitted)
    #[arg(long)]
    steps: Option<u64>,

    /// Override snapshot interval in steps
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Serve the live viewer instead of printing step summaries
    #[arg(long)]
    serve: bool,

    /// Viewer bind host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Viewer bind port
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;
    let steps = scenario.steps(cli.steps);
    let snapshot_interval = cli
        .snapshot_interval
        .unwrap_or(scenario.snapshot_interval_steps);
    let snapshot_dir = cli
        .snapshot_dir
        .unwrap_or_else(|| PathBuf::from("snapshots"));

    if cli.serve {
        let config = web::ServerConfig {
            scenario,
            steps,
            snapshot_interval,
            snapshot_dir,
            host: cli.host,
            port: cli.port,
        };
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        return runtime.block_on(web::run(config));
    }

    let mut model = scenario.build_model()?;
    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_steps: snapshot_interval,
        snapshot_dir,
    };
    let mut engine = Engine::new(settings);

    engine.run_with_hook(&mut model, steps, |_, summary| {
        println!(
            "step {:>5} | active {:>5}/{:<5} | obs [{:.3}, {:.3}] | forcing {:.1}",
            summary.step,
            summary.census.active,
            summary.census.total,
            summary.observation_min,
            summary.observation_max,
            summary.forcing_total,
        );
    })?;

    let census = model.agents().census();
    println!(
        "Scenario '{}' completed after {} steps ({:.0} days). Final census: {}",
        scenario.name,
        steps,
        model.days_elapsed(),
        census
            .kinds
            .iter()
            .map(|k| format!("{} {}", k.count, k.kind))
            .collect::<Vec<_>>()
            .join(", "),
    );
    Ok(())
}
