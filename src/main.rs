use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use parking_lot::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use forcelattice::{Config, DrawList, Simulation, benchmark};

mod cli;

use cli::{Cli, Commands};

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    Ok(match path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    })
}

async fn run(config: Config, seconds: u64, width: u32, height: u32) -> anyhow::Result<()> {
    let mut simulation = Simulation::start(&config)?;
    let surface = Arc::new(Mutex::new(DrawList::new(width, height)));
    simulation.spawn_renderer(surface.clone());

    info!(seconds, width, height, "running simulation");
    let deadline = tokio::time::sleep(Duration::from_secs(seconds));
    tokio::pin!(deadline);
    let mut report = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            _ = report.tick() => {
                let stats = simulation.stats();
                let world = simulation.world();
                info!(
                    model_fps = stats.update_fps,
                    render_fps = stats.draw_fps,
                    nodes = world.node_count(),
                    edges = world.edge_count(),
                    frames = world.frames(),
                    "stats"
                );
            }
        }
    }

    let overlay = simulation.overlay();
    let commands = surface.lock().commands().len();
    simulation.stop().await?;

    for line in overlay {
        println!("{line}");
    }
    println!("Last frame: {commands} draw commands");
    Ok(())
}

fn bench(config: &Config, nodes: &[usize], theta: Option<f64>, json: bool) -> anyhow::Result<()> {
    let mut params = config.physics.repulsion();
    if let Some(theta) = theta {
        params.theta = theta;
    }
    let sizes = if nodes.is_empty() {
        benchmark::DEFAULT_SIZES.to_vec()
    } else {
        nodes.to_vec()
    };

    info!(?sizes, theta = params.theta, "benchmarking repulsion");
    let results = benchmark::run(&sizes, params);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            println!("{result}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            seconds,
            no_growth,
            bulk_seed,
            width,
            height,
        } => {
            if no_growth {
                config.growth.enabled = false;
            }
            if bulk_seed {
                config.growth.bulk_seed = true;
            }
            run(config, seconds, width, height).await?;
        }
        Commands::Bench { nodes, theta, json } => {
            bench(&config, &nodes, theta, json)?;
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn cli_parses_run_with_defaults() {
        let cli = Cli::try_parse_from(["forcelattice", "run"]).unwrap();
        match cli.command {
            Commands::Run {
                seconds,
                no_growth,
                bulk_seed,
                width,
                height,
            } => {
                assert_eq!(seconds, 10);
                assert!(!no_growth);
                assert!(!bulk_seed);
                assert_eq!((width, height), (800, 600));
            }
            _ => panic!("Expected Run command"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn cli_parses_run_flags_and_global_config() {
        let cli = Cli::try_parse_from([
            "forcelattice",
            "run",
            "--seconds",
            "3",
            "--no-growth",
            "--bulk-seed",
            "--config",
            "lattice.yaml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("lattice.yaml")));
        match cli.command {
            Commands::Run {
                seconds,
                no_growth,
                bulk_seed,
                ..
            } => {
                assert_eq!(seconds, 3);
                assert!(no_growth);
                assert!(bulk_seed);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn cli_parses_bench_sizes() {
        let cli = Cli::try_parse_from([
            "forcelattice",
            "bench",
            "--nodes",
            "100",
            "200",
            "--theta",
            "0.3",
        ])
        .unwrap();
        match cli.command {
            Commands::Bench { nodes, theta, json } => {
                assert_eq!(nodes, vec![100, 200]);
                assert_eq!(theta, Some(0.3));
                assert!(!json);
            }
            _ => panic!("Expected Bench command"),
        }
    }

    #[test]
    fn cli_requires_a_subcommand() {
        assert!(Cli::try_parse_from(["forcelattice"]).is_err());
    }

    #[test]
    fn missing_config_defaults() {
        assert_eq!(load_config(None).unwrap(), Config::default());
    }
}
