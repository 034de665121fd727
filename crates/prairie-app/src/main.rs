use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use crossfire::mpmc;
use prairie_app::start_viewer;
use prairie_core::{PrairieConfig, Species};
use prairie_runtime::{
    AgentSpawner, ConnectionRegistry, Coordinator, ThreadSpawner, create_command_bus, shared_world,
};
use tracing::info;

/// Predator-prey-grass ecosystem simulation with a line-oriented TCP
/// control and status surface.
#[derive(Parser, Debug)]
#[command(name = "prairie", version, about)]
struct Cli {
    /// Address for the viewer/control server.
    #[arg(long, default_value = "127.0.0.1:5005")]
    listen: SocketAddr,

    /// Initial prey population.
    #[arg(long, default_value_t = 3)]
    prey: u32,

    /// Initial predator population.
    #[arg(long, default_value_t = 2)]
    predators: u32,

    /// Grass carrying capacity target.
    #[arg(long, default_value_t = 20)]
    grass: u32,

    /// Grass growth coefficient.
    #[arg(long, default_value_t = 0.1)]
    growth: f32,

    /// Simulation tick period in milliseconds.
    #[arg(long, default_value_t = 1000)]
    tick_ms: u64,

    /// Seed for reproducible initial energy draws.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Arc::new(PrairieConfig {
        grass_target: cli.grass,
        growth_coefficient: cli.growth,
        tick_period: std::time::Duration::from_millis(cli.tick_ms),
        rng_seed: cli.seed,
        ..PrairieConfig::default()
    });

    let world = shared_world(&config);
    let (registry, join_tx) = ConnectionRegistry::new(
        world.clone(),
        config.join_queue_capacity,
        config.signal_queue_capacity,
        config.notice_queue_capacity,
    );
    let (command_tx, command_rx) = create_command_bus(config.command_queue_capacity);
    let (status_tx, status_rx) = mpmc::bounded_blocking(8);

    let addr = start_viewer(cli.listen, command_tx, status_rx)?;
    info!(%addr, prey = cli.prey, predators = cli.predators, "prairie starting");

    let mut spawner = ThreadSpawner::new(join_tx, Arc::clone(&config));
    for _ in 0..cli.prey {
        spawner.spawn(Species::Prey);
    }
    for _ in 0..cli.predators {
        spawner.spawn(Species::Predator);
    }

    let mut coordinator = Coordinator::new(
        world,
        registry,
        command_rx,
        status_tx,
        Box::new(spawner),
        config,
    );
    coordinator.run();
    info!("prairie stopped");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
