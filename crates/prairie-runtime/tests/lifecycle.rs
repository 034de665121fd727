//! Threaded end-to-end runs at millisecond tick rates.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossfire::mpmc;
use prairie_core::{ControlCommand, DeathCause, PrairieConfig, Species, SpeciesProfile};
use prairie_runtime::{
    AgentSignal, AgentSpawner, ConnectionRegistry, Coordinator, ThreadSpawner, create_command_bus,
    run_agent, shared_world, submit_command,
};

fn fast_config() -> PrairieConfig {
    PrairieConfig {
        tick_period: Duration::from_millis(5),
        snapshot_interval: Duration::from_millis(10),
        shutdown_grace: Duration::from_millis(150),
        rng_seed: Some(1),
        ..PrairieConfig::default()
    }
}

#[test]
fn full_run_reaches_clean_shutdown() {
    let config = Arc::new(fast_config());
    let world = shared_world(&config);
    let (registry, join_tx) = ConnectionRegistry::new(
        world.clone(),
        config.join_queue_capacity,
        config.signal_queue_capacity,
        config.notice_queue_capacity,
    );
    let (command_tx, command_rx) = create_command_bus(config.command_queue_capacity);
    let (status_tx, status_rx) = mpmc::bounded_blocking(64);

    let mut spawner = ThreadSpawner::new(join_tx, Arc::clone(&config));
    for _ in 0..3 {
        spawner.spawn(Species::Prey);
    }
    for _ in 0..2 {
        spawner.spawn(Species::Predator);
    }

    let mut coordinator = Coordinator::new(
        world.clone(),
        registry,
        command_rx,
        status_tx,
        Box::new(spawner),
        Arc::clone(&config),
    );
    let coordinator_thread = thread::spawn(move || coordinator.run());

    // Wait until the one-per-tick admission has let the whole population in.
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let (prey, predators) = {
            let world = world.lock().unwrap();
            (world.prey_count(), world.predator_count())
        };
        if prey + predators == 5 || Instant::now() > deadline {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }

    // Let the ecosystem run a little, then ask for shutdown.
    thread::sleep(Duration::from_millis(100));
    assert!(submit_command(&command_tx, ControlCommand::Quit));
    coordinator_thread.join().expect("coordinator thread");

    // Every agent deregistered on its way out, whatever the cause.
    let world = world.lock().unwrap();
    assert_eq!(world.prey_count(), 0);
    assert_eq!(world.predator_count(), 0);
    assert!(world.huntable().is_empty());
    assert!(world.reproducible(Species::Prey).is_empty());
    assert!(world.reproducible(Species::Predator).is_empty());
    assert!(world.quit_requested());

    // At least one status line made it out during the run.
    assert!(status_rx.try_recv().is_ok());
}

#[test]
fn eaten_prey_exits_reporting_predation() {
    // Prey spawn hungry with no grass available, so the first tick puts
    // them in the huntable pool and keeps them there.
    let config = PrairieConfig {
        tick_period: Duration::from_millis(1),
        prey: SpeciesProfile {
            initial_energy_min: 3.0,
            initial_energy_max: 3.0,
            // Slow metabolism so the prey cannot starve before the kill
            // signal lands.
            energy_lost_tick: 0.001,
            ..SpeciesProfile::prey()
        },
        grass_target: 0,
        ..PrairieConfig::default()
    };
    let world = shared_world(&config);
    let (mut registry, join_tx) = ConnectionRegistry::new(world.clone(), 4, 4, 16);
    let board = registry.board();

    let prey_thread = thread::spawn({
        let join_tx = join_tx.clone();
        let config = config.clone();
        move || run_agent(&join_tx, Species::Prey, &config, 99)
    });

    let deadline = Instant::now() + Duration::from_secs(5);
    while !registry.accept_one() {
        assert!(Instant::now() < deadline, "join never arrived");
        thread::sleep(Duration::from_millis(1));
    }

    // Wait for the prey to mark itself huntable, then play the predator's
    // part: take it under the lock, deliver the kill outside it.
    let victim = loop {
        assert!(Instant::now() < deadline, "prey never became huntable");
        let taken = world.lock().unwrap().take_huntable_prey();
        if let Some(id) = taken {
            break id;
        }
        thread::sleep(Duration::from_millis(1));
    };
    assert!(board.signal(victim, AgentSignal::Eaten));

    let result = prey_thread.join().expect("prey thread");
    assert_eq!(result, Ok(DeathCause::Predation));
    assert_eq!(registry.drain_notices(), 1);

    let world = world.lock().unwrap();
    assert_eq!(world.prey_count(), 0);
    assert!(world.huntable().is_empty());
}
