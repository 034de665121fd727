//! Synchronous multi-agent scenarios driven tick by tick against one world.

use prairie_core::{
    AgentId, AgentRuntime, ControlCommand, PrairieConfig, Species, World, agent_tick,
};

struct Member {
    id: AgentId,
    species: Species,
    state: AgentRuntime,
}

fn seed(world: &mut World, config: &PrairieConfig, next_id: &mut u64, species: Species, energy: f32) -> Member {
    let id = AgentId(*next_id);
    *next_id += 1;
    world.register_agent(species);
    Member {
        id,
        species,
        state: AgentRuntime::new(energy, config.profile(species).reproduction_cooldown),
    }
}

/// Drive one full round: every live agent ticks, then the coordinator's
/// environment step and reproduction arbiter run.
fn round(world: &mut World, config: &PrairieConfig, members: &mut Vec<Member>) -> Vec<Species> {
    let mut eaten = Vec::new();
    for member in members.iter_mut() {
        if !member.state.alive {
            continue;
        }
        let profile = config.profile(member.species);
        let outcome = agent_tick(world, member.id, member.species, profile, &mut member.state);
        if let Some(victim) = outcome.killed {
            eaten.push(victim);
        }
    }
    // Predation kill signals arrive between the victim's ticks.
    for victim in eaten {
        if let Some(member) = members.iter_mut().find(|m| m.id == victim) {
            member.state.alive = false;
        }
    }
    members.retain(|m| m.state.alive);

    if !world.is_paused() && !world.quit_requested() {
        world.environment_tick();
        world.reproduction_due()
    } else {
        Vec::new()
    }
}

#[test]
fn invariants_hold_across_a_long_mixed_run() {
    let config = PrairieConfig::default();
    let mut world = World::new(&config);
    let mut next_id = 1;
    let mut members = vec![
        seed(&mut world, &config, &mut next_id, Species::Prey, 9.0),
        seed(&mut world, &config, &mut next_id, Species::Prey, 12.0),
        seed(&mut world, &config, &mut next_id, Species::Prey, 6.0),
        seed(&mut world, &config, &mut next_id, Species::Predator, 10.0),
        seed(&mut world, &config, &mut next_id, Species::Predator, 13.0),
    ];

    for tick in 0..200 {
        round(&mut world, &config, &mut members);

        assert!(
            world.grass_units() >= 0.0 && world.grass_units() <= world.grass_target() as f32,
            "grass out of bounds at tick {tick}: {}",
            world.grass_units()
        );

        // Counts always match the live membership.
        let live_prey = members
            .iter()
            .filter(|m| m.species == Species::Prey)
            .count() as u32;
        let live_predators = members
            .iter()
            .filter(|m| m.species == Species::Predator)
            .count() as u32;
        assert_eq!(world.prey_count(), live_prey, "prey count at tick {tick}");
        assert_eq!(
            world.predator_count(),
            live_predators,
            "predator count at tick {tick}"
        );

        // Huntable membership is exactly the hungry live prey.
        for member in &members {
            let hungry = member.species == Species::Prey
                && member.state.energy < config.prey.hunger_threshold;
            assert_eq!(
                world.huntable().contains(&member.id),
                hungry,
                "huntable mismatch for agent {} at tick {tick}",
                member.id
            );
        }
        for id in world.huntable() {
            assert!(
                members.iter().any(|m| m.id == *id),
                "stale huntable entry {id} at tick {tick}"
            );
        }
    }
}

#[test]
fn pause_freezes_the_environment_but_not_command_state() {
    let config = PrairieConfig::default();
    let mut world = World::new(&config);
    let mut members = Vec::new();

    for _ in 0..5 {
        round(&mut world, &config, &mut members);
    }
    let grass_before = world.grass_units();
    assert!(grass_before > 0.0);

    world.apply_command(ControlCommand::Pause);
    for _ in 0..10 {
        round(&mut world, &config, &mut members);
    }
    assert_eq!(world.grass_units(), grass_before);

    world.apply_command(ControlCommand::Start);
    round(&mut world, &config, &mut members);
    assert!(world.grass_units() > grass_before);
}

#[test]
fn well_fed_population_eventually_produces_a_birth_request() {
    let config = PrairieConfig::default();
    let mut world = World::new(&config);
    world.stock_grass(20.0);
    let mut next_id = 1;
    let mut members = vec![
        seed(&mut world, &config, &mut next_id, Species::Prey, 20.0),
        seed(&mut world, &config, &mut next_id, Species::Prey, 21.0),
    ];

    let mut births = Vec::new();
    for _ in 0..=config.prey.reproduction_cooldown {
        births = round(&mut world, &config, &mut members);
        if !births.is_empty() {
            break;
        }
    }
    assert_eq!(births, vec![Species::Prey]);
    assert!(world.reproducible(Species::Prey).is_empty());
}

#[test]
fn predation_chain_empties_the_prey_population() {
    let config = PrairieConfig::default();
    let mut world = World::new(&config);
    let mut next_id = 1;
    // Hungry prey with no grass, one hungry predator.
    let mut members = vec![
        seed(&mut world, &config, &mut next_id, Species::Prey, 4.0),
        seed(&mut world, &config, &mut next_id, Species::Prey, 4.5),
        seed(&mut world, &config, &mut next_id, Species::Predator, 4.0),
    ];
    world.apply_command(ControlCommand::SetGrassTarget(0));

    // The predator eats, digests back below the hunger threshold, and eats
    // again; ten rounds cover both kills.
    for _ in 0..10 {
        round(&mut world, &config, &mut members);
    }

    assert_eq!(world.prey_count(), 0);
    assert!(world.huntable().is_empty());
    assert_eq!(world.predator_count(), 1);
}
