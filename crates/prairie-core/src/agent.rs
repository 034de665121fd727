//! The per-agent tick state machine, shared by both species.
//!
//! One call to [`agent_tick`] performs everything the agent does during a
//! single locked section: metabolism, the huntability toggle, feeding,
//! the reproduction-eligibility toggle, and the natural death check. The
//! runtime layer is responsible for acquiring the lock, delivering kill
//! signals reported in the outcome, and sending death notices.

use crate::config::SpeciesProfile;
use crate::world::World;
use crate::{AgentId, Species};
use tracing::debug;

/// Mutable per-agent state owned by the agent itself (never shared).
#[derive(Debug, Clone, PartialEq)]
pub struct AgentRuntime {
    pub energy: f32,
    pub alive: bool,
    pub reproduction_cooldown: u32,
}

impl AgentRuntime {
    /// Fresh agent state at spawn time.
    #[must_use]
    pub fn new(initial_energy: f32, reproduction_cooldown: u32) -> Self {
        Self {
            energy: initial_energy,
            alive: true,
            reproduction_cooldown,
        }
    }
}

/// What happened during one agent tick, for the runtime to act on outside
/// the lock.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickOutcome {
    /// The agent starved this tick and has deregistered itself.
    pub died: bool,
    /// A predator consumed this prey; the kill signal still needs delivery.
    pub killed: Option<AgentId>,
    /// The agent crossed into the huntable pool this tick.
    pub became_huntable: bool,
    /// The agent fed this tick (grazed or hunted).
    pub ate: bool,
}

/// Run one tick of the agent state machine. The caller must hold the
/// global lock for the whole call.
pub fn agent_tick(
    world: &mut World,
    id: AgentId,
    species: Species,
    profile: &SpeciesProfile,
    state: &mut AgentRuntime,
) -> TickOutcome {
    debug_assert!(state.alive, "dead agents must not tick");
    let mut outcome = TickOutcome::default();

    // 1. Metabolism.
    state.energy -= profile.energy_lost_tick;
    if state.reproduction_cooldown > 0 {
        state.reproduction_cooldown -= 1;
    }

    // 2. Huntability toggle on the hunger threshold crossing (prey only).
    if species == Species::Prey {
        if state.energy < profile.hunger_threshold {
            if world.mark_huntable(id) {
                outcome.became_huntable = true;
                debug!(%id, energy = state.energy, "prey is now huntable");
            }
        } else if world.clear_huntable(id) {
            debug!(%id, energy = state.energy, "prey is no longer huntable");
        }
    }

    // 3./4. Feeding while hungry.
    if state.energy < profile.hunger_threshold {
        match species {
            Species::Predator => {
                if let Some(victim) = world.take_huntable_prey() {
                    state.energy += profile.eat_gain;
                    outcome.killed = Some(victim);
                    outcome.ate = true;
                    debug!(%id, %victim, energy = state.energy, "predator hunted");
                }
            }
            Species::Prey => {
                if world.consume_grass(profile.eat_amount) {
                    state.energy += profile.eat_gain;
                    outcome.ate = true;
                    debug!(%id, energy = state.energy, "prey grazed");
                }
            }
        }
    }

    // 5. Reproduction eligibility: threshold met and cooldown elapsed adds
    // the agent to its pool; dropping below the threshold removes it. An
    // eligible agent may sit in the pool indefinitely.
    let eligible =
        state.energy >= profile.reproduction_threshold && state.reproduction_cooldown == 0;
    world.set_reproducible(id, species, eligible);

    // 6. Natural death: detected and acted on by the agent itself.
    if state.energy <= 0.0 {
        state.alive = false;
        world.deregister_agent(id, species);
        outcome.died = true;
    }

    outcome
}
