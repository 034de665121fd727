//! The spawn capability: how new agents come into existence.
//!
//! The coordinator asks for births through [`AgentSpawner`] without knowing
//! how an agent is hosted. The default [`ThreadSpawner`] runs each agent on
//! its own named OS thread; tests substitute a recording stub.

use std::sync::Arc;
use std::thread;

use crossfire::MTx;
use prairie_core::{PrairieConfig, Species};
use tracing::warn;

use crate::agent_loop::run_agent;
use crate::registry::JoinRequest;

/// Capability to bring a new agent of a species into the simulation.
pub trait AgentSpawner: Send {
    fn spawn(&mut self, species: Species);
}

/// Default seed mixed with the per-spawn counter when no seed is
/// configured.
const DEFAULT_BASE_SEED: u64 = 0x5EED_0F_7E_9A12;

/// Spawns each agent on a dedicated OS thread running [`run_agent`].
pub struct ThreadSpawner {
    join_tx: MTx<JoinRequest>,
    config: Arc<PrairieConfig>,
    base_seed: u64,
    spawned: u64,
}

impl ThreadSpawner {
    #[must_use]
    pub fn new(join_tx: MTx<JoinRequest>, config: Arc<PrairieConfig>) -> Self {
        let base_seed = config.rng_seed.unwrap_or(DEFAULT_BASE_SEED);
        Self {
            join_tx,
            config,
            base_seed,
            spawned: 0,
        }
    }

    /// Number of spawn requests issued so far.
    #[must_use]
    pub const fn spawned(&self) -> u64 {
        self.spawned
    }

    fn next_seed(&mut self) -> u64 {
        let seed = self
            .base_seed
            .wrapping_add(self.spawned.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        self.spawned += 1;
        seed
    }
}

impl AgentSpawner for ThreadSpawner {
    fn spawn(&mut self, species: Species) {
        let seed = self.next_seed();
        let name = format!("{}-{}", species.label(), self.spawned);
        let join_tx = self.join_tx.clone();
        let config = Arc::clone(&self.config);
        let spawned = thread::Builder::new().name(name).spawn(move || {
            if let Err(err) = run_agent(&join_tx, species, &config, seed) {
                warn!(species = species.label(), error = %err, "agent never joined");
            }
        });
        if let Err(err) = spawned {
            warn!(species = species.label(), error = %err, "failed to spawn agent thread");
        }
    }
}
