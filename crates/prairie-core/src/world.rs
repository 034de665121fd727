//! The shared world aggregate: counts, grass, drought, and the three pools.
//!
//! Every participant mutates this state through the methods below while
//! holding the single global lock owned by the runtime. There is no
//! finer-grained locking: one mutex over the whole aggregate bounds
//! throughput but rules out lost updates and torn reads on the counters.

use crate::command::ControlCommand;
use crate::config::PrairieConfig;
use crate::{AgentId, Species};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, warn};

/// World state plus the shared pools, guarded together by one lock.
#[derive(Debug, Clone)]
pub struct World {
    prey_count: u32,
    predator_count: u32,
    grass_target: u32,
    grass_units: f32,
    growth_coefficient: f32,
    drought_active: bool,
    drought_remaining: u32,
    paused: bool,
    quit_requested: bool,
    huntable: BTreeSet<AgentId>,
    reproducible_prey: BTreeSet<AgentId>,
    reproducible_predators: BTreeSet<AgentId>,
}

impl World {
    /// Build a fresh world from configuration defaults. Grass starts empty
    /// and grows toward the target over the first ticks.
    #[must_use]
    pub fn new(config: &PrairieConfig) -> Self {
        Self {
            prey_count: 0,
            predator_count: 0,
            grass_target: config.grass_target,
            grass_units: 0.0,
            growth_coefficient: config.growth_coefficient,
            drought_active: false,
            drought_remaining: 0,
            paused: false,
            quit_requested: false,
            huntable: BTreeSet::new(),
            reproducible_prey: BTreeSet::new(),
            reproducible_predators: BTreeSet::new(),
        }
    }

    /// Number of live prey.
    #[must_use]
    pub const fn prey_count(&self) -> u32 {
        self.prey_count
    }

    /// Number of live predators.
    #[must_use]
    pub const fn predator_count(&self) -> u32 {
        self.predator_count
    }

    /// Current grass carrying capacity target.
    #[must_use]
    pub const fn grass_target(&self) -> u32 {
        self.grass_target
    }

    /// Current grass stock.
    #[must_use]
    pub const fn grass_units(&self) -> f32 {
        self.grass_units
    }

    /// Current grass growth coefficient.
    #[must_use]
    pub const fn growth_coefficient(&self) -> f32 {
        self.growth_coefficient
    }

    /// Whether a drought is currently suspending grass growth.
    #[must_use]
    pub const fn drought_active(&self) -> bool {
        self.drought_active
    }

    /// Remaining drought duration in ticks.
    #[must_use]
    pub const fn drought_remaining(&self) -> u32 {
        self.drought_remaining
    }

    /// Whether the simulation step is suspended.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether cooperative shutdown has been requested.
    #[must_use]
    pub const fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Prey currently eligible to be hunted.
    #[must_use]
    pub const fn huntable(&self) -> &BTreeSet<AgentId> {
        &self.huntable
    }

    /// Agents of `species` currently eligible to reproduce.
    #[must_use]
    pub const fn reproducible(&self, species: Species) -> &BTreeSet<AgentId> {
        match species {
            Species::Prey => &self.reproducible_prey,
            Species::Predator => &self.reproducible_predators,
        }
    }

    fn reproducible_mut(&mut self, species: Species) -> &mut BTreeSet<AgentId> {
        match species {
            Species::Prey => &mut self.reproducible_prey,
            Species::Predator => &mut self.reproducible_predators,
        }
    }

    /// Apply one control command. Pause/start are idempotent; a lowered
    /// grass target clamps the stock down immediately so the grass
    /// invariant holds on the very next observation.
    pub fn apply_command(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::Pause => {
                self.paused = true;
                info!("simulation paused");
            }
            ControlCommand::Start => {
                self.paused = false;
                info!("simulation resumed");
            }
            ControlCommand::Quit => {
                self.quit_requested = true;
                info!("shutdown requested");
            }
            ControlCommand::SetGrowth(value) => {
                self.growth_coefficient = value;
                info!(coefficient = value, "grass growth coefficient updated");
            }
            ControlCommand::SetGrassTarget(target) => {
                self.grass_target = target;
                if self.grass_units > target as f32 {
                    self.grass_units = target as f32;
                }
                info!(target, "grass target updated");
            }
        }
    }

    /// One environment step: drought decay, then grass growth while no
    /// drought is active. Grass approaches the target asymptotically and
    /// is clamped on overshoot; the increment is recomputed from scratch
    /// each tick so a moving target is chased correctly.
    pub fn environment_tick(&mut self) {
        if self.drought_active {
            self.drought_remaining = self.drought_remaining.saturating_sub(1);
            if self.drought_remaining == 0 {
                self.drought_active = false;
                info!("drought over");
            } else {
                debug!(remaining = self.drought_remaining, "drought active");
            }
            return;
        }

        let target = self.grass_target as f32;
        if self.grass_units < target {
            let increment = (target - self.grass_units.floor()) * self.growth_coefficient;
            self.grass_units += increment;
            if self.grass_units > target {
                self.grass_units = target;
            }
        }
    }

    /// Begin a drought unless one is already running. No-op once shutdown
    /// has been requested.
    pub fn trigger_drought(&mut self, duration_ticks: u32) {
        if self.quit_requested || self.drought_active || duration_ticks == 0 {
            return;
        }
        self.drought_active = true;
        self.drought_remaining = duration_ticks;
        info!(duration_ticks, "drought triggered");
    }

    /// Record a newly joined agent in the population counts.
    pub fn register_agent(&mut self, species: Species) {
        match species {
            Species::Prey => self.prey_count += 1,
            Species::Predator => self.predator_count += 1,
        }
        debug!(species = species.label(), "agent registered");
    }

    /// Remove a departing agent from every shared collection and decrement
    /// its species count. Used for natural death and shutdown; predation
    /// cleanup happens in [`World::take_huntable_prey`] instead.
    pub fn deregister_agent(&mut self, id: AgentId, species: Species) {
        self.huntable.remove(&id);
        self.reproducible_mut(species).remove(&id);
        self.decrement_count(species);
    }

    fn decrement_count(&mut self, species: Species) {
        let count = match species {
            Species::Prey => &mut self.prey_count,
            Species::Predator => &mut self.predator_count,
        };
        if *count == 0 {
            // Decrementing below zero is a defect; guard instead of wrap.
            warn!(species = species.label(), "count already zero; skipping decrement");
            return;
        }
        *count -= 1;
    }

    /// Add a prey to the huntable pool. Returns whether the entry is new.
    pub fn mark_huntable(&mut self, id: AgentId) -> bool {
        self.huntable.insert(id)
    }

    /// Remove a prey from the huntable pool. Returns whether it was there.
    pub fn clear_huntable(&mut self, id: AgentId) -> bool {
        self.huntable.remove(&id)
    }

    /// Atomically pick one huntable prey: remove it from every pool and
    /// decrement the prey count in the same locked section. The caller is
    /// responsible for delivering the kill signal to the victim.
    pub fn take_huntable_prey(&mut self) -> Option<AgentId> {
        let victim = self.huntable.iter().next().copied()?;
        self.huntable.remove(&victim);
        self.reproducible_prey.remove(&victim);
        self.decrement_count(Species::Prey);
        Some(victim)
    }

    /// Consume `amount` grass if the stock suffices. Returns whether the
    /// graze happened; the stock never goes negative.
    pub fn consume_grass(&mut self, amount: f32) -> bool {
        if amount <= 0.0 || self.grass_units < amount {
            return false;
        }
        self.grass_units -= amount;
        true
    }

    /// Toggle an agent's membership in its species' reproduction pool.
    /// Returns whether the pool changed.
    pub fn set_reproducible(&mut self, id: AgentId, species: Species, eligible: bool) -> bool {
        let pool = self.reproducible_mut(species);
        if eligible {
            pool.insert(id)
        } else {
            pool.remove(&id)
        }
    }

    /// Reproduction arbiter: each pool holding at least two eligible
    /// agents yields exactly one birth and is cleared outright, resetting
    /// eligibility for every member.
    pub fn reproduction_due(&mut self) -> Vec<Species> {
        let mut births = Vec::new();
        if self.reproducible_prey.len() >= 2 {
            self.reproducible_prey.clear();
            births.push(Species::Prey);
        }
        if self.reproducible_predators.len() >= 2 {
            self.reproducible_predators.clear();
            births.push(Species::Predator);
        }
        births
    }

    /// Seed the grass stock directly, clamped into the valid range.
    pub fn stock_grass(&mut self, units: f32) {
        self.grass_units = units.clamp(0.0, self.grass_target as f32);
    }

    /// Capture the current state for the viewer channel.
    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            predators: self.predator_count,
            preys: self.prey_count,
            grass_target: self.grass_target,
            grass_units: self.grass_units,
            drought: self.drought_active,
            paused: self.paused,
            growth_coefficient: self.growth_coefficient,
        }
    }
}

/// Formatted view of the world pushed to status viewers at least every
/// snapshot interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub predators: u32,
    pub preys: u32,
    pub grass_target: u32,
    pub grass_units: f32,
    pub drought: bool,
    pub paused: bool,
    pub growth_coefficient: f32,
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "predators={} | preys={} | grass plants={} | grass units={:.1} | drought={} | pause={} | growth={}",
            self.predators,
            self.preys,
            self.grass_target,
            self.grass_units,
            self.drought,
            self.paused,
            self.growth_coefficient,
        )
    }
}
