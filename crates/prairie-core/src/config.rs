//! Simulation configuration.

use crate::Species;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-species tuning constants for the agent state machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SpeciesProfile {
    /// Energy threshold `H` below which the agent is hungry (prey become
    /// huntable, predators start hunting).
    pub hunger_threshold: f32,
    /// Energy threshold `R` at or above which the agent may reproduce.
    pub reproduction_threshold: f32,
    /// Metabolic cost deducted every tick.
    pub energy_lost_tick: f32,
    /// Grass units consumed per graze. Only meaningful for prey; predators
    /// feed by hunting.
    pub eat_amount: f32,
    /// Energy gained per successful feeding.
    pub eat_gain: f32,
    /// Lower bound of the initial energy draw at spawn.
    pub initial_energy_min: f32,
    /// Upper bound of the initial energy draw at spawn.
    pub initial_energy_max: f32,
    /// Ticks a freshly spawned agent must wait before it can enter a
    /// reproduction pool.
    pub reproduction_cooldown: u32,
}

impl SpeciesProfile {
    /// Defaults for prey (grazers).
    #[must_use]
    pub fn prey() -> Self {
        Self {
            hunger_threshold: 5.0,
            reproduction_threshold: 15.0,
            energy_lost_tick: 0.3,
            eat_amount: 3.0,
            eat_gain: 2.0,
            initial_energy_min: 8.0,
            initial_energy_max: 14.0,
            reproduction_cooldown: 10,
        }
    }

    /// Defaults for predators (hunters).
    #[must_use]
    pub fn predator() -> Self {
        Self {
            hunger_threshold: 5.0,
            reproduction_threshold: 15.0,
            energy_lost_tick: 0.6,
            eat_amount: 0.0,
            eat_gain: 6.0,
            initial_energy_min: 8.0,
            initial_energy_max: 14.0,
            reproduction_cooldown: 10,
        }
    }
}

/// Top-level configuration for one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrairieConfig {
    /// Prey tuning constants.
    pub prey: SpeciesProfile,
    /// Predator tuning constants.
    pub predator: SpeciesProfile,
    /// Initial grass carrying capacity (runtime-tunable via `GRASS`).
    pub grass_target: u32,
    /// Initial grass growth coefficient (runtime-tunable via `GROWTH`).
    pub growth_coefficient: f32,
    /// Ticks between drought triggers.
    pub drought_period_ticks: u32,
    /// Ticks a drought suspends grass growth once triggered.
    pub drought_duration_ticks: u32,
    /// Wall-clock period of one simulation tick for every participant.
    pub tick_period: Duration,
    /// Minimum interval between status snapshots pushed to viewers.
    pub snapshot_interval: Duration,
    /// Grace period between the STOP broadcast and channel teardown.
    pub shutdown_grace: Duration,
    /// Bound of the inbound control command queue.
    pub command_queue_capacity: usize,
    /// Bound of the join handshake queue.
    pub join_queue_capacity: usize,
    /// Bound of each per-agent signal channel.
    pub signal_queue_capacity: usize,
    /// Bound of the death notice queue.
    pub notice_queue_capacity: usize,
    /// Optional seed for reproducible initial energy draws.
    pub rng_seed: Option<u64>,
}

impl Default for PrairieConfig {
    fn default() -> Self {
        Self {
            prey: SpeciesProfile::prey(),
            predator: SpeciesProfile::predator(),
            grass_target: 20,
            growth_coefficient: 0.1,
            drought_period_ticks: 30,
            drought_duration_ticks: 15,
            tick_period: Duration::from_secs(1),
            snapshot_interval: Duration::from_millis(500),
            shutdown_grace: Duration::from_secs(1),
            command_queue_capacity: 64,
            join_queue_capacity: 16,
            signal_queue_capacity: 4,
            notice_queue_capacity: 64,
            rng_seed: None,
        }
    }
}

impl PrairieConfig {
    /// Borrow the tuning constants for one species.
    #[must_use]
    pub fn profile(&self, species: Species) -> &SpeciesProfile {
        match species {
            Species::Prey => &self.prey,
            Species::Predator => &self.predator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let config = PrairieConfig::default();
        assert_eq!(config.prey.hunger_threshold, 5.0);
        assert_eq!(config.prey.reproduction_threshold, 15.0);
        assert_eq!(config.prey.energy_lost_tick, 0.3);
        assert_eq!(config.predator.energy_lost_tick, 0.6);
        assert_eq!(config.predator.eat_gain, 6.0);
        assert_eq!(config.grass_target, 20);
        assert_eq!(config.drought_period_ticks, 30);
        assert_eq!(config.drought_duration_ticks, 15);
    }

    #[test]
    fn config_round_trips_through_serde() {
        let config = PrairieConfig {
            rng_seed: Some(42),
            ..PrairieConfig::default()
        };
        let json = serde_json::to_string(&config).expect("serialize");
        let parsed: PrairieConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, config);
    }

    #[test]
    fn profile_lookup_matches_species() {
        let config = PrairieConfig::default();
        assert_eq!(
            config.profile(Species::Prey).energy_lost_tick,
            config.prey.energy_lost_tick
        );
        assert_eq!(
            config.profile(Species::Predator).eat_gain,
            config.predator.eat_gain
        );
    }
}
