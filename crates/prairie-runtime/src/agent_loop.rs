//! The per-agent thread body: join, tick until death, report the cause.

use std::sync::PoisonError;
use std::thread;

use crossfire::{MTx, TryRecvError, mpmc};
use prairie_core::{AgentRuntime, DeathCause, PrairieConfig, Species, agent_tick};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::registry::{AgentHandles, AgentSignal, DeathNotice, JoinReply, JoinRequest};

/// Failures during the join handshake. Once an agent is admitted it no
/// longer errors; every exit path maps to a [`DeathCause`] instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AgentRunError {
    /// The registry refused the join (shutdown already in progress).
    #[error("join rejected by the coordinator")]
    Rejected,
    /// The join or reply channel closed before the handshake completed.
    #[error("join channel closed")]
    ChannelClosed,
}

/// Run one agent to completion: request admission, register in the world,
/// then tick once per period until a terminal event. Returns how the
/// agent died; the matching death notice has already been sent.
pub fn run_agent(
    join_tx: &MTx<JoinRequest>,
    species: Species,
    config: &PrairieConfig,
    seed: u64,
) -> Result<DeathCause, AgentRunError> {
    let (reply_tx, reply_rx) = mpmc::bounded_blocking(1);
    join_tx
        .send(JoinRequest {
            species,
            reply: reply_tx,
        })
        .map_err(|_| AgentRunError::ChannelClosed)?;
    let handles = match reply_rx.recv() {
        Ok(JoinReply::Accepted(handles)) => *handles,
        Ok(JoinReply::Rejected) => return Err(AgentRunError::Rejected),
        Err(_) => return Err(AgentRunError::ChannelClosed),
    };

    let profile = config.profile(species);
    let mut rng = SmallRng::seed_from_u64(seed);
    let initial_energy = rng.gen_range(profile.initial_energy_min..=profile.initial_energy_max);
    let mut state = AgentRuntime::new(initial_energy, profile.reproduction_cooldown);

    match handles.world.lock() {
        Ok(mut world) => world.register_agent(species),
        Err(_) => {
            let cause = DeathCause::Error("world lock poisoned".into());
            send_notice(&handles, species, &cause);
            return Ok(cause);
        }
    }
    info!(id = %handles.id, species = species.label(), energy = initial_energy, "agent running");

    let cause = agent_ticks(&handles, species, config, profile, &mut state);
    send_notice(&handles, species, &cause);
    info!(id = %handles.id, species = species.label(), cause = %cause, "agent exiting");
    Ok(cause)
}

fn agent_ticks(
    handles: &AgentHandles,
    species: Species,
    config: &PrairieConfig,
    profile: &prairie_core::SpeciesProfile,
    state: &mut AgentRuntime,
) -> DeathCause {
    loop {
        thread::sleep(config.tick_period);

        // Poll right before the tick: a kill or stop that arrived during
        // the sleep must preempt the tick, or a dead agent would mutate
        // shared state once more.
        match handles.signals.try_recv() {
            Ok(AgentSignal::Stop) => {
                let mut world = handles
                    .world
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                world.deregister_agent(handles.id, species);
                return DeathCause::Shutdown;
            }
            Ok(AgentSignal::Eaten) => {
                // The predator already removed this agent from the pools
                // and decremented the count; only drop stale entries the
                // agent may have re-added since.
                let mut world = handles
                    .world
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                world.clear_huntable(handles.id);
                world.set_reproducible(handles.id, species, false);
                return DeathCause::Predation;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                debug!(id = %handles.id, "signal channel closed; treating as stop");
                let mut world = handles
                    .world
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                world.deregister_agent(handles.id, species);
                return DeathCause::Shutdown;
            }
        }

        let outcome = match handles.world.lock() {
            Ok(mut world) => agent_tick(&mut world, handles.id, species, profile, state),
            Err(poisoned) => {
                let mut world = poisoned.into_inner();
                world.deregister_agent(handles.id, species);
                return DeathCause::Error("world lock poisoned".into());
            }
        };

        // Kill delivery happens outside the lock.
        if let Some(victim) = outcome.killed {
            if !handles.board.signal(victim, AgentSignal::Eaten) {
                warn!(id = %handles.id, %victim, "kill signal undeliverable; victim already gone");
            }
        }
        if outcome.died {
            return DeathCause::Starvation;
        }
    }
}

fn send_notice(handles: &AgentHandles, species: Species, cause: &DeathCause) {
    let notice = DeathNotice {
        id: handles.id,
        species,
        cause: cause.clone(),
    };
    if handles.notices.try_send(notice).is_err() {
        debug!(id = %handles.id, "death notice channel unavailable");
    }
}
