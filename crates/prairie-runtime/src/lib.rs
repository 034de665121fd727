//! Concurrent runtime for the prairie simulation.
//!
//! The coordinator and every agent run their own tick loops against one
//! [`SharedWorld`]; the mutex is the global lock of the design, and every
//! read-modify-write of world state happens inside a single short locked
//! section. Joins, kill signals, the shutdown broadcast, death notices,
//! and control commands all travel over bounded channels.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use prairie_core::World;

pub mod agent_loop;
pub mod command;
pub mod registry;
pub mod scheduler;
pub mod spawn;

pub use agent_loop::{AgentRunError, run_agent};
pub use command::{CommandReceiver, CommandSender, create_command_bus, submit_command};
pub use registry::{
    AgentHandles, AgentSignal, ConnectionRegistry, DeathNotice, JoinReply, JoinRequest, SignalBoard,
};
pub use scheduler::{Coordinator, TickReport};
pub use spawn::{AgentSpawner, ThreadSpawner};

/// The one global lock: shared handle to the world aggregate.
pub type SharedWorld = Arc<Mutex<World>>;

/// Build a fresh shared world from configuration defaults.
#[must_use]
pub fn shared_world(config: &prairie_core::PrairieConfig) -> SharedWorld {
    Arc::new(Mutex::new(World::new(config)))
}

/// Coordinator-side lock helper: a poisoned lock means an agent thread
/// panicked while holding it, which must never take the coordinator down.
pub(crate) fn lock_world(shared: &SharedWorld) -> MutexGuard<'_, World> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}
