//! Core types shared across the Prairie workspace.
//!
//! Everything in this crate is synchronous and clock-free: the world
//! aggregate, the control command vocabulary, species profiles, and the
//! per-agent tick state machine. The concurrent runtime (locking, channels,
//! scheduling) lives in `prairie-runtime` and drives these types from
//! behind one global mutex.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod agent;
pub mod command;
pub mod config;
pub mod world;

pub use agent::{AgentRuntime, TickOutcome, agent_tick};
pub use command::{CommandParseError, ControlCommand};
pub use config::{PrairieConfig, SpeciesProfile};
pub use world::{StatusSnapshot, World};

/// Stable handle for a live agent, issued by the coordinator at join time.
///
/// Ids are allocated from a monotonically increasing counter and never
/// reused, so a retired id can never be mistaken for a live agent the way a
/// recycled OS process id could.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Species tag carried through joins, pools, and death notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Prey,
    Predator,
}

impl Species {
    /// Lowercase identifier used in logs and notices.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Species::Prey => "prey",
            Species::Predator => "predator",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why an agent left the simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeathCause {
    /// Energy fell to zero; the agent detected this itself.
    Starvation,
    /// A predator consumed the agent mid-simulation.
    Predation,
    /// The coordinator requested shutdown or disappeared.
    Shutdown,
    /// The agent aborted for an unexpected reason.
    Error(String),
}

impl fmt::Display for DeathCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeathCause::Starvation => f.write_str("natural death"),
            DeathCause::Predation => f.write_str("predation"),
            DeathCause::Shutdown => f.write_str("env shutdown"),
            DeathCause::Error(cause) => write!(f, "error: {cause}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_ids_order_by_issue_sequence() {
        assert!(AgentId(1) < AgentId(2));
        assert_eq!(AgentId(7).to_string(), "7");
    }

    #[test]
    fn death_causes_render_notice_text() {
        assert_eq!(DeathCause::Starvation.to_string(), "natural death");
        assert_eq!(DeathCause::Predation.to_string(), "predation");
        assert_eq!(DeathCause::Shutdown.to_string(), "env shutdown");
        assert_eq!(
            DeathCause::Error("lock poisoned".into()).to_string(),
            "error: lock poisoned"
        );
    }
}
