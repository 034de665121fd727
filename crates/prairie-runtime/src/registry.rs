//! Join handshake, live connection tracking, and signal routing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crossfire::{MRx, MTx, TrySendError, mpmc};
use prairie_core::{AgentId, DeathCause, Species};
use tracing::{debug, info, warn};

use crate::SharedWorld;

/// Signals delivered asynchronously to a live agent. Each agent polls its
/// channel once per tick without blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentSignal {
    /// Coordinator shutdown broadcast: exit gracefully.
    Stop,
    /// A predator consumed this agent; its pool entries and count are
    /// already gone.
    Eaten,
}

/// Fire-and-forget exit notice sent by a departing agent. The registry
/// logs it and prunes the connection; it never re-derives world state
/// from notices.
#[derive(Debug, Clone)]
pub struct DeathNotice {
    pub id: AgentId,
    pub species: Species,
    pub cause: DeathCause,
}

/// Everything an admitted agent needs to participate in the simulation.
pub struct AgentHandles {
    /// Coordinator-issued identifier, unique for the whole run.
    pub id: AgentId,
    /// Handle to the world aggregate behind the global lock.
    pub world: SharedWorld,
    /// Inbound signal channel (stop broadcast, predation kill).
    pub signals: MRx<AgentSignal>,
    /// Routing table used to deliver kill signals to other agents.
    pub board: SignalBoard,
    /// Outbound death notice channel.
    pub notices: MTx<DeathNotice>,
}

/// Join handshake request. The reply channel must have capacity for one
/// message; the registry answers exactly once.
pub struct JoinRequest {
    pub species: Species,
    pub reply: MTx<JoinReply>,
}

/// Registry answer to a join request.
pub enum JoinReply {
    Accepted(Box<AgentHandles>),
    Rejected,
}

/// Shared routing table mapping live agents to their signal channels.
///
/// Guarded by its own small lock, separate from the world lock: signal
/// delivery never happens while the world lock is held.
#[derive(Clone, Default)]
pub struct SignalBoard {
    inner: Arc<Mutex<HashMap<AgentId, MTx<AgentSignal>>>>,
}

impl SignalBoard {
    fn insert(&self, id: AgentId, sender: MTx<AgentSignal>) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, sender);
    }

    fn remove(&self, id: AgentId) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }

    /// Deliver a signal to one agent. A full channel counts as delivered
    /// (a signal is already pending); a closed or missing channel means
    /// the agent is already gone.
    pub fn signal(&self, id: AgentId, signal: AgentSignal) -> bool {
        let mut board = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = board.get(&id) else {
            return false;
        };
        match sender.try_send(signal) {
            Ok(()) | Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => {
                board.remove(&id);
                false
            }
        }
    }

    /// Deliver a signal to every registered agent, pruning closed
    /// channels opportunistically.
    pub fn broadcast(&self, signal: AgentSignal) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|id, sender| match sender.try_send(signal) {
                Ok(()) | Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Disconnected(_)) => {
                    debug!(%id, "pruning closed signal channel");
                    false
                }
            });
    }

    /// Number of registered signal channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Accepts agent joins, tracks live connections, records death notices,
/// and broadcasts the shutdown signal. Owned by the coordinator.
pub struct ConnectionRegistry {
    world: SharedWorld,
    join_rx: MRx<JoinRequest>,
    notice_rx: MRx<DeathNotice>,
    notice_tx: MTx<DeathNotice>,
    board: SignalBoard,
    links: HashMap<AgentId, Species>,
    next_id: u64,
    accepting: bool,
    signal_capacity: usize,
}

impl ConnectionRegistry {
    /// Build the registry and the join endpoint handed to spawners.
    #[must_use]
    pub fn new(
        world: SharedWorld,
        join_capacity: usize,
        signal_capacity: usize,
        notice_capacity: usize,
    ) -> (Self, MTx<JoinRequest>) {
        let (join_tx, join_rx) = mpmc::bounded_blocking(join_capacity);
        let (notice_tx, notice_rx) = mpmc::bounded_blocking(notice_capacity);
        let registry = Self {
            world,
            join_rx,
            notice_rx,
            notice_tx,
            board: SignalBoard::default(),
            links: HashMap::new(),
            next_id: 1,
            accepting: true,
            signal_capacity,
        };
        (registry, join_tx)
    }

    /// Shared routing table for kill-signal delivery.
    #[must_use]
    pub fn board(&self) -> SignalBoard {
        self.board.clone()
    }

    /// Number of currently registered connections.
    #[must_use]
    pub fn live_connections(&self) -> usize {
        self.links.len()
    }

    /// Admit at most one pending join; the one-per-tick rate limit is
    /// deliberate. Returns whether an agent was admitted.
    pub fn accept_one(&mut self) -> bool {
        let Ok(request) = self.join_rx.try_recv() else {
            return false;
        };
        if !self.accepting {
            let _ = request.reply.try_send(JoinReply::Rejected);
            return false;
        }

        let id = AgentId(self.next_id);
        let (signal_tx, signal_rx) = mpmc::bounded_blocking(self.signal_capacity);
        let handles = AgentHandles {
            id,
            world: Arc::clone(&self.world),
            signals: signal_rx,
            board: self.board.clone(),
            notices: self.notice_tx.clone(),
        };

        match request.reply.try_send(JoinReply::Accepted(Box::new(handles))) {
            Ok(()) => {
                self.next_id += 1;
                self.board.insert(id, signal_tx);
                self.links.insert(id, request.species);
                info!(%id, species = request.species.label(), "agent joined");
                true
            }
            Err(_) => {
                warn!(species = request.species.label(), "join reply channel closed before ACK");
                false
            }
        }
    }

    /// Drain pending death notices: log each one and prune the dead
    /// agent's connection. Returns the number drained.
    pub fn drain_notices(&mut self) -> usize {
        let mut drained = 0;
        while let Ok(notice) = self.notice_rx.try_recv() {
            info!(
                id = %notice.id,
                species = notice.species.label(),
                cause = %notice.cause,
                "death notice"
            );
            self.board.remove(notice.id);
            self.links.remove(&notice.id);
            drained += 1;
        }
        drained
    }

    /// Stop admitting agents and reject every queued join.
    pub fn begin_shutdown(&mut self) {
        self.accepting = false;
        while let Ok(request) = self.join_rx.try_recv() {
            let _ = request.reply.try_send(JoinReply::Rejected);
        }
    }

    /// Send the stop signal to every registered connection.
    pub fn broadcast_stop(&self) {
        info!(agents = self.board.len(), "broadcasting STOP");
        self.board.broadcast(AgentSignal::Stop);
    }
}
