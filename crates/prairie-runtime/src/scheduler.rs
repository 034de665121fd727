//! The coordinator tick loop: commands, joins, environment, reproduction.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossfire::{MTx, TrySendError};
use prairie_core::{ControlCommand, PrairieConfig, StatusSnapshot};
use tracing::{debug, info};

use crate::command::CommandReceiver;
use crate::registry::ConnectionRegistry;
use crate::spawn::AgentSpawner;
use crate::{SharedWorld, lock_world};

/// What one coordinator tick did, mainly for tests and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Shutdown was requested on or before this tick.
    pub quitting: bool,
    /// An agent was admitted this tick.
    pub admitted: bool,
    /// Births requested from the spawner this tick.
    pub births: usize,
}

/// Owns the periodic environment loop. Everything the simulation shares
/// runs through here once per tick, in a fixed order: control commands,
/// at most one join, death notices, drought and grass, reproduction.
pub struct Coordinator {
    world: SharedWorld,
    registry: ConnectionRegistry,
    commands: CommandReceiver,
    status_tx: MTx<StatusSnapshot>,
    spawner: Box<dyn AgentSpawner>,
    config: Arc<PrairieConfig>,
    ticks_until_drought: u32,
    last_snapshot: Option<Instant>,
}

impl Coordinator {
    #[must_use]
    pub fn new(
        world: SharedWorld,
        registry: ConnectionRegistry,
        commands: CommandReceiver,
        status_tx: MTx<StatusSnapshot>,
        spawner: Box<dyn AgentSpawner>,
        config: Arc<PrairieConfig>,
    ) -> Self {
        let ticks_until_drought = config.drought_period_ticks;
        Self {
            world,
            registry,
            commands,
            status_tx,
            spawner,
            config,
            ticks_until_drought,
            last_snapshot: None,
        }
    }

    /// Run one coordinator tick. Callers decide pacing; [`Coordinator::run`]
    /// paces by the configured tick period.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        // Commands are applied one at a time, each under its own short
        // locked section. QUIT ends the drain early; later commands stay
        // queued and die with the queue.
        while let Ok(command) = self.commands.try_recv() {
            let quit = matches!(command, ControlCommand::Quit);
            lock_world(&self.world).apply_command(command);
            if quit {
                // No joins may be admitted once shutdown is requested,
                // including on this same tick.
                self.registry.begin_shutdown();
                break;
            }
        }

        report.admitted = self.registry.accept_one();
        self.registry.drain_notices();

        let births = {
            let mut world = lock_world(&self.world);
            report.quitting = world.quit_requested();

            // The drought clock keeps running while paused; only shutdown
            // stops the reschedule.
            if !report.quitting {
                self.ticks_until_drought = self.ticks_until_drought.saturating_sub(1);
                if self.ticks_until_drought == 0 {
                    world.trigger_drought(self.config.drought_duration_ticks);
                    self.ticks_until_drought = self.config.drought_period_ticks;
                }
            }

            if report.quitting || world.is_paused() {
                Vec::new()
            } else {
                world.environment_tick();
                world.reproduction_due()
            }
        };

        report.births = births.len();
        for species in births {
            info!(species = species.label(), "birth");
            self.spawner.spawn(species);
        }
        report
    }

    /// Push a status snapshot if the snapshot interval has elapsed (or
    /// none has been sent yet). A full or closed status channel only
    /// drops the snapshot.
    pub fn publish_status(&mut self) {
        let due = self
            .last_snapshot
            .map_or(true, |at| at.elapsed() >= self.config.snapshot_interval);
        if due {
            self.push_snapshot();
        }
    }

    fn push_snapshot(&mut self) {
        let snapshot = lock_world(&self.world).snapshot();
        match self.status_tx.try_send(snapshot) {
            Ok(()) => self.last_snapshot = Some(Instant::now()),
            Err(TrySendError::Full(_)) => debug!("status channel full; snapshot dropped"),
            Err(TrySendError::Disconnected(_)) => {
                debug!("status channel closed; snapshot dropped");
            }
        }
    }

    /// Drive ticks at the configured period until shutdown, then run the
    /// grace sequence. Blocks the calling thread for the whole run.
    pub fn run(&mut self) {
        info!(
            tick_ms = self.config.tick_period.as_millis() as u64,
            "coordinator running"
        );
        loop {
            let started = Instant::now();
            let report = self.tick();
            if report.quitting {
                break;
            }
            self.publish_status();
            if let Some(rest) = self.config.tick_period.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
        // Viewers get one last snapshot before the status stream closes.
        self.push_snapshot();
        self.shutdown();
    }

    /// Cooperative shutdown: stop admitting, broadcast STOP, give agents
    /// the grace period to exit, then log whatever remains.
    pub fn shutdown(&mut self) {
        self.registry.begin_shutdown();
        self.registry.broadcast_stop();
        thread::sleep(self.config.shutdown_grace);
        self.registry.drain_notices();
        info!(
            remaining = self.registry.live_connections(),
            "coordinator stopped"
        );
    }
}
