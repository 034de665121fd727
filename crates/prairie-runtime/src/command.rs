//! Bounded command bus between control surfaces and the coordinator.

use crossfire::{MRx, MTx, TrySendError, detect_backoff_cfg, mpmc};
use prairie_core::ControlCommand;
use tracing::warn;

pub type CommandSender = MTx<ControlCommand>;
pub type CommandReceiver = MRx<ControlCommand>;

/// Create the control command bus with the configured bound.
#[must_use]
pub fn create_command_bus(capacity: usize) -> (CommandSender, CommandReceiver) {
    detect_backoff_cfg();
    mpmc::bounded_blocking(capacity)
}

/// Submit a command without blocking. Overflow and disconnect drop the
/// command with a warning; the tick loop is the retry mechanism.
pub fn submit_command(sender: &CommandSender, command: ControlCommand) -> bool {
    match sender.try_send(command) {
        Ok(()) => true,
        Err(TrySendError::Full(cmd)) => {
            warn!(?cmd, "control command queue full; dropping command");
            false
        }
        Err(TrySendError::Disconnected(cmd)) => {
            warn!(?cmd, "control command queue disconnected");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_reports_overflow_without_blocking() {
        let (tx, rx) = create_command_bus(1);
        assert!(submit_command(&tx, ControlCommand::Pause));
        assert!(!submit_command(&tx, ControlCommand::Start));
        assert!(matches!(rx.try_recv(), Ok(ControlCommand::Pause)));
        assert!(submit_command(&tx, ControlCommand::Start));
    }

    #[test]
    fn submit_reports_disconnect() {
        let (tx, rx) = create_command_bus(4);
        drop(rx);
        assert!(!submit_command(&tx, ControlCommand::Quit));
    }
}
