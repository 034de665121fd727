//! Control commands accepted from the status viewer surface.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// External control command applied to the world at the top of a
/// coordinator tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControlCommand {
    /// Suspend the simulation step (idempotent).
    Pause,
    /// Resume the simulation step (idempotent).
    Start,
    /// Request cooperative shutdown of the whole simulation.
    Quit,
    /// Replace the grass growth coefficient.
    SetGrowth(f32),
    /// Replace the grass carrying capacity target.
    SetGrassTarget(u32),
}

/// Errors produced when parsing a viewer command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("empty command line")]
    Empty,
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("{command} requires a value")]
    MissingValue { command: &'static str },
    #[error("invalid {command} payload: {payload}")]
    InvalidPayload {
        command: &'static str,
        payload: String,
    },
}

impl ControlCommand {
    /// Parse one viewer line (`PAUSE`, `START`, `QUIT`, `GROWTH <float>`,
    /// `GRASS <int>`), ASCII case-insensitive.
    pub fn parse(line: &str) -> Result<Self, CommandParseError> {
        let mut parts = line.split_whitespace();
        let keyword = parts.next().ok_or(CommandParseError::Empty)?;
        let payload = parts.next();

        match keyword.to_ascii_uppercase().as_str() {
            "PAUSE" => Ok(ControlCommand::Pause),
            "START" => Ok(ControlCommand::Start),
            "QUIT" => Ok(ControlCommand::Quit),
            "GROWTH" => {
                let raw = payload.ok_or(CommandParseError::MissingValue { command: "GROWTH" })?;
                match raw.parse::<f32>() {
                    Ok(value) if value.is_finite() && value >= 0.0 => {
                        Ok(ControlCommand::SetGrowth(value))
                    }
                    _ => Err(CommandParseError::InvalidPayload {
                        command: "GROWTH",
                        payload: raw.to_string(),
                    }),
                }
            }
            "GRASS" => {
                let raw = payload.ok_or(CommandParseError::MissingValue { command: "GRASS" })?;
                raw.parse::<u32>()
                    .map(ControlCommand::SetGrassTarget)
                    .map_err(|_| CommandParseError::InvalidPayload {
                        command: "GRASS",
                        payload: raw.to_string(),
                    })
            }
            other => Err(CommandParseError::Unknown(other.to_string())),
        }
    }
}
