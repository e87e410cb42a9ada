use crate::bus::CrowdLevel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_COMMAND_SIZE: usize = 4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub id: u32,
    pub timestamp: u64,
    pub command_type: CommandType,
}

impl Command {
    pub fn new(id: u32, command_type: CommandType) -> Self {
        Self {
            id,
            timestamp: current_timestamp(),
            command_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommandType {
    Ping,
    SimulatorStatus,
    GetAvailableRoutes,
    GetLiveBuses,
    GetBus { driver_id: String },
    StartBusSimulation { driver_id: String, route_id: String },
    StopBusSimulation { driver_id: String },
    UpdateCrowdLevel { driver_id: String, level: CrowdLevel },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub id: u32,
    pub timestamp: u64,
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    Success,
    Error,
    InvalidCommand,
    ParseError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Invalid JSON format")]
    InvalidJson,
    #[error("Message exceeds maximum command size")]
    MessageTooLarge,
    #[error("Serialization failed")]
    SerializationError,
    #[error("Invalid command")]
    InvalidCommand,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolStats {
    pub commands_parsed: u32,
    pub parse_failures: u32,
    pub responses_serialized: u32,
}

#[derive(Debug, Default)]
pub struct ProtocolHandler {
    stats: ProtocolStats,
}

impl ProtocolHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_command(&mut self, json_str: &str) -> Result<Command, ProtocolError> {
        if json_str.len() > MAX_COMMAND_SIZE {
            self.stats.parse_failures = self.stats.parse_failures.saturating_add(1);
            return Err(ProtocolError::MessageTooLarge);
        }

        match serde_json::from_str::<Command>(json_str) {
            Ok(command) => {
                self.stats.commands_parsed = self.stats.commands_parsed.saturating_add(1);
                Ok(command)
            }
            Err(_) => {
                self.stats.parse_failures = self.stats.parse_failures.saturating_add(1);
                Err(ProtocolError::InvalidJson)
            }
        }
    }

    /// Protocol-level checks only. Driver and route ids are passed through
    /// untouched; the registry decides what they mean.
    #[allow(clippy::unused_self)]
    pub fn validate_command(&self, command: &Command) -> Result<(), ProtocolError> {
        if command.id == 0 {
            return Err(ProtocolError::InvalidCommand);
        }
        Ok(())
    }

    pub fn serialize_response(
        &mut self,
        response: &CommandResponse,
    ) -> Result<String, ProtocolError> {
        let json_str =
            serde_json::to_string(response).map_err(|_| ProtocolError::SerializationError)?;
        self.stats.responses_serialized = self.stats.responses_serialized.saturating_add(1);
        Ok(json_str)
    }

    #[allow(clippy::unused_self)]
    pub fn create_response(
        &self,
        command_id: u32,
        status: ResponseStatus,
        message: Option<&str>,
    ) -> CommandResponse {
        CommandResponse {
            id: command_id,
            timestamp: current_timestamp(),
            status,
            message: message.map(ToString::to_string),
            data: None,
        }
    }

    pub fn create_data_response(
        &self,
        command_id: u32,
        data: serde_json::Value,
    ) -> CommandResponse {
        CommandResponse {
            data: Some(data),
            ..self.create_response(command_id, ResponseStatus::Success, None)
        }
    }

    /// Response for a line that never became a command; it carries id 0.
    pub fn create_parse_error_response(&self, error: ProtocolError) -> CommandResponse {
        self.create_response(
            0,
            ResponseStatus::ParseError,
            Some(&format!("Invalid command format: {}", error)),
        )
    }

    pub fn stats(&self) -> &ProtocolStats {
        &self.stats
    }
}

pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}
