use shared::{domain::SettingsField, error::ProtocolError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("control channel is not open")]
    NotConnected,
    #[error("{field} must not be blank")]
    Validation { field: SettingsField },
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("control channel closed")]
    ChannelClosed,
    #[error("invalid control endpoint: {0}")]
    Endpoint(String),
    #[error("failed to load console config: {0}")]
    Config(String),
}

impl ConsoleError {
    /// Field that blocked submission, if this is a validation failure.
    pub fn invalid_field(&self) -> Option<SettingsField> {
        match self {
            ConsoleError::Validation { field } => Some(*field),
            _ => None,
        }
    }
}
