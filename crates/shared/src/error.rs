use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure details reported by the device, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFailure {
    pub code: String,
    pub message: String,
}

impl DeviceFailure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown settings field: {0}")]
    UnknownField(String),
    #[error("failed to encode {command}: {source}")]
    Encode {
        command: &'static str,
        source: serde_json::Error,
    },
    #[error("{source}")]
    Decode {
        command: &'static str,
        source: serde_json::Error,
    },
}

impl ProtocolError {
    pub fn decode(command: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { command, source }
    }
}
