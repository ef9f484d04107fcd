//! Typed dispatch of device result messages.
//!
//! Each result kind maps to a handler that decodes its own payload schema and
//! describes the UI reaction. Handlers never touch the connection or the form
//! directly, so the table can be exercised without a socket.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::SettingsRecord,
    error::ProtocolError,
    protocol::{
        CheckMqttResult, CheckWifiResult, CommandMessage, IdentityResult, LoadSettingsResult,
        MqttProbe, OutcomeResult, ResultKind,
    },
};
use tracing::{debug, warn};

use crate::validation::with_defaults;

pub const REBOOT_NOTICE: &str = "Device will reboot after 3 seconds.";

/// What the controller should do in response to one inbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reaction {
    pub lines: Vec<String>,
    pub populate: Option<SettingsRecord>,
    pub follow_up: Option<CommandMessage>,
}

impl Reaction {
    pub fn line(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            ..Self::default()
        }
    }

    fn then_send(mut self, command: CommandMessage) -> Self {
        self.follow_up = Some(command);
        self
    }
}

/// Decodes a result payload and builds the reaction. `form` is the current
/// form content, for handlers that chain a follow-up command.
pub type ResultHandler = fn(Value, &SettingsRecord) -> Result<Reaction, ProtocolError>;

pub struct DispatchTable {
    handlers: HashMap<ResultKind, ResultHandler>,
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl DispatchTable {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register(ResultKind::IdentityResult, on_identity);
        table.register(ResultKind::CheckWifiResult, on_check_wifi);
        table.register(ResultKind::CheckInternetResult, on_check_internet);
        table.register(ResultKind::CheckMqttResult, on_check_mqtt);
        table.register(ResultKind::LoadSettingsResult, on_load_settings);
        table.register(ResultKind::SaveSettingsResult, on_save_settings);
        table
    }

    pub fn register(&mut self, kind: ResultKind, handler: ResultHandler) {
        self.handlers.insert(kind, handler);
    }

    pub fn handler(&self, kind: ResultKind) -> Option<ResultHandler> {
        self.handlers.get(&kind).copied()
    }

    /// Routes one raw text frame. Never fails: anything that cannot be
    /// handled is reported as a single log line or dropped.
    pub fn dispatch(&self, raw: &str, form: &SettingsRecord) -> Reaction {
        let value = match serde_json::from_str::<Value>(raw) {
            Ok(value) => value,
            Err(err) => {
                debug!(%err, "inbound frame is not JSON");
                return Reaction::line(format!("Received: {raw}"));
            }
        };

        let Some(name) = value.get("command").and_then(Value::as_str) else {
            debug!("inbound JSON has no command name");
            return Reaction::line(format!("Received: {raw}"));
        };

        let Some(kind) = ResultKind::from_name(name) else {
            debug!(command = name, "ignoring unknown result");
            return Reaction::default();
        };

        let Some(handler) = self.handler(kind) else {
            debug!(command = name, "no handler registered");
            return Reaction::default();
        };

        match handler(value, form) {
            Ok(reaction) => reaction,
            Err(err) => {
                warn!(command = kind.as_str(), %err, "malformed result payload");
                Reaction::line(format!("Malformed {}: {err}", kind.as_str()))
            }
        }
    }
}

fn decode<T: DeserializeOwned>(kind: ResultKind, value: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|err| ProtocolError::decode(kind.as_str(), err))
}

fn on_identity(value: Value, _form: &SettingsRecord) -> Result<Reaction, ProtocolError> {
    let identity: IdentityResult = decode(ResultKind::IdentityResult, value)?;
    Ok(Reaction::line(format!(
        "Identity: {} (hardware version {}), MAC {}, IP {}",
        identity.hardware_name,
        identity.hardware_version,
        identity.mac_address,
        identity.ip_address
    )))
}

fn on_check_wifi(value: Value, _form: &SettingsRecord) -> Result<Reaction, ProtocolError> {
    let result: CheckWifiResult = decode(ResultKind::CheckWifiResult, value)?;
    if result.is_connected() {
        Ok(Reaction::line("Check Wifi Success"))
    } else {
        Ok(Reaction::line(format!(
            "Check wifi failed with code: {}",
            result.result_code
        )))
    }
}

fn on_check_internet(value: Value, form: &SettingsRecord) -> Result<Reaction, ProtocolError> {
    let result: OutcomeResult = decode(ResultKind::CheckInternetResult, value)?;
    if !result.is_success() {
        return Ok(Reaction::line("Check Internet Failed"));
    }
    let probe = MqttProbe::from(&with_defaults(form.clone()));
    Ok(Reaction::line("Check Internet Success").then_send(CommandMessage::CheckMqtt(probe)))
}

fn on_check_mqtt(value: Value, _form: &SettingsRecord) -> Result<Reaction, ProtocolError> {
    let result: CheckMqttResult = decode(ResultKind::CheckMqttResult, value)?;
    match result.failure() {
        None => Ok(Reaction::line("Check MQTT Success")),
        Some(failure) => Ok(Reaction::line(format!(
            "Check MQTT failed with code ({}): {}",
            failure.code, failure.message
        ))),
    }
}

fn on_load_settings(value: Value, _form: &SettingsRecord) -> Result<Reaction, ProtocolError> {
    let result: LoadSettingsResult = decode(ResultKind::LoadSettingsResult, value)?;
    if result.result != shared::protocol::RESULT_SUCCESS {
        return Ok(Reaction::line("Load Settings Failed"));
    }
    Ok(Reaction {
        populate: Some(result.settings),
        ..Reaction::default()
    })
}

fn on_save_settings(value: Value, _form: &SettingsRecord) -> Result<Reaction, ProtocolError> {
    let result: OutcomeResult = decode(ResultKind::SaveSettingsResult, value)?;
    if !result.is_success() {
        return Ok(Reaction::line("Save Settings Failed"));
    }
    Ok(Reaction {
        lines: vec!["Save Settings Success".to_string(), REBOOT_NOTICE.to_string()],
        populate: None,
        follow_up: Some(CommandMessage::RebootDevice),
    })
}
