use shared::{
    domain::{SettingsField, SettingsRecord},
    protocol::CommandMessage,
};
use tracing::{debug, info, warn};

use crate::{
    dispatch::{DispatchTable, Reaction},
    error::ConsoleError,
    form::{self, FormView},
    output::OutputLog,
    transport::{
        control_url, ChannelEvent, CommandSink, ConnectionId, Connector, TransportEvent,
        DEFAULT_CONTROL_CHANNEL, DEFAULT_CONTROL_PORT,
    },
    validation,
};

/// Raw text greeting sent once the control channel opens.
pub const CLIENT_GREETING: &str = "hello from client";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closed,
}

/// Drives one device configuration session: turns operator actions into
/// command messages and applies device results to the form and output log.
pub struct ConsoleController<F: FormView, L: OutputLog> {
    form: F,
    log: L,
    dispatch: DispatchTable,
    port: u16,
    channel: String,
    state: ConnectionState,
    connection: Option<ConnectionId>,
    next_connection: u64,
    sink: Option<Box<dyn CommandSink>>,
}

impl<F: FormView, L: OutputLog> ConsoleController<F, L> {
    pub fn new(form: F, log: L) -> Self {
        Self::with_dispatch(form, log, DispatchTable::standard())
    }

    pub fn with_dispatch(form: F, log: L, dispatch: DispatchTable) -> Self {
        Self {
            form,
            log,
            dispatch,
            port: DEFAULT_CONTROL_PORT,
            channel: DEFAULT_CONTROL_CHANNEL.to_string(),
            state: ConnectionState::Disconnected,
            connection: None,
            next_connection: 0,
            sink: None,
        }
    }

    pub fn with_endpoint(mut self, port: u16, channel: impl Into<String>) -> Self {
        self.port = port;
        self.channel = channel.into();
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Opens a new control channel to `address`, replacing any current one.
    pub fn connect(
        &mut self,
        connector: &mut dyn Connector,
        address: &str,
    ) -> Result<ConnectionId, ConsoleError> {
        let endpoint = control_url(address, self.port, &self.channel)?;

        self.next_connection += 1;
        let connection = ConnectionId(self.next_connection);
        if self.sink.take().is_some() {
            debug!(
                previous = ?self.connection,
                "dropping previous control channel"
            );
        }

        info!(%endpoint, connection = connection.0, "connecting control channel");
        self.sink = Some(connector.open(connection, &endpoint));
        self.connection = Some(connection);
        self.state = ConnectionState::Connecting;
        Ok(connection)
    }

    pub fn handle_event(&mut self, event: TransportEvent) {
        if self.connection != Some(event.connection) {
            debug!(connection = event.connection.0, "ignoring event from stale connection");
            return;
        }

        match event.event {
            ChannelEvent::Opened => {
                self.state = ConnectionState::Open;
                if let Err(err) = self.send_raw(CLIENT_GREETING.to_string()) {
                    warn!(%err, "failed to greet device");
                }
                self.log.append("Connected to server");
            }
            ChannelEvent::Text(text) => {
                debug!(len = text.len(), "received control frame");
                let reaction = self.dispatch.dispatch(&text, &self.snapshot());
                self.apply(reaction);
            }
            ChannelEvent::Closed => {
                self.log.append("Connection Closed");
                self.teardown();
            }
            ChannelEvent::Error(payload) => {
                warn!(%payload, "control channel error");
                self.log.append(&payload);
                self.teardown();
            }
        }
    }

    pub fn send(&mut self, command: &CommandMessage) -> Result<(), ConsoleError> {
        let text = command.to_json()?;
        debug!(command = command.name(), "sending command");
        self.send_raw(text)
    }

    pub fn identity(&mut self) -> Result<(), ConsoleError> {
        self.send(&CommandMessage::Identity)
    }

    pub fn check_wifi(&mut self) -> Result<(), ConsoleError> {
        let probe = self.validated(validation::wifi_probe)?;
        self.send(&CommandMessage::CheckWifi(probe))
    }

    pub fn check_mqtt(&mut self) -> Result<(), ConsoleError> {
        let probe = self.validated(validation::mqtt_probe)?;
        self.send(&CommandMessage::CheckMqtt(probe))
    }

    pub fn load_settings(&mut self) -> Result<(), ConsoleError> {
        self.send(&CommandMessage::LoadSettings)
    }

    /// Blank required fields block the save and take focus; blank optional
    /// fields are sent as their defaults.
    pub fn save_settings(&mut self) -> Result<(), ConsoleError> {
        let settings = self.validated(validation::settings_for_save)?;
        self.send(&CommandMessage::SaveSettings(settings))
    }

    pub fn reboot_device(&mut self) -> Result<(), ConsoleError> {
        self.send(&CommandMessage::RebootDevice)
    }

    /// Operator typed `raw` into `field`.
    pub fn input(&mut self, field: SettingsField, raw: &str) {
        let value = form::sanitize(field, raw);
        self.form.set_value(field, &value);
    }

    /// Operator left `field`.
    pub fn commit(&mut self, field: SettingsField) {
        form::commit(&mut self.form, field);
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn validated<T>(
        &mut self,
        check: impl FnOnce(&SettingsRecord) -> Result<T, ConsoleError>,
    ) -> Result<T, ConsoleError> {
        check(&self.snapshot()).inspect_err(|err| {
            if let Some(field) = err.invalid_field() {
                self.form.focus(field);
            }
        })
    }

    fn snapshot(&self) -> SettingsRecord {
        form::snapshot(&self.form)
    }

    fn send_raw(&mut self, text: String) -> Result<(), ConsoleError> {
        if self.state != ConnectionState::Open {
            return Err(ConsoleError::NotConnected);
        }
        let sink = self.sink.as_mut().ok_or(ConsoleError::NotConnected)?;
        sink.send_text(text)
    }

    fn apply(&mut self, reaction: Reaction) {
        for line in &reaction.lines {
            self.log.append(line);
        }
        if let Some(record) = &reaction.populate {
            form::populate(&mut self.form, record);
        }
        if let Some(command) = &reaction.follow_up {
            if let Err(err) = self.send(command) {
                warn!(command = command.name(), %err, "follow-up command not sent");
                self.log
                    .append(&format!("Failed to send {}: {err}", command.name()));
            }
        }
    }

    fn teardown(&mut self) {
        self.sink = None;
        self.state = ConnectionState::Closed;
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
