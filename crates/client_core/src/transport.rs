use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ConsoleError;

pub const DEFAULT_CONTROL_PORT: u16 = 80;
pub const DEFAULT_CONTROL_CHANNEL: &str = "control";

/// Identifies one connection attempt so events from a torn-down socket can be
/// told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened,
    Text(String),
    Closed,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub connection: ConnectionId,
    pub event: ChannelEvent,
}

/// Outbound half of the control channel. Sending never waits for the peer.
pub trait CommandSink: Send {
    fn send_text(&mut self, text: String) -> Result<(), ConsoleError>;
}

/// Opens control channels. Lifecycle and inbound traffic are reported as
/// [`TransportEvent`]s tagged with the given connection id.
pub trait Connector {
    fn open(&mut self, connection: ConnectionId, endpoint: &Url) -> Box<dyn CommandSink>;
}

pub fn control_url(address: &str, port: u16, channel: &str) -> Result<Url, ConsoleError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ConsoleError::Endpoint("device address is blank".to_string()));
    }
    let channel = channel.trim().trim_start_matches('/');
    let url = Url::parse(&format!("ws://{address}:{port}/{channel}"))
        .map_err(|err| ConsoleError::Endpoint(format!("{address}: {err}")))?;
    if url.host_str().is_none() {
        return Err(ConsoleError::Endpoint(format!("{address}: missing host")));
    }
    Ok(url)
}

pub struct WsConnector {
    events: UnboundedSender<TransportEvent>,
}

impl WsConnector {
    pub fn new() -> (Self, UnboundedReceiver<TransportEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        (Self { events }, events_rx)
    }
}

impl Connector for WsConnector {
    /// Must be called from within a tokio runtime.
    fn open(&mut self, connection: ConnectionId, endpoint: &Url) -> Box<dyn CommandSink> {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_connection(
            connection,
            endpoint.clone(),
            outbound_rx,
            self.events.clone(),
        ));
        Box::new(WsSink { outbound })
    }
}

struct WsSink {
    outbound: UnboundedSender<String>,
}

impl CommandSink for WsSink {
    fn send_text(&mut self, text: String) -> Result<(), ConsoleError> {
        self.outbound
            .send(text)
            .map_err(|_| ConsoleError::ChannelClosed)
    }
}

async fn run_connection(
    connection: ConnectionId,
    endpoint: Url,
    mut outbound: UnboundedReceiver<String>,
    events: UnboundedSender<TransportEvent>,
) {
    let emit = |event: ChannelEvent| {
        let _ = events.send(TransportEvent { connection, event });
    };

    let ws_stream = match connect_async(endpoint.as_str()).await {
        Ok((ws_stream, _)) => ws_stream,
        Err(err) => {
            warn!(%endpoint, %err, "control channel connect failed");
            emit(ChannelEvent::Error(err.to_string()));
            emit(ChannelEvent::Closed);
            return;
        }
    };
    info!(%endpoint, connection = connection.0, "control channel open");
    emit(ChannelEvent::Opened);

    let (mut ws_writer, mut ws_reader) = ws_stream.split();
    loop {
        tokio::select! {
            outgoing = outbound.recv() => match outgoing {
                Some(text) => {
                    if let Err(err) = ws_writer.send(Message::Text(text)).await {
                        warn!(%err, "websocket send failed");
                        emit(ChannelEvent::Error(err.to_string()));
                        break;
                    }
                }
                None => {
                    debug!(connection = connection.0, "sink dropped; closing control channel");
                    let _ = ws_writer.close().await;
                    break;
                }
            },
            incoming = ws_reader.next() => match incoming {
                Some(Ok(Message::Text(text))) => emit(ChannelEvent::Text(text)),
                Some(Ok(Message::Binary(bytes))) => {
                    debug!(len = bytes.len(), "ignoring binary frame");
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(%err, "websocket receive failed");
                    emit(ChannelEvent::Error(err.to_string()));
                    break;
                }
            },
        }
    }

    info!(%endpoint, connection = connection.0, "control channel closed");
    emit(ChannelEvent::Closed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_url_targets_control_channel_on_port_80() {
        let url = control_url("192.168.4.1", DEFAULT_CONTROL_PORT, DEFAULT_CONTROL_CHANNEL)
            .expect("url");
        assert_eq!(url.scheme(), "ws");
        assert_eq!(url.host_str(), Some("192.168.4.1"));
        assert_eq!(url.port_or_known_default(), Some(80));
        assert_eq!(url.path(), "/control");
    }

    #[test]
    fn control_url_keeps_custom_port_and_strips_leading_slash() {
        let url = control_url(" device.local ", 8080, "/control").expect("url");
        assert_eq!(url.as_str(), "ws://device.local:8080/control");
    }

    #[test]
    fn control_url_rejects_blank_address() {
        assert!(matches!(
            control_url("  ", 80, "control"),
            Err(ConsoleError::Endpoint(_))
        ));
    }
}
