pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod form;
pub mod output;
pub mod transport;
pub mod validation;

pub use config::{load_settings, ConsoleSettings};
pub use controller::{ConnectionState, ConsoleController};
pub use dispatch::{DispatchTable, Reaction};
pub use error::ConsoleError;
pub use form::{FormState, FormView};
pub use output::{MemoryLog, OutputLog};
pub use transport::{
    control_url, ChannelEvent, CommandSink, ConnectionId, Connector, TransportEvent, WsConnector,
};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
