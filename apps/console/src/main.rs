use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    load_settings, ConsoleController, ConsoleError, FormState, OutputLog, WsConnector,
};
use shared::domain::SettingsField;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod repl;

use repl::{parse_line, ConsoleCommand, HELP};

#[derive(Parser, Debug)]
#[command(name = "iot-console", about = "Configure a WiFi/MQTT bridge over its control channel")]
struct Args {
    /// TOML config file; `console.toml` is read when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    addr: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    channel: Option<String>,
    /// Connect on startup instead of waiting for `connect`.
    #[arg(long)]
    connect: bool,
}

/// Prints output lines as they arrive.
struct TerminalLog<W: Write> {
    out: W,
}

impl<W: Write> TerminalLog<W> {
    fn write(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            tracing::warn!(%err, "failed to write console output");
        }
    }
}

impl<W: Write> OutputLog for TerminalLog<W> {
    fn append(&mut self, line: &str) {
        self.write(&format!("{line}\n"));
    }

    fn clear(&mut self) {
        self.write("\x1b[2J\x1b[H");
    }
}

type Console = ConsoleController<FormState, TerminalLog<io::Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    if let Some(addr) = args.addr {
        settings.device_addr = addr;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(channel) = args.channel {
        settings.channel = channel;
    }

    let mut console = ConsoleController::new(
        FormState::new(settings.form.clone()),
        TerminalLog { out: io::stdout() },
    )
    .with_endpoint(settings.port, settings.channel.clone());
    let (mut connector, mut events) = WsConnector::new();

    if args.connect {
        console
            .connect(&mut connector, &settings.device_addr)
            .with_context(|| format!("failed to connect to {}", settings.device_addr))?;
    }
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                let command = match parse_line(&line) {
                    Ok(command) => command,
                    Err(err) => {
                        println!("! {err}");
                        continue;
                    }
                };
                if command == ConsoleCommand::Quit {
                    break;
                }
                let address = settings.device_addr.clone();
                if let Err(err) = run_command(&mut console, &mut connector, &address, command) {
                    report(&console, &err);
                }
            }
            Some(event) = events.recv() => console.handle_event(event),
        }
    }

    Ok(())
}

fn run_command(
    console: &mut Console,
    connector: &mut WsConnector,
    default_addr: &str,
    command: ConsoleCommand,
) -> Result<(), ConsoleError> {
    match command {
        ConsoleCommand::Empty | ConsoleCommand::Quit => Ok(()),
        ConsoleCommand::Connect(addr) => {
            let addr = addr.as_deref().unwrap_or(default_addr);
            console.connect(connector, addr).map(|_| ())
        }
        ConsoleCommand::Identity => console.identity(),
        ConsoleCommand::CheckWifi => console.check_wifi(),
        ConsoleCommand::CheckMqtt => console.check_mqtt(),
        ConsoleCommand::Load => console.load_settings(),
        ConsoleCommand::Save => console.save_settings(),
        ConsoleCommand::Reboot => console.reboot_device(),
        ConsoleCommand::Set { field, value } => {
            console.input(field, &value);
            console.commit(field);
            Ok(())
        }
        ConsoleCommand::Show => {
            show_form(console);
            Ok(())
        }
        ConsoleCommand::Clear => {
            console.clear_log();
            Ok(())
        }
        ConsoleCommand::Help => {
            println!("{HELP}");
            Ok(())
        }
    }
}

fn report(console: &Console, err: &ConsoleError) {
    match err.invalid_field() {
        Some(field) => println!("! {err} (cursor on {field})"),
        None => println!("! {err}"),
    }
    tracing::debug!(state = ?console.state(), %err, "command not sent");
}

fn show_form(console: &Console) {
    let form = console.form();
    for field in SettingsField::ALL {
        let marker = if form.focused() == Some(*field) { '>' } else { ' ' };
        println!("{marker} {:<22} {}", field.as_str(), form.record().get(*field));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Screen {
        bytes: Vec<u8>,
        flushed: usize,
    }

    impl Write for Screen {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushed = self.bytes.len();
            Ok(())
        }
    }

    #[test]
    fn clear_is_flushed_without_a_newline() {
        let mut log = TerminalLog {
            out: Screen::default(),
        };
        log.append("Connected to server");
        log.clear();

        let expected = "Connected to server\n\x1b[2J\x1b[H";
        assert_eq!(String::from_utf8_lossy(&log.out.bytes), expected);
        assert_eq!(log.out.flushed, expected.len());
    }
}
