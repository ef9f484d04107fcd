//! Line commands accepted by the interactive console.

use anyhow::{anyhow, bail, Result};
use shared::domain::SettingsField;

pub const HELP: &str = "\
commands:
  connect [host]         open ws://<host>:<port>/<channel>
  identity               query hardware identity
  check_wifi             test the WiFi credentials in the form
  check_mqtt             test the MQTT broker settings in the form
  load                   load settings from the device into the form
  save                   save the form to the device (device reboots)
  reboot                 reboot the device
  set <field> [value]    edit a form field (blank value clears it)
  show                   print the form
  clear                  clear the output log
  help                   show this text
  quit                   exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Empty,
    Connect(Option<String>),
    Identity,
    CheckWifi,
    CheckMqtt,
    Load,
    Save,
    Reboot,
    Set { field: SettingsField, value: String },
    Show,
    Clear,
    Help,
    Quit,
}

/// `set` keeps its value exactly as typed after the single space following
/// the field name; everything else ignores surrounding whitespace.
pub fn parse_line(line: &str) -> Result<ConsoleCommand> {
    let line = line.trim_end_matches(['\r', '\n']).trim_start();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let args = rest.trim();

    let command = match word {
        "" => ConsoleCommand::Empty,
        "connect" => ConsoleCommand::Connect((!args.is_empty()).then(|| args.to_string())),
        "identity" => ConsoleCommand::Identity,
        "check_wifi" | "wifi" => ConsoleCommand::CheckWifi,
        "check_mqtt" | "mqtt" => ConsoleCommand::CheckMqtt,
        "load" | "load_settings" => ConsoleCommand::Load,
        "save" | "save_settings" => ConsoleCommand::Save,
        "reboot" | "reboot_device" => ConsoleCommand::Reboot,
        "set" => {
            let rest = rest.trim_start();
            let (name, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            if name.is_empty() {
                bail!("usage: set <field> [value]");
            }
            let field = name.parse::<SettingsField>().map_err(|err| anyhow!(err))?;
            ConsoleCommand::Set {
                field,
                value: value.to_string(),
            }
        }
        "show" => ConsoleCommand::Show,
        "clear" => ConsoleCommand::Clear,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => bail!("unknown command '{other}', try 'help'"),
    };

    let takes_arguments = matches!(
        command,
        ConsoleCommand::Connect(_) | ConsoleCommand::Set { .. }
    );
    if !args.is_empty() && !takes_arguments {
        bail!("'{word}' takes no arguments");
    }
    Ok(command)
}
