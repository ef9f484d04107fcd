use std::{fs, path::Path};

use serde::Deserialize;
use shared::domain::SettingsRecord;

use crate::{
    error::ConsoleError,
    transport::{DEFAULT_CONTROL_CHANNEL, DEFAULT_CONTROL_PORT},
};

pub const DEFAULT_CONFIG_FILE: &str = "console.toml";
/// Address the device uses for its own access point.
pub const DEFAULT_DEVICE_ADDR: &str = "192.168.4.1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub device_addr: String,
    pub port: u16,
    pub channel: String,
    pub form: SettingsRecord,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            device_addr: DEFAULT_DEVICE_ADDR.into(),
            port: DEFAULT_CONTROL_PORT,
            channel: DEFAULT_CONTROL_CHANNEL.into(),
            form: SettingsRecord::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    device_addr: Option<String>,
    port: Option<u16>,
    channel: Option<String>,
    form: Option<SettingsRecord>,
}

/// Defaults, then the TOML file, then environment overrides. An explicit
/// `path` must exist; the default `console.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> Result<ConsoleSettings, ConsoleError> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

pub(crate) fn load_settings_with(
    path: Option<&Path>,
    var: impl Fn(&str) -> Option<String>,
) -> Result<ConsoleSettings, ConsoleError> {
    let mut settings = ConsoleSettings::default();

    let raw = match path {
        Some(path) => Some(fs::read_to_string(path).map_err(|err| {
            ConsoleError::Config(format!("failed to read '{}': {err}", path.display()))
        })?),
        None => fs::read_to_string(DEFAULT_CONFIG_FILE).ok(),
    };
    if let Some(raw) = raw {
        apply_file(&mut settings, &raw)?;
    }

    apply_env(&mut settings, var);
    Ok(settings)
}

pub(crate) fn apply_file(settings: &mut ConsoleSettings, raw: &str) -> Result<(), ConsoleError> {
    let file_cfg: FileConfig =
        toml::from_str(raw).map_err(|err| ConsoleError::Config(err.to_string()))?;

    if let Some(v) = file_cfg.device_addr {
        settings.device_addr = v;
    }
    if let Some(v) = file_cfg.port {
        settings.port = v;
    }
    if let Some(v) = file_cfg.channel {
        settings.channel = v;
    }
    if let Some(v) = file_cfg.form {
        settings.form = v;
    }
    Ok(())
}

pub(crate) fn apply_env(settings: &mut ConsoleSettings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("CONSOLE_ADDR") {
        settings.device_addr = v;
    }
    if let Some(v) = var("APP__DEVICE_ADDR") {
        settings.device_addr = v;
    }

    if let Some(v) = var("CONSOLE_PORT") {
        if let Ok(parsed) = v.parse::<u16>() {
            settings.port = parsed;
        }
    }
    if let Some(v) = var("APP__PORT") {
        if let Ok(parsed) = v.parse::<u16>() {
            settings.port = parsed;
        }
    }

    if let Some(v) = var("APP__CHANNEL") {
        settings.channel = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
