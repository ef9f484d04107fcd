use std::{fmt, str::FromStr};

use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

pub const DEFAULT_MQTT_HOST: &str = "47.102.44.223";
pub const DEFAULT_MQTT_PORT: &str = "1883";
pub const DEFAULT_MQTT_KEEPALIVE: &str = "120";
pub const DEFAULT_MQTT_PATH: &str = "/";

macro_rules! settings_fields {
    ($($variant:ident => $field:ident),+ $(,)?) => {
        /// One named field of the device configuration schema.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum SettingsField {
            $($variant,)+
        }

        impl SettingsField {
            pub const ALL: &'static [SettingsField] = &[$(SettingsField::$variant,)+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(SettingsField::$variant => stringify!($field),)+
                }
            }
        }

        impl FromStr for SettingsField {
            type Err = ProtocolError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($field) => Ok(SettingsField::$variant),)+
                    other => Err(ProtocolError::UnknownField(other.to_string())),
                }
            }
        }

        /// Settings as stored by the device firmware. Values are kept as text
        /// and round-tripped verbatim.
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct SettingsRecord {
            $(
                #[serde(default, deserialize_with = "text_or_number")]
                pub $field: String,
            )+
        }

        impl SettingsRecord {
            pub fn get(&self, field: SettingsField) -> &str {
                match field {
                    $(SettingsField::$variant => &self.$field,)+
                }
            }

            pub fn get_mut(&mut self, field: SettingsField) -> &mut String {
                match field {
                    $(SettingsField::$variant => &mut self.$field,)+
                }
            }
        }
    };
}

settings_fields! {
    WifiSsid => wifi_ssid,
    WifiPassword => wifi_password,
    MqttHost => mqtt_host,
    MqttPort => mqtt_port,
    MqttKeepalive => mqtt_keepalive,
    MqttPath => mqtt_path,
    MqttUsername => mqtt_username,
    MqttDeviceNumber => mqtt_device_number,
    MqttDeviceAuthorize => mqtt_device_authorize,
    MqttDeviceName => mqtt_device_name,
    MqttDataPoint => mqtt_data_point,
}

impl SettingsField {
    /// Value substituted when an optional field is left blank.
    pub fn default_value(self) -> Option<&'static str> {
        match self {
            SettingsField::MqttHost => Some(DEFAULT_MQTT_HOST),
            SettingsField::MqttPort => Some(DEFAULT_MQTT_PORT),
            SettingsField::MqttKeepalive => Some(DEFAULT_MQTT_KEEPALIVE),
            SettingsField::MqttPath => Some(DEFAULT_MQTT_PATH),
            _ => None,
        }
    }
}

impl fmt::Display for SettingsField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SettingsRecord {
    pub fn set(&mut self, field: SettingsField, value: impl Into<String>) {
        *self.get_mut(field) = value.into();
    }
}

/// Accepts a JSON string or number and keeps its textual form. Firmware
/// builds send status codes and ports as integers.
pub(crate) fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_text(Value::deserialize(deserializer)?).map_err(D::Error::custom)
}

pub(crate) fn optional_text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_text(value).map(Some).map_err(D::Error::custom),
    }
}

fn scalar_text(value: Value) -> Result<String, String> {
    match value {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(format!("expected a string or number, got {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_match_firmware_schema() {
        let names: Vec<_> = SettingsField::ALL.iter().map(|f| f.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "wifi_ssid",
                "wifi_password",
                "mqtt_host",
                "mqtt_port",
                "mqtt_keepalive",
                "mqtt_path",
                "mqtt_username",
                "mqtt_device_number",
                "mqtt_device_authorize",
                "mqtt_device_name",
                "mqtt_data_point",
            ]
        );
        assert_eq!(
            "mqtt_device_name".parse::<SettingsField>().expect("field"),
            SettingsField::MqttDeviceName
        );
        assert!("device_name".parse::<SettingsField>().is_err());
    }

    #[test]
    fn settings_record_accepts_numeric_values() {
        let record: SettingsRecord = serde_json::from_value(serde_json::json!({
            "wifi_ssid": "office",
            "mqtt_port": 1883,
            "mqtt_keepalive": 120,
            "mqtt_path": null
        }))
        .expect("record");

        assert_eq!(record.wifi_ssid, "office");
        assert_eq!(record.mqtt_port, "1883");
        assert_eq!(record.mqtt_keepalive, "120");
        assert_eq!(record.mqtt_path, "");
        assert_eq!(record.mqtt_username, "");
    }

    #[test]
    fn only_broker_connection_fields_have_defaults() {
        let defaulted: Vec<_> = SettingsField::ALL
            .iter()
            .filter_map(|f| f.default_value().map(|v| (f.as_str(), v)))
            .collect();
        assert_eq!(
            defaulted,
            vec![
                ("mqtt_host", "47.102.44.223"),
                ("mqtt_port", "1883"),
                ("mqtt_keepalive", "120"),
                ("mqtt_path", "/"),
            ]
        );
    }
}
