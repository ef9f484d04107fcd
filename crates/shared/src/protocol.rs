use serde::{Deserialize, Serialize};

use crate::{
    domain::{optional_text_or_number, text_or_number, SettingsRecord},
    error::{DeviceFailure, ProtocolError},
};

/// `result` value the firmware sends for a successful operation.
pub const RESULT_SUCCESS: &str = "success";
/// Station status the firmware reports once it has an IP address.
pub const WIFI_CONNECTED_CODE: &str = "1010";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandMessage {
    Identity,
    CheckWifi(WifiProbe),
    CheckMqtt(MqttProbe),
    LoadSettings,
    SaveSettings(SettingsRecord),
    RebootDevice,
}

impl CommandMessage {
    pub fn name(&self) -> &'static str {
        match self {
            CommandMessage::Identity => "identity",
            CommandMessage::CheckWifi(_) => "check_wifi",
            CommandMessage::CheckMqtt(_) => "check_mqtt",
            CommandMessage::LoadSettings => "load_settings",
            CommandMessage::SaveSettings(_) => "save_settings",
            CommandMessage::RebootDevice => "reboot_device",
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|source| ProtocolError::Encode {
            command: self.name(),
            source,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiProbe {
    #[serde(default)]
    pub wifi_ssid: String,
    #[serde(default)]
    pub wifi_password: String,
}

/// Broker parameters for a trial connection. The firmware reads these
/// without the `mqtt_` prefix used by the stored settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttProbe {
    #[serde(default, deserialize_with = "text_or_number")]
    pub host: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub port: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub keepalive: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub path: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub username: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub device_number: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub device_authorize: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub device_name: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub data_point: String,
}

impl From<&SettingsRecord> for MqttProbe {
    fn from(settings: &SettingsRecord) -> Self {
        Self {
            host: settings.mqtt_host.clone(),
            port: settings.mqtt_port.clone(),
            keepalive: settings.mqtt_keepalive.clone(),
            path: settings.mqtt_path.clone(),
            username: settings.mqtt_username.clone(),
            device_number: settings.mqtt_device_number.clone(),
            device_authorize: settings.mqtt_device_authorize.clone(),
            device_name: settings.mqtt_device_name.clone(),
            data_point: settings.mqtt_data_point.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    IdentityResult,
    CheckWifiResult,
    CheckInternetResult,
    CheckMqttResult,
    LoadSettingsResult,
    SaveSettingsResult,
}

impl ResultKind {
    pub const ALL: [ResultKind; 6] = [
        ResultKind::IdentityResult,
        ResultKind::CheckWifiResult,
        ResultKind::CheckInternetResult,
        ResultKind::CheckMqttResult,
        ResultKind::LoadSettingsResult,
        ResultKind::SaveSettingsResult,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResultKind::IdentityResult => "identity_result",
            ResultKind::CheckWifiResult => "check_wifi_result",
            ResultKind::CheckInternetResult => "check_internet_result",
            ResultKind::CheckMqttResult => "check_mqtt_result",
            ResultKind::LoadSettingsResult => "load_settings_result",
            ResultKind::SaveSettingsResult => "save_settings_result",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityResult {
    #[serde(default, deserialize_with = "text_or_number")]
    pub hardware_version: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub hardware_name: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub mac_address: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub ip_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckWifiResult {
    #[serde(default, deserialize_with = "text_or_number")]
    pub result_code: String,
}

impl CheckWifiResult {
    pub fn is_connected(&self) -> bool {
        self.result_code == WIFI_CONNECTED_CODE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeResult {
    #[serde(default, deserialize_with = "text_or_number")]
    pub result: String,
}

impl OutcomeResult {
    pub fn is_success(&self) -> bool {
        self.result == RESULT_SUCCESS
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckMqttResult {
    #[serde(default, deserialize_with = "text_or_number")]
    pub result: String,
    #[serde(default, deserialize_with = "optional_text_or_number")]
    pub error_code: Option<String>,
    #[serde(default, deserialize_with = "optional_text_or_number")]
    pub error_msg: Option<String>,
}

impl CheckMqttResult {
    pub fn failure(&self) -> Option<DeviceFailure> {
        if self.result == RESULT_SUCCESS {
            return None;
        }
        Some(DeviceFailure::new(
            self.error_code.clone().unwrap_or_default(),
            self.error_msg.clone().unwrap_or_default(),
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSettingsResult {
    #[serde(default, deserialize_with = "text_or_number")]
    pub result: String,
    #[serde(flatten)]
    pub settings: SettingsRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn unit_commands_carry_only_the_command_name() {
        let text = CommandMessage::RebootDevice.to_json().expect("json");
        let value: Value = serde_json::from_str(&text).expect("value");
        assert_eq!(value, json!({ "command": "reboot_device" }));

        let text = CommandMessage::LoadSettings.to_json().expect("json");
        let value: Value = serde_json::from_str(&text).expect("value");
        assert_eq!(value, json!({ "command": "load_settings" }));
    }

    #[test]
    fn save_settings_flattens_record_beside_command() {
        let mut settings = SettingsRecord::default();
        settings.wifi_ssid = "office".to_string();
        settings.mqtt_port = "1883".to_string();

        let value = serde_json::to_value(CommandMessage::SaveSettings(settings)).expect("value");
        assert_eq!(value["command"], "save_settings");
        assert_eq!(value["wifi_ssid"], "office");
        assert_eq!(value["mqtt_port"], "1883");
        assert_eq!(value["mqtt_data_point"], "");
        assert_eq!(value.as_object().expect("object").len(), 12);
    }

    #[test]
    fn check_mqtt_uses_unprefixed_field_names() {
        let mut settings = SettingsRecord::default();
        settings.mqtt_host = "broker.local".to_string();
        settings.mqtt_device_name = "bridge_".to_string();

        let value =
            serde_json::to_value(CommandMessage::CheckMqtt(MqttProbe::from(&settings)))
                .expect("value");
        assert_eq!(value["command"], "check_mqtt");
        assert_eq!(value["host"], "broker.local");
        assert_eq!(value["device_name"], "bridge_");
        assert!(value.get("mqtt_host").is_none());
    }

    #[test]
    fn commands_decode_from_device_side_json() {
        let command: CommandMessage = serde_json::from_value(json!({
            "command": "check_wifi",
            "wifi_ssid": "office",
            "wifi_password": "secret"
        }))
        .expect("command");
        assert_eq!(
            command,
            CommandMessage::CheckWifi(WifiProbe {
                wifi_ssid: "office".to_string(),
                wifi_password: "secret".to_string(),
            })
        );
    }

    #[test]
    fn wifi_result_code_may_be_numeric() {
        let result: CheckWifiResult =
            serde_json::from_value(json!({ "command": "check_wifi_result", "result_code": 1010 }))
                .expect("result");
        assert!(result.is_connected());

        let result: CheckWifiResult =
            serde_json::from_value(json!({ "command": "check_wifi_result", "result_code": "202" }))
                .expect("result");
        assert!(!result.is_connected());
        assert_eq!(result.result_code, "202");
    }

    #[test]
    fn mqtt_failure_passes_device_codes_through() {
        let result: CheckMqttResult = serde_json::from_value(json!({
            "command": "check_mqtt_result",
            "result": "failed",
            "error_code": 5,
            "error_msg": "Authorized failed, check Device Number and Device Authorize"
        }))
        .expect("result");

        assert_eq!(
            result.failure(),
            Some(DeviceFailure::new(
                "5",
                "Authorized failed, check Device Number and Device Authorize"
            ))
        );
    }

    #[test]
    fn required_and_optional_codes_accept_the_same_scalars() {
        let result: CheckMqttResult = serde_json::from_value(json!({
            "result": false,
            "error_code": true,
            "error_msg": null
        }))
        .expect("result");
        assert_eq!(result.result, "false");
        assert_eq!(result.error_code.as_deref(), Some("true"));
        assert_eq!(result.error_msg, None);

        assert!(serde_json::from_value::<CheckMqttResult>(json!({
            "result": "failed",
            "error_code": [1]
        }))
        .is_err());
    }

    #[test]
    fn load_settings_result_reads_flattened_record() {
        let result: LoadSettingsResult = serde_json::from_value(json!({
            "command": "load_settings_result",
            "result": "success",
            "wifi_ssid": "office",
            "mqtt_port": 1883
        }))
        .expect("result");

        assert_eq!(result.result, RESULT_SUCCESS);
        assert_eq!(result.settings.wifi_ssid, "office");
        assert_eq!(result.settings.mqtt_port, "1883");
    }

    #[test]
    fn result_kinds_round_trip_names() {
        for kind in ResultKind::ALL {
            assert_eq!(ResultKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(ResultKind::from_name("reboot_device_result"), None);
    }
}
