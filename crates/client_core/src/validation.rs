use shared::{
    domain::{SettingsField, SettingsRecord},
    protocol::{MqttProbe, WifiProbe},
};

use crate::error::ConsoleError;

/// Checked in this order; the first blank one receives focus.
pub const SAVE_REQUIRED: [SettingsField; 6] = [
    SettingsField::WifiSsid,
    SettingsField::WifiPassword,
    SettingsField::MqttUsername,
    SettingsField::MqttDeviceNumber,
    SettingsField::MqttDeviceAuthorize,
    SettingsField::MqttDeviceName,
];

pub const MQTT_REQUIRED: [SettingsField; 4] = [
    SettingsField::MqttUsername,
    SettingsField::MqttDeviceNumber,
    SettingsField::MqttDeviceAuthorize,
    SettingsField::MqttDeviceName,
];

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn first_blank(record: &SettingsRecord, required: &[SettingsField]) -> Option<SettingsField> {
    required
        .iter()
        .copied()
        .find(|field| is_blank(record.get(*field)))
}

/// Fills blank optional fields with their defaults.
pub fn with_defaults(mut record: SettingsRecord) -> SettingsRecord {
    for field in SettingsField::ALL {
        if let Some(default) = field.default_value() {
            if is_blank(record.get(*field)) {
                record.set(*field, default);
            }
        }
    }
    record
}

fn require(record: &SettingsRecord, required: &[SettingsField]) -> Result<(), ConsoleError> {
    match first_blank(record, required) {
        Some(field) => Err(ConsoleError::Validation { field }),
        None => Ok(()),
    }
}

pub fn settings_for_save(record: &SettingsRecord) -> Result<SettingsRecord, ConsoleError> {
    require(record, &SAVE_REQUIRED)?;
    Ok(with_defaults(record.clone()))
}

pub fn wifi_probe(record: &SettingsRecord) -> Result<WifiProbe, ConsoleError> {
    require(record, &[SettingsField::WifiSsid])?;
    Ok(WifiProbe {
        wifi_ssid: record.wifi_ssid.clone(),
        wifi_password: record.wifi_password.clone(),
    })
}

pub fn mqtt_probe(record: &SettingsRecord) -> Result<MqttProbe, ConsoleError> {
    require(record, &MQTT_REQUIRED)?;
    Ok(MqttProbe::from(&with_defaults(record.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> SettingsRecord {
        let mut record = SettingsRecord::default();
        for field in SAVE_REQUIRED {
            record.set(field, format!("{field}-value"));
        }
        record
    }

    #[test]
    fn blank_optional_fields_take_defaults() {
        let record = settings_for_save(&filled()).expect("valid");
        assert_eq!(record.mqtt_host, "47.102.44.223");
        assert_eq!(record.mqtt_port, "1883");
        assert_eq!(record.mqtt_keepalive, "120");
        assert_eq!(record.mqtt_path, "/");
        assert_eq!(record.mqtt_data_point, "");
    }

    #[test]
    fn filled_optional_fields_are_kept() {
        let mut record = filled();
        record.mqtt_host = "broker.local".to_string();
        record.mqtt_keepalive = "60".to_string();
        let record = settings_for_save(&record).expect("valid");
        assert_eq!(record.mqtt_host, "broker.local");
        assert_eq!(record.mqtt_keepalive, "60");
    }

    #[test]
    fn whitespace_counts_as_blank() {
        let mut record = filled();
        record.mqtt_device_number = "   ".to_string();
        let err = settings_for_save(&record).expect_err("blank");
        assert_eq!(err.invalid_field(), Some(SettingsField::MqttDeviceNumber));
    }

    #[test]
    fn first_blank_follows_form_order() {
        let mut record = filled();
        record.mqtt_device_name.clear();
        record.wifi_password.clear();
        assert_eq!(
            first_blank(&record, &SAVE_REQUIRED),
            Some(SettingsField::WifiPassword)
        );
    }

    #[test]
    fn wifi_probe_allows_open_networks() {
        let mut record = SettingsRecord::default();
        record.wifi_ssid = "guest".to_string();
        let probe = wifi_probe(&record).expect("probe");
        assert_eq!(probe.wifi_password, "");

        let err = wifi_probe(&SettingsRecord::default()).expect_err("blank ssid");
        assert_eq!(err.invalid_field(), Some(SettingsField::WifiSsid));
    }

    #[test]
    fn mqtt_probe_ignores_wifi_fields() {
        let mut record = filled();
        record.wifi_ssid.clear();
        let probe = mqtt_probe(&record).expect("probe");
        assert_eq!(probe.port, "1883");
        assert_eq!(probe.username, "mqtt_username-value");
    }
}
