//! Settings form abstraction and the input rules the page applies while typing.

use shared::domain::{SettingsField, SettingsRecord};

pub trait FormView {
    fn value(&self, field: SettingsField) -> String;
    fn set_value(&mut self, field: SettingsField, value: &str);
    fn focus(&mut self, field: SettingsField);
}

pub fn snapshot(form: &impl FormView) -> SettingsRecord {
    let mut record = SettingsRecord::default();
    for field in SettingsField::ALL {
        record.set(*field, form.value(*field));
    }
    record
}

pub fn populate(form: &mut impl FormView, record: &SettingsRecord) {
    for field in SettingsField::ALL {
        form.set_value(*field, record.get(*field));
    }
}

/// Strips characters a field does not accept as typed input.
pub fn sanitize(field: SettingsField, raw: &str) -> String {
    match field {
        SettingsField::MqttKeepalive => raw.chars().filter(char::is_ascii_digit).collect(),
        SettingsField::MqttDataPoint => raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == ',')
            .collect(),
        _ => raw.to_string(),
    }
}

/// Runs when the operator leaves `field`. Leaving a filled username with no
/// device name suggests `<username>_` as the device name.
pub fn commit(form: &mut impl FormView, field: SettingsField) {
    if field != SettingsField::MqttUsername {
        return;
    }
    let username = form.value(SettingsField::MqttUsername);
    if username.trim().is_empty() {
        return;
    }
    if form.value(SettingsField::MqttDeviceName).trim().is_empty() {
        form.set_value(SettingsField::MqttDeviceName, &format!("{username}_"));
    }
}

/// In-memory form used by the terminal console and tests.
#[derive(Debug, Default, Clone)]
pub struct FormState {
    record: SettingsRecord,
    focused: Option<SettingsField>,
}

impl FormState {
    pub fn new(record: SettingsRecord) -> Self {
        Self {
            record,
            focused: None,
        }
    }

    pub fn record(&self) -> &SettingsRecord {
        &self.record
    }

    pub fn focused(&self) -> Option<SettingsField> {
        self.focused
    }
}

impl FormView for FormState {
    fn value(&self, field: SettingsField) -> String {
        self.record.get(field).to_string()
    }

    fn set_value(&mut self, field: SettingsField, value: &str) {
        self.record.set(field, value);
    }

    fn focus(&mut self, field: SettingsField) {
        self.focused = Some(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keepalive_keeps_only_digits() {
        assert_eq!(sanitize(SettingsField::MqttKeepalive, "1a2 0s"), "120");
    }

    #[test]
    fn data_point_keeps_word_characters_and_commas() {
        assert_eq!(
            sanitize(SettingsField::MqttDataPoint, "temp, humidity;rssi_1"),
            "temp,humidityrssi_1"
        );
    }

    #[test]
    fn other_fields_are_taken_verbatim() {
        assert_eq!(sanitize(SettingsField::WifiPassword, " p@ss word "), " p@ss word ");
    }

    #[test]
    fn leaving_username_fills_blank_device_name() {
        let mut form = FormState::default();
        form.set_value(SettingsField::MqttUsername, "bridge");
        commit(&mut form, SettingsField::MqttUsername);
        assert_eq!(form.record().mqtt_device_name, "bridge_");

        form.set_value(SettingsField::MqttUsername, "other");
        commit(&mut form, SettingsField::MqttUsername);
        assert_eq!(form.record().mqtt_device_name, "bridge_");
    }

    #[test]
    fn leaving_blank_username_changes_nothing() {
        let mut form = FormState::default();
        commit(&mut form, SettingsField::MqttUsername);
        assert_eq!(form.record().mqtt_device_name, "");
    }

    #[test]
    fn snapshot_and_populate_cover_every_field() {
        let mut record = SettingsRecord::default();
        for (i, field) in SettingsField::ALL.iter().enumerate() {
            record.set(*field, format!("v{i}"));
        }

        let mut form = FormState::default();
        populate(&mut form, &record);
        assert_eq!(snapshot(&form), record);
    }
}
