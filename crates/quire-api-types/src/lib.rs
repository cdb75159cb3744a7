//! Wire types shared by the quire server and the navigator client.
//!
//! A page travels as [`PageData`]: the rendered body plus the settings parsed
//! from its settings block. The server emits it when a request carries the
//! [`CSR_MARKER`] query parameter; the navigator decodes it and caches it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Query parameter that asks the server for page data instead of a document.
pub const CSR_MARKER: &str = "csr";

/// Value of [`CSR_MARKER`] that enables the data representation.
pub const CSR_MARKER_VALUE: &str = "true";

/// Parsed settings keyed by normalized (trimmed, lower-cased) name.
pub type SettingsMap = BTreeMap<String, SettingValue>;

/// A single settings entry: either `key: value` or a bare `key` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Text(String),
    Flag(bool),
}

impl SettingValue {
    /// The textual value, if this entry carries one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SettingValue::Text(value) => Some(value.as_str()),
            SettingValue::Flag(_) => None,
        }
    }

    /// Renders the value the way it is interpolated into markup.
    pub fn display_value(&self) -> &str {
        match self {
            SettingValue::Text(value) => value.as_str(),
            SettingValue::Flag(true) => "true",
            SettingValue::Flag(false) => "",
        }
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

/// Page payload returned for data requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageData {
    pub content: String,
    pub settings: Option<SettingsMap>,
}

impl PageData {
    /// Looks up a textual setting, treating flags and absence alike.
    pub fn setting_text(&self, key: &str) -> Option<&str> {
        self.settings
            .as_ref()
            .and_then(|settings| settings.get(key))
            .and_then(SettingValue::as_text)
    }
}
