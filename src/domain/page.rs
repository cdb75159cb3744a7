//! Renderable page values and their head-metadata properties.

use quire_api_types::PageData;

use super::settings::Settings;

pub const DEFAULT_FAVICON_HREF: &str = "/resources/favicon.png";

/// An assembled page: body markup plus the settings that describe it.
///
/// Pages are immutable once built; a cache miss always builds a fresh one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    content: String,
    settings: Option<Settings>,
}

impl Page {
    pub fn new(content: impl Into<String>, settings: Option<Settings>) -> Self {
        Self {
            content: content.into(),
            settings,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    /// True when the settings block carries `key` in any form.
    pub fn has_setting(&self, key: &str) -> bool {
        self.settings
            .as_ref()
            .is_some_and(|settings| settings.is_set(key))
    }

    /// Pre-formatted head fragment (or raw value) for `name`. Never fails.
    pub fn property(&self, name: &str) -> String {
        let value = self
            .settings
            .as_ref()
            .and_then(|settings| settings.get(name))
            .map(|value| value.display_value());

        match (PageProperty::from_name(name), value) {
            (Some(property), Some(value)) => property.render(value),
            (Some(property), None) => property.fallback().unwrap_or_default(),
            (None, Some(value)) => value.to_string(),
            (None, None) => String::new(),
        }
    }

    pub fn to_data(&self) -> PageData {
        PageData {
            content: self.content.clone(),
            settings: self.settings.as_ref().map(|s| s.as_map().clone()),
        }
    }

    pub fn into_data(self) -> PageData {
        PageData {
            content: self.content,
            settings: self.settings.map(Settings::into_map),
        }
    }
}

/// Settings names with a dedicated head-markup template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageProperty {
    Title,
    Description,
    OgImage,
    OgUrl,
    OgType,
    Favicon,
}

impl PageProperty {
    pub const ALL: [PageProperty; 6] = [
        PageProperty::Title,
        PageProperty::Description,
        PageProperty::OgImage,
        PageProperty::OgUrl,
        PageProperty::OgType,
        PageProperty::Favicon,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|property| property.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            PageProperty::Title => "title",
            PageProperty::Description => "description",
            PageProperty::OgImage => "og-image",
            PageProperty::OgUrl => "og-url",
            PageProperty::OgType => "og-type",
            PageProperty::Favicon => "favicon",
        }
    }

    pub fn render(self, value: &str) -> String {
        match self {
            PageProperty::Title => format!(
                "<title>{value}</title><meta property='og:title' content='{value}' />"
            ),
            PageProperty::Description => format!(
                "<meta name='description' content='{value}'><meta name='og:description' content='{value}'>"
            ),
            PageProperty::OgImage => format!("<meta property='og:image' content='{value}' />"),
            PageProperty::OgUrl => format!("<meta property='og:url' content='{value}' />"),
            PageProperty::OgType => format!("<meta property='og:type' content='{value}' />"),
            PageProperty::Favicon => {
                format!("<link rel='shortcut icon' type='image' href='{value}' />")
            }
        }
    }

    /// Output used when the page does not set this property.
    pub fn fallback(self) -> Option<String> {
        match self {
            PageProperty::Favicon => Some(self.render(DEFAULT_FAVICON_HREF)),
            _ => None,
        }
    }
}
