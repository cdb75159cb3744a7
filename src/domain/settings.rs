//! Content description parsing.
//!
//! A content resource is plain text with an optional settings block on top,
//! separated from the body by a *splitter line*: any single character followed
//! by a run of `=` characters and optional trailing whitespace, e.g.
//!
//! ```text
//! title: Home
//! hide_footer
//! =====
//! <p>Hi</p>
//! ```
//!
//! Settings lines are `key: value` pairs or bare `key` flags. Keys are trimmed
//! and lower-cased; the first valid occurrence of a key wins.

use std::borrow::Cow;

use quire_api_types::{SettingValue, SettingsMap};
use url::Url;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// Typed settings parsed from a settings block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    entries: SettingsMap,
}

impl Settings {
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.entries.get(key)
    }

    /// Textual value of `key`; flags and missing keys yield `None`.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(SettingValue::as_text)
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Whole-second value of `key` when it holds a non-negative integer.
    pub fn seconds(&self, key: &str) -> Option<u64> {
        self.text(key).and_then(|value| value.trim().parse().ok())
    }

    /// Signed integer value of `key` (unix timestamps).
    pub fn integer(&self, key: &str) -> Option<i64> {
        self.text(key).and_then(|value| value.trim().parse().ok())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value))
    }

    pub fn as_map(&self) -> &SettingsMap {
        &self.entries
    }

    pub fn into_map(self) -> SettingsMap {
        self.entries
    }

    fn insert_first(&mut self, key: String, value: SettingValue) {
        self.entries.entry(key).or_insert(value);
    }
}

impl From<SettingsMap> for Settings {
    fn from(entries: SettingsMap) -> Self {
        Self { entries }
    }
}

/// Result of splitting a content resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedContent<'a> {
    /// `None` when the resource has no splitter line.
    pub settings: Option<Settings>,
    pub body: &'a str,
}

/// Split `raw` at its first splitter line and parse the settings block.
pub fn parse_content(raw: &str) -> ParsedContent<'_> {
    match split_at_splitter(raw) {
        Some((block, body)) => ParsedContent {
            settings: Some(parse_settings_block(block)),
            body,
        },
        None => ParsedContent {
            settings: None,
            body: raw,
        },
    }
}

/// Returns `(settings_block, body)` when `raw` contains a splitter line.
///
/// The splitter's own line terminator belongs to neither part.
pub fn split_at_splitter(raw: &str) -> Option<(&str, &str)> {
    let mut line_start = 0;
    loop {
        let line_end = raw[line_start..].find('\n').map(|offset| line_start + offset);
        let line = &raw[line_start..line_end.unwrap_or(raw.len())];

        if is_splitter_line(line) {
            let body_start = line_end.map_or(raw.len(), |end| end + 1);
            return Some((&raw[..line_start], &raw[body_start..]));
        }

        match line_end {
            Some(end) => line_start = end + 1,
            None => return None,
        }
    }
}

/// One leading character, then one or more `=`, then optional whitespace.
pub fn is_splitter_line(line: &str) -> bool {
    let mut chars = line.trim_end().chars();
    if chars.next().is_none() {
        return false;
    }
    let run = chars.as_str();
    !run.is_empty() && run.chars().all(|c| c == '=')
}

/// Parse a settings block into typed entries.
pub fn parse_settings_block(block: &str) -> Settings {
    let stripped = strip_comments(block);
    let mut settings = Settings::default();

    for line in stripped.split(['\n', '\r']) {
        let Some((key, value)) = parse_line(line) else {
            continue;
        };
        settings.insert_first(key, value);
    }

    settings
}

fn parse_line(line: &str) -> Option<(String, SettingValue)> {
    match line.split_once(':') {
        None => {
            let key = normalize_key(line);
            (!key.is_empty()).then_some((key, SettingValue::Flag(true)))
        }
        Some((key, value)) => {
            let value = value.trim();
            if value.contains(':') && !is_absolute_url(value) {
                return None;
            }
            let key = normalize_key(key);
            (!key.is_empty()).then(|| (key, SettingValue::Text(value.to_string())))
        }
    }
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// `a:b:c` is malformed, `url: http://host:80` is not.
fn is_absolute_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|url| url.has_host())
}

/// Remove every terminated `<!-- ... -->` comment. An unterminated opener is
/// left in place.
pub fn strip_comments(block: &str) -> Cow<'_, str> {
    if !block.contains(COMMENT_OPEN) {
        return Cow::Borrowed(block);
    }

    let mut output = String::with_capacity(block.len());
    let mut rest = block;
    while let Some(open) = rest.find(COMMENT_OPEN) {
        let after_open = &rest[open + COMMENT_OPEN.len()..];
        let Some(close) = after_open.find(COMMENT_CLOSE) else {
            break;
        };
        output.push_str(&rest[..open]);
        rest = &after_open[close + COMMENT_CLOSE.len()..];
    }
    output.push_str(rest);
    Cow::Owned(output)
}
