//! On-disk artifact format.
//!
//! An artifact is the producer's raw output with two settings lines in front:
//!
//! ```text
//! generated: 1700000000
//! cache-expires: 1700000060
//!
//! title: Events
//! cache-for: 60
//! =====
//! <ul>...</ul>
//! ```
//!
//! Because the first occurrence of a key wins, the header always overrides any
//! `generated` or `cache-expires` the producer may emit itself.

use crate::domain::settings::Settings;

pub const GENERATED_KEY: &str = "generated";
pub const EXPIRES_KEY: &str = "cache-expires";
pub const CACHE_FOR_KEY: &str = "cache-for";

pub fn encode(raw_content: &str, generated_at: i64, expires_at: i64) -> String {
    format!("{GENERATED_KEY}: {generated_at}\n{EXPIRES_KEY}: {expires_at}\n\n{raw_content}")
}

/// Expiry timestamp carried by a parsed artifact, if readable.
pub fn expires_at(settings: Option<&Settings>) -> Option<i64> {
    settings.and_then(|settings| settings.integer(EXPIRES_KEY))
}

/// Producer-declared lifetime, when it is a positive whole number of seconds.
pub fn cache_for(settings: Option<&Settings>) -> Option<u64> {
    settings
        .and_then(|settings| settings.seconds(CACHE_FOR_KEY))
        .filter(|seconds| *seconds > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::parse_content;

    #[test]
    fn header_round_trips_through_the_parser() {
        let raw = "title: Events\ncache-for: 60\n=====\n<ul></ul>";
        let artifact = encode(raw, 1_000, 1_060);
        let parsed = parse_content(&artifact);
        let settings = parsed.settings.expect("artifact settings");

        assert_eq!(settings.integer(GENERATED_KEY), Some(1_000));
        assert_eq!(expires_at(Some(&settings)), Some(1_060));
        assert_eq!(settings.text("title"), Some("Events"));
        assert_eq!(cache_for(Some(&settings)), Some(60));
        assert_eq!(parsed.body, "<ul></ul>");
    }

    #[test]
    fn header_wins_over_producer_declared_expiry() {
        let raw = "cache-expires: 99999999999\ncache-for: 5\n=====\nbody";
        let artifact = encode(raw, 10, 15);
        let parsed = parse_content(&artifact);
        assert_eq!(expires_at(parsed.settings.as_ref()), Some(15));
    }

    #[test]
    fn cache_for_requires_positive_integer() {
        let parse = |block: &str| parse_content(&format!("{block}\n===\n")).settings;
        assert_eq!(cache_for(parse("cache-for: 0").as_ref()), None);
        assert_eq!(cache_for(parse("cache-for: soon").as_ref()), None);
        assert_eq!(cache_for(parse("cache-for").as_ref()), None);
        assert_eq!(cache_for(parse("cache-for: 30").as_ref()), Some(30));
        assert_eq!(cache_for(None), None);
    }
}
