use std::path::Path;

use super::*;

#[test]
fn defaults_describe_a_local_site() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.site.webpages_dir, Path::new("./webpages"));
    assert_eq!(settings.site.errors_dir, Path::new("./errors"));
    assert!(settings.cache.enabled);
    assert_eq!(settings.producer.script_name, "template.sh");
    assert_eq!(settings.producer.interpreter, "sh");
    assert_eq!(settings.producer.timeout, Duration::from_secs(30));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.cache.enabled = Some(true);

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        cache_enabled: Some(false),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(!settings.cache.enabled);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn site_directories_resolve_against_root() {
    let mut raw = RawSettings::default();
    raw.site.root = Some("/srv/site".into());
    raw.site.errors_dir = Some("/var/quire/errors".into());

    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.site.webpages_dir, Path::new("/srv/site/webpages"));
    // Absolute directories replace the root.
    assert_eq!(settings.site.errors_dir, Path::new("/var/quire/errors"));
}

#[test]
fn rejects_zero_port() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero port");
    assert!(matches!(err, LoadError::Invalid { key: "server.port", .. }));
}

#[test]
fn rejects_script_names_with_separators() {
    let mut raw = RawSettings::default();
    raw.producer.script_name = Some("../run.sh".to_string());

    let err = Settings::from_raw(raw).expect_err("path script name");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "producer.script_name",
            ..
        }
    ));
}

#[test]
fn rejects_unknown_log_level() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("chatty".to_string());

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["quire"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_purge_cache_arguments() {
    let args = CliArgs::parse_from(["quire", "purge-cache", "--site-root", "/srv/site", "--dry-run"]);

    match args.command.expect("purge command") {
        Command::PurgeCache(purge) => {
            assert_eq!(purge.site.site_root.as_deref(), Some(Path::new("/srv/site")));
            assert!(purge.dry_run);
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_serve_arguments() {
    let args = CliArgs::parse_from([
        "quire",
        "serve",
        "--server-port",
        "8080",
        "--cache-enabled",
        "false",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_port, Some(8080));
            assert_eq!(serve.overrides.cache_enabled, Some(false));
        }
        _ => panic!("wrong command parsed"),
    }
}
