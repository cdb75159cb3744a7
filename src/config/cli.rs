use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the Quire binary.
#[derive(Debug, Parser)]
#[command(name = "quire", version, about = "Quire flat-file site server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "QUIRE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve the site over HTTP.
    Serve(Box<ServeArgs>),
    /// Delete every cached template artifact under the site tree.
    #[command(name = "purge-cache")]
    PurgeCache(PurgeArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SiteOverrides {
    /// Override the site root directory.
    #[arg(long = "site-root", value_name = "PATH")]
    pub site_root: Option<PathBuf>,

    /// Override the directory holding page resources.
    #[arg(long = "site-webpages-dir", value_name = "PATH")]
    pub webpages_dir: Option<PathBuf>,

    /// Override the directory holding error page resources.
    #[arg(long = "site-errors-dir", value_name = "PATH")]
    pub errors_dir: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub site: SiteOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Toggle the template artifact cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the template script interpreter.
    #[arg(long = "producer-interpreter", value_name = "PROGRAM")]
    pub producer_interpreter: Option<String>,

    /// Override the template script timeout.
    #[arg(long = "producer-timeout-seconds", value_name = "SECONDS")]
    pub producer_timeout_seconds: Option<u64>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct PurgeArgs {
    #[command(flatten)]
    pub site: SiteOverrides,

    /// List the artifacts that would be removed without deleting them.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub dry_run: bool,
}
