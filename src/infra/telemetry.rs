use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::{
    METRIC_PRODUCE_MS, METRIC_TTL_EXPIRED, METRIC_TTL_HIT, METRIC_TTL_MISS, METRIC_TTL_PERSIST,
    METRIC_TTL_PERSIST_FAILED,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_TTL_HIT,
            Unit::Count,
            "Template requests served from a fresh cached artifact."
        );
        describe_counter!(
            METRIC_TTL_MISS,
            Unit::Count,
            "Template requests that ran the producer."
        );
        describe_counter!(
            METRIC_TTL_EXPIRED,
            Unit::Count,
            "Cached artifacts found expired and deleted."
        );
        describe_counter!(
            METRIC_TTL_PERSIST,
            Unit::Count,
            "Artifacts written after a producer run with cache-for."
        );
        describe_counter!(
            METRIC_TTL_PERSIST_FAILED,
            Unit::Count,
            "Artifact writes that failed; the page was still served."
        );
        describe_histogram!(
            METRIC_PRODUCE_MS,
            Unit::Milliseconds,
            "Template producer latency in milliseconds."
        );
    });
}
