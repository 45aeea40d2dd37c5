use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default());

    let result = match logging.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(true))
            .try_init(),
    };

    result.map_err(|err| InfraError::telemetry(format!("tracing subscriber: {err}")))
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "rostra_cache_hit_total",
            Unit::Count,
            "Total number of index response-cache hits."
        );
        describe_counter!(
            "rostra_cache_miss_total",
            Unit::Count,
            "Total number of index response-cache misses."
        );
        describe_counter!(
            "rostra_cache_evict_total",
            Unit::Count,
            "Total number of index response-cache entries displaced by capacity or repopulation."
        );
        describe_histogram!(
            "rostra_http_request_seconds",
            Unit::Seconds,
            "Wall time spent serving one HTTP request."
        );
    });
}
