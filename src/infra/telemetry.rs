use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
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
            "vetrina_cache_query_hit_total",
            Unit::Count,
            "Total number of query cache hits."
        );
        describe_counter!(
            "vetrina_cache_query_miss_total",
            Unit::Count,
            "Total number of query cache misses."
        );
        describe_counter!(
            "vetrina_cache_query_expired_total",
            Unit::Count,
            "Total number of query cache entries dropped past their TTL."
        );
        describe_counter!(
            "vetrina_cache_query_invalidated_total",
            Unit::Count,
            "Total number of query cache entries removed by tag invalidation."
        );
        describe_counter!(
            "vetrina_cache_page_hit_total",
            Unit::Count,
            "Total number of page cache hits."
        );
        describe_counter!(
            "vetrina_cache_page_miss_total",
            Unit::Count,
            "Total number of page cache misses."
        );
        describe_counter!(
            "vetrina_cache_page_invalidated_total",
            Unit::Count,
            "Total number of page cache entries removed by path invalidation."
        );
        describe_counter!(
            "vetrina_webhook_processed_total",
            Unit::Count,
            "Total number of revalidation webhooks accepted and applied."
        );
        describe_counter!(
            "vetrina_webhook_rejected_total",
            Unit::Count,
            "Total number of revalidation webhooks rejected before cache action."
        );
        describe_counter!(
            "vetrina_contact_accepted_total",
            Unit::Count,
            "Total number of contact messages accepted."
        );
        describe_counter!(
            "vetrina_contact_rate_limited_total",
            Unit::Count,
            "Total number of contact submissions rejected by the rate limit."
        );
        describe_counter!(
            "vetrina_contact_honeypot_total",
            Unit::Count,
            "Total number of contact submissions discarded by the honeypot."
        );
    });
}
