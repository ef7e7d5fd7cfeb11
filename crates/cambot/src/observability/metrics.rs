use super::GLOBAL_LABELS;
use crate::prelude::*;
use crate::Result;
use std::net::SocketAddr;

pub(crate) const COMMANDS_TOTAL: &str = "cambot_commands_total";
pub(crate) const COMMAND_ERRORS_TOTAL: &str = "cambot_command_errors_total";
pub(crate) const PHOTOS_CAPTURED_TOTAL: &str = "cambot_photos_captured_total";
pub(crate) const CAPTURE_DURATION_SECONDS: &str = "cambot_capture_duration_seconds";

/// Histogram buckets for the camera capture duration. The warm up alone takes
/// two seconds, so the interesting range is above that.
const CAPTURE_DURATION_BUCKETS: &[f64] = &[0.1, 0.5, 1.0, 2.0, 2.5, 3.0, 4.0, 5.0, 10.0, 30.0];

pub struct MetricsConfig {
    /// Address to serve Prometheus metrics on. Metrics are not exported
    /// if it isn't set.
    pub(crate) addr: Option<SocketAddr>,
}

pub fn init_metrics(config: &MetricsConfig) -> Result {
    describe_metrics();

    let Some(addr) = config.addr else {
        debug!("Metrics address is not configured, not exporting metrics");
        return Ok(());
    };

    let mut builder = metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Full(CAPTURE_DURATION_SECONDS.to_owned()),
            CAPTURE_DURATION_BUCKETS,
        )
        .fatal_ctx(|| "Failed to set the capture duration buckets")?;

    for (key, value) in GLOBAL_LABELS {
        builder = builder.add_global_label(*key, *value);
    }

    builder
        .install()
        .fatal_ctx(|| format!("Failed to start the metrics listener at {addr}"))?;

    info!(%addr, "Serving Prometheus metrics");

    Ok(())
}

fn describe_metrics() {
    metrics::describe_counter!(COMMANDS_TOTAL, "Number of bot commands received");
    metrics::describe_counter!(
        COMMAND_ERRORS_TOTAL,
        "Number of bot commands that failed to be handled"
    );
    metrics::describe_counter!(
        PHOTOS_CAPTURED_TOTAL,
        "Number of photos successfully captured"
    );
    metrics::describe_histogram!(
        CAPTURE_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Time it took to capture a single photo, including the warm up"
    );
}
