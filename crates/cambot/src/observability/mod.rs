pub(crate) mod logging;
pub(crate) mod metrics;

pub use self::logging::{init_logging, tracing_err, LoggingConfig, LoggingTask};
pub use self::metrics::{init_metrics, MetricsConfig};

const GLOBAL_LABELS: &[(&str, &str)] = &[
    ("app_version", env!("CARGO_PKG_VERSION")),
    ("source", "cambot"),
];
