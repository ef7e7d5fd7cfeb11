use crate::observability::GLOBAL_LABELS;
use crate::prelude::*;
use crate::{LogLevel, Result};
use std::ops::Deref;
use tracing_subscriber::prelude::*;

/// Name of the environment variable with `tracing` filter directives, that
/// take precedence over the log level from the command line.
const LOG_FILTER_ENV_VAR: &str = "CAMBOT_LOG";

pub struct LoggingConfig {
    pub(crate) level: LogLevel,

    /// Push the logs to Grafana Loki in addition to stderr if set
    pub(crate) loki_url: Option<url::Url>,
}

pub struct LoggingTask {
    loki: Option<LokiTask>,
}

struct LokiTask {
    task: tokio::task::JoinHandle<()>,
    controller: tracing_loki::BackgroundTaskController,
}

impl LoggingTask {
    pub async fn shutdown(self) {
        let Some(LokiTask { task, controller }) = self.loki else {
            return;
        };

        info!("Waiting for the logging task to finish nicely...");

        let start = std::time::Instant::now();
        controller.shutdown().await;
        let duration = start.elapsed();

        eprintln!("Stopped logging task in {:.2?}: {:?}", duration, task.await);
    }
}

/// Installs the global `tracing` subscriber. Must be called once at the
/// start of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingTask> {
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(config.level.to_level_filter().into())
        .with_env_var(LOG_FILTER_ENV_VAR)
        .from_env_lossy();

    let fmt = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(std::env::var("COLORS").as_deref() != Ok("0"))
        .pretty();

    let (loki, loki_task) = match &config.loki_url {
        Some(loki_url) => {
            let (layer, task) = init_loki(loki_url.clone())?;
            (Some(layer), Some(task))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt)
        .with(loki)
        .with(env_filter)
        .with(tracing_error::ErrorLayer::default())
        .init();

    init_panic_hook();

    Ok(LoggingTask { loki: loki_task })
}

fn init_loki(loki_url: url::Url) -> Result<(tracing_loki::Layer, LokiTask)> {
    let builder = GLOBAL_LABELS
        .iter()
        .try_fold(tracing_loki::builder(), |builder, (key, value)| {
            builder.label(*key, *value)
        })
        .fatal_ctx(|| "Failed to set the labels for Loki logging layer")?;

    let (layer, controller, task) = builder
        .build_controller_url(loki_url)
        .fatal_ctx(|| "Failed to create Loki logging layer")?;

    let task = tokio::spawn(task);

    Ok((layer, LokiTask { task, controller }))
}

fn init_panic_hook() {
    let current_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        // It's super-important to call the default panic hook, otherwise
        // we may not see it in the logs at all, because the panic may
        // happen inside of `tracing` logging system itself.
        // See the footgun: https://github.com/rust-itertools/itertools/issues/667
        current_hook(panic_info);

        let backtrace = std::backtrace::Backtrace::capture();
        let location = panic_info.location().map(|location| {
            format!(
                "{}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            )
        });

        // If the panic message was formatted using interpolated values,
        // it will be a `String`. Otherwise, it will be a `&str`.
        let payload = panic_info.payload();
        let message = payload
            .downcast_ref::<String>()
            .map(<_>::deref)
            .or_else(|| payload.downcast_ref::<&str>().map(<_>::deref))
            .unwrap_or("<unknown>");

        let span_trace = tracing_error::SpanTrace::capture();

        error!(
            target: "panic",
            thread = std::thread::current().name(),
            location,
            span_trace = %span_trace,
            backtrace = format_args!("\n{backtrace}"),
            "{message}"
        );
    }));
}
