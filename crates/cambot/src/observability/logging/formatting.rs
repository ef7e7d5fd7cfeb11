use std::fmt;
use std::time::Duration;

/// Records the error as a `dyn Error` value, so that the subscriber
/// can display its chain of sources
#[must_use]
pub fn tracing_err<'a, E: std::error::Error + 'static>(err: &'a E) -> impl tracing::Value + 'a {
    err as &dyn std::error::Error
}

/// Durations are displayed in seconds, the same unit the metrics use
pub(crate) fn tracing_duration(duration: Duration) -> impl tracing::Value {
    tracing::field::display(Seconds(duration))
}

struct Seconds(Duration);

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0.as_secs_f64())
    }
}
