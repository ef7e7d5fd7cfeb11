use crate::prelude::*;
use crate::Result;
use async_trait::async_trait;
use easy_ext::ext;
use futures::prelude::*;
use std::time::Duration;

#[ext(FutureExt)]
#[async_trait]
pub(crate) impl<T, F> F
where
    F: Future<Output = Result<T>> + Send,
    T: Send,
{
    /// Logs the outcome of the future together with the time it took to complete.
    /// Failures are logged with the error id to correlate them with the error
    /// reports.
    async fn with_duration_log<'m>(self, msg: &'m str) -> Result<T> {
        let (result, duration) = self.with_duration().await;
        let duration = tracing_duration(duration);
        match &result {
            Ok(_) => info!(result = "ok", duration, "{msg}"),
            Err(err) => warn!(result = "err", id = err.id(), duration, "{msg}"),
        }
        result
    }

    async fn with_duration(self) -> (Result<T>, Duration) {
        let start = std::time::Instant::now();
        let result = self.await;
        (result, start.elapsed())
    }
}
