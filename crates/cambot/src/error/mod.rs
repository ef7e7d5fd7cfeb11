mod ext;
mod macros;

use crate::prelude::*;
use crate::util::DynError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing_error::SpanTrace;

pub(crate) use macros::*;

pub(crate) mod prelude {
    pub(crate) use super::ext::{OptionExt as _, ResultExt as _};
}

pub type Result<T = (), E = Error> = std::result::Result<T, E>;

/// Describes any possible error that may happen in the application lifetime.
#[derive(Clone)]
pub struct Error {
    imp: Arc<ErrorImp>,
}

struct ErrorImp {
    /// Small identifier used for debugging purposes.
    /// It is logged together with the error, so that all log records
    /// related to the same failure can be found by it.
    id: String,
    kind: ErrorKind,

    // Participates only in debug impl
    spantrace: SpanTrace,
}

#[derive(Error, Debug, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum ErrorKind {
    #[error(transparent)]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error(transparent)]
    Camera {
        #[from]
        source: crate::camera::CameraError,
    },

    #[error(transparent)]
    Tg {
        #[from]
        source: teloxide::RequestError,
    },

    /// Unrecoverable kind of error, that is not supposed to happen, but when
    /// it happens we can't do anything reasonable about it, so no structural
    /// error handling is possible, this error is just propagated to the top.
    #[error("FATAL: {message}")]
    Fatal {
        message: String,
        source: Option<Box<DynError>>,
    },
}

/// Errors that prevent the bot from starting
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error(
        "You must give bot token with --token argument or in {} environment variable",
        crate::config::TOKEN_ENV_VAR
    )]
    MissingToken,

    #[error("Failed to read the config from the environment")]
    Env { source: envy::Error },
}

impl Error {
    pub(crate) fn id(&self) -> &str {
        &self.imp.id
    }

    pub(crate) fn kind(&self) -> &ErrorKind {
        &self.imp.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error (id: {}): {}", self.imp.id, self.imp.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.imp.kind.source()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)?;
        fmt::Display::fmt(&self.imp.spantrace, f)
    }
}

impl<T: Into<ErrorKind>> From<T> for Error {
    #[track_caller]
    fn from(kind: T) -> Self {
        let imp = ErrorImp {
            kind: kind.into(),
            id: nanoid::nanoid!(6),
            spantrace: SpanTrace::capture(),
        };

        let err = Self { imp: Arc::new(imp) };

        trace!(err = tracing_err(&err), "Created an error");

        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn display_includes_id() {
        let err = err!(ConfigError::MissingToken);

        assert_eq!(err.id().len(), 6);
        assert_eq!(
            err.to_string(),
            format!(
                "Error (id: {}): You must give bot token with --token argument \
                or in CAMBOT_TOKEN environment variable",
                err.id()
            )
        );
    }

    #[test]
    fn fatal_ctx_keeps_the_source() {
        let result: Result<(), std::io::Error> = Err(std::io::ErrorKind::BrokenPipe.into());
        let err = result.fatal_ctx(|| "Pipe broke").unwrap_err();

        assert_matches!(
            err.kind(),
            ErrorKind::Fatal { message, source: Some(_) } if message == "Pipe broke"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn kind_labels() {
        let label: &str = err!(ConfigError::MissingToken).kind().into();
        assert_eq!(label, "config");

        let label: &str = fatal!("boom").kind().into();
        assert_eq!(label, "fatal");
    }

    #[test]
    fn clones_share_the_id() {
        let err = fatal!("boom {}", 42);
        let clone = err.clone();

        assert_eq!(err.id(), clone.id());
        assert_matches!(
            clone.kind(),
            ErrorKind::Fatal { message, source: None } if message == "boom 42"
        );
    }
}
