use super::{err, ErrorKind, Result};
use crate::util::DynError;
use easy_ext::ext;

#[ext(ResultExt)]
pub(crate) impl<T, E> std::result::Result<T, E> {
    #[track_caller]
    fn fatal_ctx<S>(self, message: impl FnOnce() -> S) -> Result<T>
    where
        S: Into<String>,
        E: Into<Box<DynError>>,
    {
        // Not using closures (e.g. `map_err`), because `#[track_caller]`
        // doesn't propagate to them.
        match self {
            Ok(value) => Ok(value),
            Err(err) => {
                let source: Box<DynError> = err.into();
                Err(err!(ErrorKind::Fatal {
                    message: message(),
                    source: Some(source),
                }))
            }
        }
    }
}

#[ext(OptionExt)]
pub(crate) impl<T> Option<T> {
    #[track_caller]
    fn fatal_ctx<S>(self, message: impl FnOnce() -> S) -> Result<T>
    where
        S: Into<String>,
    {
        // Not using closures (e.g. `ok_or_else`), because `#[track_caller]`
        // doesn't propagate to them.
        match self {
            Some(value) => Ok(value),
            None => Err(err!(ErrorKind::Fatal {
                message: message(),
                source: None::<Box<DynError>>,
            })),
        }
    }
}
