use chrono::prelude::*;
use easy_ext::ext;

#[ext(DateTimeExt)]
pub(crate) impl DateTime<Utc> {
    /// Basic ISO 8601 format without separators, e.g. `20240229T235959Z`.
    /// It is safe to use in file names.
    fn to_compact_iso8601(&self) -> String {
        self.format("%Y%m%dT%H%M%SZ").to_string()
    }
}
