use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

use crate::error::{Error, Result};

/// Compact UTC timestamp suitable for file names, e.g. `20240131-235959`.
const SLUG_FORMAT: &[FormatItem<'static>] =
    format_description!("[year][month][day]-[hour][minute][second]");

/// Format `datetime` as a file-name friendly slug.
pub fn slug(datetime: OffsetDateTime) -> Result<String> {
    datetime
        .format(SLUG_FORMAT)
        .map_err(|e| Error::encoding(format!("failed to format timestamp: {e}"), Some(Box::new(e))))
}

/// The current UTC time as a file-name friendly slug.
pub fn now_slug() -> Result<String> {
    slug(OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn slug_format() {
        assert_eq!(
            slug(datetime!(2024-01-31 23:59:58 UTC)).unwrap(),
            "20240131-235958"
        );
    }

    #[test]
    fn now_slug_shape() {
        let slug = now_slug().unwrap();
        assert_eq!(slug.len(), 15);
        assert_eq!(slug.as_bytes()[8], b'-');
    }
}
