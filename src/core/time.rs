use time::{format_description::well_known::Rfc3339, Duration, OffsetDateTime, PrimitiveDateTime};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

/// RFC 3339 rendering of a naive UTC timestamp, always with a `Z` suffix.
pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

pub(crate) fn add_minutes(value: PrimitiveDateTime, minutes: i64) -> PrimitiveDateTime {
    value.saturating_add(Duration::minutes(minutes))
}

/// Whole seconds between two timestamps, clamped at zero.
pub(crate) fn elapsed_seconds(from: PrimitiveDateTime, to: PrimitiveDateTime) -> i64 {
    (to - from).whole_seconds().max(0)
}
