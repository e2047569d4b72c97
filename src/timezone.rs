use chrono::{DateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use time::OffsetDateTime;

pub(crate) fn parse_timezone(id: &str) -> Option<Tz> {
    id.trim().parse::<Tz>().ok()
}

/// Unknown identifiers are treated as UTC.
pub(crate) fn resolve_timezone(id: &str) -> Tz {
    parse_timezone(id).unwrap_or_else(|| {
        tracing::warn!(timezone = id, "unrecognized timezone, falling back to UTC");
        Tz::UTC
    })
}

pub(crate) fn to_chrono(instant: OffsetDateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(instant.unix_timestamp(), instant.nanosecond())
        .unwrap_or_default()
}

pub(crate) fn from_chrono(instant: DateTime<Utc>) -> Option<OffsetDateTime> {
    let seconds = OffsetDateTime::from_unix_timestamp(instant.timestamp()).ok()?;
    Some(seconds + time::Duration::nanoseconds(i64::from(instant.timestamp_subsec_nanos())))
}

pub(crate) fn local_hour(instant: OffsetDateTime, tz: Tz) -> u32 {
    to_chrono(instant).with_timezone(&tz).hour()
}

pub(crate) fn local_hour_from_epoch(epoch: i64, tz: Tz) -> Option<u32> {
    tz.timestamp_opt(epoch, 0).single().map(|local| local.hour())
}

/// `14` renders as `2 PM`, `0` as `12 AM`.
pub fn format_hour_label(hour: u32) -> String {
    let display = match hour % 12 {
        0 => 12,
        other => other,
    };
    let period = if hour < 12 { "AM" } else { "PM" };
    format!("{display} {period}")
}

/// Wall clock time with minutes, e.g. `2:05 PM`.
pub fn format_local_time<T: TimeZone>(instant: &DateTime<T>) -> String
where
    T::Offset: std::fmt::Display,
{
    instant.format("%-I:%M %p").to_string()
}
