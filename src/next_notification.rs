use crate::timezone;

use chrono::{Duration, NaiveTime, TimeZone, Timelike, Utc};
use time::OffsetDateTime;

/// Next even-hour boundary in `timezone`, strictly after `now`.
///
/// An even local hour moves two hours ahead, an odd one moves to the next
/// hour. Targets past 23:00 roll into the next local day. When the wall
/// clock hour falls into a DST gap, the instant one real hour after the
/// preceding local hour is used.
pub fn compute_next(now: OffsetDateTime, timezone: &str) -> OffsetDateTime {
    let tz = timezone::resolve_timezone(timezone);
    let local = timezone::to_chrono(now).with_timezone(&tz);
    let hour = local.hour();
    let target = hour + (2 - hour % 2);
    let wall_clock =
        local.date_naive().and_time(NaiveTime::MIN) + Duration::hours(i64::from(target));

    let next = tz.from_local_datetime(&wall_clock).earliest().or_else(|| {
        tz.from_local_datetime(&(wall_clock - Duration::hours(1)))
            .earliest()
            .map(|before| before + Duration::hours(1))
    });

    next.and_then(|next| timezone::from_chrono(next.with_timezone(&Utc)))
        .unwrap_or_else(|| now + time::Duration::hours(2))
}
