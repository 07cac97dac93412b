//! # Business-Day Boundaries
//!
//! The café runs on the América/Lima clock (UTC−5, no DST) and its
//! accounting day opens at 06:00 local — a session closed at 01:30 on the
//! calendar 11th belongs to the business day of the 10th. Every date-range
//! filter in the reporting code converts calendar dates through this
//! module, so all screens agree on which day a row falls into.
//!
//! Business day `D` spans `[D 06:00:00−05:00, D+1 06:00:00−05:00)`, i.e.
//! `[D 11:00Z, D+1 11:00Z)`.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};

/// Lima offset in seconds east of UTC (UTC−5, fixed year-round).
const LIMA_OFFSET_SECS: i32 = -5 * 3600;

/// Local hour at which the business day opens.
const OPENING_HOUR: u32 = 6;

fn lima() -> FixedOffset {
    // Fixed offset is valid by construction; Peru observes no DST.
    FixedOffset::east_opt(LIMA_OFFSET_SECS).expect("valid UTC-5 offset")
}

/// UTC instant at which the business day `day` opens (06:00 Lima).
///
/// ## Example
/// ```rust
/// use cabina_core::days::business_day_start;
/// use chrono::NaiveDate;
///
/// let d = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
/// assert_eq!(
///     business_day_start(d).to_rfc3339(),
///     "2026-03-10T11:00:00+00:00"
/// );
/// ```
pub fn business_day_start(day: NaiveDate) -> DateTime<Utc> {
    let local = day
        .and_hms_opt(OPENING_HOUR, 0, 0)
        .expect("06:00:00 is a valid time");
    lima()
        .from_local_datetime(&local)
        .single()
        .expect("fixed offset has no ambiguous local times")
        .with_timezone(&Utc)
}

/// Half-open UTC range covering the business days `from..=to`:
/// `[from 06:00, to+1 06:00)`.
pub fn business_day_range(from: NaiveDate, to: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        business_day_start(from),
        business_day_start(to + Duration::days(1)),
    )
}

/// The business day a UTC instant falls into.
pub fn business_day_of(instant: DateTime<Utc>) -> NaiveDate {
    // Shift into Lima time, then roll back past the 06:00 opening.
    (instant.with_timezone(&lima()) - Duration::hours(OPENING_HOUR as i64)).date_naive()
}

/// Half-open UTC range covering every business day of a month.
///
/// Returns `None` for an invalid year/month.
pub fn month_range(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((business_day_start(first), business_day_start(next)))
}

// =============================================================================
// Unit Tests
// =============================================================================
