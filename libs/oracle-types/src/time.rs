use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

/// Returns true while FX markets are closed: Friday 22:00 UTC through
/// Sunday 22:00 UTC inclusive-exclusive as specified (Fri >=22:00, all of
/// Sat, Sun <22:00... actually Sun is closed until 22:00, i.e. still closed).
///
/// Boundary semantics (from the glossary and worked examples): the window is
/// `[Fri 22:00:00 UTC, Sun 22:00:00 UTC)` — the Friday instant is closed, the
/// Sunday instant at exactly 22:00:00 is open again.
pub fn fx_markets_closed(now: DateTime<Utc>) -> bool {
    let seconds_into_week = seconds_since_monday_midnight(now);
    let friday_close = SECONDS_PER_DAY * 4 + 22 * 3600; // Friday 22:00:00
    let sunday_reopen = SECONDS_PER_DAY * 6 + 22 * 3600; // Sunday 22:00:00
    (friday_close..sunday_reopen).contains(&seconds_into_week)
}

const SECONDS_PER_DAY: i64 = 24 * 3600;

fn seconds_since_monday_midnight(now: DateTime<Utc>) -> i64 {
    let day_index = now.weekday().num_days_from_monday() as i64;
    let seconds_of_day =
        now.hour() as i64 * 3600 + now.minute() as i64 * 60 + now.second() as i64;
    day_index * SECONDS_PER_DAY + seconds_of_day
}

/// Whether `value` lies within `ref * (1 - tolerance)` and `ref * (1 +
/// tolerance)`, inclusive at both ends.
pub fn within_tolerance(value: rust_decimal::Decimal, reference: rust_decimal::Decimal, tolerance: rust_decimal::Decimal) -> bool {
    let lower = reference * (rust_decimal::Decimal::ONE - tolerance);
    let upper = reference * (rust_decimal::Decimal::ONE + tolerance);
    value >= lower && value <= upper
}
