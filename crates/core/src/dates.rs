//! Human date expressions for date-range bounds.
//!
//! Accepted forms: RFC 3339 timestamps, `YYYY-MM-DD`, `now`, `today`,
//! `tomorrow`, `yesterday`, `N <unit>s ago`, `in N <unit>s`, `+N <unit>s`
//! and `-N <unit>s` with units day, week, month, year. Relative forms are
//! anchored at the caller's reference instant.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, Month, OffsetDateTime, Time};

pub fn parse_human_date(expr: &str, now: OffsetDateTime) -> Option<OffsetDateTime> {
    let expr = expr.trim();
    if let Ok(ts) = OffsetDateTime::parse(expr, &Rfc3339) {
        return Some(ts);
    }
    if let Ok(date) = Date::parse(expr, format_description!("[year]-[month]-[day]")) {
        return Some(date.midnight().assume_utc());
    }

    let lower = expr.to_ascii_lowercase();
    let midnight = now.replace_time(Time::MIDNIGHT);
    match lower.as_str() {
        "now" => return Some(now),
        "today" => return Some(midnight),
        "tomorrow" => return midnight.checked_add(Duration::days(1)),
        "yesterday" => return midnight.checked_sub(Duration::days(1)),
        _ => {}
    }

    let words: Vec<&str> = lower.split_whitespace().collect();
    let (amount, unit, sign) = match words.as_slice() {
        [n, unit, "ago"] => (*n, *unit, -1),
        ["in", n, unit] => (*n, *unit, 1),
        [n, unit] if n.starts_with('+') => (&n[1..], *unit, 1),
        [n, unit] if n.starts_with('-') => (&n[1..], *unit, -1),
        _ => return None,
    };
    let amount: i64 = amount.parse().ok()?;
    shift(now, amount.checked_mul(sign)?, unit)
}

const SECONDS_PER_DAY: i64 = 86_400;

fn shift(from: OffsetDateTime, amount: i64, unit: &str) -> Option<OffsetDateTime> {
    match unit.trim_end_matches('s') {
        "day" => from.checked_add(Duration::seconds(amount.checked_mul(SECONDS_PER_DAY)?)),
        "week" => from.checked_add(Duration::seconds(
            amount.checked_mul(7 * SECONDS_PER_DAY)?,
        )),
        "month" => add_months(from, amount),
        "year" => add_months(from, amount.checked_mul(12)?),
        _ => None,
    }
}

/// Calendar month arithmetic, clamping the day to the target month's length.
fn add_months(from: OffsetDateTime, months: i64) -> Option<OffsetDateTime> {
    let index = (i64::from(from.year()) * 12 + i64::from(u8::from(from.month())) - 1)
        .checked_add(months)?;
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = Month::try_from(u8::try_from(index.rem_euclid(12) + 1).ok()?).ok()?;
    let date = (1..=from.day())
        .rev()
        .find_map(|day| Date::from_calendar_date(year, month, day).ok())?;
    Some(from.replace_date(date))
}
