//! Calendar parsing and arithmetic helpers.
//!
//! Formula dates are zone-less civil date-times. Inputs that carry an explicit offset are
//! normalised to UTC before the offset is dropped.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use lazy_regex::{regex, Captures};

/// Date forms with an English month name, tried in order
const NAMED_MONTH_FORMATS: &[&str] = &[
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%A, %B %d, %Y",
    "%a %B %d %Y",
];

/// Parse a date or date-time in any of the accepted shapes.
///
/// Returns `None` for anything unrecognisable; callers treat that as "no date".
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.naive_utc());
    }

    let iso = regex!(
        r"^(?P<y>\d{4})[-/](?P<m>\d{1,2})[-/](?P<d>\d{1,2})(?:(?:T|\s+)(?P<time>.+?))?\s*(?P<tz>Z|[+-]\d{2}:?\d{2})?$"
    );
    if let Some(caps) = iso.captures(text) {
        let date = ymd(&caps, "y", "m", "d")?;
        return with_time_and_offset(date, &caps);
    }

    let us = regex!(
        r"^(?P<m>\d{1,2})/(?P<d>\d{1,2})/(?P<y>\d{4})(?:\s+(?P<time>.+?))?\s*(?P<tz>Z|[+-]\d{2}:?\d{2})?$"
    );
    if let Some(caps) = us.captures(text) {
        let date = ymd(&caps, "y", "m", "d")?;
        return with_time_and_offset(date, &caps);
    }

    parse_named_month(text)
}

fn ymd(caps: &Captures<'_>, y: &str, m: &str, d: &str) -> Option<NaiveDate> {
    let year = caps.name(y)?.as_str().parse().ok()?;
    let month = caps.name(m)?.as_str().parse().ok()?;
    let day = caps.name(d)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn with_time_and_offset(date: NaiveDate, caps: &Captures<'_>) -> Option<NaiveDateTime> {
    let time = match caps.name("time") {
        Some(t) => parse_time(t.as_str())?,
        None => NaiveTime::MIN,
    };
    let dt = date.and_time(time);
    match caps.name("tz") {
        Some(tz) => dt.checked_sub_signed(Duration::minutes(offset_minutes(tz.as_str())?)),
        None => Some(dt),
    }
}

/// `HH:MM[:SS[.fff]] [AM|PM]`
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let re = regex!(
        r"^(?P<h>\d{1,2}):(?P<mi>\d{2})(?::(?P<s>\d{2})(?:\.(?P<f>\d{1,9}))?)?\s*(?P<ampm>[AaPp][Mm])?$"
    );
    let caps = re.captures(text.trim())?;

    let mut hour: u32 = caps.name("h")?.as_str().parse().ok()?;
    let minute: u32 = caps.name("mi")?.as_str().parse().ok()?;
    let second: u32 = caps
        .name("s")
        .map_or(Some(0), |s| s.as_str().parse().ok())?;
    let nanos: u32 = match caps.name("f") {
        Some(f) => {
            let digits = f.as_str();
            let padded = format!("{:0<9}", digits);
            padded.parse().ok()?
        }
        None => 0,
    };

    if let Some(ampm) = caps.name("ampm") {
        if hour == 0 || hour > 12 {
            return None;
        }
        let pm = ampm.as_str().eq_ignore_ascii_case("pm");
        hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
    }

    NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)
}

fn offset_minutes(tz: &str) -> Option<i64> {
    if tz == "Z" {
        return Some(0);
    }
    let sign = if tz.starts_with('-') { -1 } else { 1 };
    let digits: String = tz[1..].chars().filter(|c| *c != ':').collect();
    let hours: i64 = digits.get(0..2)?.parse().ok()?;
    let minutes: i64 = digits.get(2..4)?.parse().ok()?;
    Some(sign * (hours * 60 + minutes))
}

fn parse_named_month(text: &str) -> Option<NaiveDateTime> {
    for format in NAMED_MONTH_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }

    // Named month followed by a time
    let (date_part, time_part) = text.rsplit_once(' ')?;
    let time = parse_time(time_part)?;
    NAMED_MONTH_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
        .map(|date| date.and_time(time))
}

/// `YYYY-MM-DD` form of a date-time
pub fn iso_date(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// Build a date from possibly out-of-range parts, rolling overflow into neighbouring months
/// and years (month 13 is January of the next year, day 0 is the last day of the previous
/// month). Two-digit years map to the 1900s.
pub fn make_date(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    let year = if (0..=99).contains(&year) {
        year + 1900
    } else {
        year
    };
    roll_date(year, month, day)
}

/// Shift by whole months, keeping the day-of-month offset so that e.g. Jan 31 + 1 month
/// lands in early March rather than clamping to February's last day.
pub fn add_months(dt: &NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let date = roll_date(
        i64::from(dt.year()),
        i64::from(dt.month()) + months,
        i64::from(dt.day()),
    )?;
    Some(date.and_time(dt.time()))
}

fn roll_date(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    let months = year.checked_mul(12)?.checked_add(month - 1)?;
    let first = NaiveDate::from_ymd_opt(
        i32::try_from(months.div_euclid(12)).ok()?,
        u32::try_from(months.rem_euclid(12) + 1).ok()?,
        1,
    )?;
    first.checked_add_signed(Duration::try_days(day - 1)?)
}

/// Day of week with Sunday = 0
pub fn weekday_from_sunday(dt: &NaiveDateTime) -> u32 {
    dt.weekday().num_days_from_sunday()
}

/// Last calendar day of the month containing `dt`
pub fn month_last_day(dt: &NaiveDateTime) -> Option<NaiveDate> {
    roll_date(i64::from(dt.year()), i64::from(dt.month()) + 1, 0)
}
