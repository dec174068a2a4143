//! Date functions
//!
//! Functions that need a date return 0 (numeric results) or the empty string (date results)
//! when their input does not parse.

use crate::datetime::{add_months, iso_date, make_date, month_last_day, weekday_from_sunday};
use crate::evaluator::Args;
use crate::value::FormulaValue;
use chrono::{Datelike, Duration, NaiveDateTime, Timelike};

const MS_PER_SECOND: f64 = 1_000.0;
const MS_PER_MINUTE: f64 = 60_000.0;
const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_DAY: f64 = 86_400_000.0;
const MS_PER_WEEK: f64 = 604_800_000.0;

fn date_or_empty(dt: Option<NaiveDateTime>) -> FormulaValue {
    match dt {
        Some(dt) => FormulaValue::String(iso_date(&dt)),
        None => FormulaValue::empty(),
    }
}

/// Whole-number amount, or `None` for infinities and values too large to add to a date
fn whole_amount(n: f64) -> Option<i64> {
    if n.is_finite() && n.abs() < 1e15 {
        Some(n.trunc() as i64)
    } else {
        None
    }
}

fn add_days(dt: &NaiveDateTime, days: i64) -> Option<NaiveDateTime> {
    dt.checked_add_signed(Duration::try_days(days)?)
}

fn add_seconds(dt: &NaiveDateTime, seconds: i64) -> Option<NaiveDateTime> {
    dt.checked_add_signed(Duration::try_seconds(seconds)?)
}

/// YEAR(Date)
pub fn fn_year(args: &Args) -> FormulaValue {
    FormulaValue::Number(args.date(0).map_or(0.0, |d| d.year() as f64))
}

/// MONTH(Date)
pub fn fn_month(args: &Args) -> FormulaValue {
    FormulaValue::Number(args.date(0).map_or(0.0, |d| d.month() as f64))
}

/// MONTHDAY(Date)
pub fn fn_monthday(args: &Args) -> FormulaValue {
    FormulaValue::Number(args.date(0).map_or(0.0, |d| d.day() as f64))
}

/// Week of the month with weeks starting on Sunday, 1-based
fn month_week(dt: &NaiveDateTime) -> u32 {
    let first_weekday = dt
        .date()
        .with_day(1)
        .map_or(0, |first| first.weekday().num_days_from_sunday());
    (dt.day() + first_weekday - 1) / 7 + 1
}

/// DATEPART(Part; Date)
pub fn fn_datepart(args: &Args) -> FormulaValue {
    let part = args.string(0).to_lowercase();
    let Some(d) = args.date(1) else {
        return FormulaValue::Number(0.0);
    };

    let n = match part.as_str() {
        "year" => d.year() as f64,
        "month" => d.month() as f64,
        "day" => d.day() as f64,
        "weekday" => weekday_from_sunday(&d) as f64,
        "hour" => d.hour() as f64,
        "minute" => d.minute() as f64,
        "second" => d.second() as f64,
        "yearday" => d.ordinal() as f64,
        "monthweek" => month_week(&d) as f64,
        "yearweek" => d.iso_week().week() as f64,
        _ => 0.0,
    };
    FormulaValue::Number(n)
}

/// DATESERIAL(Year; Month; Day)
pub fn fn_dateserial(args: &Args) -> FormulaValue {
    let parts = (
        whole_amount(args.number(0)),
        whole_amount(args.number(1)),
        whole_amount(args.number(2)),
    );
    let date = match parts {
        (Some(y), Some(m), Some(d)) => make_date(y, m, d),
        _ => None,
    };
    match date {
        Some(date) => FormulaValue::String(date.format("%Y-%m-%d").to_string()),
        None => FormulaValue::empty(),
    }
}

/// DATEDIFF(Unit; From; To)
pub fn fn_datediff(args: &Args) -> FormulaValue {
    let unit = args.string(0).to_lowercase();
    let (Some(from), Some(to)) = (args.date(1), args.date(2)) else {
        return FormulaValue::Number(0.0);
    };

    let elapsed = (to - from).num_milliseconds() as f64;
    let n = match unit.as_str() {
        "second" => (elapsed / MS_PER_SECOND).floor(),
        "minute" => (elapsed / MS_PER_MINUTE).floor(),
        "hour" => (elapsed / MS_PER_HOUR).floor(),
        "week" => (elapsed / MS_PER_WEEK).floor(),
        "month" => {
            let years = i64::from(to.year()) - i64::from(from.year());
            let months = i64::from(to.month()) - i64::from(from.month());
            (years * 12 + months) as f64
        }
        "year" => (i64::from(to.year()) - i64::from(from.year())) as f64,
        _ => (elapsed / MS_PER_DAY).floor(),
    };
    FormulaValue::Number(n)
}

/// Move by `amount` business days: whole 5-day blocks become 7 calendar days, and a
/// remainder that runs past Friday skips the weekend.
fn add_weekdays(dt: &NaiveDateTime, amount: i64) -> Option<NaiveDateTime> {
    let sign = if amount < 0 { -1 } else { 1 };
    let abs = amount.abs();
    let full_weeks = abs / 5;
    let remainder = abs % 5;

    let shifted = add_days(dt, sign * full_weeks * 7)?;

    // Monday = 0 .. Friday = 4, Sunday = -1, Saturday = -2
    let weekday_index = match weekday_from_sunday(&shifted) {
        0 => -1,
        6 => -2,
        d => i64::from(d) - 1,
    };
    let mut extra = remainder;
    if weekday_index + remainder >= 5 {
        extra += 2;
    }
    add_days(&shifted, sign * extra)
}

/// DATEADD(Unit; Amount; Date)
pub fn fn_dateadd(args: &Args) -> FormulaValue {
    let unit = args.string(0).to_lowercase();
    let amount = args.number(1);
    let Some(d) = args.date(2) else {
        return FormulaValue::empty();
    };
    let Some(amount) = whole_amount(amount) else {
        return FormulaValue::empty();
    };

    let result = match unit.as_str() {
        "second" => add_seconds(&d, amount),
        "minute" => amount.checked_mul(60).and_then(|s| add_seconds(&d, s)),
        "hour" => amount.checked_mul(3_600).and_then(|s| add_seconds(&d, s)),
        "day" => add_days(&d, amount),
        "weekday" => add_weekdays(&d, amount),
        "week" => amount.checked_mul(7).and_then(|days| add_days(&d, days)),
        "month" => add_months(&d, amount),
        "year" => amount.checked_mul(12).and_then(|m| add_months(&d, m)),
        _ => Some(d),
    };
    date_or_empty(result)
}

/// DATELIST(Start; End)
pub fn fn_datelist(args: &Args) -> FormulaValue {
    let (Some(start), Some(end)) = (args.date(0), args.date(1)) else {
        return FormulaValue::empty();
    };

    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(iso_date(&current));
        match add_days(&current, 1) {
            Some(next) => current = next,
            None => break,
        }
    }
    FormulaValue::String(dates.join(";"))
}

/// DATETIMEMERGE(Date; Time)
pub fn fn_datetimemerge(args: &Args) -> FormulaValue {
    FormulaValue::String(format!("{} {}", args.string(0), args.string(1)))
}

/// DATEROUND(Unit; Interval; Date)
///
/// Only day granularity is supported: the time of day is dropped whatever the unit.
pub fn fn_dateround(args: &Args) -> FormulaValue {
    date_or_empty(args.date(2))
}

/// MONTHLASTDAY(Date; [OffsetDays])
pub fn fn_monthlastday(args: &Args) -> FormulaValue {
    let Some(d) = args.date(0) else {
        return FormulaValue::empty();
    };
    let offset = if args.len() > 1 {
        whole_amount(args.number(1))
    } else {
        Some(0)
    };

    let last = month_last_day(&d)
        .zip(offset)
        .and_then(|(last, offset)| last.checked_add_signed(Duration::try_days(offset)?));
    match last {
        Some(last) => FormulaValue::String(last.format("%Y-%m-%d").to_string()),
        None => FormulaValue::empty(),
    }
}

/// FISCALMONTH(StartMonth; Date)
pub fn fn_fiscalmonth(args: &Args) -> FormulaValue {
    let start_month = args.number(0);
    let Some(d) = args.date(1) else {
        return FormulaValue::Number(0.0);
    };
    let mut fiscal = d.month() as f64 - start_month + 1.0;
    if fiscal <= 0.0 {
        fiscal += 12.0;
    }
    FormulaValue::Number(fiscal)
}

/// FISCALYEAR(StartMonth; Date)
pub fn fn_fiscalyear(args: &Args) -> FormulaValue {
    let start_month = args.number(0);
    let Some(d) = args.date(1) else {
        return FormulaValue::Number(0.0);
    };
    let mut year = d.year() as f64;
    if (d.month() as f64) < start_month {
        year -= 1.0;
    }
    FormulaValue::Number(year)
}

fn compare_dates(args: &Args, test: fn(&NaiveDateTime, &NaiveDateTime) -> bool) -> FormulaValue {
    match (args.date(0), args.date(1)) {
        (Some(a), Some(b)) => test(&a, &b).into(),
        _ => false.into(),
    }
}

/// GTDATE(Date; Other)
pub fn fn_gtdate(args: &Args) -> FormulaValue {
    compare_dates(args, |a, b| a > b)
}

/// GTEDATE(Date; Other)
pub fn fn_gtedate(args: &Args) -> FormulaValue {
    compare_dates(args, |a, b| a >= b)
}

/// LTDATE(Date; Other)
pub fn fn_ltdate(args: &Args) -> FormulaValue {
    compare_dates(args, |a, b| a < b)
}

/// LTEDATE(Date; Other)
pub fn fn_ltedate(args: &Args) -> FormulaValue {
    compare_dates(args, |a, b| a <= b)
}

/// BDATE(Date; After; Before), exclusive
pub fn fn_bdate(args: &Args) -> FormulaValue {
    match (args.date(0), args.date(1), args.date(2)) {
        (Some(d), Some(lo), Some(hi)) => (d > lo && d < hi).into(),
        _ => false.into(),
    }
}

/// BEDATE(Date; From; To), inclusive
pub fn fn_bedate(args: &Args) -> FormulaValue {
    match (args.date(0), args.date(1), args.date(2)) {
        (Some(d), Some(lo), Some(hi)) => (d >= lo && d <= hi).into(),
        _ => false.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_add_weekdays() {
        // Friday + 1 business day lands on Monday
        assert_eq!(add_weekdays(&dt(2024, 1, 5), 1), Some(dt(2024, 1, 8)));
        // Monday + 5 is the next Monday
        assert_eq!(add_weekdays(&dt(2024, 1, 1), 5), Some(dt(2024, 1, 8)));
        // Wednesday + 3 crosses the weekend
        assert_eq!(add_weekdays(&dt(2024, 1, 3), 3), Some(dt(2024, 1, 8)));
        // Saturday + 1 counts from the weekend
        assert_eq!(add_weekdays(&dt(2024, 1, 6), 1), Some(dt(2024, 1, 7)));
        assert_eq!(add_weekdays(&dt(2024, 1, 10), -2), Some(dt(2024, 1, 8)));
    }

    #[test]
    fn test_month_week() {
        // 2024-09-01 is a Sunday
        assert_eq!(month_week(&dt(2024, 9, 1)), 1);
        assert_eq!(month_week(&dt(2024, 9, 7)), 1);
        assert_eq!(month_week(&dt(2024, 9, 8)), 2);
        // 2024-06-01 is a Saturday
        assert_eq!(month_week(&dt(2024, 6, 2)), 2);
    }

    #[test]
    fn test_whole_amount() {
        assert_eq!(whole_amount(2.9), Some(2));
        assert_eq!(whole_amount(-2.9), Some(-2));
        assert_eq!(whole_amount(f64::INFINITY), None);
    }
}
