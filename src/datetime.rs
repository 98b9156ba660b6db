//! Date and time normalization for agenda input fields.
//!
//! Two paths exist side by side. The strict path (`parse_flexible_date`,
//! `display_to_iso`, `is_valid_time`, ...) rejects anything that is not a real
//! calendar date or an in-range time. The as-typed path (`format_date_as_typed`,
//! `finalize_date_input`, ...) runs on every keystroke and never fails: it
//! punctuates partial input and clamps out-of-range components instead.
//!
//! Every function here is pure and signals failure with `None`, `false` or an
//! empty string.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

pub const MIN_YEAR: u32 = 1;
pub const MAX_YEAR: u32 = 9999;

/// Proleptic Gregorian leap year rule.
pub fn is_leap_year(year: u32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Number of days in `month` of `year`, or 0 when `month` is not in 1..=12.
pub fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        _ => 0,
    }
}

pub fn is_real_date(day: u32, month: u32, year: u32) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&year)
        && (1..=12).contains(&month)
        && day >= 1
        && day <= days_in_month(year, month)
}

fn parse_digits(segment: &str) -> Option<u32> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

fn build_date(day: u32, month: u32, year: u32) -> Option<NaiveDate> {
    if !is_real_date(day, month, year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

/// Parse a date typed as `DD/MM/YYYY`, `D/M/YYYY`, `YYYY-MM-DD`, `YYYY/MM/DD`
/// or `DD-MM-YYYY`. Whitespace anywhere in the input is ignored.
///
/// The order is decided by the first segment alone: four characters means
/// year-month-day, anything else is read as day-month-year. Month-first input
/// is never guessed.
pub fn parse_flexible_date(input: &str) -> Option<NaiveDate> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();

    let separator = if compact.contains('/') {
        '/'
    } else if compact.contains('-') {
        '-'
    } else {
        return None;
    };

    let parts: Vec<&str> = compact.split(separator).collect();
    if parts.len() != 3 {
        return None;
    }

    let numbers = [
        parse_digits(parts[0])?,
        parse_digits(parts[1])?,
        parse_digits(parts[2])?,
    ];

    if parts[0].len() == 4 {
        let [year, month, day] = numbers;
        build_date(day, month, year)
    } else {
        let [day, month, year] = numbers;
        build_date(day, month, year)
    }
}

/// Canonical `YYYY-MM-DD` form of any input `parse_flexible_date` accepts.
pub fn normalize_date(input: &str) -> Option<String> {
    parse_flexible_date(input).map(to_iso)
}

pub fn to_iso(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

pub fn to_display(date: NaiveDate) -> String {
    format!("{:02}/{:02}/{:04}", date.day(), date.month(), date.year())
}

fn split_fixed<'a>(input: &'a str, separator: char, widths: [usize; 3]) -> Option<[u32; 3]> {
    let parts: Vec<&'a str> = input.split(separator).collect();
    if parts.len() != 3 {
        return None;
    }
    let mut out = [0u32; 3];
    for (slot, (part, width)) in out.iter_mut().zip(parts.iter().zip(widths)) {
        if part.len() != width {
            return None;
        }
        *slot = parse_digits(part)?;
    }
    Some(out)
}

/// Strictly parse a canonical `YYYY-MM-DD` string.
pub fn parse_iso_date(iso: &str) -> Option<NaiveDate> {
    let [year, month, day] = split_fixed(iso, '-', [4, 2, 2])?;
    build_date(day, month, year)
}

/// `YYYY-MM-DD` to `DD/MM/YYYY`. Malformed input gives an empty string.
pub fn iso_to_display(iso: &str) -> String {
    parse_iso_date(iso).map(to_display).unwrap_or_default()
}

/// `DD/MM/YYYY` to `YYYY-MM-DD`, or `None` if the input is not an exact,
/// real display date.
pub fn display_to_iso(display: &str) -> Option<String> {
    let [day, month, year] = split_fixed(display, '/', [2, 2, 4])?;
    build_date(day, month, year).map(to_iso)
}

/// Exactly `HH:MM` with hour 00-23 and minute 00-59.
pub fn is_valid_time(input: &str) -> bool {
    parse_time(input).is_some()
}

pub fn parse_time(input: &str) -> Option<NaiveTime> {
    let bytes = input.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }
    let hour = parse_digits(&input[0..2])?;
    let minute = parse_digits(&input[3..5])?;
    if hour > 23 || minute > 59 {
        return None;
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

pub fn format_time(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

fn typed_digits(input: &str, limit: usize) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(limit)
        .collect()
}

fn punctuate(digits: &str, separator: char, breaks: &[usize]) -> String {
    let mut out = String::with_capacity(digits.len() + breaks.len());
    for (i, c) in digits.chars().enumerate() {
        if breaks.contains(&i) {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

/// Keystroke formatter for the date field: keeps at most 8 digits and inserts
/// `/` before the 3rd and 5th digit as they arrive.
pub fn format_date_as_typed(input: &str) -> String {
    punctuate(&typed_digits(input, 8), '/', &[2, 4])
}

/// Repair a fully typed date instead of rejecting it. Month is clamped first,
/// then year, then the day against the clamped month and year. Input with
/// fewer than 8 digits is only punctuated.
pub fn finalize_date_input(input: &str) -> String {
    let digits = typed_digits(input, 8);
    if digits.len() != 8 {
        return punctuate(&digits, '/', &[2, 4]);
    }

    // Eight ASCII digits always fit.
    let day: u32 = digits[0..2].parse().unwrap_or(1);
    let month: u32 = digits[2..4].parse().unwrap_or(1);
    let year: u32 = digits[4..8].parse().unwrap_or(MIN_YEAR);

    let month = month.clamp(1, 12);
    let year = year.clamp(MIN_YEAR, MAX_YEAR);
    let day = day.clamp(1, days_in_month(year, month));

    format!("{:02}/{:02}/{:04}", day, month, year)
}

/// Keystroke formatter for the time field: at most 4 digits, `:` before the
/// 3rd.
pub fn format_time_as_typed(input: &str) -> String {
    punctuate(&typed_digits(input, 4), ':', &[2])
}

/// Clamp a fully typed `HHMM` to a valid `HH:MM`.
pub fn finalize_time_input(input: &str) -> String {
    let digits = typed_digits(input, 4);
    if digits.len() != 4 {
        return punctuate(&digits, ':', &[2]);
    }

    let hour: u32 = digits[0..2].parse().unwrap_or(0);
    let minute: u32 = digits[2..4].parse().unwrap_or(0);

    format!("{:02}:{:02}", hour.min(23), minute.min(59))
}
