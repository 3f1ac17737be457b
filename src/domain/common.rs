use std::{fmt, ops::RangeInclusive};

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Monetary amounts are integer cents everywhere in the ledger.
pub type Cents = i64;

/// Identifies the owner of every persisted row.
pub type UserId = Uuid;

/// Identifies entities that expose a stable unique identifier.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Rows that belong to a single owner.
pub trait Owned {
    fn owner_id(&self) -> UserId;

    fn is_owned_by(&self, owner: UserId) -> bool {
        self.owner_id() == owner
    }
}

/// Supplies a presentation-ready label for UI or logs.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Years a [`YearMonth`] can name.
pub const YEAR_RANGE: RangeInclusive<i32> = 1..=9999;

/// Calendar month label used by statements and billed installments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Returns `None` unless `month` is within `1..=12` and `year` has four
    /// digits.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let valid = YEAR_RANGE.contains(&year) && (1..=12).contains(&month);
        valid.then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn of_instant(instant: DateTime<Utc>) -> Self {
        Self::of(instant.date_naive())
    }

    fn index(self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    fn from_index(index: i64) -> Self {
        Self {
            year: index.div_euclid(12) as i32,
            month: (index.rem_euclid(12) + 1) as u32,
        }
    }

    /// Shifts the label by `months`, rolling the year over in both directions.
    pub fn add_months(self, months: i64) -> Self {
        Self::from_index(self.index() + months)
    }

    /// Signed number of months from `self` to `other`.
    pub fn months_until(self, other: YearMonth) -> i64 {
        other.index() - self.index()
    }

    /// `None` when month arithmetic left the supported year range.
    pub fn first_day(self) -> Option<NaiveDate> {
        if !YEAR_RANGE.contains(&self.year) {
            return None;
        }
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Midnight UTC on the first day of the month.
    pub fn start_instant(self) -> Option<DateTime<Utc>> {
        self.first_day()
            .map(|day| Utc.from_utc_datetime(&day.and_time(chrono::NaiveTime::MIN)))
    }

    /// Parses `YYYY-MM`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (year, month) = raw.trim().split_once('-')?;
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Renders cents as a signed decimal string with two fraction digits.
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Parses a decimal amount such as `12`, `12.3` or `12.34` into cents without
/// going through floating point.
pub fn parse_cents(raw: &str) -> Option<Cents> {
    let trimmed = raw.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if fraction.len() > 2
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };
    let cents = whole.checked_mul(100)?.checked_add(fraction)?;
    Some(if negative { -cents } else { cents })
}

// Re-export common dependencies so consumers can rely on this module as a façade.
pub use chrono;
pub use serde;
pub use uuid;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_month_rolls_over_year_boundaries() {
        let november = YearMonth::new(2024, 11).unwrap();
        assert_eq!(november.add_months(3), YearMonth::new(2025, 2).unwrap());
        assert_eq!(november.add_months(-11), YearMonth::new(2023, 12).unwrap());
        assert_eq!(november.months_until(YearMonth::new(2025, 2).unwrap()), 3);
    }

    #[test]
    fn year_month_rejects_out_of_range_month() {
        assert!(YearMonth::new(2025, 0).is_none());
        assert!(YearMonth::new(2025, 13).is_none());
        assert_eq!(YearMonth::parse("2025-07"), YearMonth::new(2025, 7));
        assert!(YearMonth::parse("2025/07").is_none());
    }

    #[test]
    fn years_outside_four_digits_have_no_calendar_day() {
        assert!(YearMonth::new(0, 1).is_none());
        assert!(YearMonth::new(10_000, 1).is_none());
        assert!(YearMonth::parse("99999-01").is_none());

        let last = YearMonth::new(9999, 12).unwrap();
        assert!(last.start_instant().is_some());
        assert_eq!(last.add_months(1).first_day(), None);
        assert_eq!(last.add_months(1).start_instant(), None);
    }

    #[test]
    fn cents_parse_and_format_without_float_drift() {
        assert_eq!(parse_cents("12.34"), Some(1234));
        assert_eq!(parse_cents("0.1"), Some(10));
        assert_eq!(parse_cents("7"), Some(700));
        assert_eq!(parse_cents("-3.05"), Some(-305));
        assert_eq!(parse_cents("1.234"), None);
        assert_eq!(parse_cents("abc"), None);
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(-5), "-0.05");
    }
}
