//! Publication-date resolution for SECOP queries.
//!
//! A request either names a date explicitly (`?fecha=YYYY-MM-DD`) or falls
//! back to the previous business day in the configured local offset.

use chrono::{Datelike, Duration, FixedOffset, NaiveDate, Utc, Weekday};
use regex::Regex;
use serde::{Serialize, Serializer};
use service_core::error::AppError;
use std::fmt;
use std::sync::OnceLock;

const DATE_FORMAT: &str = "%Y-%m-%d";
/// ASCII digits only; `\d` would also accept other Unicode digits.
const DATE_PATTERN: &str = r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$";

static DATE_SHAPE: OnceLock<Regex> = OnceLock::new();

/// A real calendar date rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateSpec(NaiveDate);

impl DateSpec {
    /// Parse a strict `YYYY-MM-DD` string. Returns `None` for anything else,
    /// including well-shaped strings that are not real dates (`2025-02-30`).
    pub fn parse(s: &str) -> Option<Self> {
        if !has_date_shape(s) {
            return None;
        }
        NaiveDate::parse_from_str(s, DATE_FORMAT).ok().map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for DateSpec {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl Serialize for DateSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn has_date_shape(s: &str) -> bool {
    DATE_SHAPE
        .get_or_init(|| Regex::new(DATE_PATTERN).expect("date pattern is a valid regex"))
        .is_match(s)
}

pub fn is_valid_date(s: &str) -> bool {
    DateSpec::parse(s).is_some()
}

/// Most recent weekday strictly before `today`.
pub fn previous_business_day(today: NaiveDate) -> DateSpec {
    let days_back = match today.weekday() {
        Weekday::Mon => 3,
        Weekday::Sun => 2,
        _ => 1,
    };
    DateSpec(today - Duration::days(days_back))
}

/// Resolves the date a request queries for.
#[derive(Debug, Clone, Copy)]
pub struct DateResolver {
    offset: FixedOffset,
}

impl DateResolver {
    pub fn new(utc_offset_hours: i32) -> Result<Self, AppError> {
        let offset = utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "UTC offset of {} hours is out of range",
                    utc_offset_hours
                ))
            })?;
        Ok(Self { offset })
    }

    /// Current calendar date in the resolver's offset.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    pub fn resolve(&self, fecha: Option<&str>) -> Result<DateSpec, AppError> {
        resolve_at(fecha, self.today())
    }
}

/// Validate `fecha` if present, otherwise apply the business-day rule to `today`.
pub fn resolve_at(fecha: Option<&str>, today: NaiveDate) -> Result<DateSpec, AppError> {
    match fecha {
        Some(raw) => DateSpec::parse(raw).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("Invalid date format. Use YYYY-MM-DD"))
        }),
        None => Ok(previous_business_day(today)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn business_day_rule_covers_every_weekday() {
        // 2025-04-14 is a Monday.
        let cases = [
            (ymd(2025, 4, 14), ymd(2025, 4, 11)), // Mon -> Fri
            (ymd(2025, 4, 15), ymd(2025, 4, 14)), // Tue -> Mon
            (ymd(2025, 4, 16), ymd(2025, 4, 15)),
            (ymd(2025, 4, 17), ymd(2025, 4, 16)),
            (ymd(2025, 4, 18), ymd(2025, 4, 17)), // Fri -> Thu
            (ymd(2025, 4, 19), ymd(2025, 4, 18)), // Sat -> Fri
            (ymd(2025, 4, 20), ymd(2025, 4, 18)), // Sun -> Fri
        ];

        for (today, expected) in cases {
            assert_eq!(previous_business_day(today).date(), expected, "today = {today}");
        }
    }

    #[test]
    fn business_day_crosses_month_and_year() {
        // 2024-01-01 is a Monday.
        assert_eq!(previous_business_day(ymd(2024, 1, 1)).date(), ymd(2023, 12, 29));
        // 2025-03-02 is a Sunday.
        assert_eq!(previous_business_day(ymd(2025, 3, 2)).date(), ymd(2025, 2, 28));
    }

    #[test]
    fn accepts_real_dates() {
        assert!(is_valid_date("2025-04-18"));
        assert!(is_valid_date("2024-02-29"));
    }

    #[test]
    fn rejects_malformed_or_impossible_dates() {
        for bad in [
            "2025-13-01",
            "25-04-18",
            "2025-02-30",
            "2023-02-29",
            "2025-4-18",
            "2025/04/18",
            " 2025-04-18",
            "2025-04-18T00:00",
            "+2025-04-18",
            "abcd-ef-gh",
            "",
        ] {
            assert!(!is_valid_date(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn shape_check_accepts_only_ascii_digits() {
        assert!(has_date_shape("2025-04-18"));
        assert!(!has_date_shape("٢٠٢٥-٠٤-١٨"));
        assert!(!has_date_shape("２０２５-０４-１８"));
        assert!(!has_date_shape("2025-04-18\n"));
        assert!(!is_valid_date("٢٠٢٥-٠٤-١٨"));
    }

    #[test]
    fn displays_and_serializes_as_iso_date() {
        let date = DateSpec::parse("2025-04-08").unwrap();
        assert_eq!(date.to_string(), "2025-04-08");
        assert_eq!(serde_json::to_value(date).unwrap(), "2025-04-08");
    }

    #[test]
    fn resolve_prefers_explicit_date() {
        let today = ymd(2025, 4, 14);
        assert_eq!(
            resolve_at(Some("2025-01-02"), today).unwrap().to_string(),
            "2025-01-02"
        );
        assert_eq!(resolve_at(None, today).unwrap().to_string(), "2025-04-11");
    }

    #[test]
    fn resolve_rejects_bad_date() {
        let err = resolve_at(Some("bad-date"), ymd(2025, 4, 14)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn resolver_rejects_impossible_offset() {
        assert!(DateResolver::new(-5).is_ok());
        assert!(DateResolver::new(30).is_err());
    }
}
