use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const MONTHS_DE: [&str; 12] = [
    "Januar", "Februar", "März", "April", "Mai", "Juni",
    "Juli", "August", "September", "Oktober", "November", "Dezember",
];

/// A calendar month in `YYYYMM` form, the aggregation key for every earnings query.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period(String);

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, AppError> {
        if !(1..=9999).contains(&year) || !(1..=12).contains(&month) {
            return Err(AppError::Validation {
                code: "invalid_period".into(),
                message: format!("no such month: {}-{}", year, month),
            });
        }
        Ok(Period(format!("{:04}{:02}", year, month)))
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        let s = s.trim();
        let invalid = || AppError::Validation {
            code: "invalid_period".into(),
            message: format!("period must be six digits YYYYMM, got '{}'", s),
        };
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = s[..4].parse().map_err(|_| invalid())?;
        let month: u32 = s[4..].parse().map_err(|_| invalid())?;
        if year == 0 || !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Period(s.to_string()))
    }

    pub fn containing(date: NaiveDate) -> Self {
        Period(format!("{:04}{:02}", date.year(), date.month()))
    }

    pub fn current() -> Self {
        Self::containing(chrono::Local::now().date_naive())
    }

    pub fn as_str(&self) -> &str { &self.0 }

    pub fn year(&self) -> i32 { self.0[..4].parse().unwrap_or_default() }

    pub fn month(&self) -> u32 { self.0[4..].parse().unwrap_or(1) }

    pub fn previous(&self) -> Self {
        let (y, m) = (self.year(), self.month());
        if m == 1 { Period(format!("{:04}12", y - 1)) } else { Period(format!("{:04}{:02}", y, m - 1)) }
    }

    /// German long label, e.g. `Oktober 2026`.
    pub fn label(&self) -> String {
        let idx = (self.month() as usize).saturating_sub(1).min(11);
        format!("{} {}", MONTHS_DE[idx], self.year())
    }
}

/// The `count` most recent months ending with the month of `today`, newest first.
pub fn recent_periods(today: NaiveDate, count: usize) -> Vec<Period> {
    let mut out = Vec::with_capacity(count);
    let mut p = Period::containing(today);
    for _ in 0..count {
        let next = p.previous();
        out.push(p);
        p = next;
    }
    out
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}

impl FromStr for Period {
    type Err = AppError;
    fn from_str(s: &str) -> Result<Self, Self::Err> { Period::parse(s) }
}

impl TryFrom<String> for Period {
    type Error = AppError;
    fn try_from(s: String) -> Result<Self, Self::Error> { Period::parse(&s) }
}

impl From<Period> for String {
    fn from(p: Period) -> String { p.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_digit_months() {
        let p = Period::parse("202610").unwrap();
        assert_eq!((p.year(), p.month()), (2026, 10));
        assert_eq!(p.label(), "Oktober 2026");
        assert!(Period::parse("202613").is_err());
        assert!(Period::parse("20261").is_err());
        assert!(Period::parse("2026-1").is_err());
        assert!(Period::parse("202600").is_err());
    }

    #[test]
    fn twelve_months_back_across_year_boundary() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let ps = recent_periods(today, 12);
        assert_eq!(ps.len(), 12);
        assert_eq!(ps[0].as_str(), "202603");
        assert_eq!(ps[2].as_str(), "202601");
        assert_eq!(ps[3].as_str(), "202512");
        assert_eq!(ps[11].as_str(), "202504");
    }

    #[test]
    fn serde_goes_through_validation() {
        let p: Period = serde_json::from_str("\"202501\"").unwrap();
        assert_eq!(p.label(), "Januar 2025");
        assert!(serde_json::from_str::<Period>("\"2025\"").is_err());
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"202501\"");
    }
}
