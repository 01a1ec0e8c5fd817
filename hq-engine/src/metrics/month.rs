//! Calendar-month keys for the profit chart
//!
//! Grouping and ordering use the numeric `(year, month)` pair; the
//! display label is derived from it and never parsed back.

use chrono::{Datelike, NaiveDate};
use shared::util::parse_iso_date;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Month of an ISO date string; `None` if the date does not parse
    pub fn from_date(date: &str) -> Option<Self> {
        parse_iso_date(date).map(|d| Self::new(d.year(), d.month()))
    }

    /// Short month name and year, e.g. `Mar 2024`
    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(first) => first.format("%b %Y").to_string(),
            None => format!("{:04}-{:02}", self.year, self.month),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_date() {
        assert_eq!(MonthKey::from_date("2024-03-15"), Some(MonthKey::new(2024, 3)));
        assert_eq!(
            MonthKey::from_date("2024-03-15T10:00:00Z"),
            Some(MonthKey::new(2024, 3))
        );
        assert_eq!(MonthKey::from_date("15/03/2024"), None);
        assert_eq!(MonthKey::from_date(""), None);
    }

    #[test]
    fn test_same_month_name_different_years_stay_apart() {
        let a = MonthKey::from_date("2023-12-01").unwrap();
        let b = MonthKey::from_date("2024-12-01").unwrap();
        let c = MonthKey::from_date("2024-01-31").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.label(), "Dec 2023");
        assert_eq!(b.label(), "Dec 2024");

        let mut keys = vec![b, c, a];
        keys.sort();
        assert_eq!(keys, vec![a, c, b]);
    }
}
