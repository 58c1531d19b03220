//! Calendar intervals used for cohort spacing, delays and ages.

use std::fmt;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Unit of birth cohorts, dosing delays and weight-for-age tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    #[default]
    Month,
    Week,
}

impl Interval {
    /// Whole intervals elapsed from `start` to `end` (floored).
    pub fn age_between(self, start: NaiveDate, end: NaiveDate) -> i64 {
        match self {
            Interval::Month => months_between(start, end),
            Interval::Week => (end - start).num_days().div_euclid(7),
        }
    }

    /// `date` moved forward by `n` intervals; `None` past the calendar range.
    pub fn offset(self, date: NaiveDate, n: u32) -> Option<NaiveDate> {
        match self {
            Interval::Month => date.checked_add_months(Months::new(n)),
            Interval::Week => date.checked_add_days(Days::new(7 * u64::from(n))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Interval::Month => "month",
            Interval::Week => "week",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Largest `n` with `start + n months <= end`, month ends clamped.
fn months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        return -months_between(end, start);
    }
    let mut months = i64::from(end.year() - start.year()) * 12 + i64::from(end.month())
        - i64::from(start.month());
    while months > 0 {
        let shifted = u32::try_from(months)
            .ok()
            .and_then(|m| start.checked_add_months(Months::new(m)));
        match shifted {
            Some(date) if date <= end => break,
            _ => months -= 1,
        }
    }
    months
}
