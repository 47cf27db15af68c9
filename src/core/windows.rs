//! Submission windows
//!
//! Each half-month of a target month can be uploaded only inside its window:
//!
//! | Half   | Opens                     | Due                                | Closes        |
//! |--------|---------------------------|------------------------------------|---------------|
//! | first  | the 15th                  | first Mon-Fri on or after the 15th | due + grace   |
//! | second | 1st of the following month| first Mon-Fri on or after that 1st | due + grace   |
//!
//! Everything here is a pure function of the `today` passed in.

use crate::error::{TimesheetError, TimesheetResult};
use crate::types::Half;
use chrono::{Datelike, Days, Duration, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::BTreeSet;

/// Dates bounding one half's window (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HalfWindow {
    pub half: Half,
    pub opens: NaiveDate,
    pub due: NaiveDate,
    pub closes: NaiveDate,
}

impl HalfWindow {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.opens <= day && day <= self.closes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionWindows {
    grace_days: u32,
}

impl Default for SubmissionWindows {
    fn default() -> Self {
        Self { grace_days: 10 }
    }
}

impl SubmissionWindows {
    pub fn new(grace_days: u32) -> Self {
        Self { grace_days }
    }

    pub fn grace_days(&self) -> u32 {
        self.grace_days
    }

    /// Window for one half of `(year, month)`
    pub fn window(&self, year: i32, month: u32, half: Half) -> TimesheetResult<HalfWindow> {
        let opens = match half {
            Half::FirstHalf => NaiveDate::from_ymd_opt(year, month, 15),
            Half::SecondHalf => first_of_next_month(year, month),
        }
        .ok_or_else(|| TimesheetError::InvalidPeriod(format!("{year}-{month}")))?;

        let due = first_business_day_on_or_after(opens);
        let closes = due
            .checked_add_days(Days::new(u64::from(self.grace_days)))
            .ok_or_else(|| {
                TimesheetError::InvalidPeriod(format!(
                    "{year}-{month}: a {}-day grace runs past the calendar",
                    self.grace_days
                ))
            })?;
        Ok(HalfWindow {
            half,
            opens,
            due,
            closes,
        })
    }

    /// Both windows of `(year, month)`
    pub fn windows(&self, year: i32, month: u32) -> TimesheetResult<[HalfWindow; 2]> {
        Ok([
            self.window(year, month, Half::FirstHalf)?,
            self.window(year, month, Half::SecondHalf)?,
        ])
    }

    /// Halves of `(year, month)` whose window contains `today`
    pub fn open_halves(&self, year: i32, month: u32, today: NaiveDate) -> BTreeSet<Half> {
        match self.windows(year, month) {
            Ok(windows) => windows
                .iter()
                .filter(|w| w.contains(today))
                .map(|w| w.half)
                .collect(),
            Err(_) => BTreeSet::new(),
        }
    }

    /// Target months an upload may name on `today`: any of the previous,
    /// current or next month with at least one half open.
    pub fn valid_upload_targets(&self, today: NaiveDate) -> BTreeSet<(i32, u32)> {
        [-1, 0, 1]
            .into_iter()
            .filter_map(|delta| shift_month(today.year(), today.month(), delta))
            .filter(|(year, month)| !self.open_halves(*year, *month, today).is_empty())
            .collect()
    }

    pub fn is_valid_target(&self, year: i32, month: u32, today: NaiveDate) -> bool {
        self.valid_upload_targets(today).contains(&(year, month))
    }
}

/// `day` itself on a weekday, otherwise the following Monday
pub fn first_business_day_on_or_after(day: NaiveDate) -> NaiveDate {
    match day.weekday() {
        Weekday::Sat => day + Duration::days(2),
        Weekday::Sun => day + Duration::days(1),
        _ => day,
    }
}

pub fn is_weekday(day: NaiveDate) -> bool {
    !matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

/// `(year, month)` moved by `delta` months, across year boundaries.
/// `None` when the result does not fit an `i32` year.
pub fn shift_month(year: i32, month: u32, delta: i32) -> Option<(i32, u32)> {
    let index = i64::from(year) * 12 + i64::from(month) - 1 + i64::from(delta);
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    Some((year, index.rem_euclid(12) as u32 + 1))
}

fn first_of_next_month(year: i32, month: u32) -> Option<NaiveDate> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let (y, m) = shift_month(year, month, 1)?;
    NaiveDate::from_ymd_opt(y, m, 1)
}
