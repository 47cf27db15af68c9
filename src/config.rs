//! Business-rule configuration
//!
//! Every tunable the parser, validator and report engine consume lives in
//! [`RulesConfig`]. Values come from built-in defaults, then an optional YAML
//! file, then environment variables (same names the deployment uses).

use crate::error::{TimesheetError, TimesheetResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Longest grace period accepted, in calendar days
pub const MAX_GRACE_CALENDAR_DAYS: u32 = 366;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesConfig {
    /// Minimum hours on a weekday once a half has any time logged
    pub min_weekday_hours: Decimal,
    /// Granularity hours should be entered in
    pub time_increment_minutes: u32,
    /// A weekday at or above this is a "long day"
    pub high_hours_threshold: Decimal,
    /// Long days allowed per ISO week before the daily summary flags it
    pub high_hours_days_per_week_threshold: u32,
    pub weekly_min_hours: Decimal,
    pub weekly_max_hours: Decimal,
    /// Weekdays that must be logged before a week's total is judged
    pub weekly_min_days_logged: u32,
    pub aggregation_rounding_tolerance: Decimal,
    pub payroll_flag_cell_threshold: Decimal,
    pub upload_max_mb: u32,
    pub upload_grace_calendar_days: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            min_weekday_hours: dec!(8),
            time_increment_minutes: 15,
            high_hours_threshold: dec!(10),
            high_hours_days_per_week_threshold: 2,
            weekly_min_hours: dec!(35),
            weekly_max_hours: dec!(55),
            weekly_min_days_logged: 3,
            aggregation_rounding_tolerance: dec!(0.01),
            payroll_flag_cell_threshold: dec!(500),
            upload_max_mb: 25,
            upload_grace_calendar_days: 10,
        }
    }
}

impl RulesConfig {
    /// Defaults, overlaid by `path` (if given), overlaid by the environment.
    pub fn load(path: Option<&Path>) -> TimesheetResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_yaml(&std::fs::read_to_string(p)?)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> TimesheetResult<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Split out from [`load`](Self::load)
    /// so tests can inject a map instead of touching the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> TimesheetResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        override_from(&lookup, "MIN_WEEKDAY_HOURS", &mut self.min_weekday_hours)?;
        override_from(&lookup, "TIME_INCREMENT_MINUTES", &mut self.time_increment_minutes)?;
        override_from(&lookup, "HIGH_HOURS_THRESHOLD", &mut self.high_hours_threshold)?;
        override_from(
            &lookup,
            "HIGH_HOURS_DAYS_PER_WEEK_THRESHOLD",
            &mut self.high_hours_days_per_week_threshold,
        )?;
        override_from(&lookup, "WEEKLY_MIN_HOURS", &mut self.weekly_min_hours)?;
        override_from(&lookup, "WEEKLY_MAX_HOURS", &mut self.weekly_max_hours)?;
        override_from(&lookup, "WEEKLY_MIN_DAYS_LOGGED", &mut self.weekly_min_days_logged)?;
        override_from(
            &lookup,
            "AGGREGATION_ROUNDING_TOLERANCE",
            &mut self.aggregation_rounding_tolerance,
        )?;
        override_from(
            &lookup,
            "PAYROLL_FLAG_CELL_THRESHOLD",
            &mut self.payroll_flag_cell_threshold,
        )?;
        override_from(&lookup, "TIMESHEET_UPLOAD_MAX_MB", &mut self.upload_max_mb)?;
        override_from(
            &lookup,
            "UPLOAD_GRACE_CALENDAR_DAYS",
            &mut self.upload_grace_calendar_days,
        )?;
        self.check()
    }

    /// Upload cap in bytes
    pub fn upload_max_bytes(&self) -> usize {
        (self.upload_max_mb as usize).saturating_mul(1024 * 1024)
    }

    fn check(&self) -> TimesheetResult<()> {
        if self.time_increment_minutes == 0 {
            return Err(TimesheetError::Config(
                "time_increment_minutes must be greater than zero".to_string(),
            ));
        }
        if self.weekly_min_hours > self.weekly_max_hours {
            return Err(TimesheetError::Config(format!(
                "weekly_min_hours ({}) is above weekly_max_hours ({})",
                self.weekly_min_hours, self.weekly_max_hours
            )));
        }
        if self.aggregation_rounding_tolerance.is_sign_negative() {
            return Err(TimesheetError::Config(
                "aggregation_rounding_tolerance cannot be negative".to_string(),
            ));
        }
        if self.upload_grace_calendar_days > MAX_GRACE_CALENDAR_DAYS {
            return Err(TimesheetError::Config(format!(
                "upload_grace_calendar_days ({}) is above {MAX_GRACE_CALENDAR_DAYS}",
                self.upload_grace_calendar_days
            )));
        }
        Ok(())
    }
}

fn override_from<F, T>(lookup: &F, key: &str, slot: &mut T) -> TimesheetResult<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(key) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|_| TimesheetError::Config(format!("{key}: cannot parse '{raw}'")))?;
    }
    Ok(())
}
