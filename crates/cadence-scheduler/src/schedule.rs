//! Schedule translation: friendly schedules to five-field cron expressions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::definition::{CronSchedule, ScheduleValue};
use crate::error::ScheduleError;

pub const MODE_MINUTES: &str = "minutes";
pub const MODE_DAILY: &str = "daily";

/// A validated five-field cron expression (`min hour dom month dow`).
#[derive(Clone)]
pub struct CronExpression {
    expression: String,
    schedule: cron::Schedule,
}

impl CronExpression {
    /// Parse a standard five-field expression.
    pub fn parse(expression: &str) -> Result<Self, ScheduleError> {
        let fields = expression.split_whitespace().count();
        if fields != 5 {
            return Err(ScheduleError::InvalidExpression {
                expression: expression.to_string(),
                reason: format!("expected 5 fields, found {}", fields),
            });
        }

        // The cron crate wants a leading seconds field.
        let schedule = cron::Schedule::from_str(&format!("0 {}", expression)).map_err(|e| {
            ScheduleError::InvalidExpression {
                expression: expression.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            expression: expression.to_string(),
            schedule,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// First fire time strictly after `after`.
    pub fn next_after(&self, after: &DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(after).next()
    }
}

impl fmt::Debug for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CronExpression").field(&self.expression).finish()
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

impl PartialEq for CronExpression {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
    }
}

impl Eq for CronExpression {}

/// Translate a job schedule into a cron expression.
pub fn translate(schedule: &CronSchedule) -> Result<CronExpression, ScheduleError> {
    let expression = match schedule.mode.as_str() {
        MODE_MINUTES => {
            let minutes = parse_minutes(&schedule.value)?;
            format!("*/{} * * * *", minutes)
        }
        MODE_DAILY => {
            let (hour, minute) = parse_daily(&schedule.value)?;
            format!("{} {} * * *", minute, hour)
        }
        other => return Err(ScheduleError::UnsupportedMode(other.to_string())),
    };

    CronExpression::parse(&expression)
}

fn parse_minutes(value: &ScheduleValue) -> Result<u32, ScheduleError> {
    let parsed = match value {
        ScheduleValue::Number(n) => Some(*n),
        ScheduleValue::Text(s) => parse_digits(s.trim()).map(i64::from),
    };

    match parsed {
        Some(n) if (1..=59).contains(&n) => Ok(n as u32),
        _ => Err(ScheduleError::InvalidMinutes(value.to_string())),
    }
}

fn parse_daily(value: &ScheduleValue) -> Result<(u32, u32), ScheduleError> {
    let invalid = || ScheduleError::InvalidDailyTime(value.to_string());

    let ScheduleValue::Text(text) = value else {
        return Err(invalid());
    };

    let (hour, minute) = text.trim().split_once(':').ok_or_else(invalid)?;
    let hour = parse_digits(hour).ok_or_else(invalid)?;
    let minute = parse_digits(minute).ok_or_else(invalid)?;

    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute))
}

/// Unsigned decimal made of ASCII digits only. Rejects signs and blanks.
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
