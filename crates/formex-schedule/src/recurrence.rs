//! Five-field recurrence expressions.
//!
//! The dialect is a strict subset of classic cron: each of the five fields
//! (minute, hour, day-of-month, month, day-of-week) is either `*` or a
//! single literal value. Ranges, lists, and steps are not part of the
//! dialect and fail to parse. Expressions are validated once, when a
//! schedule is created; matching is a plain field-by-field comparison
//! against a UTC instant.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Timelike, Utc};
use thiserror::Error;

use formex_model::ScheduleTime;

/// Recurrence parse and validation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("recurrence expression needs 5 fields, got {0}")]
    FieldCount(usize),

    #[error("invalid {field} value: {value} (allowed {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: String,
        min: u32,
        max: u32,
    },
}

/// One position in the expression: wildcard or a single literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Any,
    Exact(u32),
}

impl Field {
    fn matches(self, actual: u32) -> bool {
        match self {
            Field::Any => true,
            Field::Exact(value) => value == actual,
        }
    }

    fn parse(raw: &str, name: &'static str, min: u32, max: u32) -> Result<Self, RecurrenceError> {
        if raw == "*" {
            return Ok(Field::Any);
        }
        let out_of_range = || RecurrenceError::OutOfRange {
            field: name,
            value: raw.to_string(),
            min,
            max,
        };
        let value: u32 = raw.parse().map_err(|_| out_of_range())?;
        if value < min || value > max {
            return Err(out_of_range());
        }
        Ok(Field::Exact(value))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Any => write!(f, "*"),
            Field::Exact(value) => write!(f, "{value}"),
        }
    }
}

/// A validated five-field recurrence.
///
/// Day-of-week uses 0 = Sunday through 6 = Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recurrence {
    pub minute: Field,
    pub hour: Field,
    pub day_of_month: Field,
    pub month: Field,
    pub day_of_week: Field,
}

impl Recurrence {
    /// Every day at the given time.
    pub fn daily(time: ScheduleTime) -> Result<Self, RecurrenceError> {
        let (minute, hour) = time_fields(time)?;
        Ok(Self {
            minute,
            hour,
            day_of_month: Field::Any,
            month: Field::Any,
            day_of_week: Field::Any,
        })
    }

    /// Once a week at the given time; `weekday` is 0 = Sunday.
    pub fn weekly(time: ScheduleTime, weekday: u32) -> Result<Self, RecurrenceError> {
        let (minute, hour) = time_fields(time)?;
        if weekday > 6 {
            return Err(RecurrenceError::OutOfRange {
                field: "day-of-week",
                value: weekday.to_string(),
                min: 0,
                max: 6,
            });
        }
        Ok(Self {
            minute,
            hour,
            day_of_month: Field::Any,
            month: Field::Any,
            day_of_week: Field::Exact(weekday),
        })
    }

    /// Once a month at the given time on the given day.
    ///
    /// Days 29 through 31 simply never match in shorter months.
    pub fn monthly(time: ScheduleTime, day: u32) -> Result<Self, RecurrenceError> {
        let (minute, hour) = time_fields(time)?;
        if day < 1 || day > 31 {
            return Err(RecurrenceError::OutOfRange {
                field: "day-of-month",
                value: day.to_string(),
                min: 1,
                max: 31,
            });
        }
        Ok(Self {
            minute,
            hour,
            day_of_month: Field::Exact(day),
            month: Field::Any,
            day_of_week: Field::Any,
        })
    }

    /// Field-by-field comparison against a UTC instant; seconds are ignored.
    pub fn matches(&self, at: &DateTime<Utc>) -> bool {
        self.minute.matches(at.minute())
            && self.hour.matches(at.hour())
            && self.day_of_month.matches(at.day())
            && self.month.matches(at.month())
            && self.day_of_week.matches(at.weekday().num_days_from_sunday())
    }
}

fn time_fields(time: ScheduleTime) -> Result<(Field, Field), RecurrenceError> {
    if time.minute > 59 {
        return Err(RecurrenceError::OutOfRange {
            field: "minute",
            value: time.minute.to_string(),
            min: 0,
            max: 59,
        });
    }
    if time.hour > 23 {
        return Err(RecurrenceError::OutOfRange {
            field: "hour",
            value: time.hour.to_string(),
            min: 0,
            max: 23,
        });
    }
    Ok((Field::Exact(time.minute), Field::Exact(time.hour)))
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.minute, self.hour, self.day_of_month, self.month, self.day_of_week
        )
    }
}

impl FromStr for Recurrence {
    type Err = RecurrenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(RecurrenceError::FieldCount(fields.len()));
        }
        Ok(Self {
            minute: Field::parse(fields[0], "minute", 0, 59)?,
            hour: Field::parse(fields[1], "hour", 0, 23)?,
            day_of_month: Field::parse(fields[2], "day-of-month", 1, 31)?,
            month: Field::parse(fields[3], "month", 1, 12)?,
            day_of_week: Field::parse(fields[4], "day-of-week", 0, 6)?,
        })
    }
}
