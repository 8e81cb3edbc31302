//! Schedule expressions for recurring migrations.
//!
//! Accepted forms:
//!
//! - `@every <duration>`, e.g. `@every 1m`, `@every 1h 30m`, `@every 500ms`,
//!   with integer amounts in any unit `humantime` understands
//! - `@yearly`, `@annually`, `@monthly`, `@weekly`, `@daily`, `@midnight`,
//!   `@hourly`
//! - cron expressions with 6 fields (seconds first) or 7 fields (with year)
//! - standard 5-field crontab expressions, firing at second 0

use crate::error::{MigrateError, MigrateResult};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A parsed recurrence.
#[derive(Debug, Clone)]
pub enum Schedule {
    /// Fires at a fixed interval after the previous fire time.
    Every(Duration),
    /// Fires on a calendar pattern.
    Cron {
        /// Normalized cron expression handed to the parser.
        expression: String,
        /// Parsed calendar pattern.
        schedule: Box<cron::Schedule>,
    },
}

impl Schedule {
    /// Parses a schedule expression.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Schedule`] if the expression is not recognized.
    pub fn parse(expression: &str) -> MigrateResult<Self> {
        let trimmed = expression.trim();
        let invalid = |message: String| MigrateError::Schedule {
            expression: expression.to_string(),
            message,
        };

        if let Some(interval) = trimmed.strip_prefix("@every") {
            let interval = parse_interval(interval.trim()).map_err(invalid)?;
            return Ok(Schedule::Every(interval));
        }

        let cron_expr = match trimmed {
            "@yearly" | "@annually" => "0 0 0 1 1 *".to_string(),
            "@monthly" => "0 0 0 1 * *".to_string(),
            "@weekly" => "0 0 0 * * Sun".to_string(),
            "@daily" | "@midnight" => "0 0 0 * * *".to_string(),
            "@hourly" => "0 0 * * * *".to_string(),
            other if other.starts_with('@') => {
                return Err(invalid(format!("unknown descriptor {other:?}")));
            }
            other => match other.split_whitespace().count() {
                5 => format!("0 {other}"),
                6 | 7 => other.to_string(),
                n => return Err(invalid(format!("expected 5 to 7 fields, found {n}"))),
            },
        };

        let schedule =
            cron::Schedule::from_str(&cron_expr).map_err(|e| invalid(e.to_string()))?;
        Ok(Schedule::Cron {
            expression: cron_expr,
            schedule: Box::new(schedule),
        })
    }

    /// Returns the first fire time strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Schedule::Every(interval) => {
                let delta = chrono::Duration::from_std(*interval).ok()?;
                after.checked_add_signed(delta)
            }
            Schedule::Cron { schedule, .. } => schedule.after(&after).next(),
        }
    }
}

impl FromStr for Schedule {
    type Err = MigrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Every(interval) => {
                write!(f, "@every {}", humantime::format_duration(*interval))
            }
            Schedule::Cron { expression, .. } => f.write_str(expression),
        }
    }
}

/// Parses the duration after `@every`, e.g. `1h30m`, `1h 30m` or `300us`.
fn parse_interval(input: &str) -> Result<Duration, String> {
    if input.is_empty() {
        return Err("missing interval after @every".into());
    }
    let interval = humantime::parse_duration(input).map_err(|e| e.to_string())?;
    if interval.is_zero() {
        return Err("interval must be positive".into());
    }
    Ok(interval)
}
