//! Subcommand implementations, one module per pipeline stage.

pub mod postrun;
pub mod prerun;
pub mod run;

use chrono::{DateTime, NaiveDate, Utc};
use oceanrun::{PipelineError, Result};

/// Parses a `YYYY-MM-DD` date into the UTC instant at midnight.
pub(crate) fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
        PipelineError::Configuration(format!("invalid date '{}': {}", value, e))
    })?;
    let midnight = date.and_hms_opt(0, 0, 0).expect("midnight is valid");
    Ok(DateTime::from_naive_utc_and_offset(midnight, Utc))
}
