//! Utility functions for the demand_forecast crate

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Days from 0001-01-01 (CE day 1) to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Where future monthly dates fall within their month
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FutureDates {
    /// Last day of each month, starting with the end of the last observed month
    #[default]
    MonthEnd,
    /// First day of each month following the last observed date
    MonthStart,
}

/// Create `horizon` monthly dates strictly after `last`
pub fn future_month_dates(
    last: NaiveDate,
    horizon: usize,
    anchor: FutureDates,
) -> Result<Vec<NaiveDate>> {
    let first = match anchor {
        FutureDates::MonthEnd => {
            let end = month_end(last)?;
            if end > last {
                end
            } else {
                month_end(add_months(last, 1)?)?
            }
        }
        FutureDates::MonthStart => add_months(month_start(last)?, 1)?,
    };

    (0..horizon)
        .map(|i| match anchor {
            FutureDates::MonthEnd => month_end(add_months(month_start(first)?, i as u32)?),
            FutureDates::MonthStart => add_months(first, i as u32),
        })
        .collect()
}

/// First day of the date's month
pub fn month_start(date: NaiveDate) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).ok_or_else(|| out_of_range(date))
}

/// Last day of the date's month
pub fn month_end(date: NaiveDate) -> Result<NaiveDate> {
    add_months(month_start(date)?, 1)?
        .pred_opt()
        .ok_or_else(|| out_of_range(date))
}

fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| out_of_range(date))
}

fn out_of_range(date: NaiveDate) -> ForecastError {
    ForecastError::DataError(format!("Date out of range near {}", date))
}

/// Days since 1970-01-01
pub fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Inverse of [`days_since_epoch`]
pub fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
}

/// Replace path separators so a value can be used inside a file name
pub fn file_name_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}
