//! Resolution of relative / partial date requests into absolute ranges.

use autopilot_core::{AutopilotError, AutopilotResult, DateRange};
use chrono::{Days, Local, NaiveDate};

/// The caller's current calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Resolve a request into an inclusive range.
///
/// `until` defaults to `today`, so the current day is always part of a
/// relative request. `since` defaults to `until - (days - 1)`; `days` is
/// ignored when `since` is given.
pub fn resolve_range(
    days: u32,
    since: Option<NaiveDate>,
    until: Option<NaiveDate>,
    today: NaiveDate,
) -> AutopilotResult<DateRange> {
    let until = until.unwrap_or(today);
    let since = match since {
        Some(since) => since,
        None => {
            if days == 0 {
                return Err(AutopilotError::InvalidRange(
                    "days must be at least 1".to_string(),
                ));
            }
            until
                .checked_sub_days(Days::new(u64::from(days) - 1))
                .ok_or_else(|| {
                    AutopilotError::InvalidRange(format!(
                        "{days} days before {until} is out of the calendar range"
                    ))
                })?
        }
    };
    if since > until {
        return Err(AutopilotError::InvalidRange(format!(
            "since {since} is after until {until}"
        )));
    }
    Ok(DateRange { since, until })
}
