//! Day-bucket windows shared by the aggregations.

use chrono::{DateTime, Days, NaiveDate, Utc};

/// The last `days` calendar days ending today (UTC), oldest first.
/// `days == 0` yields an empty window.
pub(crate) fn day_range(days: u32, now: DateTime<Utc>) -> Vec<NaiveDate> {
    let today = now.date_naive();
    (0..days)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(u64::from(back))))
        .collect()
}

/// Start of the window as a timestamp, for coarse pre-filtering.
pub(crate) fn window_start(days: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    let first_day = now
        .date_naive()
        .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
        .unwrap_or_else(|| now.date_naive());
    first_day
        .and_hms_opt(0, 0, 0)
        .map_or(now, |naive| naive.and_utc())
}
