//! Mention-rate trend, bucketed by day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use aivis_visibility::VisibilityCheck;

use crate::window::{day_range, window_start};

/// One day of the trend. `mention_rate` is `None` on days with zero
/// checks: "no data" is a different fact from "confirmed zero visibility"
/// and must not be flattened to `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub day: NaiveDate,
    pub checks: u64,
    pub mentions: u64,
    pub mention_rate: Option<f64>,
}

/// Per-day mention rate over the last `days` days, oldest first. Every day
/// in the window gets a bucket, including empty ones.
#[must_use]
pub fn trend_data(checks: &[VisibilityCheck], days: u32, now: DateTime<Utc>) -> Vec<TrendPoint> {
    let start = window_start(days, now);
    let in_window: Vec<&VisibilityCheck> = checks
        .iter()
        .filter(|c| c.checked_at >= start && c.checked_at <= now)
        .collect();

    day_range(days, now)
        .into_iter()
        .map(|day| {
            let day_checks: Vec<&&VisibilityCheck> = in_window
                .iter()
                .filter(|c| c.checked_at.date_naive() == day)
                .collect();
            let total = day_checks.len() as u64;
            let mentions = day_checks.iter().filter(|c| c.is_mentioned).count() as u64;
            let mention_rate = if total == 0 {
                None
            } else {
                #[allow(clippy::cast_precision_loss)]
                Some(mentions as f64 / total as f64)
            };
            TrendPoint {
                day,
                checks: total,
                mentions,
                mention_rate,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use aivis_visibility::{PlatformId, ResponseQuality};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap()
    }

    fn check(day: u32, hour: u32, mentioned: bool) -> VisibilityCheck {
        VisibilityCheck {
            shop_id: 1,
            platform: PlatformId::ChatGpt,
            query: "q".to_string(),
            is_mentioned: mentioned,
            mention_context: mentioned.then(|| "context".to_string()),
            position: None,
            competitors_found: vec![],
            response_quality: if mentioned {
                ResponseQuality::Brief
            } else {
                ResponseQuality::None
            },
            duration_ms: 100,
            checked_at: Utc.with_ymd_and_hms(2026, 8, day, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_days_have_null_rate_not_zero() {
        let checks = vec![check(7, 9, true)];
        let trend = trend_data(&checks, 3, now());

        assert_eq!(trend.len(), 3);
        assert_eq!(trend[0].mention_rate, None, "no checks on 08-05");
        assert_eq!(trend[1].mention_rate, None, "no checks on 08-06");
        assert_eq!(trend[2].mention_rate, Some(1.0));
    }

    #[test]
    fn confirmed_zero_visibility_is_zero_not_null() {
        let checks = vec![check(7, 9, false), check(7, 10, false)];
        let trend = trend_data(&checks, 1, now());
        assert_eq!(trend[0].checks, 2);
        assert_eq!(trend[0].mention_rate, Some(0.0));
    }

    #[test]
    fn rates_are_per_day_fractions() {
        let checks = vec![
            check(6, 9, true),
            check(6, 10, false),
            check(6, 11, false),
            check(6, 12, true),
        ];
        let trend = trend_data(&checks, 2, now());
        assert_eq!(trend[0].day, "2026-08-06".parse().unwrap());
        assert_eq!(trend[0].mentions, 2);
        assert_eq!(trend[0].mention_rate, Some(0.5));
    }

    #[test]
    fn checks_outside_the_window_are_ignored() {
        let checks = vec![check(1, 9, true), check(7, 9, true)];
        let trend = trend_data(&checks, 2, now());
        let total: u64 = trend.iter().map(|p| p.checks).sum();
        assert_eq!(total, 1, "only the 08-07 check is inside a 2-day window");
    }

    #[test]
    fn buckets_are_oldest_first() {
        let trend = trend_data(&[], 3, now());
        assert!(trend.windows(2).all(|w| w[0].day < w[1].day));
    }
}
