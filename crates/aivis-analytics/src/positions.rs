//! Average list position over time, keeping ranked and unranked mentions
//! distinct.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use aivis_visibility::VisibilityCheck;

use crate::window::{day_range, window_start};

/// One day of position history. `average_position` only averages ranked
/// mentions; unranked mentions are counted separately so "always #1" and
/// "mostly unranked" stay distinguishable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionPoint {
    pub day: NaiveDate,
    pub average_position: Option<f64>,
    pub ranked_mentions: u64,
    pub unranked_mentions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionHistory {
    pub points: Vec<PositionPoint>,
    /// Mentioned-but-unranked checks across the whole window.
    pub unranked_total: u64,
}

/// Per-day mean of non-null positions over the last `days` days.
#[must_use]
pub fn position_history(
    checks: &[VisibilityCheck],
    days: u32,
    now: DateTime<Utc>,
) -> PositionHistory {
    let start = window_start(days, now);
    let mentioned: Vec<&VisibilityCheck> = checks
        .iter()
        .filter(|c| c.checked_at >= start && c.checked_at <= now && c.is_mentioned)
        .collect();

    let points: Vec<PositionPoint> = day_range(days, now)
        .into_iter()
        .map(|day| {
            let day_checks: Vec<&&VisibilityCheck> = mentioned
                .iter()
                .filter(|c| c.checked_at.date_naive() == day)
                .collect();

            let positions: Vec<u32> = day_checks.iter().filter_map(|c| c.position).collect();
            let ranked_mentions = positions.len() as u64;
            let unranked_mentions = day_checks.len() as u64 - ranked_mentions;

            let average_position = if positions.is_empty() {
                None
            } else {
                #[allow(clippy::cast_precision_loss)]
                Some(positions.iter().map(|p| f64::from(*p)).sum::<f64>() / positions.len() as f64)
            };

            PositionPoint {
                day,
                average_position,
                ranked_mentions,
                unranked_mentions,
            }
        })
        .collect();

    let unranked_total = points.iter().map(|p| p.unranked_mentions).sum();

    PositionHistory {
        points,
        unranked_total,
    }
}
