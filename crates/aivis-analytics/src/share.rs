//! Share of voice: brand mentions against named competitors.

use chrono::{DateTime, Utc};
use serde::Serialize;

use aivis_visibility::VisibilityCheck;

use crate::window::window_start;

/// Mention count for one named competitor over the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitorShare {
    pub name: String,
    pub mentions: u64,
    /// Fraction of all mentions (brand + competitors); `0.0` when nobody
    /// was mentioned.
    pub share: f64,
}

/// Brand share of voice over a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareOfVoice {
    /// `brand / (brand + competitors)`; `0.0` when the denominator is zero.
    pub value: f64,
    pub brand_mentions: u64,
    pub competitor_mentions: u64,
    /// `true` when nobody — brand or competitor — was mentioned at all,
    /// so `value == 0.0` means "no data", not "zero share".
    pub no_data: bool,
    pub competitors: Vec<CompetitorShare>,
}

/// Compute share of voice over the last `days` days.
///
/// A check counts for the brand when `is_mentioned` is set, and for each
/// named competitor appearing in its `competitors_found` list
/// (case-insensitive). Division by zero is represented, never raised: with
/// zero total mentions the result is `{value: 0.0, no_data: true}`.
#[must_use]
pub fn share_of_voice(
    checks: &[VisibilityCheck],
    competitors: &[String],
    days: u32,
    now: DateTime<Utc>,
) -> ShareOfVoice {
    let start = window_start(days, now);
    let in_window: Vec<&VisibilityCheck> = checks
        .iter()
        .filter(|c| c.checked_at >= start && c.checked_at <= now)
        .collect();

    let brand_mentions = in_window.iter().filter(|c| c.is_mentioned).count() as u64;

    let per_competitor: Vec<(String, u64)> = competitors
        .iter()
        .map(|name| {
            let mentions = in_window
                .iter()
                .filter(|c| {
                    c.competitors_found
                        .iter()
                        .any(|found| found.eq_ignore_ascii_case(name))
                })
                .count() as u64;
            (name.clone(), mentions)
        })
        .collect();

    let competitor_mentions: u64 = per_competitor.iter().map(|(_, m)| m).sum();
    let total = brand_mentions + competitor_mentions;
    let no_data = total == 0;

    #[allow(clippy::cast_precision_loss)]
    let fraction = |mentions: u64| -> f64 {
        if total == 0 {
            0.0
        } else {
            mentions as f64 / total as f64
        }
    };

    ShareOfVoice {
        value: fraction(brand_mentions),
        brand_mentions,
        competitor_mentions,
        no_data,
        competitors: per_competitor
            .into_iter()
            .map(|(name, mentions)| CompetitorShare {
                name,
                share: fraction(mentions),
                mentions,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use aivis_visibility::{PlatformId, ResponseQuality};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap()
    }

    fn check(mentioned: bool, competitors_found: &[&str]) -> VisibilityCheck {
        VisibilityCheck {
            shop_id: 1,
            platform: PlatformId::ChatGpt,
            query: "q".to_string(),
            is_mentioned: mentioned,
            mention_context: None,
            position: None,
            competitors_found: competitors_found.iter().map(|s| (*s).to_string()).collect(),
            response_quality: ResponseQuality::Brief,
            duration_ms: 100,
            checked_at: Utc.with_ymd_and_hms(2026, 8, 6, 9, 0, 0).unwrap(),
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn zero_total_mentions_is_no_data_not_a_division_error() {
        let checks = vec![check(false, &[]), check(false, &[])];
        let sov = share_of_voice(&checks, &names(&["Nike"]), 30, now());
        assert!((sov.value - 0.0).abs() < f64::EPSILON);
        assert!(sov.no_data);
    }

    #[test]
    fn splits_voice_between_brand_and_competitors() {
        let checks = vec![
            check(true, &["Nike"]),
            check(true, &[]),
            check(false, &["Nike"]),
            check(false, &["Reebok"]),
        ];
        let sov = share_of_voice(&checks, &names(&["Nike", "Reebok"]), 30, now());
        // brand 2, Nike 2, Reebok 1 → total 5.
        assert_eq!(sov.brand_mentions, 2);
        assert_eq!(sov.competitor_mentions, 3);
        assert!((sov.value - 0.4).abs() < 1e-9);
        assert!(!sov.no_data);
        assert_eq!(sov.competitors[0].mentions, 2);
        assert!((sov.competitors[0].share - 0.4).abs() < 1e-9);
        assert_eq!(sov.competitors[1].mentions, 1);
    }

    #[test]
    fn competitor_matching_is_case_insensitive() {
        let checks = vec![check(false, &["nike"])];
        let sov = share_of_voice(&checks, &names(&["Nike"]), 30, now());
        assert_eq!(sov.competitors[0].mentions, 1);
    }

    #[test]
    fn checks_outside_the_window_do_not_count() {
        let mut old = check(true, &["Nike"]);
        old.checked_at = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let sov = share_of_voice(&[old], &names(&["Nike"]), 30, now());
        assert!(sov.no_data);
    }

    #[test]
    fn brand_only_world_is_full_share() {
        let checks = vec![check(true, &[]), check(true, &[])];
        let sov = share_of_voice(&checks, &names(&["Nike"]), 30, now());
        assert!((sov.value - 1.0).abs() < f64::EPSILON);
        assert_eq!(sov.competitors[0].mentions, 0);
    }
}
