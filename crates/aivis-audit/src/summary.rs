//! Shop-level aggregation over the stored audit set.
//!
//! Summaries are always recomputed from the full `ProductAudit` set for a
//! shop — never incrementally patched — so a partial page failure can't
//! leave counts referencing a stale intermediate state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{ProductAudit, Severity};

/// Score bucket a product falls into, by fixed thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBucket {
    /// `ai_score < 40`
    Critical,
    /// `40 <= ai_score < 70`
    Warning,
    /// `70 <= ai_score < 90`
    Info,
    /// `ai_score >= 90`
    Healthy,
}

/// Map a score to its bucket.
#[must_use]
pub fn score_bucket(ai_score: u8) -> ScoreBucket {
    match ai_score {
        0..=39 => ScoreBucket::Critical,
        40..=69 => ScoreBucket::Warning,
        70..=89 => ScoreBucket::Info,
        _ => ScoreBucket::Healthy,
    }
}

/// Aggregated audit state for one shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSummary {
    /// Catalog-wide product count (source-reported when available,
    /// otherwise the audited count).
    pub total_products: u64,
    /// Products actually audited (bounded by the plan cap).
    pub audited_products: u64,
    /// Mean score across audited products; `0.0` when nothing is audited.
    pub average_score: f64,
    /// Issue counts by issue severity.
    pub critical_issues: u64,
    pub warning_issues: u64,
    pub info_issues: u64,
    /// Product counts by score bucket.
    pub critical_products: u64,
    pub warning_products: u64,
    pub info_products: u64,
    pub healthy_products: u64,
    pub last_audit_at: Option<DateTime<Utc>>,
}

/// Recompute the summary from the complete stored audit set.
#[must_use]
pub fn summarize(audits: &[ProductAudit], total_products: u64) -> AuditSummary {
    let audited_products = audits.len() as u64;

    let average_score = if audits.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let denom = audits.len() as f64;
        let sum: f64 = audits.iter().map(|a| f64::from(a.ai_score)).sum();
        sum / denom
    };

    let mut summary = AuditSummary {
        total_products: total_products.max(audited_products),
        audited_products,
        average_score,
        critical_issues: 0,
        warning_issues: 0,
        info_issues: 0,
        critical_products: 0,
        warning_products: 0,
        info_products: 0,
        healthy_products: 0,
        last_audit_at: audits.iter().map(|a| a.last_audit_at).max(),
    };

    for audit in audits {
        for issue in &audit.issues {
            match issue.severity {
                Severity::Critical => summary.critical_issues += 1,
                Severity::Warning => summary.warning_issues += 1,
                Severity::Info => summary.info_issues += 1,
            }
        }

        match score_bucket(audit.ai_score) {
            ScoreBucket::Critical => summary.critical_products += 1,
            ScoreBucket::Warning => summary.warning_products += 1,
            ScoreBucket::Info => summary.info_products += 1,
            ScoreBucket::Healthy => summary.healthy_products += 1,
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use crate::store::Issue;

    use super::*;

    fn audit(product_id: i64, ai_score: u8, issues: Vec<Issue>) -> ProductAudit {
        ProductAudit {
            shop_id: 1,
            product_id,
            title: format!("Product {product_id}"),
            handle: format!("product-{product_id}"),
            ai_score,
            issues,
            has_images: true,
            has_description: true,
            has_metafields: false,
            description_length: 300,
            last_audit_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    fn warning_issue(code: &str) -> Issue {
        Issue {
            severity: Severity::Warning,
            code: code.to_string(),
            message: String::new(),
        }
    }

    #[test]
    fn bucket_thresholds() {
        assert_eq!(score_bucket(0), ScoreBucket::Critical);
        assert_eq!(score_bucket(39), ScoreBucket::Critical);
        assert_eq!(score_bucket(40), ScoreBucket::Warning);
        assert_eq!(score_bucket(69), ScoreBucket::Warning);
        assert_eq!(score_bucket(70), ScoreBucket::Info);
        assert_eq!(score_bucket(89), ScoreBucket::Info);
        assert_eq!(score_bucket(90), ScoreBucket::Healthy);
        assert_eq!(score_bucket(100), ScoreBucket::Healthy);
    }

    #[test]
    fn empty_audit_set_yields_zeroed_summary() {
        let summary = summarize(&[], 0);
        assert_eq!(summary.audited_products, 0);
        assert!((summary.average_score - 0.0).abs() < f64::EPSILON);
        assert!(summary.last_audit_at.is_none());
    }

    #[test]
    fn averages_and_buckets_products() {
        let audits = vec![
            audit(1, 30, vec![warning_issue("no_tags")]),
            audit(2, 60, vec![]),
            audit(3, 95, vec![]),
        ];
        let summary = summarize(&audits, 3);
        assert_eq!(summary.audited_products, 3);
        assert!((summary.average_score - (30.0 + 60.0 + 95.0) / 3.0).abs() < 1e-9);
        assert_eq!(summary.critical_products, 1);
        assert_eq!(summary.warning_products, 1);
        assert_eq!(summary.healthy_products, 1);
        assert_eq!(summary.warning_issues, 1);
    }

    #[test]
    fn total_products_never_below_audited_count() {
        // A source that reports no total still produces a sane summary.
        let audits = vec![audit(1, 80, vec![])];
        let summary = summarize(&audits, 0);
        assert_eq!(summary.total_products, 1);
    }

    #[test]
    fn counts_issues_by_severity_across_products() {
        let critical = Issue {
            severity: Severity::Critical,
            code: "missing_description".to_string(),
            message: String::new(),
        };
        let info = Issue {
            severity: Severity::Info,
            code: "missing_vendor".to_string(),
            message: String::new(),
        };
        let audits = vec![
            audit(1, 20, vec![critical.clone(), warning_issue("no_tags")]),
            audit(2, 50, vec![info, warning_issue("missing_seo_title")]),
        ];
        let summary = summarize(&audits, 2);
        assert_eq!(summary.critical_issues, 1);
        assert_eq!(summary.warning_issues, 2);
        assert_eq!(summary.info_issues, 1);
    }
}
