//! Visibility run orchestration: quota pre-check, concurrent platform
//! fan-out, per-result persistence, stable result ordering.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use futures::future::join_all;

use aivis_core::Plan;

use crate::adapter::ChatCompletionClient;
use crate::analyzer::analyze;
use crate::error::{PlatformError, VisibilityError};
use crate::platform::{PlatformConfig, PlatformId, PlatformSet};
use crate::queries::{default_queries, validate_queries};
use crate::store::{CheckStore, VisibilityCheck};

/// The brand identity one run probes for.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityTarget<'a> {
    pub shop_id: i64,
    pub brand_name: &'a str,
    pub competitors: &'a [String],
    pub vertical: &'a str,
}

/// One platform call that produced no check row.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PlatformFailure {
    pub platform: PlatformId,
    pub query: String,
    pub reason: String,
}

/// Outcome of one visibility run. `checks` is ordered by configured
/// platform order then query order — never by completion time — so
/// callers and tests see deterministic output.
#[derive(Debug, Clone)]
pub struct VisibilityRun {
    pub checks: Vec<VisibilityCheck>,
    pub failures: Vec<PlatformFailure>,
}

/// Run one visibility check for a shop.
///
/// Caller-supplied `queries` replace the default set (they never append).
/// The monthly quota is computed from stored rows **before** any platform
/// is queried: a run that would overshoot the plan limit is rejected whole
/// rather than partially consuming budget on some platforms only. Two
/// concurrent runs for the same shop can both pass this check and overshoot
/// by one run; that race is accepted, not defended against.
///
/// Platforms are queried concurrently, bounded by the plan's
/// `platforms_tracked`. Each successful check is persisted as soon as its
/// platform call resolves, so one slow or dead backend neither blocks nor
/// loses the others' results. Failed calls produce `failures` entries and
/// no rows.
///
/// # Errors
///
/// - [`VisibilityError::Validation`] — malformed caller queries; rejected
///   before any side effect.
/// - [`VisibilityError::QuotaExceeded`] — monthly limit reached; zero rows
///   written.
/// - [`VisibilityError::Store`] — the quota count itself failed.
pub async fn run_visibility_check<S>(
    target: VisibilityTarget<'_>,
    plan: &Plan,
    platforms: &PlatformSet,
    client: &ChatCompletionClient,
    store: &S,
    queries: Option<Vec<String>>,
) -> Result<VisibilityRun, VisibilityError>
where
    S: CheckStore + Sync,
{
    let queries = match queries {
        Some(custom) => {
            validate_queries(&custom)?;
            custom
        }
        None => default_queries(target.vertical),
    };

    let enabled: &[PlatformConfig] = {
        let all = platforms.ordered();
        &all[..all.len().min(plan.platforms_tracked)]
    };

    let requested = (enabled.len() * queries.len()) as u64;
    let limit = u64::from(plan.visibility_checks_per_month);
    let used = store
        .count_checks_since(target.shop_id, month_start(Utc::now()))
        .await?;
    if used.saturating_add(requested) > limit {
        return Err(VisibilityError::QuotaExceeded {
            used,
            limit,
            requested,
        });
    }

    let competitors =
        &target.competitors[..target.competitors.len().min(plan.competitors_tracked)];

    // One task per (platform, query). join_all preserves input order, so
    // results come back platform-major regardless of completion order.
    let tasks = enabled.iter().flat_map(|platform| {
        queries.iter().map(move |query| {
            run_one(target.shop_id, target.brand_name, competitors, client, store, platform, query)
        })
    });

    let mut checks = Vec::new();
    let mut failures = Vec::new();
    for result in join_all(tasks).await {
        match result {
            Ok(check) => checks.push(check),
            Err(failure) => failures.push(failure),
        }
    }

    tracing::info!(
        shop_id = target.shop_id,
        checks = checks.len(),
        failures = failures.len(),
        "visibility run complete"
    );

    Ok(VisibilityRun { checks, failures })
}

/// Query one platform, analyze, and persist. Failures are data, not
/// errors: they flow into the run's failure list.
async fn run_one<S>(
    shop_id: i64,
    brand_name: &str,
    competitors: &[String],
    client: &ChatCompletionClient,
    store: &S,
    platform: &PlatformConfig,
    query: &str,
) -> Result<VisibilityCheck, PlatformFailure>
where
    S: CheckStore + Sync,
{
    let reply = match client.complete(platform, query).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(
                platform = %platform.id,
                query,
                error = %e,
                "platform call failed — skipping for this run"
            );
            return Err(failure(platform.id, query, &e));
        }
    };

    let analysis = analyze(&reply.text, brand_name, competitors);
    let check = VisibilityCheck {
        shop_id,
        platform: platform.id,
        query: query.to_string(),
        is_mentioned: analysis.is_mentioned,
        mention_context: analysis.mention_context,
        position: analysis.position,
        competitors_found: analysis.competitors_found,
        response_quality: analysis.response_quality,
        duration_ms: reply.duration_ms,
        checked_at: Utc::now(),
    };

    match store.insert_check(&check).await {
        Ok(()) => Ok(check),
        Err(e) => {
            tracing::error!(
                platform = %platform.id,
                error = %e,
                "failed to persist visibility check"
            );
            Err(PlatformFailure {
                platform: platform.id,
                query: query.to_string(),
                reason: format!("persist failed: {e}"),
            })
        }
    }
}

fn failure(platform: PlatformId, query: &str, e: &PlatformError) -> PlatformFailure {
    PlatformFailure {
        platform,
        query: query.to_string(),
        reason: e.to_string(),
    }
}

/// Midnight UTC on the first of the current month — the quota window start.
fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}
