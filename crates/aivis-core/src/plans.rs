use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Per-plan usage limits, supplied externally via `config/plans.yaml`.
///
/// Quota enforcement counts persisted rows against these limits; the limits
/// themselves are never stored alongside the counted records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Stable plan identifier referenced by `shops.plan_id` (e.g. `starter`).
    pub id: String,
    /// Maximum number of products audited per run.
    pub products_audited: u32,
    /// Maximum visibility checks recorded per calendar month.
    pub visibility_checks_per_month: u32,
    /// Number of AI platforms queried per visibility run.
    pub platforms_tracked: usize,
    /// Maximum competitors a shop may track.
    pub competitors_tracked: usize,
    /// Maximum content optimizations per calendar month.
    pub optimizations_per_month: u32,
    /// How far back analytics windows may reach, in days.
    pub history_days: u32,
}

#[derive(Debug, Deserialize)]
pub struct PlansFile {
    pub plans: Vec<Plan>,
}

/// Validated, lookup-ready plan catalog.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    /// Look up a plan by id.
    #[must_use]
    pub fn get(&self, plan_id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == plan_id)
    }

    /// All configured plans, in file order.
    #[must_use]
    pub fn all(&self) -> &[Plan] {
        &self.plans
    }
}

/// Load and validate the plan catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation (duplicate ids, zero limits).
pub fn load_plans(path: &Path) -> Result<PlanCatalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PlansFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let plans_file: PlansFile = serde_yaml::from_str(&content)?;
    validate_plans(&plans_file)?;

    Ok(PlanCatalog {
        plans: plans_file.plans,
    })
}

fn validate_plans(plans_file: &PlansFile) -> Result<(), ConfigError> {
    if plans_file.plans.is_empty() {
        return Err(ConfigError::Validation(
            "plans file must define at least one plan".to_string(),
        ));
    }

    let mut seen_ids = HashSet::new();

    for plan in &plans_file.plans {
        if plan.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "plan id must be non-empty".to_string(),
            ));
        }

        if !seen_ids.insert(plan.id.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate plan id: '{}'",
                plan.id
            )));
        }

        if plan.products_audited == 0 {
            return Err(ConfigError::Validation(format!(
                "plan '{}' has products_audited = 0; every plan must audit at least one product",
                plan.id
            )));
        }

        if plan.visibility_checks_per_month == 0 {
            return Err(ConfigError::Validation(format!(
                "plan '{}' has visibility_checks_per_month = 0",
                plan.id
            )));
        }

        if plan.platforms_tracked == 0 {
            return Err(ConfigError::Validation(format!(
                "plan '{}' has platforms_tracked = 0",
                plan.id
            )));
        }

        if plan.history_days == 0 {
            return Err(ConfigError::Validation(format!(
                "plan '{}' has history_days = 0",
                plan.id
            )));
        }
    }

    Ok(())
}
