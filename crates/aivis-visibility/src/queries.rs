//! Default query set and caller-input validation.

use crate::error::VisibilityError;

/// Upper bound on queries per run, defaults included.
pub const MAX_QUERIES_PER_RUN: usize = 10;

/// Upper bound on a single query's length in characters.
pub const MAX_QUERY_CHARS: usize = 300;

/// Generic "best brand for X" prompts filled with the shop's vertical.
/// A caller-supplied query list replaces this set; it never appends.
const DEFAULT_QUERY_TEMPLATES: &[&str] = &[
    "What are the best {vertical} brands?",
    "Which {vertical} products would you recommend?",
    "What are the top online stores for {vertical}?",
    "Recommend a trustworthy {vertical} brand",
];

/// Build the default query set for a shop's vertical.
#[must_use]
pub fn default_queries(vertical: &str) -> Vec<String> {
    DEFAULT_QUERY_TEMPLATES
        .iter()
        .map(|template| template.replace("{vertical}", vertical.trim()))
        .collect()
}

/// Validate a caller-supplied query list before any side effect.
///
/// # Errors
///
/// Returns [`VisibilityError::Validation`] when the list is empty, too
/// long, or contains a blank or oversized query.
pub fn validate_queries(queries: &[String]) -> Result<(), VisibilityError> {
    if queries.is_empty() {
        return Err(VisibilityError::Validation(
            "query list must not be empty".to_string(),
        ));
    }

    if queries.len() > MAX_QUERIES_PER_RUN {
        return Err(VisibilityError::Validation(format!(
            "at most {MAX_QUERIES_PER_RUN} queries per run, got {}",
            queries.len()
        )));
    }

    for (i, query) in queries.iter().enumerate() {
        if query.trim().is_empty() {
            return Err(VisibilityError::Validation(format!(
                "query {} is blank",
                i + 1
            )));
        }
        if query.chars().count() > MAX_QUERY_CHARS {
            return Err(VisibilityError::Validation(format!(
                "query {} exceeds {MAX_QUERY_CHARS} characters",
                i + 1
            )));
        }
    }

    Ok(())
}
