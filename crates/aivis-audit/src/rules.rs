//! Deterministic content-quality scoring rules.
//!
//! Rule-weighted deduction model: a product starts at 100 and each failed
//! check subtracts a fixed amount and appends one issue with a stable code.
//!
//! ## Deduction table
//!
//! | code                      | deduction | severity |
//! |---------------------------|-----------|----------|
//! | `missing_description`     | 25        | critical |
//! | `short_description`       | 10        | warning  |
//! | `no_images`               | 20        | critical |
//! | `missing_alt_text`        | 10        | warning  |
//! | `missing_seo_title`       | 10        | warning  |
//! | `missing_seo_description` | 10        | warning  |
//! | `no_tags`                 | 10        | warning  |
//! | `missing_product_type`    | 5         | info     |
//! | `missing_vendor`          | 5         | info     |
//!
//! `missing_description` and `short_description` are mutually exclusive, as
//! are `no_images` and `missing_alt_text`. Rich content (a long description
//! with alt-texted imagery and at least one metafield) caps the total
//! deduction at [`RICH_CONTENT_DEDUCTION_CAP`]. The final score is clamped
//! to `[0, 100]` and is a pure function of the product snapshot.

use aivis_core::Product;

use crate::html;
use crate::store::{Issue, Severity};

/// Descriptions shorter than this (visible characters) are flagged short.
pub const MIN_DESCRIPTION_CHARS: usize = 200;

/// Descriptions at or above this length count as rich content.
pub const RICH_DESCRIPTION_CHARS: usize = 600;

/// Maximum total deduction applied to a rich-content product.
const RICH_CONTENT_DEDUCTION_CAP: u32 = 30;

const DEDUCT_MISSING_DESCRIPTION: u32 = 25;
const DEDUCT_SHORT_DESCRIPTION: u32 = 10;
const DEDUCT_NO_IMAGES: u32 = 20;
const DEDUCT_MISSING_ALT_TEXT: u32 = 10;
const DEDUCT_MISSING_SEO_TITLE: u32 = 10;
const DEDUCT_MISSING_SEO_DESCRIPTION: u32 = 10;
const DEDUCT_NO_TAGS: u32 = 10;
const DEDUCT_MISSING_PRODUCT_TYPE: u32 = 5;
const DEDUCT_MISSING_VENDOR: u32 = 5;

/// Result of scoring one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductScore {
    /// Content-quality score in `[0, 100]`.
    pub ai_score: u8,
    /// One entry per failed check, in check order.
    pub issues: Vec<Issue>,
    /// Visible description length measured during scoring.
    pub description_length: u32,
}

/// Score one product's AI readiness.
///
/// Pure and deterministic: no I/O, no randomness, no clock. Re-scoring an
/// unchanged product snapshot yields an identical score and issue list.
#[must_use]
pub fn score_product(product: &Product) -> ProductScore {
    let mut issues = Vec::new();
    let mut deduction: u32 = 0;

    let description_length = html::visible_len(product.body_html.as_deref());
    let has_alt_text = product
        .images
        .iter()
        .any(|image| !is_blank(image.alt.as_deref()));

    if description_length == 0 {
        deduction += DEDUCT_MISSING_DESCRIPTION;
        issues.push(issue(
            Severity::Critical,
            "missing_description",
            "Product has no description; AI assistants have nothing to cite",
        ));
    } else if description_length < MIN_DESCRIPTION_CHARS {
        deduction += DEDUCT_SHORT_DESCRIPTION;
        issues.push(issue(
            Severity::Warning,
            "short_description",
            "Description is too short to give AI assistants usable detail",
        ));
    }

    if product.images.is_empty() {
        deduction += DEDUCT_NO_IMAGES;
        issues.push(issue(
            Severity::Critical,
            "no_images",
            "Product has no images",
        ));
    } else if !has_alt_text {
        deduction += DEDUCT_MISSING_ALT_TEXT;
        issues.push(issue(
            Severity::Warning,
            "missing_alt_text",
            "No product image carries alt text",
        ));
    }

    if is_blank(product.seo_title.as_deref()) {
        deduction += DEDUCT_MISSING_SEO_TITLE;
        issues.push(issue(
            Severity::Warning,
            "missing_seo_title",
            "SEO title is not set",
        ));
    }

    if is_blank(product.seo_description.as_deref()) {
        deduction += DEDUCT_MISSING_SEO_DESCRIPTION;
        issues.push(issue(
            Severity::Warning,
            "missing_seo_description",
            "SEO description is not set",
        ));
    }

    if product.tags.is_empty() {
        deduction += DEDUCT_NO_TAGS;
        issues.push(issue(
            Severity::Warning,
            "no_tags",
            "Product has no tags to anchor category queries",
        ));
    }

    if is_blank(product.product_type.as_deref()) {
        deduction += DEDUCT_MISSING_PRODUCT_TYPE;
        issues.push(issue(
            Severity::Info,
            "missing_product_type",
            "Product type is not set",
        ));
    }

    if is_blank(product.vendor.as_deref()) {
        deduction += DEDUCT_MISSING_VENDOR;
        issues.push(issue(
            Severity::Info,
            "missing_vendor",
            "Vendor is not set",
        ));
    }

    // Rich content caps the damage from peripheral-field misses: a long,
    // tag-stripped description plus alt-texted imagery and structured
    // metafields is what AI answers actually quote.
    let rich_content = description_length >= RICH_DESCRIPTION_CHARS
        && has_alt_text
        && !product.metafields.is_empty();
    if rich_content {
        deduction = deduction.min(RICH_CONTENT_DEDUCTION_CAP);
    }

    let ai_score = u8::try_from(100u32.saturating_sub(deduction).min(100)).unwrap_or(0);

    ProductScore {
        ai_score,
        issues,
        description_length: u32::try_from(description_length).unwrap_or(u32::MAX),
    }
}

fn issue(severity: Severity, code: &str, message: &str) -> Issue {
    Issue {
        severity,
        code: code.to_string(),
        message: message.to_string(),
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|s| s.trim().is_empty())
}
