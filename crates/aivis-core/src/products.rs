//! Catalog product snapshot consumed by the audit engine.
//!
//! ## Observed shape from live storefront catalog APIs
//!
//! ### Description
//! `body_html` carries the raw HTML product description. Stores with no
//! description return `null` or an empty string interchangeably; both are
//! treated as "missing" by the scoring rules, which strip tags before
//! measuring visible text.
//!
//! ### Tags
//! Returned as a JSON array of strings. `#[serde(default)]` covers stores
//! with no tags, which return `[]` or omit the field entirely.
//!
//! ### SEO fields
//! `seo_title` / `seo_description` come from the store's search-engine
//! listing settings. Many stores never set them; absent and empty-string
//! values are equivalent.
//!
//! ### Images
//! Alt text is optional per image and frequently blank even when present,
//! so `alt` is `Option<String>` and blank strings count as missing.
//!
//! ### Metafields
//! Structured extension fields (specs, FAQ content, dimensions). Only their
//! presence matters to scoring; values are passed through untouched.

use serde::{Deserialize, Serialize};

/// A single product as returned by the catalog source. Read-only input:
/// the engine never mutates or writes products back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Numeric product ID, unique within one shop's catalog.
    pub id: i64,

    /// Display name of the product.
    pub title: String,

    /// URL slug for the product page.
    pub handle: String,

    /// Raw HTML product description. May be `null`, absent, or empty.
    #[serde(default)]
    pub body_html: Option<String>,

    /// Vendor / brand name as configured in the store.
    #[serde(default)]
    pub vendor: Option<String>,

    /// Product category string; empty string is treated as absent.
    #[serde(default)]
    pub product_type: Option<String>,

    /// Tags as a JSON array of strings. Empty array when untagged.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Search-engine listing title, when the merchant has set one.
    #[serde(default)]
    pub seo_title: Option<String>,

    /// Search-engine listing description, when the merchant has set one.
    #[serde(default)]
    pub seo_description: Option<String>,

    /// Full image gallery for the product.
    #[serde(default)]
    pub images: Vec<ProductImage>,

    /// Structured extension fields attached to the product.
    #[serde(default)]
    pub metafields: Vec<Metafield>,

    /// Whether the product is currently purchasable.
    /// Defaults to `true` when the catalog omits the field.
    #[serde(default = "default_available")]
    pub available: bool,
}

/// A product image with optional alt text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    /// Canonical CDN URL.
    pub src: String,
    /// Optional alt text; blank strings count as missing.
    #[serde(default)]
    pub alt: Option<String>,
    /// 1-based gallery position.
    #[serde(default)]
    pub position: Option<i32>,
}

/// A structured key/value extension field on a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metafield {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Default for `Product::available` when the catalog omits the field.
///
/// Serde's `default = "..."` attribute needs a function path, so this
/// cannot be a `const`. `true` is intentional (optimistic availability).
fn default_available() -> bool {
    true
}
