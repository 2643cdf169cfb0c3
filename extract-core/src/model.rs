//! Product data model returned by the extraction phases.
//!
//! Field names are snake_case on the wire; the JSON schema handed to the
//! model is derived from these types with `schemars`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A category from the product taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Category {
    /// Exact taxonomy path, e.g. `Apparel & Accessories > Shoes`.
    pub name: String,
}

impl Category {
    /// Creates a category with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Price of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Price {
    /// Current selling price.
    pub price: f64,
    /// Currency code or symbol as shown on the page.
    pub currency: String,
    /// Original price when the product is on sale.
    #[serde(default)]
    pub compare_at_price: Option<f64>,
}

/// One selectable value of a variant, e.g. size `9.5`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OptionEntry {
    /// Displayed value.
    pub value: String,
    /// Whether the option can currently be bought.
    #[serde(default = "default_available")]
    pub available: bool,
    /// Option-specific price; `None` inherits the product price.
    #[serde(default)]
    pub price: Option<f64>,
}

const fn default_available() -> bool {
    true
}

/// A variant dimension (e.g. `Size`) with its choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Variant {
    /// Dimension title, e.g. `Size` or `Color`.
    pub title: String,
    /// Available choices. May be empty.
    pub options: Vec<OptionEntry>,
}

/// A fully extracted product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Product {
    /// Product title.
    pub name: String,
    /// Pricing information.
    pub price: Price,
    /// Long-form description.
    pub description: String,
    /// Bullet-point features.
    pub key_features: Vec<String>,
    /// Absolute image URLs.
    pub image_urls: Vec<String>,
    /// Product video URL, if any.
    #[serde(default)]
    pub video_url: Option<String>,
    /// Taxonomy category.
    pub category: Category,
    /// Brand or manufacturer.
    pub brand: String,
    /// Color names.
    pub colors: Vec<String>,
    /// Variant dimensions.
    pub variants: Vec<Variant>,
}

/// JSON schema of a [`Category`] response.
#[must_use]
pub fn category_schema() -> Value {
    json!(schemars::schema_for!(Category))
}

/// JSON schema of a [`Product`] response.
#[must_use]
pub fn product_schema() -> Value {
    json!(schemars::schema_for!(Product))
}
