//! Acceptance rules for category and product results.
//!
//! Everything here is pure: no I/O, no network.

use serde_json::Value;
use thiserror::Error;

use crate::model::Product;
use crate::taxonomy::Taxonomy;

/// A result the model returned that does not satisfy its contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Category name is not a member of the taxonomy.
    #[error("Category '{0}' is not a valid category in the taxonomy")]
    InvalidCategory(String),

    /// Product breaks one or more structural rules.
    #[error("Product failed validation: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),
}

/// Checks taxonomy membership of a category name.
pub fn validate_category(name: &str, taxonomy: &Taxonomy) -> Result<(), ValidationError> {
    if taxonomy.contains(name) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCategory(name.to_string()))
    }
}

/// Checks the semantic rules of a product: non-negative finite numbers and
/// category membership. All violations are reported, not only the first.
pub fn validate_product(product: &Product, taxonomy: &Taxonomy) -> Result<(), ValidationError> {
    let mut violations = Vec::new();

    check_amount(&mut violations, "price.price", Some(product.price.price));
    check_amount(
        &mut violations,
        "price.compare_at_price",
        product.price.compare_at_price,
    );
    for (v, variant) in product.variants.iter().enumerate() {
        for (o, option) in variant.options.iter().enumerate() {
            check_amount(
                &mut violations,
                &format!("variants[{v}].options[{o}].price"),
                option.price,
            );
        }
    }

    if let Err(e) = validate_category(&product.category.name, taxonomy) {
        violations.push(format!("category.name: {e}"));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::SchemaViolation(violations))
    }
}

fn check_amount(violations: &mut Vec<String>, field: &str, amount: Option<f64>) {
    match amount {
        Some(value) if !value.is_finite() => {
            violations.push(format!("{field}: {value} is not a finite number"));
        }
        Some(value) if value < 0.0 => {
            violations.push(format!("{field}: {value} is negative"));
        }
        _ => {}
    }
}

/// Collects every JSON-schema violation of `instance`, each prefixed with its
/// instance path.
#[must_use]
pub fn collect_validation_errors(schema: &Value, instance: &Value) -> Vec<String> {
    match jsonschema::Validator::new(schema) {
        Ok(validator) => validator
            .iter_errors(instance)
            .map(|error| format!("At path '{}': {}", error.instance_path, error))
            .collect(),
        Err(e) => vec![format!("Schema compilation error: {e}")],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{product_schema, Category, OptionEntry, Price, Variant};
    use serde_json::json;

    fn taxonomy() -> Taxonomy {
        ["Apparel & Accessories > Shoes", "Hardware > Tools"]
            .into_iter()
            .collect()
    }

    fn product(category: &str) -> Product {
        Product {
            name: "Trail Runner".to_string(),
            price: Price {
                price: 120.0,
                currency: "USD".to_string(),
                compare_at_price: Some(150.0),
            },
            description: "Lightweight trail shoe".to_string(),
            key_features: vec!["Grippy outsole".to_string()],
            image_urls: vec!["https://cdn.example.com/shoe.jpg".to_string()],
            video_url: None,
            category: Category::new(category),
            brand: "Acme".to_string(),
            colors: vec!["Black".to_string()],
            variants: vec![Variant {
                title: "Size".to_string(),
                options: vec![OptionEntry {
                    value: "9".to_string(),
                    available: true,
                    price: None,
                }],
            }],
        }
    }

    #[test]
    fn category_membership() {
        let taxonomy = taxonomy();
        for name in taxonomy.iter() {
            assert!(validate_category(name, &taxonomy).is_ok());
        }
        for name in ["Shoes", "apparel & accessories > shoes", "", "Hardware > Tools "] {
            assert_eq!(
                validate_category(name, &taxonomy),
                Err(ValidationError::InvalidCategory(name.to_string()))
            );
        }
    }

    #[test]
    fn valid_product_passes() {
        assert!(validate_product(&product("Hardware > Tools"), &taxonomy()).is_ok());
    }

    #[test]
    fn product_violations_are_all_reported() {
        let mut p = product("Made Up");
        p.price.price = -1.0;
        p.variants[0].options[0].price = Some(f64::NAN);

        let Err(ValidationError::SchemaViolation(violations)) = validate_product(&p, &taxonomy())
        else {
            panic!("expected schema violation");
        };
        assert_eq!(violations.len(), 3);
        assert!(violations[0].starts_with("price.price"));
        assert!(violations[1].starts_with("variants[0].options[0].price"));
        assert!(violations[2].contains("Made Up"));
    }

    #[test]
    fn schema_reports_missing_fields() {
        let errors = collect_validation_errors(
            &product_schema(),
            &json!({"name": "x", "price": {"price": "free", "currency": "USD"}}),
        );
        assert!(errors.iter().any(|e| e.contains("category")));
        assert!(errors.iter().any(|e| e.contains("/price/price")));
    }
}
