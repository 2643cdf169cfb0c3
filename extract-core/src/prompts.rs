//! Prompt builders for the category and product phases, including the
//! correction hint threaded back into a retried call.

use crate::gateway::Message;
use crate::taxonomy::Taxonomy;

const CATEGORY_INSTRUCTION: &str = "You classify a product page into exactly one category. \
Respond with a Category object that has a single field, name. \
The name must be copied exactly from the list of valid categories below. \
Pick the most specific category that applies.";

const PRODUCT_INSTRUCTION: &str = "You extract product data from a product page and respond with one Product object. \
The category is decided already: copy it exactly and never change it. \
Use absolute image URLs and prefer full-resolution images. \
Prices are plain numbers; compare_at_price is the original price when the product is on sale. \
An option price of null means the option costs the same as the product.";

/// Messages for the category phase.
///
/// The system message embeds the full taxonomy so the model can copy a name
/// verbatim.
#[must_use]
pub fn category_messages(
    taxonomy: &Taxonomy,
    filtered_html: &str,
    prior_error: Option<&str>,
) -> Vec<Message> {
    let system = format!(
        "{CATEGORY_INSTRUCTION}\n\nValid categories (use one exactly as written):\n\n{}",
        taxonomy.listing()
    );

    let mut user = format!(
        "Classify the product on this page. Respond with a Category.\n\n{filtered_html}"
    );
    if let Some(error) = prior_error {
        user.push_str(&category_correction(error));
    }

    vec![Message::system(system), Message::user(user)]
}

/// Messages for the product phase with the category pinned.
#[must_use]
pub fn product_messages(
    filtered_html: &str,
    category_name: &str,
    prior_error: Option<&str>,
) -> Vec<Message> {
    let mut user = format!(
        "Extract the product on this page. Use this exact category: {category_name}\n\n{filtered_html}"
    );
    if let Some(error) = prior_error {
        user.push_str(&product_correction(error, category_name));
    }

    vec![Message::system(PRODUCT_INSTRUCTION), Message::user(user)]
}

/// Correction hint appended after a rejected category.
#[must_use]
pub fn category_correction(error: &str) -> String {
    format!(
        "\n\nYour previous answer was rejected: {error}\n\
         Respond with a Category whose name is exactly one of the valid categories listed above."
    )
}

/// Correction hint appended after a rejected product.
#[must_use]
pub fn product_correction(error: &str, category_name: &str) -> String {
    format!(
        "\n\nYour previous answer was rejected: {error}\n\
         Fix every error and respond with a valid Product. Keep the category as: {category_name}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Role;

    #[test]
    fn category_prompt_embeds_taxonomy() {
        let taxonomy: Taxonomy = ["Hardware > Tools", "Apparel & Accessories > Shoes"]
            .into_iter()
            .collect();
        let messages = category_messages(&taxonomy, "<p>Hammer</p>", None);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Hardware > Tools"));
        assert!(messages[0].content.contains("Apparel & Accessories > Shoes"));
        assert!(messages[1].content.ends_with("<p>Hammer</p>"));
    }

    #[test]
    fn retry_names_the_previous_error() {
        let taxonomy = Taxonomy::default();
        let messages = category_messages(&taxonomy, "<p/>", Some("Category 'Shoes' is not valid"));
        assert!(messages[1].content.contains("rejected: Category 'Shoes' is not valid"));
    }

    #[test]
    fn product_prompt_pins_category() {
        let messages = product_messages("<p/>", "Hardware > Tools", Some("price missing"));
        let user = &messages[1].content;
        assert!(user.contains("Use this exact category: Hardware > Tools"));
        assert!(user.contains("rejected: price missing"));
        assert!(user.ends_with("Keep the category as: Hardware > Tools"));
    }
}
