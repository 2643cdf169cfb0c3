//! Noise removal for raw product-page markup before it is sent to a model.

use scraper::{Html, Node, Selector};

/// Elements that rarely carry product copy.
const NOISE_ELEMENTS: &str = "style, link, noscript, iframe, svg, nav, header, footer";

/// Script types kept because they carry structured product data.
const DATA_SCRIPT_TYPES: [&str; 2] = ["application/ld+json", "application/json"];

/// Attributes stripped from every element.
const STRIPPED_ATTRIBUTES: [&str; 2] = ["class", "style"];

/// Elements whose attributes are left untouched.
const KEPT_ATTRIBUTE_ELEMENTS: [&str; 2] = ["meta", "script"];

/// Removes layout chrome, non-data scripts, comments and presentational
/// attributes from `html`.
#[must_use]
pub fn filter_html(html: &str) -> String {
    let mut document = Html::parse_document(html);
    let mut doomed = Vec::new();

    if let Ok(scripts) = Selector::parse("script") {
        doomed.extend(
            document
                .select(&scripts)
                .filter(|script| {
                    let kind = script
                        .value()
                        .attr("type")
                        .unwrap_or_default()
                        .trim()
                        .to_ascii_lowercase();
                    !DATA_SCRIPT_TYPES.contains(&kind.as_str())
                })
                .map(|script| script.id()),
        );
    }
    if let Ok(noise) = Selector::parse(NOISE_ELEMENTS) {
        doomed.extend(document.select(&noise).map(|element| element.id()));
    }
    doomed.extend(
        document
            .tree
            .nodes()
            .filter(|node| node.value().is_comment())
            .map(|node| node.id()),
    );

    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    strip_attributes(&mut document);
    document.html()
}

/// Drops `class` and `style` from every element except `meta` and `script`.
fn strip_attributes(document: &mut Html) {
    let elements: Vec<_> = document
        .tree
        .nodes()
        .filter(|node| {
            node.value()
                .as_element()
                .is_some_and(|element| !KEPT_ATTRIBUTE_ELEMENTS.contains(&element.name()))
        })
        .map(|node| node.id())
        .collect();

    for id in elements {
        if let Some(mut node) = document.tree.get_mut(id) {
            if let Node::Element(element) = node.value() {
                element
                    .attrs
                    .retain(|name, _| !STRIPPED_ATTRIBUTES.contains(&&*name.local));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head>
<title>Trail Runner</title>
<style>body { color: red }</style>
<link rel="stylesheet" href="/a.css">
<script>track();</script>
<script type="application/ld+json">{"@type":"Product","name":"Trail Runner"}</script>
<meta name="description" content="Shoe">
</head>
<body>
<header>Shop</header>
<nav><a href="/">Home</a></nav>
<!-- promo banner -->
<div class="pdp" style="margin:0" itemprop="offers"><h1 class="title">Trail Runner</h1>
<p>Price: $120 &lt;sale&gt;</p>
<svg><path d="M0"/></svg>
<iframe src="https://video.example.com"></iframe>
</div>
<footer>Legal</footer>
</body></html>"#;

    #[test]
    fn removes_noise_and_keeps_product_copy() {
        let filtered = filter_html(PAGE);

        assert!(filtered.contains("Trail Runner"));
        assert!(filtered.contains("application/ld+json"));
        assert!(filtered.contains("Price: $120"));
        assert!(filtered.contains(r#"itemprop="offers""#));
        assert!(filtered.contains(r#"name="description""#));

        for gone in [
            "track()", "body { color", "a.css", "<header", "<nav", "promo banner", "<svg",
            "<iframe", "Legal",
        ] {
            assert!(!filtered.contains(gone), "{gone} should have been removed");
        }
    }

    #[test]
    fn strips_class_and_style_attributes() {
        let filtered = filter_html(PAGE);
        assert!(!filtered.contains("class="));
        assert!(!filtered.contains("style="));
        assert!(filtered.contains("<h1>Trail Runner</h1>"));
    }

    #[test]
    fn attribute_stripping_ignores_text() {
        let filtered = filter_html(r#"<p class="a" id="b">x class="y"</p>"#);
        assert!(filtered.contains(r#"<p id="b">x class="y"</p>"#));
    }

    #[test]
    fn markup_inside_json_ld_does_not_stop_stripping() {
        let filtered = filter_html(
            r#"<html><head><script type="application/ld+json">{"description":"a<b \"c\""}</script></head>
<body><div class="promo" style="x">Shoe</div><span style="y">Red</span></body></html>"#,
        );

        assert!(filtered.contains(r#"{"description":"a<b \"c\""}"#));
        assert!(filtered.contains("<div>Shoe</div>"));
        assert!(filtered.contains("<span>Red</span>"));
    }
}
