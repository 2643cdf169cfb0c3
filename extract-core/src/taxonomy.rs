//! The fixed set of valid category names.

use std::collections::BTreeSet;
use std::path::Path;

/// Finite set of valid taxonomy strings.
///
/// Membership is exact: no case folding and no whitespace trimming on lookup.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    categories: BTreeSet<String>,
}

impl Taxonomy {
    /// Parses a taxonomy listing: one category per line, blank lines and
    /// `#` comments skipped, surrounding whitespace trimmed.
    #[must_use]
    pub fn parse(listing: &str) -> Self {
        listing
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect()
    }

    /// Loads a taxonomy listing from disk.
    ///
    /// # Errors
    /// Returns the I/O error if the file cannot be read.
    pub async fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let listing = tokio::fs::read_to_string(path.as_ref()).await?;
        let taxonomy = Self::parse(&listing);
        tracing::info!(
            path = %path.as_ref().display(),
            categories = taxonomy.len(),
            "Loaded category taxonomy"
        );
        Ok(taxonomy)
    }

    /// Returns `true` if `name` is exactly one of the valid categories.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.categories.contains(name)
    }

    /// Number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Returns `true` if the taxonomy has no categories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Iterates the categories in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    /// Newline-separated listing for embedding in a prompt.
    #[must_use]
    pub fn listing(&self) -> String {
        self.iter().collect::<Vec<_>>().join("\n")
    }
}

impl<S: Into<String>> FromIterator<S> for Taxonomy {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            categories: iter.into_iter().map(Into::into).collect(),
        }
    }
}
