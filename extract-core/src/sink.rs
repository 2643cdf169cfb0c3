//! Keyed flat store for finished products.
//!
//! [`CsvSink`] keeps one row per source key. An upsert reads the whole file,
//! drops any row with the same key, appends the new row and rewrites the
//! file. Upserts on one sink are serialized by an internal lock; two sinks
//! pointing at the same file are not coordinated.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::model::Product;

const DESCRIPTION_LIMIT: usize = 500;
const IMAGE_LIMIT: usize = 10;
const LIST_DELIMITER: &str = "|";

/// Errors raised by a persistence sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Reading or writing the backing file failed.
    #[error("Store I/O failed for {}: {source}", .path.display())]
    Io {
        /// Backing file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The backing file could not be parsed or written as CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The variants could not be serialized.
    #[error("Failed to serialize variants: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Insert-or-replace keyed writes of finished products.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Stores `product` under `key`, replacing any earlier record for it.
    async fn upsert(&self, key: &str, product: &Product) -> Result<(), SinkError>;
}

/// One flat row of the store. Every cell is a single line of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Source key (the input file name).
    pub filename: String,
    /// Product name.
    pub name: String,
    /// Brand.
    pub brand: String,
    /// Category name.
    pub category: String,
    /// Price.
    pub price: String,
    /// Currency.
    pub currency: String,
    /// Original price, empty when not on sale.
    pub compare_at_price: String,
    /// Description, truncated.
    pub description: String,
    /// Key features, `|`-joined.
    pub key_features: String,
    /// Image URLs, capped and `|`-joined.
    pub image_urls: String,
    /// Video URL, empty when absent.
    pub video_url: String,
    /// Colors, `|`-joined.
    pub colors: String,
    /// Variants as JSON, empty when there are none.
    pub variants: String,
}

impl ProductRecord {
    /// Flattens a product into a row keyed by `key`.
    ///
    /// # Errors
    /// Returns an error if the variants cannot be serialized.
    pub fn from_product(key: &str, product: &Product) -> Result<Self, serde_json::Error> {
        let variants = if product.variants.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&product.variants)?
        };
        let images: Vec<&str> = product
            .image_urls
            .iter()
            .take(IMAGE_LIMIT)
            .map(String::as_str)
            .collect();
        let description: String = product.description.chars().take(DESCRIPTION_LIMIT).collect();

        Ok(Self {
            filename: single_line(key),
            name: single_line(&product.name),
            brand: single_line(&product.brand),
            category: single_line(&product.category.name),
            price: product.price.price.to_string(),
            currency: single_line(&product.price.currency),
            compare_at_price: product
                .price
                .compare_at_price
                .map(|p| p.to_string())
                .unwrap_or_default(),
            description: single_line(&description),
            key_features: single_line(&product.key_features.join(LIST_DELIMITER)),
            image_urls: single_line(&images.join(LIST_DELIMITER)),
            video_url: single_line(product.video_url.as_deref().unwrap_or_default()),
            colors: single_line(&product.colors.join(LIST_DELIMITER)),
            variants: single_line(&variants),
        })
    }
}

/// Trims a cell and replaces embedded line breaks with spaces.
#[must_use]
pub fn single_line(value: &str) -> String {
    value
        .trim()
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
}

/// CSV-backed [`PersistenceSink`].
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvSink {
    /// Creates a sink writing to `path`. The file is created on first upsert.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every stored record. A missing or empty file has none.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn records(&self) -> Result<Vec<ProductRecord>, SinkError> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(SinkError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        csv::Reader::from_reader(content.as_slice())
            .deserialize()
            .collect::<Result<Vec<ProductRecord>, _>>()
            .map_err(SinkError::from)
    }

    async fn write_all(&self, records: &[ProductRecord]) -> Result<(), SinkError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for record in records {
            writer.serialize(record)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| SinkError::Io {
                path: self.path.clone(),
                source: e.into_error(),
            })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SinkError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|source| SinkError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

#[async_trait]
impl PersistenceSink for CsvSink {
    async fn upsert(&self, key: &str, product: &Product) -> Result<(), SinkError> {
        let row = ProductRecord::from_product(key, product)?;
        let _guard = self.lock.lock().await;

        let mut records = self.records().await?;
        records.retain(|record| record.filename != row.filename);
        records.push(row);
        self.write_all(&records).await?;

        tracing::info!(key, path = %self.path.display(), "Upserted record");
        Ok(())
    }
}
