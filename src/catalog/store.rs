//! Immutable product catalog.
//!
//! The [`Catalog`] is validated once at load and never mutated afterwards, so
//! it can be shared by `Arc` across any number of concurrent sessions.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::{Product, ProductId, Review};
use crate::error::CatalogError;

/// A product record as it arrives from an external loader.
///
/// Required fields are optional here so that a missing one can be reported
/// as a [`CatalogError::MissingField`] instead of a generic parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(default, alias = "asin")]
    pub id: Option<String>,
    #[serde(default, alias = "name")]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub options: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl ProductRecord {
    /// Validate the record into a [`Product`].
    pub fn into_product(self) -> Result<Product, CatalogError> {
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => return Err(CatalogError::missing("<unknown>", "id")),
        };
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| CatalogError::missing(&id, "title"))?;
        let description = self
            .description
            .ok_or_else(|| CatalogError::missing(&id, "description"))?;
        let price = self.price.ok_or_else(|| CatalogError::missing(&id, "price"))?;
        if !price.is_finite() || price < 0.0 {
            return Err(CatalogError::InvalidPrice { product: id, price });
        }
        if let Some((dimension, _)) = self.options.iter().find(|(_, values)| values.is_empty()) {
            return Err(CatalogError::EmptyOption {
                product: id,
                dimension: dimension.clone(),
            });
        }

        let mut attributes = self.attributes;
        let mut seen = std::collections::HashSet::new();
        attributes.retain(|a| seen.insert(a.clone()));

        Ok(Product {
            id: ProductId::new(id),
            title,
            description,
            attributes,
            options: self.options,
            price,
            image: self.image,
            category: self.category,
            features: self.features,
            reviews: self.reviews,
        })
    }
}

/// The product catalog, sorted by product id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    by_id: HashMap<ProductId, usize>,
}

impl Catalog {
    /// Build a catalog from already-validated products.
    pub fn from_products(mut products: Vec<Product>) -> Result<Self, CatalogError> {
        products.sort_by(|a, b| a.id.cmp(&b.id));

        let mut by_id = HashMap::with_capacity(products.len());
        for (idx, product) in products.iter().enumerate() {
            if by_id.insert(product.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateId(product.id.to_string()));
            }
        }

        Ok(Self { products, by_id })
    }

    /// Validate raw records and build a catalog. Any bad record aborts the load.
    pub fn from_records(records: Vec<ProductRecord>) -> Result<Self, CatalogError> {
        let products = records
            .into_iter()
            .map(ProductRecord::into_product)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_products(products)
    }

    /// Parse a catalog from JSON text: either a JSON array of records or one
    /// record per line (JSON Lines).
    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        let records: Vec<ProductRecord> = if text.trim_start().starts_with('[') {
            serde_json::from_str(text).map_err(|source| CatalogError::Json { line: 1, source })?
        } else {
            text.lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(idx, line)| {
                    serde_json::from_str(line)
                        .map_err(|source| CatalogError::Json { line: idx + 1, source })
                })
                .collect::<Result<Vec<_>, _>>()?
        };
        Self::from_records(records)
    }

    /// Load a catalog file (JSON array or JSON Lines).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_json_str(&text)?;
        tracing::info!(
            path = %path.as_ref().display(),
            products = catalog.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.by_id.get(id).map(|&idx| &self.products[idx])
    }

    pub fn contains(&self, id: &ProductId) -> bool {
        self.by_id.contains_key(id)
    }

    /// All products, in id order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
