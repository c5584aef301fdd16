//! Product and instruction records.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::text::same_name;

/// Catalog-unique product identifier (an ASIN-like string).
///
/// Ordering is plain string ordering; the retrieval index uses it to break
/// score ties.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single customer review shown on the Reviews sub-page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Star rating, 1-5.
    pub rating: u8,
    pub text: String,
}

/// An immutable catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    /// Attribute phrases such as `"color:red"` or `"machine washable"`.
    pub attributes: Vec<String>,
    /// Option dimension name -> allowed values, in display order.
    pub options: BTreeMap<String, Vec<String>>,
    pub price: f64,
    /// Image reference (URL or path); not interpreted by the engine.
    pub image: Option<String>,
    pub category: Option<String>,
    /// Bullet points for the Features sub-page.
    pub features: Vec<String>,
    pub reviews: Vec<Review>,
}

impl Product {
    /// Text fed to the retrieval index: title, description and attributes.
    pub fn searchable_text(&self) -> String {
        let mut text = String::with_capacity(
            self.title.len() + self.description.len() + self.attributes.len() * 16,
        );
        text.push_str(&self.title);
        text.push(' ');
        text.push_str(&self.description);
        for attr in &self.attributes {
            text.push(' ');
            text.push_str(attr);
        }
        text
    }

    /// The product's spelling of an option dimension, matched case-insensitively.
    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions().find(|d| same_name(d, name))
    }

    /// Resolve a dimension/value pair against this product's options.
    ///
    /// Both names are matched case-insensitively; on success the product's own
    /// spelling of each is returned.
    pub fn resolve_option(&self, dimension: &str, value: &str) -> Option<(&str, &str)> {
        let (dim, values) = self.options.iter().find(|(d, _)| same_name(d, dimension))?;
        let val = values.iter().find(|v| same_name(v, value))?;
        Some((dim.as_str(), val.as_str()))
    }

    /// Dimension names in display order.
    pub fn dimensions(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }
}

/// Structured shopping goal attached to an instruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Desired value per option dimension, e.g. `size -> M`.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    /// Attribute phrases the purchased product must carry.
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Maximum acceptable price.
    #[serde(default)]
    pub price_ceiling: Option<f64>,
}

/// The natural-language goal driving one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Optional label carried into trajectories.
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    /// `None` means free text only; scoring then falls back to relevance.
    #[serde(default)]
    pub target: Option<Target>,
}

impl Instruction {
    /// A free-text instruction with no structured target.
    pub fn free_text(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
            target: None,
        }
    }

    pub fn with_target(text: impl Into<String>, target: Target) -> Self {
        Self {
            id: None,
            text: text.into(),
            target: Some(target),
        }
    }
}

/// Load a goals file: a JSON array of instructions.
pub fn load_instructions(path: impl AsRef<Path>) -> Result<Vec<Instruction>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read goals from {}", path.display()))?;
    let goals: Vec<Instruction> = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse goals in {}", path.display()))?;
    tracing::info!(path = %path.display(), count = goals.len(), "Loaded goals");
    Ok(goals)
}
