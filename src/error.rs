//! Error types for catalog loading and environment misuse.
//!
//! Invalid agent actions are not errors: they come back as a
//! [`Rejection`](crate::session::Rejection) inside a normal observation.

use thiserror::Error;

/// Malformed catalog data. Fatal at load time; never surfaces mid-episode.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A record is missing a required field.
    #[error("product {product} is missing required field '{field}'")]
    MissingField { product: String, field: &'static str },

    /// Two records share the same product id.
    #[error("duplicate product id '{0}'")]
    DuplicateId(String),

    /// Price is negative or not a finite number.
    #[error("product {product} has invalid price {price}")]
    InvalidPrice { product: String, price: f64 },

    /// An option dimension was declared with no allowed values.
    #[error("product {product} declares option '{dimension}' with no values")]
    EmptyOption { product: String, dimension: String },

    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog record {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    pub fn missing(product: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            product: product.into(),
            field,
        }
    }
}

/// Caller misuse of the environment facade.
///
/// These indicate a bug in the driving code, not a recoverable condition.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvError {
    #[error("step called before reset")]
    NotReset,

    #[error("step called on a finished episode")]
    EpisodeFinished,
}
