//! Product catalog: records, instructions and the immutable store.
//!
//! - [`types`] -- [`Product`], [`Instruction`] and [`Target`].
//! - [`store`] -- the validated, id-sorted [`Catalog`] and its JSON loader.

#[cfg(test)]
pub(crate) mod fixtures;
pub mod store;
pub mod types;

pub use store::{Catalog, ProductRecord};
pub use types::{load_instructions, Instruction, Product, ProductId, Review, Target};
