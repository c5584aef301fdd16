//! Inverted lexical index with TF-IDF ranking.
//!
//! Scoring for a query `q` against document `d`:
//!
//!   score(q, d) = sum_{t in uniq(q), tf(t,d) > 0} (1 + ln tf(t,d)) * idf(t)
//!   idf(t)      = ln(1 + N / df(t))
//!
//! Document text is the product title, description and attribute phrases,
//! tokenized with [`normalize`]. Equal scores are ordered by product id
//! ascending so rankings are fully deterministic.

use std::cmp::Reverse;
use std::collections::HashMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ProductId};
use crate::text::normalize;

/// One posting: a document position in the catalog and the term's frequency
/// in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc: usize,
    pub tf: u32,
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ProductId,
    pub score: f64,
}

/// Read-only inverted index over a [`Catalog`].
///
/// Built once; queries take `&self`, so one index can serve any number of
/// sessions concurrently.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    postings: HashMap<String, Vec<Posting>>,
    doc_ids: Vec<ProductId>,
}

impl SearchIndex {
    /// Build the index from every product in the catalog.
    pub fn build(catalog: &Catalog) -> Self {
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let mut doc_ids = Vec::with_capacity(catalog.len());

        for (doc, product) in catalog.products().iter().enumerate() {
            doc_ids.push(product.id.clone());

            let mut tf: HashMap<String, u32> = HashMap::new();
            for token in normalize(&product.searchable_text()) {
                *tf.entry(token).or_default() += 1;
            }
            for (term, count) in tf {
                postings.entry(term).or_default().push(Posting { doc, tf: count });
            }
        }

        tracing::info!(
            documents = doc_ids.len(),
            vocabulary = postings.len(),
            "Built search index"
        );

        Self { postings, doc_ids }
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }

    /// Number of distinct terms.
    pub fn vocabulary_size(&self) -> usize {
        self.postings.len()
    }

    /// Number of documents containing `term` (already normalized).
    pub fn document_frequency(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, Vec::len)
    }

    /// Postings for a normalized term.
    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    fn idf(&self, df: usize) -> f64 {
        (1.0 + self.doc_ids.len() as f64 / df as f64).ln()
    }

    /// Return at most `k` hits for `text`, best first.
    ///
    /// Empty or all-stop-token queries yield an empty list.
    pub fn query(&self, text: &str, k: usize) -> Vec<SearchHit> {
        if k == 0 {
            return Vec::new();
        }

        let mut terms = normalize(text);
        let mut seen = std::collections::HashSet::new();
        terms.retain(|t| seen.insert(t.clone()));
        if terms.is_empty() {
            return Vec::new();
        }

        let mut scores: HashMap<usize, f64> = HashMap::new();
        for term in &terms {
            let Some(list) = self.postings.get(term) else {
                continue;
            };
            let idf = self.idf(list.len());
            for posting in list {
                *scores.entry(posting.doc).or_default() += (1.0 + (posting.tf as f64).ln()) * idf;
            }
        }

        let mut ranked: Vec<(OrderedFloat<f64>, usize)> = scores
            .into_iter()
            .map(|(doc, score)| (OrderedFloat(score), doc))
            .collect();
        // Doc positions follow catalog id order, so the secondary key is the
        // id tie-break.
        ranked.sort_by_key(|&(score, doc)| (Reverse(score), doc));
        ranked.truncate(k);

        ranked
            .into_iter()
            .map(|(score, doc)| SearchHit {
                id: self.doc_ids[doc].clone(),
                score: score.into_inner(),
            })
            .collect()
    }

    /// Ids of the top `k` hits for `text`.
    pub fn query_ids(&self, text: &str, k: usize) -> Vec<ProductId> {
        self.query(text, k).into_iter().map(|hit| hit.id).collect()
    }
}
