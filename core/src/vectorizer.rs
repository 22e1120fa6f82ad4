use crate::matrix::{ColumnId, FeatureMatrix};
use crate::tokenizer::{tokenize, tokenize_stemmed};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

pub const DEFAULT_MAX_FEATURES: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Vocabulary cap; terms are kept by total count across the corpus.
    pub max_features: usize,
    pub stem: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self { max_features: DEFAULT_MAX_FEATURES, stem: false }
    }
}

/// Bounded-vocabulary TF-IDF model with smoothed IDF and L2-normalized rows.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
    vocabulary: BTreeMap<String, ColumnId>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    fn terms(&self, text: &str) -> Vec<String> {
        if self.config.stem { tokenize_stemmed(text) } else { tokenize(text) }
    }

    pub fn fit(config: VectorizerConfig, docs: &[&str]) -> Self {
        let mut model = Self { config, vocabulary: BTreeMap::new(), idf: Vec::new() };
        let tokenized: Vec<Vec<String>> = docs.iter().map(|d| model.terms(d)).collect();

        let mut total: HashMap<&str, u64> = HashMap::new();
        let mut df: HashMap<&str, u32> = HashMap::new();
        for tokens in &tokenized {
            let mut seen: HashSet<&str> = HashSet::new();
            for t in tokens {
                *total.entry(t.as_str()).or_insert(0) += 1;
                if seen.insert(t.as_str()) {
                    *df.entry(t.as_str()).or_insert(0) += 1;
                }
            }
        }

        // Most frequent terms first, ties by term so the cut is reproducible.
        let mut ranked: Vec<(&str, u64)> = total.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(config.max_features);

        let mut kept: Vec<&str> = ranked.into_iter().map(|(t, _)| t).collect();
        kept.sort_unstable();

        let n = docs.len() as f32;
        model.idf = kept
            .iter()
            .map(|t| {
                let df_t = *df.get(t).unwrap_or(&0) as f32;
                ((1.0 + n) / (1.0 + df_t)).ln() + 1.0
            })
            .collect();
        model.vocabulary = kept
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i as ColumnId))
            .collect();
        tracing::debug!(docs = docs.len(), vocabulary = model.vocabulary.len(), "fitted tf-idf vocabulary");
        model
    }

    pub fn transform(&self, docs: &[&str]) -> FeatureMatrix {
        let mut matrix = FeatureMatrix::new(self.vocabulary.len());
        for doc in docs {
            let mut counts: BTreeMap<ColumnId, u32> = BTreeMap::new();
            for t in self.terms(doc) {
                if let Some(&col) = self.vocabulary.get(&t) {
                    *counts.entry(col).or_insert(0) += 1;
                }
            }
            let mut row: Vec<(ColumnId, f32)> = counts
                .into_iter()
                .map(|(col, tf)| (col, tf as f32 * self.idf[col as usize]))
                .collect();
            let norm = row.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
            if norm > 0.0 {
                for (_, w) in row.iter_mut() {
                    *w /= norm;
                }
            }
            matrix.push_row(&row);
        }
        matrix
    }

    pub fn fit_transform(config: VectorizerConfig, docs: &[&str]) -> (Self, FeatureMatrix) {
        let model = Self::fit(config, docs);
        let matrix = model.transform(docs);
        (model, matrix)
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, ColumnId> { &self.vocabulary }

    pub fn idf(&self) -> &[f32] { &self.idf }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_is_capped_by_corpus_frequency() {
        let docs = ["drama drama drama heist", "drama heist robot", "drama alien"];
        let config = VectorizerConfig { max_features: 2, stem: false };
        let model = TfidfVectorizer::fit(config, &docs);
        let terms: Vec<&str> = model.vocabulary().keys().map(String::as_str).collect();
        assert_eq!(terms, vec!["drama", "heist"]);
    }

    #[test]
    fn rare_terms_weigh_more() {
        let docs = ["space war", "space love", "space"];
        let (model, _) = TfidfVectorizer::fit_transform(VectorizerConfig::default(), &docs);
        let space = model.vocabulary()["space"] as usize;
        let war = model.vocabulary()["war"] as usize;
        assert!(model.idf()[war] > model.idf()[space]);
        assert!((model.idf()[space] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rows_are_unit_length_or_empty() {
        let docs = ["heist crew vault", "the and of"];
        let (_, m) = TfidfVectorizer::fit_transform(VectorizerConfig::default(), &docs);
        assert!((m.row(0).unwrap().norm() - 1.0).abs() < 1e-5);
        assert_eq!(m.row(1).unwrap().nnz(), 0);
    }

    #[test]
    fn fitting_is_deterministic() {
        let docs = ["alpha beta gamma", "beta gamma delta", "gamma delta epsilon"];
        let (_, a) = TfidfVectorizer::fit_transform(VectorizerConfig::default(), &docs);
        let (_, b) = TfidfVectorizer::fit_transform(VectorizerConfig::default(), &docs);
        assert_eq!(a, b);
    }
}
