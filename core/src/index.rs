use crate::catalog::{Catalog, MovieRecord, RawMovie, RowIndex};
use crate::error::EngineError;
use crate::matrix::FeatureMatrix;
use crate::search;
use crate::similarity::{self, Neighbor};
use crate::vectorizer::{TfidfVectorizer, VectorizerConfig};
use std::collections::HashMap;

/// Title lookup used to turn user input into a catalog row.
#[derive(Debug, Clone, Default)]
pub struct TitleIndex {
    exact: HashMap<String, RowIndex>,
    lowered: Vec<String>,
}

impl TitleIndex {
    /// When titles repeat, the most voted record wins; equal votes keep the earliest row.
    pub fn build(catalog: &Catalog) -> Self {
        let mut exact: HashMap<String, RowIndex> = HashMap::with_capacity(catalog.len());
        for rec in catalog.iter() {
            match exact.get(&rec.title) {
                Some(&prev) if catalog.get(prev).map_or(true, |p| p.vote_count >= rec.vote_count) => {}
                _ => {
                    exact.insert(rec.title.clone(), rec.row);
                }
            }
        }
        let lowered = catalog.iter().map(|r| r.title.to_lowercase()).collect();
        Self { exact, lowered }
    }

    /// Exact (case-sensitive) match, else the first title in catalog order
    /// containing `query` case-insensitively.
    pub fn resolve(&self, query: &str) -> Result<RowIndex, EngineError> {
        if query.trim().is_empty() {
            return Err(EngineError::NotFound(query.to_string()));
        }
        if let Some(&row) = self.exact.get(query) {
            return Ok(row);
        }
        let needle = query.to_lowercase();
        self.lowered
            .iter()
            .position(|t| t.contains(&needle))
            .ok_or_else(|| EngineError::NotFound(query.to_string()))
    }

    pub fn len(&self) -> usize { self.exact.len() }

    pub fn is_empty(&self) -> bool { self.exact.is_empty() }
}

/// Immutable catalog + feature matrix + title lookup, built once and shared by reference.
#[derive(Debug, Clone)]
pub struct MovieIndex {
    catalog: Catalog,
    matrix: FeatureMatrix,
    titles: TitleIndex,
}

impl MovieIndex {
    /// Clean the raw rows and fit the vectorizer over their combined text.
    pub fn build(raw: Vec<RawMovie>, config: VectorizerConfig) -> Self {
        let catalog = Catalog::from_raw(raw);
        let docs: Vec<&str> = catalog.iter().map(|r| r.combined_text.as_str()).collect();
        let (_, matrix) = TfidfVectorizer::fit_transform(config, &docs);
        tracing::info!(rows = matrix.n_rows(), cols = matrix.n_cols(), nnz = matrix.nnz(), "built feature matrix");
        let titles = TitleIndex::build(&catalog);
        Self { catalog, matrix, titles }
    }

    /// Pair a catalog with its matrix, rejecting pairs whose rows do not line up.
    pub fn from_parts(catalog: Catalog, matrix: FeatureMatrix) -> Result<Self, EngineError> {
        if catalog.len() != matrix.n_rows() {
            return Err(EngineError::Corrupt(format!(
                "catalog has {} rows but matrix has {}",
                catalog.len(),
                matrix.n_rows()
            )));
        }
        if !catalog.is_dense() {
            return Err(EngineError::Corrupt("catalog row numbers are not contiguous".into()));
        }
        matrix.validate().map_err(EngineError::Corrupt)?;
        let titles = TitleIndex::build(&catalog);
        Ok(Self { catalog, matrix, titles })
    }

    pub fn catalog(&self) -> &Catalog { &self.catalog }

    pub fn matrix(&self) -> &FeatureMatrix { &self.matrix }

    pub fn titles(&self) -> &TitleIndex { &self.titles }

    pub fn resolve(&self, title: &str) -> Result<RowIndex, EngineError> {
        self.titles.resolve(title)
    }

    pub fn rank(&self, row: RowIndex, n: usize) -> Vec<Neighbor> {
        similarity::rank(&self.matrix, row, n)
    }

    /// Resolve then rank, reporting why nothing came back.
    pub fn try_recommend(&self, title: &str, n: usize) -> Result<Vec<&MovieRecord>, EngineError> {
        let row = self.resolve(title)?;
        let neighbors = self.rank(row, n);
        if neighbors.is_empty() && n > 0 {
            return Err(EngineError::EmptyResult);
        }
        Ok(neighbors.iter().filter_map(|nb| self.catalog.get(nb.row)).collect())
    }

    /// Records most similar to `title`; empty when the title cannot be resolved.
    pub fn recommend(&self, title: &str, n: usize) -> Vec<&MovieRecord> {
        match self.try_recommend(title, n) {
            Ok(records) => records,
            Err(e) => {
                tracing::debug!(title, error = %e, "no recommendations");
                Vec::new()
            }
        }
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<&MovieRecord> {
        search::search(&self.catalog, query, limit)
    }

    pub fn suggest(&self, query: &str, limit: usize) -> Vec<&MovieRecord> {
        search::suggest(&self.catalog, query, limit)
    }

    pub fn list_top(&self, genre: Option<&str>, limit: usize) -> Vec<&MovieRecord> {
        search::list_top(&self.catalog, genre, limit)
    }

    pub fn genres(&self) -> Vec<String> {
        search::genres(&self.catalog)
    }
}
