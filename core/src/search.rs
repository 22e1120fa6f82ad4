use crate::catalog::{Catalog, MovieRecord};
use std::collections::BTreeSet;

/// Queries shorter than this (after trimming) match nothing.
pub const MIN_QUERY_LEN: usize = 2;

fn by_popularity(mut records: Vec<&MovieRecord>) -> Vec<&MovieRecord> {
    records.sort_by(|a, b| b.vote_count.total_cmp(&a.vote_count));
    records
}

/// Titles containing `query` (case-insensitive), most voted first.
pub fn search<'a>(catalog: &'a Catalog, query: &str, limit: usize) -> Vec<&'a MovieRecord> {
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_LEN || limit == 0 {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    let matches = catalog
        .iter()
        .filter(|r| r.title.to_lowercase().contains(&needle))
        .collect();
    let mut ranked = by_popularity(matches);
    ranked.truncate(limit);
    ranked
}

/// Titles containing `query` (case-insensitive), first matches in catalog order.
pub fn suggest<'a>(catalog: &'a Catalog, query: &str, limit: usize) -> Vec<&'a MovieRecord> {
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_LEN {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    catalog
        .iter()
        .filter(|r| r.title.to_lowercase().contains(&needle))
        .take(limit)
        .collect()
}

/// Most voted records, optionally restricted to those whose genres contain `genre`.
pub fn list_top<'a>(catalog: &'a Catalog, genre: Option<&str>, limit: usize) -> Vec<&'a MovieRecord> {
    let genre = genre.map(str::trim).filter(|g| !g.is_empty()).map(str::to_lowercase);
    let matches = catalog
        .iter()
        .filter(|r| match &genre {
            Some(g) => r.genres.to_lowercase().contains(g),
            None => true,
        })
        .collect();
    let mut ranked = by_popularity(matches);
    ranked.truncate(limit);
    ranked
}

/// Sorted distinct genre names from the comma-separated genres field.
pub fn genres(catalog: &Catalog) -> Vec<String> {
    catalog
        .iter()
        .flat_map(|r| r.genres.split(','))
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
