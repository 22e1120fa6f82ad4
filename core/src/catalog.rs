use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

pub type RowIndex = usize;

/// Columns every dataset must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "title",
    "genres",
    "keywords",
    "overview",
    "vote_average",
    "vote_count",
    "poster_path",
];

/// One dataset row as read from disk, before cleaning.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMovie {
    pub title: Option<String>,
    pub genres: Option<String>,
    pub keywords: Option<String>,
    pub overview: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<f64>,
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub row: RowIndex,
    pub title: String,
    pub genres: String,
    pub keywords: String,
    pub overview: String,
    pub vote_average: f64,
    pub vote_count: f64,
    /// May be relative to the image host, or absent.
    pub poster_path: Option<String>,
    /// genres + " " + keywords + " " + overview
    pub combined_text: String,
}

/// Missing, NaN and infinite numbers all count as zero so they sort last.
fn finite_or_zero(v: Option<f64>) -> f64 {
    v.filter(|x| x.is_finite()).unwrap_or(0.0)
}

/// Cleaned records in input order. Row `i` is always `records[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    records: Vec<MovieRecord>,
}

impl Catalog {
    /// Drop rows missing any text feature, then assign dense row indices.
    pub fn from_raw(raw: Vec<RawMovie>) -> Self {
        let total = raw.len();
        let records: Vec<MovieRecord> = raw
            .into_iter()
            .filter_map(|m| {
                let genres = m.genres?;
                let keywords = m.keywords?;
                let overview = m.overview?;
                Some((m.title, genres, keywords, overview, m.vote_average, m.vote_count, m.poster_path))
            })
            .enumerate()
            .map(|(row, (title, genres, keywords, overview, vote_average, vote_count, poster_path))| {
                let combined_text = format!("{genres} {keywords} {overview}");
                MovieRecord {
                    row,
                    title: title.unwrap_or_default(),
                    genres,
                    keywords,
                    overview,
                    vote_average: finite_or_zero(vote_average),
                    vote_count: finite_or_zero(vote_count),
                    poster_path: poster_path.filter(|p| !p.trim().is_empty()),
                    combined_text,
                }
            })
            .collect();
        tracing::info!(total, kept = records.len(), dropped = total - records.len(), "cleaned catalog");
        Self { records }
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn get(&self, row: RowIndex) -> Option<&MovieRecord> { self.records.get(row) }

    pub fn iter(&self) -> std::slice::Iter<'_, MovieRecord> { self.records.iter() }

    pub fn records(&self) -> &[MovieRecord] { &self.records }

    /// Every record's row must equal its position.
    pub(crate) fn is_dense(&self) -> bool {
        self.records.iter().enumerate().all(|(i, r)| r.row == i)
    }
}

fn check_headers(headers: &csv::StringRecord) -> Result<(), EngineError> {
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *col) {
            return Err(EngineError::MissingColumn((*col).to_string()));
        }
    }
    Ok(())
}

/// Read raw rows from CSV. Empty cells become `None`.
pub fn read_movies<R: Read>(reader: R) -> Result<Vec<RawMovie>, EngineError> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    check_headers(rdr.headers()?)?;
    let mut movies = Vec::new();
    for row in rdr.deserialize() {
        let movie: RawMovie = row?;
        movies.push(movie);
    }
    Ok(movies)
}

pub fn load_movies<P: AsRef<Path>>(path: P) -> Result<Vec<RawMovie>, EngineError> {
    let f = File::open(path.as_ref())?;
    read_movies(f)
}

/// Copy the `n` rows with the highest vote_count from `reader` to `writer`, keeping every column.
/// Equal vote counts keep input order. Returns the number of rows written.
pub fn sample_top_by_votes<R: Read, W: Write>(reader: R, writer: W, n: usize) -> Result<usize, EngineError> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    check_headers(&headers)?;
    let votes_col = headers
        .iter()
        .position(|h| h == "vote_count")
        .ok_or_else(|| EngineError::MissingColumn("vote_count".into()))?;

    let mut rows: Vec<(f64, csv::StringRecord)> = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let votes = rec.get(votes_col).and_then(|v| v.trim().parse::<f64>().ok()).unwrap_or(0.0);
        rows.push((votes, rec));
    }
    rows.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&headers)?;
    let mut written = 0;
    for (_, rec) in rows.into_iter().take(n) {
        wtr.write_record(&rec)?;
        written += 1;
    }
    wtr.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "title,genres,keywords,overview,vote_average,vote_count,poster_path\n";

    #[test]
    fn rows_missing_text_are_dropped_before_numbering() {
        let csv = format!(
            "{HEADER}A,Action,hero,fights,7.0,10,/a.jpg\nB,,hero,fights,7.0,10,\nC,Drama,tears,cries,6.0,3,\n"
        );
        let catalog = Catalog::from_raw(read_movies(csv.as_bytes()).unwrap());
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(1).unwrap().title, "C");
        assert_eq!(catalog.get(1).unwrap().row, 1);
        assert_eq!(catalog.get(0).unwrap().combined_text, "Action hero fights");
        assert_eq!(catalog.get(1).unwrap().poster_path, None);
    }

    #[test]
    fn non_finite_numbers_become_zero() {
        let csv = format!("{HEADER}A,Action,k,o,NaN,NaN,\nB,Action,k,o,inf,-inf,\nC,Action,k,o,6.5,12,\n");
        let catalog = Catalog::from_raw(read_movies(csv.as_bytes()).unwrap());
        let votes: Vec<f64> = catalog.iter().map(|r| r.vote_count).collect();
        let averages: Vec<f64> = catalog.iter().map(|r| r.vote_average).collect();
        assert_eq!(votes, vec![0.0, 0.0, 12.0]);
        assert_eq!(averages, vec![0.0, 0.0, 6.5]);
    }

    #[test]
    fn missing_column_is_fatal() {
        let csv = "title,genres,keywords,overview\nA,Action,hero,fights\n";
        let err = read_movies(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, EngineError::MissingColumn(c) if c == "vote_average"));
    }

    #[test]
    fn sample_keeps_most_voted_rows() {
        let csv = format!("{HEADER}A,g,k,o,1,5,\nB,g,k,o,1,50,\nC,g,k,o,1,20,\n");
        let mut out = Vec::new();
        let n = sample_top_by_votes(csv.as_bytes(), &mut out, 2).unwrap();
        assert_eq!(n, 2);
        let titles: Vec<String> = read_movies(out.as_slice())
            .unwrap()
            .into_iter()
            .map(|m| m.title.unwrap_or_default())
            .collect();
        assert_eq!(titles, vec!["B", "C"]);
    }
}
