use crate::enrich::MovieDetails;
use cinematch_core::MovieRecord;
use serde::Serialize;

pub const TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
pub const PLACEHOLDER_POSTER: &str = "https://fakeimg.pl/300x450/333333/ffffff?text=No+Poster";
pub const NOT_RATED: &str = "Not Rated";

/// A movie as returned to clients. Every field is always populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieView {
    pub title: String,
    pub vote_average: f64,
    pub genres: String,
    pub poster_path: String,
    pub overview: String,
    pub cast: Vec<String>,
    pub directors: Vec<String>,
    pub age_rating: String,
}

fn absolute_poster(path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("{TMDB_IMAGE_BASE_URL}{path}")
    }
}

/// Merge a catalog record with whatever enrichment came back.
/// The catalog poster wins over the provider's; placeholders fill the gaps.
pub fn present(record: &MovieRecord, details: Option<MovieDetails>) -> MovieView {
    let details = details.unwrap_or_else(|| MovieDetails { age_rating: NOT_RATED.to_string(), ..Default::default() });
    let poster_path = record
        .poster_path
        .as_deref()
        .map(absolute_poster)
        .or(details.poster_path)
        .unwrap_or_else(|| PLACEHOLDER_POSTER.to_string());
    let age_rating = if details.age_rating.is_empty() { NOT_RATED.to_string() } else { details.age_rating };
    MovieView {
        title: record.title.clone(),
        vote_average: record.vote_average,
        genres: record.genres.clone(),
        poster_path,
        overview: record.overview.clone(),
        cast: details.cast,
        directors: details.directors,
        age_rating,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreView {
    pub name: String,
    pub icon: &'static str,
}

pub fn genre_icon(genre: &str) -> &'static str {
    match genre {
        "Action" => "fa-explosion",
        "Adventure" => "fa-compass",
        "Animation" => "fa-child",
        "Comedy" => "fa-face-laugh",
        "Crime" => "fa-handcuffs",
        "Documentary" => "fa-video",
        "Drama" => "fa-masks-theater",
        "Family" => "fa-users",
        "Fantasy" => "fa-wand-magic",
        "History" => "fa-landmark",
        "Horror" => "fa-ghost",
        "Music" => "fa-music",
        "Mystery" => "fa-magnifying-glass",
        "Romance" => "fa-heart",
        "Science Fiction" => "fa-rocket",
        "TV Movie" => "fa-tv",
        "Thriller" => "fa-skull",
        "War" => "fa-gun",
        "Western" => "fa-hat-cowboy",
        _ => "fa-film",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(poster: Option<&str>) -> MovieRecord {
        MovieRecord {
            row: 0,
            title: "Night Train".into(),
            genres: "Thriller".into(),
            keywords: "train".into(),
            overview: "A murder aboard a train".into(),
            vote_average: 7.2,
            vote_count: 820.0,
            poster_path: poster.map(str::to_string),
            combined_text: "Thriller train A murder aboard a train".into(),
        }
    }

    #[test]
    fn unavailable_enrichment_uses_placeholders() {
        let view = present(&record(None), None);
        assert_eq!(view.poster_path, PLACEHOLDER_POSTER);
        assert_eq!(view.age_rating, NOT_RATED);
        assert!(view.cast.is_empty() && view.directors.is_empty());
    }

    #[test]
    fn relative_posters_become_absolute() {
        let view = present(&record(Some("/nt.jpg")), None);
        assert_eq!(view.poster_path, "https://image.tmdb.org/t/p/w500/nt.jpg");
        let view = present(&record(Some("https://cdn/x.jpg")), None);
        assert_eq!(view.poster_path, "https://cdn/x.jpg");
    }

    #[test]
    fn provider_poster_fills_missing_catalog_poster() {
        let details = MovieDetails {
            cast: vec!["A".into()],
            directors: vec!["D".into()],
            age_rating: "PG".into(),
            poster_path: Some("https://img/p.jpg".into()),
        };
        let view = present(&record(None), Some(details));
        assert_eq!(view.poster_path, "https://img/p.jpg");
        assert_eq!(view.age_rating, "PG");
        assert_eq!(view.directors, vec!["D"]);
    }

    #[test]
    fn unknown_genres_get_default_icon() {
        assert_eq!(genre_icon("Romance"), "fa-heart");
        assert_eq!(genre_icon("Mumblecore"), "fa-film");
    }
}
