//! External metadata and trailer lookups. Both are best-effort: callers get
//! `None` (or a fallback link) instead of an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const TMDB_API_BASE: &str = "https://api.themoviedb.org/3";
pub const YOUTUBE_SEARCH_API: &str = "https://www.googleapis.com/youtube/v3/search";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MovieDetails {
    pub cast: Vec<String>,
    pub directors: Vec<String>,
    pub age_rating: String,
    /// Absolute poster URL, when the provider has one.
    pub poster_path: Option<String>,
}

#[async_trait]
pub trait Enricher: Send + Sync {
    async fn details(&self, title: &str) -> Option<MovieDetails>;
}

/// Used when no metadata provider is configured.
pub struct NoEnrichment;

#[async_trait]
impl Enricher for NoEnrichment {
    async fn details(&self, _title: &str) -> Option<MovieDetails> { None }
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct TmdbDetails {
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    credits: Option<Credits>,
    #[serde(default)]
    release_dates: Option<ReleaseDates>,
}

#[derive(Debug, Default, Deserialize)]
struct Credits {
    #[serde(default)]
    cast: Vec<Person>,
    #[serde(default)]
    crew: Vec<CrewMember>,
}

#[derive(Debug, Deserialize)]
struct Person {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CrewMember {
    name: String,
    #[serde(default)]
    job: String,
}

#[derive(Debug, Default, Deserialize)]
struct ReleaseDates {
    #[serde(default)]
    results: Vec<CountryReleases>,
}

#[derive(Debug, Deserialize)]
struct CountryReleases {
    iso_3166_1: String,
    #[serde(default)]
    release_dates: Vec<Release>,
}

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    certification: String,
}

/// Top five cast, every director, and the first non-empty US certification.
pub fn details_from_tmdb(d: TmdbDetails, image_base: &str) -> MovieDetails {
    let credits = d.credits.unwrap_or_default();
    let cast = credits.cast.into_iter().take(5).map(|p| p.name).collect();
    let directors = credits
        .crew
        .into_iter()
        .filter(|c| c.job == "Director")
        .map(|c| c.name)
        .collect();
    let age_rating = d
        .release_dates
        .unwrap_or_default()
        .results
        .into_iter()
        .find(|c| c.iso_3166_1 == "US")
        .and_then(|c| c.release_dates.into_iter().map(|r| r.certification).find(|c| !c.is_empty()))
        .unwrap_or_else(|| crate::views::NOT_RATED.to_string());
    let poster_path = d.poster_path.filter(|p| !p.is_empty()).map(|p| format!("{image_base}{p}"));
    MovieDetails { cast, directors, age_rating, poster_path }
}

pub struct TmdbClient {
    http: reqwest::Client,
    api_key: String,
}

impl TmdbClient {
    pub fn new(api_key: String, timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, api_key })
    }

    async fn fetch(&self, title: &str) -> reqwest::Result<Option<MovieDetails>> {
        let page: SearchPage = self
            .http
            .get(format!("{TMDB_API_BASE}/search/movie"))
            .query(&[("api_key", self.api_key.as_str()), ("query", title)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let Some(first) = page.results.first() else {
            return Ok(None);
        };
        let details: TmdbDetails = self
            .http
            .get(format!("{TMDB_API_BASE}/movie/{}", first.id))
            .query(&[("api_key", self.api_key.as_str()), ("append_to_response", "credits,release_dates")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(Some(details_from_tmdb(details, crate::views::TMDB_IMAGE_BASE_URL)))
    }
}

#[async_trait]
impl Enricher for TmdbClient {
    async fn details(&self, title: &str) -> Option<MovieDetails> {
        match self.fetch(title).await {
            Ok(details) => details,
            Err(e) => {
                tracing::warn!(title, error = %e, "tmdb lookup failed");
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trailer {
    pub title: String,
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_url: Option<String>,
}

impl Trailer {
    /// A YouTube search link for "<title> official trailer".
    pub fn fallback(title: &str) -> Self {
        let query: String = url::form_urlencoded::byte_serialize(format!("{title} official trailer").as_bytes()).collect();
        Self {
            title: format!("{title} - Official Trailer"),
            video_id: None,
            embed_url: None,
            search_url: Some(format!("https://www.youtube.com/results?search_query={query}")),
        }
    }
}

#[async_trait]
pub trait TrailerLookup: Send + Sync {
    /// Never fails: lookups that cannot find a video return a search link.
    async fn trailer(&self, title: &str) -> Trailer;
}

/// Always answers with a search link.
pub struct SearchLinkTrailers;

#[async_trait]
impl TrailerLookup for SearchLinkTrailers {
    async fn trailer(&self, title: &str) -> Trailer { Trailer::fallback(title) }
}

pub struct YouTubeTrailers {
    http: reqwest::Client,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoPage {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: VideoId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct VideoId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
}

impl YouTubeTrailers {
    pub fn new(api_key: Option<String>, timeout: Duration) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, api_key })
    }

    async fn search(&self, key: &str, title: &str) -> reqwest::Result<Option<Trailer>> {
        let query = format!("{title} official trailer");
        let page: VideoPage = self
            .http
            .get(YOUTUBE_SEARCH_API)
            .query(&[("part", "snippet"), ("q", query.as_str()), ("type", "video"), ("maxResults", "1"), ("key", key)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(page.items.into_iter().find_map(|item| {
            let id = item.id.video_id?;
            Some(Trailer {
                title: item.snippet.title,
                embed_url: Some(format!("https://www.youtube.com/embed/{id}")),
                video_id: Some(id),
                search_url: None,
            })
        }))
    }
}

#[async_trait]
impl TrailerLookup for YouTubeTrailers {
    async fn trailer(&self, title: &str) -> Trailer {
        let Some(key) = self.api_key.as_deref() else {
            return Trailer::fallback(title);
        };
        match self.search(key, title).await {
            Ok(Some(t)) => t,
            Ok(None) => Trailer::fallback(title),
            Err(e) => {
                tracing::warn!(title, error = %e, "youtube lookup failed");
                Trailer::fallback(title)
            }
        }
    }
}
