pub mod enrich;
pub mod views;

use anyhow::Result;
use axum::{extract::{Query, State}, http::StatusCode, routing::{get, post}, Form, Json, Router};
use cinematch_core::persist::{open_or_build, IndexPaths};
use cinematch_core::{MovieIndex, MovieRecord, VectorizerConfig};
use enrich::{Enricher, NoEnrichment, SearchLinkTrailers, TmdbClient, Trailer, TrailerLookup, YouTubeTrailers};
use futures::future::join_all;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use views::{genre_icon, present, GenreView, MovieView};

/// Movies returned by `/search`.
pub const SEARCH_LIMIT: usize = 5;
/// Movies returned by the listing routes.
pub const LISTING_LIMIT: usize = 12;
pub const MAX_RECOMMENDATIONS: usize = 100;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub index_dir: PathBuf,
    pub dataset: PathBuf,
    pub vectorizer: VectorizerConfig,
    pub tmdb_api_key: Option<String>,
    pub youtube_api_key: Option<String>,
    pub enrich_timeout: Duration,
}

impl ServerConfig {
    /// Secrets and timeouts come from the environment.
    pub fn with_env(mut self) -> Self {
        self.tmdb_api_key = std::env::var("TMDB_API_KEY").ok().filter(|k| !k.is_empty());
        self.youtube_api_key = std::env::var("YOUTUBE_API_KEY").ok().filter(|k| !k.is_empty());
        if let Some(ms) = std::env::var("ENRICH_TIMEOUT_MS").ok().and_then(|v| v.parse::<u64>().ok()) {
            self.enrich_timeout = Duration::from_millis(ms);
        }
        self
    }
}

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<MovieIndex>,
    pub enricher: Arc<dyn Enricher>,
    pub trailers: Arc<dyn TrailerLookup>,
    pub enrich_timeout: Duration,
}

impl AppState {
    /// Load or build the index before anything is served.
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let index = open_or_build(&IndexPaths::new(&config.index_dir), &config.dataset, config.vectorizer)?;
        let enricher: Arc<dyn Enricher> = match &config.tmdb_api_key {
            Some(key) => Arc::new(TmdbClient::new(key.clone(), config.enrich_timeout)?),
            None => {
                tracing::info!("TMDB_API_KEY not set, enrichment disabled");
                Arc::new(NoEnrichment)
            }
        };
        let trailers = Arc::new(YouTubeTrailers::new(config.youtube_api_key.clone(), config.enrich_timeout)?);
        Ok(Self { index: Arc::new(index), enricher, trailers, enrich_timeout: config.enrich_timeout })
    }

    /// In-memory state with no network collaborators.
    pub fn with_index(index: MovieIndex) -> Self {
        let timeout = Duration::from_secs(3);
        Self {
            index: Arc::new(index),
            enricher: Arc::new(NoEnrichment),
            trailers: Arc::new(SearchLinkTrailers),
            enrich_timeout: timeout,
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/recommend", post(recommend_handler))
        .route("/search", post(search_handler))
        .route("/search_suggestions", post(suggestions_handler))
        .route("/movies", get(movies_handler))
        .route("/default_movies", get(default_movies_handler))
        .route("/genres", get(genres_handler))
        .route("/get_trailer", post(trailer_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Attach enrichment to already-selected records. Lookups run concurrently and
/// each is time-boxed, so a route waits at most one `enrich_timeout`.
async fn enrich_all(state: &AppState, records: Vec<MovieRecord>) -> Vec<MovieView> {
    let lookups = records.iter().map(|rec| async move {
        match tokio::time::timeout(state.enrich_timeout, state.enricher.details(&rec.title)).await {
            Ok(details) => details,
            Err(_) => {
                tracing::warn!(title = %rec.title, "enrichment timed out");
                None
            }
        }
    });
    let details = join_all(lookups).await;
    records.iter().zip(details).map(|(rec, d)| present(rec, d)).collect()
}

fn owned(records: Vec<&MovieRecord>) -> Vec<MovieRecord> {
    records.into_iter().cloned().collect()
}

#[derive(Deserialize)]
pub struct RecommendForm {
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_n")]
    pub n: usize,
}
fn default_n() -> usize { 10 }

pub async fn recommend_handler(State(state): State<AppState>, Form(form): Form<RecommendForm>) -> Json<Vec<MovieView>> {
    let n = form.n.min(MAX_RECOMMENDATIONS);
    let records = owned(state.index.recommend(&form.title, n));
    tracing::debug!(title = %form.title, hits = records.len(), "recommend");
    Json(enrich_all(&state, records).await)
}

#[derive(Deserialize)]
pub struct SearchBody {
    #[serde(default)]
    pub query: String,
}

pub async fn search_handler(State(state): State<AppState>, Json(body): Json<SearchBody>) -> Json<Vec<MovieView>> {
    let records = owned(state.index.search(&body.query, SEARCH_LIMIT));
    Json(enrich_all(&state, records).await)
}

pub async fn suggestions_handler(State(state): State<AppState>, Form(form): Form<SearchBody>) -> Json<Vec<String>> {
    let titles = state
        .index
        .suggest(&form.query, SEARCH_LIMIT)
        .into_iter()
        .map(|r| r.title.clone())
        .collect();
    Json(titles)
}

#[derive(Deserialize)]
pub struct GenreParams {
    pub genre: Option<String>,
}

pub async fn movies_handler(State(state): State<AppState>, Query(params): Query<GenreParams>) -> Json<Vec<MovieView>> {
    let records = owned(state.index.list_top(params.genre.as_deref(), LISTING_LIMIT));
    Json(enrich_all(&state, records).await)
}

pub async fn default_movies_handler(State(state): State<AppState>) -> Json<Vec<MovieView>> {
    let records = owned(state.index.list_top(None, LISTING_LIMIT));
    Json(enrich_all(&state, records).await)
}

pub async fn genres_handler(State(state): State<AppState>) -> Json<Vec<GenreView>> {
    let genres = state
        .index
        .genres()
        .into_iter()
        .map(|name| {
            let icon = genre_icon(&name);
            GenreView { name, icon }
        })
        .collect();
    Json(genres)
}

#[derive(Deserialize)]
pub struct TitleForm {
    #[serde(default)]
    pub title: String,
}

pub async fn trailer_handler(State(state): State<AppState>, Form(form): Form<TitleForm>) -> Result<Json<Trailer>, (StatusCode, Json<serde_json::Value>)> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": "No title provided" }))));
    }
    let trailer = match tokio::time::timeout(state.enrich_timeout, state.trailers.trailer(title)).await {
        Ok(t) => t,
        Err(_) => Trailer::fallback(title),
    };
    Ok(Json(trailer))
}
