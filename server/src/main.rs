use anyhow::Result;
use axum::Router;
use cinematch_core::vectorizer::DEFAULT_MAX_FEATURES;
use cinematch_core::VectorizerConfig;
use cinematch_server::{build_app, AppState, ServerConfig};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Index directory path
    #[arg(long, default_value = "./index")]
    index: PathBuf,
    /// Raw dataset used when the index must be (re)built
    #[arg(long, default_value = "./movies.csv")]
    dataset: PathBuf,
    /// Maximum vocabulary size when building
    #[arg(long, default_value_t = DEFAULT_MAX_FEATURES)]
    max_features: usize,
    #[arg(long, default_value_t = false)]
    stem: bool,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = ServerConfig {
        index_dir: args.index,
        dataset: args.dataset,
        vectorizer: VectorizerConfig { max_features: args.max_features, stem: args.stem },
        tmdb_api_key: None,
        youtube_api_key: None,
        enrich_timeout: Duration::from_secs(3),
    }
    .with_env();

    // Building is CPU-bound; finish it before the listener exists.
    let state = tokio::task::spawn_blocking(move || AppState::from_config(&config)).await??;
    let app: Router = build_app(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
