use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cinematch_core::catalog::{load_movies, sample_top_by_votes};
use cinematch_core::persist::{fingerprint, load_index, save_index, IndexPaths};
use cinematch_core::vectorizer::DEFAULT_MAX_FEATURES;
use cinematch_core::{MovieIndex, VectorizerConfig};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and inspect the movie similarity index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a movies CSV
    Build {
        /// Input dataset (CSV)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Maximum vocabulary size
        #[arg(long, default_value_t = DEFAULT_MAX_FEATURES)]
        max_features: usize,
        /// Stem terms before counting them
        #[arg(long, default_value_t = false)]
        stem: bool,
    },
    /// Write the most voted rows of a dataset to a smaller CSV
    Sample {
        #[arg(long)]
        input: String,
        #[arg(long)]
        output: String,
        #[arg(long, default_value_t = 1000)]
        size: usize,
    },
    /// Print titles similar to the given one
    Recommend {
        /// Index directory
        #[arg(long, default_value = "./index")]
        index: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value_t = 10)]
        n: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, max_features, stem } => {
            build_index(&input, &output, VectorizerConfig { max_features, stem })
        }
        Commands::Sample { input, output, size } => sample(&input, &output, size),
        Commands::Recommend { index, title, n } => recommend(&index, &title, n),
    }
}

fn build_index(input: &str, output: &str, config: VectorizerConfig) -> Result<()> {
    let input_path = Path::new(input);
    let raw = load_movies(input_path).with_context(|| format!("reading {input}"))?;
    tracing::info!(rows = raw.len(), input, "read dataset");

    let index = MovieIndex::build(raw, config);
    let fp = fingerprint(input_path, config)?;
    let meta = save_index(&IndexPaths::new(output), &index, Some(fp))?;

    tracing::info!(output, rows = meta.num_rows, vocabulary = meta.num_cols, "index build complete");
    Ok(())
}

fn sample(input: &str, output: &str, size: usize) -> Result<()> {
    let reader = BufReader::new(File::open(input).with_context(|| format!("opening {input}"))?);
    let writer = BufWriter::new(File::create(output).with_context(|| format!("creating {output}"))?);
    let written = sample_top_by_votes(reader, writer, size)?;
    tracing::info!(input, output, written, "wrote sample dataset");
    Ok(())
}

fn recommend(index_dir: &str, title: &str, n: usize) -> Result<()> {
    let (index, _) = load_index(&IndexPaths::new(index_dir))?;
    let row = match index.resolve(title) {
        Ok(row) => row,
        Err(e) => {
            println!("{e}");
            return Ok(());
        }
    };
    if let Some(found) = index.catalog().get(row) {
        println!("Similar to \"{}\":", found.title);
    }
    for nb in index.rank(row, n) {
        if let Some(rec) = index.catalog().get(nb.row) {
            println!("{:>6.3}  {}", nb.score, rec.title);
        }
    }
    Ok(())
}
