use crate::catalog::{load_movies, Catalog};
use crate::error::EngineError;
use crate::index::MovieIndex;
use crate::matrix::FeatureMatrix;
use crate::vectorizer::VectorizerConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fs::{self, create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

/// Manifest written after both artifacts; its presence commits the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_rows: usize,
    pub num_cols: usize,
    pub created_at: String,
    pub version: u32,
    /// SHA-1 over the source dataset and vectorizer settings, when known.
    pub fingerprint: Option<String>,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn matrix(&self) -> PathBuf { self.root.join("tfidf_matrix.bin") }
    pub fn catalog(&self) -> PathBuf { self.root.join("catalog.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }

    fn all(&self) -> [PathBuf; 3] { [self.matrix(), self.catalog(), self.meta()] }
}

/// Write to a sibling temp file, then rename over the target.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut f = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path).with_context(|| format!("publishing {}", path.display()))?;
    Ok(())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(buf)
}

pub fn save_matrix(paths: &IndexPaths, matrix: &FeatureMatrix) -> Result<()> {
    create_dir_all(&paths.root)?;
    let bytes = bincode::serialize(matrix)?;
    write_atomic(&paths.matrix(), &bytes)
}

pub fn load_matrix(paths: &IndexPaths) -> Result<FeatureMatrix> {
    let buf = read_bytes(&paths.matrix())?;
    let matrix = bincode::deserialize(&buf)?;
    Ok(matrix)
}

pub fn save_catalog(paths: &IndexPaths, catalog: &Catalog) -> Result<()> {
    create_dir_all(&paths.root)?;
    let bytes = bincode::serialize(catalog)?;
    write_atomic(&paths.catalog(), &bytes)
}

pub fn load_catalog(paths: &IndexPaths) -> Result<Catalog> {
    let buf = read_bytes(&paths.catalog())?;
    let catalog = bincode::deserialize(&buf)?;
    Ok(catalog)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(meta)?;
    write_atomic(&paths.meta(), json.as_bytes())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let buf = read_bytes(&paths.meta())?;
    let meta: MetaFile = serde_json::from_slice(&buf)?;
    Ok(meta)
}

/// Fingerprint of a dataset file combined with the vectorizer settings.
pub fn fingerprint(dataset: &Path, config: VectorizerConfig) -> Result<String> {
    let mut f = File::open(dataset).with_context(|| format!("opening {}", dataset.display()))?;
    let mut hasher = Sha1::new();
    std::io::copy(&mut f, &mut hasher)?;
    hasher.update(format!("max_features={};stem={}", config.max_features, config.stem).as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Persist an index. Any previous manifest is removed first so a crash part-way
/// leaves no loadable snapshot.
pub fn save_index(paths: &IndexPaths, index: &MovieIndex, fingerprint: Option<String>) -> Result<MetaFile> {
    create_dir_all(&paths.root)?;
    match fs::remove_file(paths.meta()) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    save_matrix(paths, index.matrix())?;
    save_catalog(paths, index.catalog())?;
    let meta = MetaFile {
        num_rows: index.catalog().len(),
        num_cols: index.matrix().n_cols(),
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: FORMAT_VERSION,
        fingerprint,
    };
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), rows = meta.num_rows, "saved index");
    Ok(meta)
}

/// Load a committed snapshot together with its manifest.
pub fn load_index(paths: &IndexPaths) -> Result<(MovieIndex, MetaFile), EngineError> {
    if paths.all().iter().any(|p| !p.is_file()) {
        return Err(EngineError::IndexNotFound(paths.root.clone()));
    }
    let corrupt = |e: anyhow::Error| EngineError::Corrupt(format!("{e:#}"));
    let meta = load_meta(paths).map_err(corrupt)?;
    if meta.version != FORMAT_VERSION {
        return Err(EngineError::Corrupt(format!("unsupported format version {}", meta.version)));
    }
    let matrix = load_matrix(paths).map_err(corrupt)?;
    let catalog = load_catalog(paths).map_err(corrupt)?;
    if meta.num_rows != catalog.len() || meta.num_cols != matrix.n_cols() {
        return Err(EngineError::Corrupt("manifest does not match artifacts".into()));
    }
    let index = MovieIndex::from_parts(catalog, matrix)?;
    Ok((index, meta))
}

/// Load the persisted index, rebuilding from `dataset` when it is missing,
/// unreadable, or was built from different data or settings.
pub fn open_or_build(paths: &IndexPaths, dataset: &Path, config: VectorizerConfig) -> Result<MovieIndex, EngineError> {
    let current = if dataset.is_file() {
        match fingerprint(dataset, config) {
            Ok(fp) => Some(fp),
            Err(e) => {
                tracing::warn!(error = ?e, "could not fingerprint dataset");
                None
            }
        }
    } else {
        None
    };

    let stale = match load_index(paths) {
        Ok((index, meta)) => match (&current, &meta.fingerprint) {
            (Some(now), Some(then)) if now != then => {
                tracing::info!(root = %paths.root.display(), "persisted index is stale, rebuilding");
                Some(index)
            }
            _ => {
                tracing::info!(root = %paths.root.display(), rows = meta.num_rows, "loaded persisted index");
                return Ok(index);
            }
        },
        Err(e) if e.is_rebuildable() => {
            tracing::info!(error = %e, "no usable persisted index, rebuilding");
            None
        }
        Err(e) => return Err(e),
    };

    match rebuild(paths, dataset, config, current) {
        Ok(index) => Ok(index),
        Err(e) => match stale {
            Some(index) => {
                tracing::warn!(error = %e, "rebuild failed, serving stale index");
                Ok(index)
            }
            None => Err(e),
        },
    }
}

fn rebuild(paths: &IndexPaths, dataset: &Path, config: VectorizerConfig, fingerprint: Option<String>) -> Result<MovieIndex, EngineError> {
    if !dataset.is_file() {
        return Err(EngineError::DataUnavailable(format!(
            "no persisted index at {} and dataset {} is missing",
            paths.root.display(),
            dataset.display()
        )));
    }
    let raw = load_movies(dataset).map_err(|e| EngineError::DataUnavailable(e.to_string()))?;
    let index = MovieIndex::build(raw, config);
    if let Err(e) = save_index(paths, &index, fingerprint) {
        tracing::warn!(error = ?e, "failed to persist index; serving from memory");
    }
    Ok(index)
}
