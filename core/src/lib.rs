pub mod catalog;
pub mod error;
pub mod index;
pub mod matrix;
pub mod persist;
pub mod search;
pub mod similarity;
pub mod tokenizer;
pub mod vectorizer;

pub use catalog::{Catalog, MovieRecord, RawMovie, RowIndex};
pub use error::EngineError;
pub use index::{MovieIndex, TitleIndex};
pub use matrix::FeatureMatrix;
pub use similarity::Neighbor;
pub use vectorizer::{TfidfVectorizer, VectorizerConfig};
