//! Intent classification and entity extraction
//!
//! - **intent**: the closed intent enumeration
//! - **catalog**: labeled example phrases per intent
//! - **embedding**: text embedders and cosine similarity
//! - **classifier**: nearest-neighbor semantic classification
//! - **entities**: rule-based slot extraction

mod catalog;
mod classifier;
mod embedding;
mod entities;
mod intent;

pub use catalog::{CatalogEntry, IntentCatalog};
pub use classifier::{Classification, IntentClassifier};
#[cfg(feature = "onnx")]
pub use embedding::OnnxEmbedder;
pub use embedding::{HashEmbedder, TextEmbedder, cosine_similarity, default_embedder};
pub use entities::{Entities, EntityExtractor};
pub use intent::Intent;
