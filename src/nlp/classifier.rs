//! Semantic intent classification
//!
//! Maps free text to the closest cataloged intent by nearest-neighbor
//! cosine similarity over example-phrase embeddings, with a
//! confidence-gated unknown fallback.

use std::sync::{Arc, RwLock};

use crate::nlp::catalog::IntentCatalog;
use crate::nlp::embedding::{TextEmbedder, cosine_similarity};
use crate::nlp::intent::Intent;
use crate::{Error, Result};

/// Outcome of classifying one text
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Best-matching intent, or [`Intent::Unknown`] below the threshold
    pub intent: Intent,
    /// Raw maximum cosine similarity observed across the catalog;
    /// reported even when the intent is unknown so callers can tell a
    /// close miss from no signal
    pub confidence: f32,
}

/// One intent's phrases and their precomputed embeddings
struct IndexEntry {
    intent: Intent,
    phrases: Vec<String>,
    embeddings: Vec<Vec<f32>>,
}

/// Nearest-neighbor intent classifier over a phrase catalog
///
/// The catalog and its embedding index live behind a readers-writer lock:
/// any number of `classify` calls may run together, while `add_examples`
/// excludes them for its recompute window.
pub struct IntentClassifier {
    embedder: Arc<dyn TextEmbedder>,
    threshold: f32,
    index: RwLock<Vec<IndexEntry>>,
}

impl IntentClassifier {
    /// Build a classifier over the built-in catalog
    ///
    /// # Errors
    ///
    /// Returns error if embedding the catalog fails
    pub fn new(embedder: Arc<dyn TextEmbedder>, threshold: f32) -> Result<Self> {
        Self::with_catalog(embedder, threshold, &IntentCatalog::builtin())
    }

    /// Build a classifier over an explicit catalog
    ///
    /// # Errors
    ///
    /// Returns error if embedding the catalog fails
    pub fn with_catalog(
        embedder: Arc<dyn TextEmbedder>,
        threshold: f32,
        catalog: &IntentCatalog,
    ) -> Result<Self> {
        let mut index = Vec::with_capacity(catalog.len());

        for entry in catalog.iter() {
            let phrases: Vec<String> =
                entry.phrases.iter().map(|p| normalize(p)).collect();
            let embeddings = embed_all(embedder.as_ref(), &phrases)?;
            index.push(IndexEntry {
                intent: entry.intent.clone(),
                phrases,
                embeddings,
            });
        }

        tracing::debug!(intents = index.len(), "intent embedding index built");

        Ok(Self {
            embedder,
            threshold,
            index: RwLock::new(index),
        })
    }

    /// Classify a text against the catalog
    ///
    /// Empty or whitespace-only input short-circuits to
    /// `(unknown, 0.0)` without touching the embedding model. Ties break
    /// to the first intent in catalog order.
    ///
    /// # Errors
    ///
    /// Returns error if the embedding model fails
    pub fn classify(&self, text: &str) -> Result<Classification> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Classification {
                intent: Intent::Unknown,
                confidence: 0.0,
            });
        }

        let query = self.embedder.embed(&normalize(trimmed))?;

        let index = self
            .index
            .read()
            .map_err(|_| Error::Embedding("intent index poisoned".to_string()))?;

        let mut best: Option<(Intent, f32)> = None;

        for entry in index.iter() {
            if entry.embeddings.is_empty() {
                continue;
            }

            // Per-intent maximum across that intent's example embeddings
            let score = entry
                .embeddings
                .iter()
                .map(|e| cosine_similarity(&query, e))
                .fold(f32::MIN, f32::max);

            // Strict comparison keeps the first intent on ties
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((entry.intent.clone(), score)),
            }
        }

        let Some((intent, confidence)) = best else {
            return Ok(Classification {
                intent: Intent::Unknown,
                confidence: 0.0,
            });
        };

        tracing::debug!(intent = %intent, confidence, "classified");

        if confidence < self.threshold {
            return Ok(Classification {
                intent: Intent::Unknown,
                confidence,
            });
        }

        Ok(Classification { intent, confidence })
    }

    /// Append example phrases to an intent and recompute its embeddings
    ///
    /// Registers the intent if it is new. Only the touched intent's
    /// embedding set is recomputed; other intents keep their cached
    /// vectors. Classification is excluded for the recompute window.
    ///
    /// # Errors
    ///
    /// Returns error if the embedding model fails
    pub fn add_examples<I, S>(&self, intent: Intent, examples: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let new_phrases: Vec<String> = examples
            .into_iter()
            .map(|p| normalize(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();

        if new_phrases.is_empty() {
            return Ok(());
        }

        let mut index = self
            .index
            .write()
            .map_err(|_| Error::Embedding("intent index poisoned".to_string()))?;

        let added = new_phrases.len();

        if let Some(entry) = index.iter_mut().find(|e| e.intent == intent) {
            entry.phrases.extend(new_phrases);
            entry.embeddings = embed_all(self.embedder.as_ref(), &entry.phrases)?;
            tracing::debug!(intent = %intent, added, "intent examples extended");
        } else {
            let embeddings = embed_all(self.embedder.as_ref(), &new_phrases)?;
            tracing::debug!(intent = %intent, added, "intent registered");
            index.push(IndexEntry {
                intent,
                phrases: new_phrases,
                embeddings,
            });
        }

        Ok(())
    }

    /// Intents currently in the catalog, in stable order
    #[must_use]
    pub fn intents(&self) -> Vec<Intent> {
        self.index
            .read()
            .map(|index| index.iter().map(|e| e.intent.clone()).collect())
            .unwrap_or_default()
    }

    /// The configured confidence threshold
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }
}

/// Normalization applied to both catalog phrases and query text
fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn embed_all(embedder: &dyn TextEmbedder, phrases: &[String]) -> Result<Vec<Vec<f32>>> {
    phrases.iter().map(|p| embedder.embed(p)).collect()
}
