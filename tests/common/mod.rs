//! Shared test utilities
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use aria_assistant::audio::{AudioFrame, FrameSource};
use aria_assistant::nlp::{Entities, Intent};
use aria_assistant::skills::SkillHandler;
use aria_assistant::{Error, HashEmbedder, Result, TextEmbedder};

/// Embedder that counts invocations, for short-circuit verification
pub struct CountingEmbedder {
    inner: HashEmbedder,
    calls: AtomicUsize,
}

impl CountingEmbedder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: HashEmbedder::default(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextEmbedder for CountingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text)
    }
}

/// Embedder returning fixed vectors per text, for exact-score tests
pub struct StubEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    dim: usize,
}

impl StubEmbedder {
    #[must_use]
    pub fn new(entries: &[(&str, &[f32])]) -> Self {
        let vectors: HashMap<String, Vec<f32>> = entries
            .iter()
            .map(|(text, vector)| (text.to_string(), vector.to_vec()))
            .collect();
        let dim = entries.first().map_or(3, |(_, v)| v.len());
        Self { vectors, dim }
    }
}

impl TextEmbedder for StubEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.dim]))
    }
}

/// Skill handler that records calls and replies with a fixed string
pub struct CountingSkill {
    response: String,
    calls: Arc<AtomicUsize>,
}

impl CountingSkill {
    #[must_use]
    pub fn new(response: &str) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Arc::new(Self {
                response: response.to_string(),
                calls: Arc::clone(&calls),
            }),
            calls,
        )
    }
}

#[async_trait]
impl SkillHandler for CountingSkill {
    async fn handle(
        &self,
        _intent: &Intent,
        _entities: &Entities,
        _raw_text: &str,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// Skill handler that always fails, for failure-policy tests
pub struct FailingSkill;

#[async_trait]
impl SkillHandler for FailingSkill {
    async fn handle(
        &self,
        _intent: &Intent,
        _entities: &Entities,
        _raw_text: &str,
    ) -> Result<String> {
        Err(Error::Skill("collaborator exploded".to_string()))
    }
}

/// Frame source replaying prepared frames
pub struct VecSource {
    frames: std::vec::IntoIter<Vec<i16>>,
    sample_rate: u32,
}

impl VecSource {
    #[must_use]
    pub fn new(frames: Vec<Vec<i16>>, sample_rate: u32) -> Self {
        Self {
            frames: frames.into_iter(),
            sample_rate,
        }
    }
}

impl FrameSource for VecSource {
    fn read_frame(&mut self) -> Result<Option<AudioFrame>> {
        Ok(self.frames.next().map(AudioFrame::new))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
