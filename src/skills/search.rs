//! Web search skill
//!
//! Keyless providers: Wikipedia summaries and DuckDuckGo instant answers.

use async_trait::async_trait;

use crate::nlp::{Entities, Intent};
use crate::skills::SkillHandler;
use crate::{Error, Result};

/// Search provider backend
#[derive(Debug, Clone, Copy)]
pub enum SearchProvider {
    /// Wikipedia opensearch + page summary
    Wikipedia,
    /// DuckDuckGo instant-answer API
    DuckDuckGo,
}

/// Web search skill
pub struct WebSearch {
    provider: SearchProvider,
    client: reqwest::Client,
}

/// Wikipedia opensearch response: `[query, titles, descriptions, urls]`
type OpenSearchResponse = (String, Vec<String>, Vec<String>, Vec<String>);

/// Wikipedia page summary response
#[derive(serde::Deserialize)]
struct PageSummary {
    #[serde(default)]
    extract: String,
}

/// DuckDuckGo instant-answer response
#[derive(serde::Deserialize)]
struct InstantAnswer {
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "Heading", default)]
    heading: String,
}

impl WebSearch {
    /// Create a search skill backed by Wikipedia
    #[must_use]
    pub fn new_wikipedia() -> Self {
        Self {
            provider: SearchProvider::Wikipedia,
            client: reqwest::Client::new(),
        }
    }

    /// Create a search skill backed by DuckDuckGo
    #[must_use]
    pub fn new_duckduckgo() -> Self {
        Self {
            provider: SearchProvider::DuckDuckGo,
            client: reqwest::Client::new(),
        }
    }

    /// Search for a query and return a spoken-form result
    ///
    /// # Errors
    ///
    /// Returns error if the provider request fails
    pub async fn search(&self, query: &str) -> Result<String> {
        let query = query.trim();
        if query.is_empty() {
            return Ok("I need something to search for. What would you like to know?".to_string());
        }

        tracing::debug!(query, provider = ?self.provider, "searching");

        match self.provider {
            SearchProvider::Wikipedia => self.search_wikipedia(query).await,
            SearchProvider::DuckDuckGo => self.search_duckduckgo(query).await,
        }
    }

    async fn search_wikipedia(&self, query: &str) -> Result<String> {
        let url = format!(
            "https://en.wikipedia.org/w/api.php?action=opensearch&search={}&limit=3&namespace=0&format=json",
            urlencoding::encode(query)
        );

        let response = self.client.get(&url).send().await?;
        let response = response.error_for_status().map_err(Error::Http)?;
        let (_, titles, ..): OpenSearchResponse = response.json().await?;

        // Try each candidate page until one has a usable summary
        for title in &titles {
            let summary_url = format!(
                "https://en.wikipedia.org/api/rest_v1/page/summary/{}",
                urlencoding::encode(title)
            );

            let Ok(response) = self.client.get(&summary_url).send().await else {
                continue;
            };
            if !response.status().is_success() {
                continue;
            }
            let Ok(summary) = response.json::<PageSummary>().await else {
                continue;
            };

            if !summary.extract.is_empty() {
                return Ok(format!("According to Wikipedia: {}", summary.extract));
            }
        }

        Ok(no_result(query))
    }

    async fn search_duckduckgo(&self, query: &str) -> Result<String> {
        let url = format!(
            "https://api.duckduckgo.com/?q={}&format=json&no_html=1&skip_disambig=1",
            urlencoding::encode(query)
        );

        let response = self.client.get(&url).send().await?;
        let response = response.error_for_status().map_err(Error::Http)?;
        let answer: InstantAnswer = response.json().await?;

        if answer.abstract_text.is_empty() {
            return Ok(no_result(query));
        }

        if answer.heading.is_empty() {
            Ok(answer.abstract_text)
        } else {
            Ok(format!("{}: {}", answer.heading, answer.abstract_text))
        }
    }
}

/// Fallback when no provider had an answer
fn no_result(query: &str) -> String {
    format!(
        "I couldn't find detailed information about '{query}'. Try asking a more specific question."
    )
}

#[async_trait]
impl SkillHandler for WebSearch {
    async fn handle(
        &self,
        _intent: &Intent,
        entities: &Entities,
        raw_text: &str,
    ) -> Result<String> {
        // Fall back to the raw text when extraction produced no usable query
        let query = entities
            .query
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .unwrap_or(raw_text);

        self.search(query).await
    }
}
