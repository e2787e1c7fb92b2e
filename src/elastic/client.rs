use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::Client;
use tracing::{debug, warn};

use super::hits::{extract_hits, extract_passage};
use super::query::{QueryOptions, Strategy, build_request};
use super::types::{ErrorBody, ErrorResponse, Hit, Passage, SearchResponse};
use crate::config::{ElasticConfig, Secret};

/// Characters to percent-encode in the index path segment.
const INDEX_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'/')
    .add(b'?')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+');

/// Either backend outcome is the "search unavailable" case; an empty match is never an error.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search engine unreachable: {0}")]
    Unavailable(#[from] reqwest::Error),

    #[error("search engine error ({status}): {reason}")]
    Backend { status: u16, reason: String },
}

/// What one retrieval produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    /// `None` means the index had nothing to ground on.
    Passage(Option<Passage>),
    Hits(Vec<Hit>),
}

/// Query-execution seam over the search engine.
/// Implemented by `ElasticClient` for production; mock implementations used in tests.
pub trait SearchClient {
    async fn retrieve(
        &self,
        query: &str,
        strategy: Strategy,
        page_size: usize,
    ) -> Result<Retrieval, SearchError>;
}

#[derive(Clone)]
pub struct ElasticClient {
    http: Client,
    base_url: String,
    api_key: Secret,
    index: String,
    opts: QueryOptions,
}

impl ElasticClient {
    pub fn new(http: Client, config: &ElasticConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            index: config.index.clone(),
            opts: QueryOptions {
                min_match_percent: config.min_match_percent,
            },
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str, index: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            api_key: Secret::new("test-key"),
            index: index.to_string(),
            opts: QueryOptions {
                min_match_percent: crate::config::DEFAULT_MIN_MATCH_PERCENT,
            },
        }
    }

    async fn execute(
        &self,
        query: &str,
        strategy: Strategy,
        page_size: usize,
    ) -> Result<SearchResponse, SearchError> {
        let index = utf8_percent_encode(&self.index, INDEX_ENCODE_SET);
        let url = format!("{}/{index}/_search", self.base_url);
        let request = build_request(query, strategy, page_size, self.opts);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("ApiKey {}", self.api_key.expose()))
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .send()
            .await
            .inspect_err(|e| warn!(strategy = strategy.label(), error = %e, "search request failed"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let reason = extract_reason(&text);
            warn!(status = %status, strategy = strategy.label(), "search engine error");
            return Err(SearchError::Backend {
                status: status.as_u16(),
                reason,
            });
        }

        let text = response.text().await?;
        let body: SearchResponse = serde_json::from_str(&text).map_err(|e| {
            warn!(status = %status, strategy = strategy.label(), error = %e, "malformed search response");
            SearchError::Backend {
                status: status.as_u16(),
                reason: format!("malformed search response: {e}"),
            }
        })?;
        debug!(
            strategy = strategy.label(),
            index = %self.index,
            hits = body.hits.as_ref().map_or(0, |h| h.hits.len()),
            "search response received"
        );
        Ok(body)
    }
}

impl SearchClient for ElasticClient {
    async fn retrieve(
        &self,
        query: &str,
        strategy: Strategy,
        page_size: usize,
    ) -> Result<Retrieval, SearchError> {
        let response = self.execute(query, strategy, page_size).await?;
        Ok(match strategy {
            Strategy::SemanticPassage => Retrieval::Passage(extract_passage(&response)),
            Strategy::SemanticList | Strategy::KeywordList => {
                Retrieval::Hits(extract_hits(&response))
            }
        })
    }
}

fn extract_reason(body: &str) -> String {
    let parsed = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.error);
    match parsed {
        Some(ErrorBody::Detailed {
            reason: Some(reason),
            ..
        }) => reason,
        Some(ErrorBody::Detailed {
            kind: Some(kind), ..
        }) => kind,
        Some(ErrorBody::Plain(message)) => message,
        _ if body.is_empty() => "no response body".to_string(),
        _ => body.chars().take(200).collect(),
    }
}
