use futures::future::join3;
use tracing::{info, warn};

use super::synth::{GenerationFailed, GenerationResult, synthesize};
use crate::config::Pricing;
use crate::elastic::{Hit, Retrieval, SearchClient, SearchError, Strategy};
use crate::openai::CompletionClient;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("query must not be empty")]
    Empty,
}

/// A non-empty, trimmed user query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QueryError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Why one comparison path produced a notice instead of results.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Generation(#[from] GenerationFailed),

    #[error("search client returned the wrong result shape for {0}")]
    UnexpectedShape(&'static str),
}

/// Outcome of the retrieve-then-summarize path when nothing failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    Answered(GenerationResult),
    /// The index had no grounding passage, so the model was never called.
    NoPassage,
}

/// Three independently obtained outcomes for one query.
/// Scores of the two hit lists come from different strategies and are never merged.
#[derive(Debug)]
pub struct ComparisonResult {
    pub query: Query,
    pub generation: Result<Generation, PathError>,
    pub semantic: Result<Vec<Hit>, PathError>,
    pub keyword: Result<Vec<Hit>, PathError>,
}

pub struct Orchestrator<S, C> {
    search: S,
    completion: C,
    pricing: Pricing,
    page_size: usize,
}

impl<S: SearchClient, C: CompletionClient> Orchestrator<S, C> {
    pub fn new(search: S, completion: C, pricing: Pricing) -> Self {
        Self {
            search,
            completion,
            pricing,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Runs the three paths concurrently and waits for all of them.
    /// A failing path only affects its own slot.
    pub async fn compare(&self, query: &Query) -> ComparisonResult {
        info!(query = %query.as_str(), page_size = self.page_size, "comparison started");

        let (generation, semantic, keyword) = join3(
            self.answer(query.as_str()),
            self.hit_list(query.as_str(), Strategy::SemanticList),
            self.hit_list(query.as_str(), Strategy::KeywordList),
        )
        .await;

        info!(
            generation = slot_summary(&generation),
            semantic = slot_summary(&semantic),
            keyword = slot_summary(&keyword),
            "comparison complete"
        );

        ComparisonResult {
            query: query.clone(),
            generation,
            semantic,
            keyword,
        }
    }

    async fn answer(&self, query: &str) -> Result<Generation, PathError> {
        self.generate(query)
            .await
            .inspect_err(|e| warn!(path = "generation", error = %e, "path failed"))
    }

    async fn generate(&self, query: &str) -> Result<Generation, PathError> {
        let retrieval = self
            .search
            .retrieve(query, Strategy::SemanticPassage, 1)
            .await?;
        let Retrieval::Passage(passage) = retrieval else {
            return Err(PathError::UnexpectedShape(Strategy::SemanticPassage.label()));
        };

        let Some(passage) = passage else {
            info!("no grounding passage found; skipping generation");
            return Ok(Generation::NoPassage);
        };

        let result = synthesize(&self.completion, query, &passage, self.pricing).await?;
        Ok(Generation::Answered(result))
    }

    async fn hit_list(&self, query: &str, strategy: Strategy) -> Result<Vec<Hit>, PathError> {
        let outcome = match self.search.retrieve(query, strategy, self.page_size).await {
            Ok(Retrieval::Hits(hits)) => Ok(hits),
            Ok(Retrieval::Passage(_)) => Err(PathError::UnexpectedShape(strategy.label())),
            Err(e) => Err(e.into()),
        };

        outcome.inspect_err(|e| warn!(path = strategy.label(), error = %e, "path failed"))
    }
}

fn slot_summary<T>(slot: &Result<T, PathError>) -> &'static str {
    if slot.is_ok() { "ok" } else { "failed" }
}
