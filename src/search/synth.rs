use tracing::{info, warn};

use crate::config::Pricing;
use crate::elastic::Passage;
use crate::openai::{CompletionClient, CompletionError, Usage};

/// Reply the model is told to give when the passage does not answer the question.
pub const REFUSAL: &str = "Not able to find the requested search term";

#[derive(Debug, thiserror::Error)]
#[error("answer generation failed: {0}")]
pub struct GenerationFailed(#[from] pub CompletionError);

/// Estimated spend for one completion, in the currency of the configured rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBreakdown {
    pub input: f64,
    pub output: f64,
    pub total: f64,
}

impl CostBreakdown {
    pub fn estimate(usage: Usage, pricing: Pricing) -> Self {
        let input = f64::from(usage.prompt_tokens) / 1000.0 * pricing.input_per_1k;
        let output = f64::from(usage.completion_tokens) / 1000.0 * pricing.output_per_1k;
        Self {
            input,
            output,
            total: input + output,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub answer: String,
    pub usage: Usage,
    pub cost: CostBreakdown,
    pub source_url: Option<String>,
}

impl GenerationResult {
    /// True when the model declined because the passage lacked the answer.
    pub fn is_refusal(&self) -> bool {
        self.answer.trim_matches(|c: char| c.is_whitespace() || c == '\'' || c == '"' || c == '.')
            == REFUSAL
    }
}

pub fn build_prompt(question: &str, passage: &str) -> String {
    format!(
        "Answer this question: {question}\nUsing only the information from {passage}\n\
         If the answer is not contained in the supplied doc, reply '{REFUSAL}'. Do not make up any answers"
    )
}

/// Asks the completion engine to answer `question` from `passage` alone.
/// Exactly one request is sent; failures are returned, never turned into the refusal.
pub async fn synthesize(
    client: &impl CompletionClient,
    question: &str,
    passage: &Passage,
    pricing: Pricing,
) -> Result<GenerationResult, GenerationFailed> {
    let prompt = build_prompt(question, &passage.body);

    let completion = client
        .complete(&prompt)
        .await
        .inspect_err(|e| warn!(deployment = client.deployment(), error = %e, "generation failed"))?;

    let usage = completion.usage;
    let cost = CostBreakdown::estimate(usage, pricing);

    info!(
        deployment = client.deployment(),
        openai_input_tokens = usage.prompt_tokens,
        openai_output_tokens = usage.completion_tokens,
        openai_total_tokens = usage.total_tokens,
        openai_input_cost = cost.input,
        openai_output_cost = cost.output,
        openai_total_cost = cost.total,
        "generation complete"
    );

    Ok(GenerationResult {
        answer: completion.text.trim().to_string(),
        usage,
        cost,
        source_url: Some(passage.url.clone()).filter(|u| !u.is_empty()),
    })
}
