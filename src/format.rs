use crate::elastic::Hit;
use crate::search::{Generation, PathError};
use crate::search::synth::GenerationResult;

pub const NO_RESULTS_NOTICE: &str = "No results found in Elasticsearch.";
pub const EMPTY_HITS_NOTICE: &str = "No matching documents.";

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayHit {
    pub title: String,
    pub url: String,
    pub score: String,
}

impl From<&Hit> for DisplayHit {
    fn from(hit: &Hit) -> Self {
        Self {
            title: single_line(&hit.title),
            url: hit.url.clone(),
            score: hit.score.to_string(),
        }
    }
}

impl DisplayHit {
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("**Title**: {}", self.title),
            format!("**URL**: {}", self.url),
            format!("**Score**: {}", self.score),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayAnswer {
    pub answer: String,
    pub url: Option<String>,
    pub token_summary: String,
    pub cost_summary: String,
}

impl From<&GenerationResult> for DisplayAnswer {
    fn from(result: &GenerationResult) -> Self {
        let usage = result.usage;
        Self {
            answer: result.answer.clone(),
            url: result.source_url.clone(),
            token_summary: format!(
                "{} (Input: {}, Output: {})",
                usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
            ),
            cost_summary: format!(
                "${:.6} (Input: ${:.6}, Output: ${:.6})",
                result.cost.total, result.cost.input, result.cost.output
            ),
        }
    }
}

impl DisplayAnswer {
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("**Chat**: {}", self.answer),
            format!("**Article URL**: {}", self.url.as_deref().unwrap_or("(none)")),
            format!("**Tokens used**: {}", self.token_summary),
            format!("**Estimated cost**: {}", self.cost_summary),
        ]
    }
}

/// What one display region shows: results, or a short notice in their place.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    Answer(DisplayAnswer),
    Hits(Vec<DisplayHit>),
    Notice(String),
}

impl Region {
    pub fn from_generation(slot: &Result<Generation, PathError>) -> Self {
        match slot {
            Ok(Generation::Answered(result)) => Region::Answer(result.into()),
            Ok(Generation::NoPassage) => Region::Notice(NO_RESULTS_NOTICE.to_string()),
            Err(e) => Region::Notice(format!("Answer unavailable: {e}")),
        }
    }

    pub fn from_hits(slot: &Result<Vec<Hit>, PathError>) -> Self {
        match slot {
            Ok(hits) if hits.is_empty() => Region::Notice(EMPTY_HITS_NOTICE.to_string()),
            Ok(hits) => Region::Hits(hits.iter().map(DisplayHit::from).collect()),
            Err(e) => Region::Notice(format!("Nothing returned: {e}")),
        }
    }

    /// Paragraphs of the region; hits are separated by an empty line.
    pub fn paragraphs(&self) -> Vec<Vec<String>> {
        match self {
            Region::Answer(answer) => vec![answer.lines()],
            Region::Hits(hits) => hits.iter().map(DisplayHit::lines).collect(),
            Region::Notice(notice) => vec![vec![notice.clone()]],
        }
    }
}

pub(crate) fn single_line(s: &str) -> String {
    s.chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}
