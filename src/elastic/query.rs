use serde_json::json;

use super::types::SearchRequest;

pub const EXPANSION_FIELD: &str = "ml.inference.body_content_expanded.predicted_value";
pub const EXPANSION_MODEL: &str = ".elser_model_2_linux-x86_64";

const PASSAGE_BOOST: u32 = 3;
const LIST_BOOST: u32 = 1;
const KEYWORD_FIELDS: [&str; 2] = ["title^3", "body_content^2"];

const PASSAGE_FIELDS: &[&str] = &["body_content", "url", "title"];
const LIST_FIELDS: &[&str] = &["title", "url"];

/// The three ways an index is queried for one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Semantic expansion, top hit only, body included for grounding.
    SemanticPassage,
    /// Semantic expansion, ranked list.
    SemanticList,
    /// Multi-field term matching, ranked list.
    KeywordList,
}

impl Strategy {
    pub fn label(self) -> &'static str {
        match self {
            Strategy::SemanticPassage => "semantic_passage",
            Strategy::SemanticList => "semantic_list",
            Strategy::KeywordList => "keyword_list",
        }
    }
}

/// Options that shape the query body but stay fixed across queries.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub min_match_percent: u8,
}

pub fn build_request(
    query: &str,
    strategy: Strategy,
    page_size: usize,
    opts: QueryOptions,
) -> SearchRequest {
    match strategy {
        Strategy::SemanticPassage => SearchRequest {
            query: text_expansion(query, PASSAGE_BOOST),
            fields: PASSAGE_FIELDS.to_vec(),
            size: 1,
            source: false,
        },
        Strategy::SemanticList => SearchRequest {
            query: text_expansion(query, LIST_BOOST),
            fields: LIST_FIELDS.to_vec(),
            size: page_size,
            source: false,
        },
        Strategy::KeywordList => SearchRequest {
            query: keyword(query, opts.min_match_percent),
            fields: LIST_FIELDS.to_vec(),
            size: page_size,
            source: false,
        },
    }
}

fn text_expansion(query: &str, boost: u32) -> serde_json::Value {
    json!({
        "text_expansion": {
            EXPANSION_FIELD: {
                "model_text": query,
                "model_id": EXPANSION_MODEL,
                "boost": boost
            }
        }
    })
}

fn keyword(query: &str, min_match_percent: u8) -> serde_json::Value {
    json!({
        "bool": {
            "must": [{
                "multi_match": {
                    "query": query,
                    "fields": KEYWORD_FIELDS,
                    "type": "best_fields",
                    "minimum_should_match": format!("{min_match_percent}%")
                }
            }]
        }
    })
}
