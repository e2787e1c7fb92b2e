use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct SearchRequest {
    pub query: serde_json::Value,
    pub fields: Vec<&'static str>,
    pub size: usize,
    #[serde(rename = "_source")]
    pub source: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub hits: Option<HitsEnvelope>,
}

#[derive(Debug, Deserialize)]
pub struct HitsEnvelope {
    #[serde(default)]
    pub hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
pub struct RawHit {
    #[serde(rename = "_score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub fields: HashMap<String, Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<ErrorBody>,
}

/// Elasticsearch reports errors either as an object or, for some proxies, a bare string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Detailed {
        #[serde(rename = "type")]
        kind: Option<String>,
        reason: Option<String>,
    },
    Plain(String),
}

/// One ranked document as shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub title: String,
    pub url: String,
    pub score: f64,
    pub body_content: Option<String>,
}

/// Top grounding passage for answer synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    pub body: String,
    pub url: String,
}
